//! Bounding volumes
//!
//! Axis aligned boxes and spheres with an explicit *invalid* state meaning
//! "no data yet". Expanding by an invalid operand leaves the target unchanged;
//! expanding an invalid target adopts the operand. Bounds propagate up the
//! scene graph through this algebra instead of through error values.

mod bounding_box;
mod bounding_sphere;

pub use bounding_box::BoundingBox;
pub use bounding_sphere::BoundingSphere;
