//! Virtual trackball
//!
//! Pointer positions in normalized device coordinates are lifted onto a
//! sphere of radius `size` that blends into a hyperbolic sheet away from the
//! centre, so drags that leave the ball still rotate smoothly.

use crate::foundation::math::{Vec2, Vec3};

/// Height of the trackball surface above `(x, y)`
pub fn project_to_sphere(size: f32, x: f32, y: f32) -> f32 {
    let d = (x * x + y * y).sqrt();
    if d < size * std::f32::consts::FRAC_1_SQRT_2 {
        (size * size - d * d).sqrt()
    } else {
        let t = size / std::f32::consts::SQRT_2;
        t * t / d
    }
}

/// Axis and angle of the drag from `p1` to `p2`
///
/// The axis is `p2 x p1` of the lifted points; the angle is the arcsine of
/// the chord over the ball diameter.
pub fn trackball(size: f32, p1: Vec2, p2: Vec2) -> (Vec3, f32) {
    let a = Vec3::new(p1.x, p1.y, project_to_sphere(size, p1.x, p1.y));
    let b = Vec3::new(p2.x, p2.y, project_to_sphere(size, p2.x, p2.y));

    let axis = b.cross(&a).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z);
    let t = ((b - a).norm() / (2.0 * size)).clamp(-1.0, 1.0);
    (axis, t.asin())
}
