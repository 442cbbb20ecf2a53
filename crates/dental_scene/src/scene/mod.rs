//! Scene graph
//!
//! Nodes, cameras and the scene root live in a [`SceneGraph`] arena together
//! with the geometries they display. Nodes refer to children, geometries and
//! their parent through arena keys, and a geometry may be shown by several
//! nodes at once.

pub mod camera;
pub mod geometry;
pub mod graph;
pub mod node;

pub use camera::{Camera, Frustum, Perspective};
pub use geometry::Geometry;
pub use graph::SceneGraph;
pub use node::{Node, NodeKind};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Transform, Unit, Vec3};

/// Anything positioned by a local model-view matrix
///
/// Incremental operations post-multiply, so they act in the object's own
/// frame.
pub trait Transformable {
    /// Local matrix
    fn mv(&self) -> &Mat4;

    /// Replace the local matrix
    fn set_mv(&mut self, mv: Mat4);

    /// Translation part of the local matrix
    fn origin(&self) -> Vec3 {
        self.mv().translation_part()
    }

    /// Replace the translation part, leaving rotation and scale alone
    fn set_origin(&mut self, origin: Vec3) {
        let mut mv = *self.mv();
        mv.set_translation_part(&origin);
        self.set_mv(mv);
    }

    /// Split the local matrix into scale, rotation and translation
    fn scale_rotate_translate(&self) -> Transform {
        Transform::from_matrix(self.mv())
    }

    /// Rebuild the local matrix as `translate * rotate * scale`
    fn set_scale_rotate_translate(&mut self, transform: &Transform) {
        self.set_mv(transform.to_matrix());
    }

    /// Move along the local axes
    fn translate(&mut self, translation: &Vec3) {
        let mv = self.mv() * Mat4::new_translation(translation);
        self.set_mv(mv);
    }

    /// Rotate `angle` radians about a local axis; a zero axis does nothing
    fn rotate(&mut self, angle: f32, axis: &Vec3) {
        let Some(axis) = Unit::try_new(*axis, f32::EPSILON) else {
            return;
        };
        let mv = self.mv() * Quat::from_axis_angle(&axis, angle).to_homogeneous();
        self.set_mv(mv);
    }

    /// Scale along the local axes
    fn scale_by(&mut self, scale: &Vec3) {
        let mv = self.mv() * Mat4::new_nonuniform_scaling(scale);
        self.set_mv(mv);
    }

    /// Length of each basis column
    fn scale(&self) -> Vec3 {
        self.scale_rotate_translate().scale
    }

    /// Replace the scale, keeping rotation and translation
    fn set_scale(&mut self, scale: Vec3) {
        let mut transform = self.scale_rotate_translate();
        transform.scale = scale;
        self.set_scale_rotate_translate(&transform);
    }

    /// Rotation as X, Y, Z Euler angles in degrees, applied `Rx * Ry * Rz`
    fn euler_degrees(&self) -> Vec3 {
        let r = self.scale_rotate_translate().rotation.to_rotation_matrix();
        let m = r.matrix();
        let y = utils::clamp(m[(0, 2)], -1.0, 1.0).asin();
        let x = (-m[(1, 2)]).atan2(m[(2, 2)]);
        let z = (-m[(0, 1)]).atan2(m[(0, 0)]);
        Vec3::new(utils::rad_to_deg(x), utils::rad_to_deg(y), utils::rad_to_deg(z))
    }

    /// Replace the rotation with X, Y, Z Euler angles in degrees
    fn set_euler_degrees(&mut self, degrees: Vec3) {
        let mut transform = self.scale_rotate_translate();
        transform.rotation = Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(degrees.x))
            * Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(degrees.y))
            * Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(degrees.z));
        self.set_scale_rotate_translate(&transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Probe {
        mv: Mat4,
        writes: usize,
    }

    impl Transformable for Probe {
        fn mv(&self) -> &Mat4 {
            &self.mv
        }

        fn set_mv(&mut self, mv: Mat4) {
            self.mv = mv;
            self.writes += 1;
        }
    }

    fn probe() -> Probe {
        Probe { mv: Mat4::identity(), writes: 0 }
    }

    #[test]
    fn test_scale_rotate_translate_roundtrip() {
        let mut p = probe();
        let axis = Unit::new_normalize(Vec3::new(0.3, -1.0, 0.2));
        let transform = Transform::new(
            Vec3::new(1.5, 2.0, 0.5),
            Quat::from_axis_angle(&axis, 1.1),
            Vec3::new(10.0, -3.0, 4.0),
        );
        p.set_scale_rotate_translate(&transform);
        let original = *p.mv();

        let split = p.scale_rotate_translate();
        p.set_scale_rotate_translate(&split);
        assert_relative_eq!(*p.mv(), original, epsilon = 1e-4);
        assert_relative_eq!(p.scale(), Vec3::new(1.5, 2.0, 0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_incremental_ops_are_local() {
        let mut p = probe();
        p.rotate(std::f32::consts::FRAC_PI_2, &Vec3::z());
        p.translate(&Vec3::new(1.0, 0.0, 0.0));
        // local +x is world +y after the rotation
        assert_relative_eq!(p.origin(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);

        p.scale_by(&Vec3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(p.scale(), Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-5);

        let writes = p.writes;
        p.rotate(1.0, &Vec3::zeros());
        assert_eq!(p.writes, writes);
    }

    #[test]
    fn test_set_origin_and_scale() {
        let mut p = probe();
        p.rotate(0.5, &Vec3::x());
        p.set_origin(Vec3::new(4.0, 5.0, 6.0));
        p.set_scale(Vec3::new(3.0, 3.0, 3.0));
        assert_relative_eq!(p.origin(), Vec3::new(4.0, 5.0, 6.0), epsilon = 1e-5);
        assert_relative_eq!(p.scale(), Vec3::new(3.0, 3.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_euler_roundtrip() {
        let mut p = probe();
        p.set_euler_degrees(Vec3::new(10.0, -20.0, 30.0));
        assert_relative_eq!(p.euler_degrees(), Vec3::new(10.0, -20.0, 30.0), epsilon = 1e-3);
    }
}
