//! Math utilities and types
//!
//! Provides the fundamental linear algebra types used by the scene graph.
//! All matrices follow OpenGL conventions: column vectors, right-handed
//! eye space looking down -Z, clip space depth in [-1, 1].

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix2, Matrix3, Matrix4,
    Quaternion,
    Rotation3,
    Unit,
    UnitQuaternion,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 2D integer vector type
pub type IVec2 = Vector2<i32>;

/// 3D integer vector type
pub type IVec3 = Vector3<i32>;

/// 4D integer vector type
pub type IVec4 = Vector4<i32>;

/// 2x2 matrix type
pub type Mat2 = Matrix2<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Scale, rotation and translation triple of an affine matrix
///
/// Composition order is `translate * rotate * scale`. Decomposition assumes the
/// matrix carries no shear and a strictly positive scale on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from its three parts
    pub const fn new(scale: Vec3, rotation: Quat, position: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine matrix
    ///
    /// Scale comes from the length of the first three columns, rotation from
    /// those columns once the scale is divided out.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        let rotation_matrix = Mat3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation_matrix));

        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

/// Extension trait for Mat4 with OpenGL style constructors
pub trait Mat4Ext {
    /// Perspective projection, `fovy` in radians
    fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Off-axis perspective projection (glFrustum)
    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Orthographic projection (glOrtho)
    fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Transform a point with a homogeneous divide
    fn project_point(&self, point: &Vec3) -> Vec3;

    /// Translation column
    fn translation_part(&self) -> Vec3;

    /// Replace the translation column
    fn set_translation_part(&mut self, translation: &Vec3);
}

impl Mat4Ext for Mat4 {
    fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fovy, near, far)
    }

    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::zeros();
        result[(0, 0)] = 2.0 * near / (right - left);
        result[(1, 1)] = 2.0 * near / (top - bottom);
        result[(0, 2)] = (right + left) / (right - left);
        result[(1, 2)] = (top + bottom) / (top - bottom);
        result[(2, 2)] = -(far + near) / (far - near);
        result[(3, 2)] = -1.0;
        result[(2, 3)] = -(2.0 * far * near) / (far - near);
        result
    }

    fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, near, far)
    }

    fn project_point(&self, point: &Vec3) -> Vec3 {
        let v = self * Vec4::new(point.x, point.y, point.z, 1.0);
        if v.w == 0.0 {
            v.xyz()
        } else {
            v.xyz() / v.w
        }
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m14, self.m24, self.m34)
    }

    fn set_translation_part(&mut self, translation: &Vec3) {
        self.m14 = translation.x;
        self.m24 = translation.y;
        self.m34 = translation.z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compose_decompose_roundtrip() {
        let axis = Unit::new_normalize(Vec3::new(1.0, 2.0, -0.5));
        let original = Transform::new(
            Vec3::new(2.0, 0.5, 3.0),
            Quat::from_axis_angle(&axis, 0.7),
            Vec3::new(-4.0, 1.0, 9.0),
        );
        let matrix = original.to_matrix();
        let decomposed = Transform::from_matrix(&matrix);

        assert_relative_eq!(decomposed.scale, original.scale, epsilon = 1e-5);
        assert_relative_eq!(decomposed.position, original.position, epsilon = 1e-5);
        assert_relative_eq!(decomposed.to_matrix(), matrix, epsilon = 1e-4);
    }

    #[test]
    fn test_frustum_matches_perspective() {
        let fovy = utils::deg_to_rad(60.0);
        let near = 1.0;
        let top = near * (fovy * 0.5).tan();
        let right = top * 1.5;
        let a = Mat4::perspective(fovy, 1.5, near, 100.0);
        let b = Mat4::frustum(-right, right, -top, top, near, 100.0);
        assert_relative_eq!(a, b, epsilon = 1e-5);
    }

    #[test]
    fn test_project_point_divides_by_w() {
        let projection = Mat4::perspective(utils::deg_to_rad(90.0), 1.0, 1.0, 10.0);
        let near_plane = projection.project_point(&Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(near_plane.z, -1.0, epsilon = 1e-5);
        let far_plane = projection.project_point(&Vec3::new(0.0, 0.0, -10.0));
        assert_relative_eq!(far_plane.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_translation_part() {
        let mut m = Mat4::identity();
        m.set_translation_part(&Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.translation_part(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m, Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)));
    }
}
