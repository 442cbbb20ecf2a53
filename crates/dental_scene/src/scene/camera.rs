//! Projection and viewport carried by camera and scene nodes

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::render::Viewport;

/// Planes of a perspective frustum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left plane at the near distance
    pub left: f32,
    /// Right plane at the near distance
    pub right: f32,
    /// Bottom plane at the near distance
    pub bottom: f32,
    /// Top plane at the near distance
    pub top: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

/// Parameters of a symmetric perspective projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Vertical field of view in degrees
    pub fovy: f32,
    /// Width over height
    pub aspect: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

/// Default vertical field of view in degrees
pub const DEFAULT_FOVY: f32 = 90.0;
/// Default near clip distance
pub const DEFAULT_NEAR: f32 = 8.0;
/// Default far clip distance
pub const DEFAULT_FAR: f32 = 1000.0;
/// Depth range of viewport-sized orthographic projections
pub const ORTHO_DEPTH: f32 = 1000.0;

const ORTHOGONAL_EPSILON: f32 = 1e-5;

/// Projection matrix plus the window rectangle it maps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    projection: Mat4,
    viewport: Viewport,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            viewport: Viewport::default(),
        }
    }
}

impl Camera {
    /// Identity projection, default viewport
    pub fn new() -> Self {
        Self::default()
    }

    /// Perspective camera covering the given window rectangle
    pub fn perspective(x: i32, y: i32, width: i32, height: i32) -> Self {
        let mut camera = Self::default();
        camera.perspective_viewport(x, y, width, height);
        camera
    }

    /// Orthographic camera covering the given window rectangle
    pub fn orthographic(x: i32, y: i32, width: i32, height: i32) -> Self {
        let mut camera = Self::default();
        camera.ortho_viewport(x, y, width, height);
        camera
    }

    /// Projection matrix
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Replace the projection matrix
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    /// Window rectangle
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Move to a new window rectangle, refitting the projection
    ///
    /// Orthographic cameras stay orthographic, everything else becomes a
    /// default perspective.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if self.is_orthogonal() {
            self.ortho_viewport(x, y, width, height);
        } else {
            self.perspective_viewport(x, y, width, height);
        }
    }

    /// Resize, keeping the origin at the window corner
    pub fn resize(&mut self, width: i32, height: i32) {
        self.set_viewport(0, 0, width, height);
    }

    fn make_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width > 2 || height > 2 {
            self.viewport.set(x, y, width, height);
        }
    }

    /// Orthographic projection one unit per pixel, centred on the view axis
    pub fn ortho_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.make_viewport(x, y, width, height);
        let (w, h) = (width as f32 / 2.0, height as f32 / 2.0);
        self.projection = Mat4::ortho(-w, w, -h, h, -ORTHO_DEPTH, ORTHO_DEPTH);
    }

    /// Perspective projection with the default field of view and clip planes
    pub fn perspective_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.perspective_viewport_with(x, y, width, height, DEFAULT_FOVY, DEFAULT_NEAR, DEFAULT_FAR);
    }

    /// Perspective projection, aspect taken from the rectangle
    #[allow(clippy::too_many_arguments)]
    pub fn perspective_viewport_with(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        fovy: f32,
        near: f32,
        far: f32,
    ) {
        let aspect = width as f32 / height.max(1) as f32;
        self.perspective_viewport_aspect(x, y, width, height, aspect, fovy, near, far);
    }

    /// Perspective projection with an explicit aspect ratio
    #[allow(clippy::too_many_arguments)]
    pub fn perspective_viewport_aspect(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        aspect: f32,
        fovy: f32,
        near: f32,
        far: f32,
    ) {
        self.make_viewport(x, y, width, height);
        self.make_perspective(fovy, aspect, near, far);
    }

    /// Perspective projection, `fovy` in degrees
    pub fn make_perspective(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Mat4::perspective(utils::deg_to_rad(fovy), aspect, near, far);
    }

    /// Off-axis perspective projection
    pub fn make_frustum(&mut self, frustum: &Frustum) {
        self.projection = Mat4::frustum(
            frustum.left,
            frustum.right,
            frustum.bottom,
            frustum.top,
            frustum.near,
            frustum.far,
        );
    }

    /// Orthographic projection with the fixed depth range
    pub fn make_ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.projection = Mat4::ortho(left, right, bottom, top, -ORTHO_DEPTH, ORTHO_DEPTH);
    }

    /// Recover frustum planes, `None` unless the projection is a perspective
    pub fn split_frustum(&self) -> Option<Frustum> {
        let p = &self.projection;
        if p[(3, 0)] != 0.0 || p[(3, 1)] != 0.0 || p[(3, 2)] != -1.0 || p[(3, 3)] != 0.0 {
            return None;
        }

        let near = p[(2, 3)] / (p[(2, 2)] - 1.0);
        let far = p[(2, 3)] / (1.0 + p[(2, 2)]);

        Some(Frustum {
            left: near * (p[(0, 2)] - 1.0) / p[(0, 0)],
            right: near * (1.0 + p[(0, 2)]) / p[(0, 0)],
            bottom: near * (p[(1, 2)] - 1.0) / p[(1, 1)],
            top: near * (1.0 + p[(1, 2)]) / p[(1, 1)],
            near,
            far,
        })
    }

    /// Recover perspective parameters, `None` unless the projection is a perspective
    pub fn split_perspective(&self) -> Option<Perspective> {
        let f = self.split_frustum()?;
        let fovy = (f.top / f.near).atan() - (f.bottom / f.near).atan();
        Some(Perspective {
            fovy: utils::rad_to_deg(fovy),
            aspect: (f.right - f.left) / (f.top - f.bottom),
            near: f.near,
            far: f.far,
        })
    }

    /// Recover orthographic box, `None` unless the projection is orthographic
    pub fn split_ortho(&self) -> Option<Frustum> {
        let p = &self.projection;
        if p[(3, 0)] != 0.0 || p[(3, 1)] != 0.0 || p[(3, 2)] != 0.0 || p[(3, 3)] != 1.0 {
            return None;
        }
        if p[(0, 0)] == 0.0 || p[(1, 1)] == 0.0 || p[(2, 2)] == 0.0 {
            return None;
        }

        Some(Frustum {
            left: -(1.0 + p[(0, 3)]) / p[(0, 0)],
            right: (1.0 - p[(0, 3)]) / p[(0, 0)],
            bottom: -(1.0 + p[(1, 3)]) / p[(1, 1)],
            top: (1.0 - p[(1, 3)]) / p[(1, 1)],
            near: (p[(2, 3)] + 1.0) / p[(2, 2)],
            far: (p[(2, 3)] - 1.0) / p[(2, 2)],
        })
    }

    /// True when rows and columns of the projection are mutually orthogonal
    ///
    /// Holds for centred orthographic projections, fails for perspectives.
    pub fn is_orthogonal(&self) -> bool {
        let p = &self.projection;
        let orthogonal = |a: Vec4, b: Vec4| {
            a.dot(&b).abs() <= (a.norm() * b.norm()).max(1.0) * ORTHOGONAL_EPSILON
        };
        for i in 0..3 {
            for j in (i + 1)..4 {
                if !orthogonal(p.column(i).into_owned(), p.column(j).into_owned()) {
                    return false;
                }
                if !orthogonal(p.row(i).transpose(), p.row(j).transpose()) {
                    return false;
                }
            }
        }
        true
    }

    /// Eye position that shows the viewport one unit per pixel at z = 0
    ///
    /// Perspective cameras back away along -z, anything else sits at the origin.
    pub fn home_origin(&self) -> Vec3 {
        match self.split_perspective() {
            Some(perspective) => {
                let half_height = self.viewport.height as f32 / 2.0;
                let distance = half_height / (utils::deg_to_rad(perspective.fovy) / 2.0).tan();
                Vec3::new(0.0, 0.0, -distance)
            }
            None => Vec3::zeros(),
        }
    }

    /// Eye space to normalized device coordinates
    pub fn project(&self, v: &Vec3) -> Vec3 {
        self.projection.project_point(v)
    }

    /// Normalized device coordinates to eye space
    ///
    /// Returns the input unchanged when the projection is singular.
    pub fn unproject(&self, v: &Vec3) -> Vec3 {
        match self.projection.try_inverse() {
            Some(inverse) => inverse.project_point(v),
            None => {
                log::warn!("Cannot unproject through a singular projection");
                *v
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_perspective_splits() {
        let camera = Camera::perspective(0, 0, 400, 300);
        let p = camera.split_perspective().unwrap();
        assert_relative_eq!(p.fovy, 90.0, epsilon = 1e-3);
        assert_relative_eq!(p.aspect, 400.0 / 300.0, epsilon = 1e-4);
        assert_relative_eq!(p.near, 8.0, epsilon = 1e-3);
        assert_relative_eq!(p.far, 1000.0, max_relative = 1e-3);
        assert!(!camera.is_orthogonal());
        assert!(camera.split_ortho().is_none());
    }

    #[test]
    fn test_frustum_roundtrip() {
        let mut camera = Camera::new();
        let frustum = Frustum { left: -2.0, right: 3.0, bottom: -1.0, top: 1.5, near: 2.0, far: 50.0 };
        camera.make_frustum(&frustum);
        let split = camera.split_frustum().unwrap();
        assert_relative_eq!(split.left, frustum.left, epsilon = 1e-4);
        assert_relative_eq!(split.right, frustum.right, epsilon = 1e-4);
        assert_relative_eq!(split.bottom, frustum.bottom, epsilon = 1e-4);
        assert_relative_eq!(split.top, frustum.top, epsilon = 1e-4);
        assert_relative_eq!(split.near, frustum.near, epsilon = 1e-4);
        assert_relative_eq!(split.far, frustum.far, max_relative = 1e-3);
    }

    #[test]
    fn test_ortho_viewport() {
        let camera = Camera::orthographic(0, 0, 200, 100);
        assert!(camera.is_orthogonal());
        assert!(camera.split_frustum().is_none());
        let box_ = camera.split_ortho().unwrap();
        assert_relative_eq!(box_.left, -100.0, epsilon = 1e-3);
        assert_relative_eq!(box_.right, 100.0, epsilon = 1e-3);
        assert_relative_eq!(box_.top, 50.0, epsilon = 1e-3);
        assert_relative_eq!(box_.near, -1000.0, epsilon = 1e-2);
        assert_relative_eq!(box_.far, 1000.0, epsilon = 1e-2);
        assert_eq!(camera.home_origin(), Vec3::zeros());
    }

    #[test]
    fn test_set_viewport_keeps_family() {
        let mut ortho = Camera::orthographic(0, 0, 200, 100);
        ortho.set_viewport(0, 0, 800, 600);
        assert!(ortho.is_orthogonal());
        assert_eq!(ortho.viewport().width, 800);

        let mut perspective = Camera::perspective(0, 0, 200, 100);
        perspective.resize(800, 600);
        assert!(perspective.split_perspective().is_some());
        assert_eq!(perspective.viewport().height, 600);
    }

    #[test]
    fn test_tiny_viewport_ignored() {
        let mut camera = Camera::perspective(0, 0, 400, 300);
        camera.set_viewport(5, 5, 2, 1);
        assert_eq!(*camera.viewport(), Viewport::new(0, 0, 400, 300));
    }

    #[test]
    fn test_home_origin_fills_height() {
        let camera = Camera::perspective(0, 0, 400, 300);
        // fovy 90 degrees: distance equals half the height
        assert_relative_eq!(camera.home_origin(), Vec3::new(0.0, 0.0, -150.0), epsilon = 1e-2);
    }

    #[test]
    fn test_project_unproject() {
        let camera = Camera::perspective(0, 0, 400, 300);
        let eye = Vec3::new(3.0, -2.0, -20.0);
        let ndc = camera.project(&eye);
        assert_relative_eq!(camera.unproject(&ndc), eye, epsilon = 1e-2);
    }
}
