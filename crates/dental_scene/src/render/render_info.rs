//! Per-draw transform state

use crate::foundation::math::Mat4;

use super::viewport::Viewport;

/// Matrices and viewport in effect for the geometry being drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderInfo {
    /// Model-view
    pub mv: Mat4,
    /// Projection
    pub projection: Mat4,
    /// Target rectangle
    pub viewport: Viewport,
}

impl Default for RenderInfo {
    fn default() -> Self {
        Self {
            mv: Mat4::identity(),
            projection: Mat4::identity(),
            viewport: Viewport::default(),
        }
    }
}

impl RenderInfo {
    /// Set model-view and projection together
    pub fn set_matrices(&mut self, mv: Mat4, projection: Mat4) {
        self.mv = mv;
        self.projection = projection;
    }

    /// Projection times model-view
    pub fn mvp(&self) -> Mat4 {
        self.projection * self.mv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_mvp_order() {
        let mut info = RenderInfo::default();
        info.set_matrices(
            Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)),
            Mat4::new_scaling(2.0),
        );
        let p = info.mvp().transform_point(&nalgebra::Point3::origin());
        assert_eq!(p, nalgebra::Point3::new(2.0, 0.0, 0.0));
    }
}
