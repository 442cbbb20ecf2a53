//! Window rectangle and coordinate conversions
//!
//! Three 2D spaces are involved:
//! - window: pixels, origin top-left, y down
//! - project: normalized device coordinates in [-1, 1], y up
//! - viewport: pixels relative to the viewport centre, y up

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec2;
use crate::gpu::GraphicsDevice;

/// Pixel rectangle a camera renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge
    pub x: i32,
    /// Bottom edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0, 600, 400)
    }
}

impl Viewport {
    /// Create a viewport
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Overwrite all four fields
    pub fn set(&mut self, x: i32, y: i32, width: i32, height: i32) {
        *self = Self::new(x, y, width, height);
    }

    /// Width over height, 1 for degenerate sizes
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    fn degenerate(&self) -> bool {
        self.width < 2 || self.height < 2
    }

    /// Window pixel to normalized device coordinates
    ///
    /// Viewports narrower than two pixels only divide by their size.
    pub fn window_to_project(&self, window: Vec2) -> Vec2 {
        let (w, h) = (self.width as f32, self.height as f32);
        if self.degenerate() {
            return Vec2::new(window.x / w, window.y / h);
        }
        Vec2::new(
            (window.x - self.x as f32) / w * 2.0 - 1.0,
            (h - self.y as f32 - window.y) / h * 2.0 - 1.0,
        )
    }

    /// Normalized device coordinates to window pixel
    pub fn project_to_window(&self, project: Vec2) -> Vec2 {
        let (w, h) = (self.width as f32, self.height as f32);
        if self.degenerate() {
            return Vec2::new(project.x * w, project.y * h);
        }
        Vec2::new(
            (project.x + 1.0) / 2.0 * w + self.x as f32,
            h - self.y as f32 - (project.y + 1.0) / 2.0 * h,
        )
    }

    /// Pixel distance to normalized distance
    pub fn length_window_to_project(&self, window: Vec2) -> Vec2 {
        Vec2::new(
            window.x / self.width as f32 * 2.0,
            window.y / self.height as f32 * 2.0,
        )
    }

    /// Normalized distance to pixel distance
    pub fn length_project_to_window(&self, project: Vec2) -> Vec2 {
        Vec2::new(
            project.x * self.width as f32 * 0.5,
            project.y * self.height as f32 * 0.5,
        )
    }

    /// Window pixel to centred, y-up pixel
    pub fn window_to_viewport(&self, window: Vec2) -> Vec2 {
        Vec2::new(
            (window.x - self.x as f32) - self.width as f32 / 2.0,
            self.height as f32 / 2.0 - (window.y - self.y as f32),
        )
    }

    /// Centred, y-up pixel to window pixel
    pub fn viewport_to_window(&self, viewport: Vec2) -> Vec2 {
        Vec2::new(
            viewport.x + self.width as f32 / 2.0 + self.x as f32,
            -viewport.y + self.height as f32 / 2.0 + self.y as f32,
        )
    }

    /// Make this the device viewport
    pub fn apply(&self, device: &mut dyn GraphicsDevice) {
        device.viewport(self.x, self.y, self.width, self.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::RecordingDevice;
    use approx::assert_relative_eq;

    #[test]
    fn test_window_project_corners() {
        let viewport = Viewport::new(0, 0, 400, 300);
        assert_relative_eq!(viewport.window_to_project(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0));
        assert_relative_eq!(viewport.window_to_project(Vec2::new(400.0, 300.0)), Vec2::new(1.0, -1.0));
        assert_relative_eq!(viewport.window_to_project(Vec2::new(200.0, 150.0)), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_window_project_roundtrip() {
        let viewport = Viewport::new(10, 20, 640, 480);
        let window = Vec2::new(123.0, 321.0);
        let back = viewport.project_to_window(viewport.window_to_project(window));
        assert_relative_eq!(back, window, epsilon = 1e-3);

        let centred = viewport.window_to_viewport(window);
        assert_relative_eq!(viewport.viewport_to_window(centred), window, epsilon = 1e-4);
    }

    #[test]
    fn test_lengths() {
        let viewport = Viewport::new(0, 0, 200, 100);
        let project = viewport.length_window_to_project(Vec2::new(50.0, 50.0));
        assert_relative_eq!(project, Vec2::new(0.5, 1.0));
        assert_relative_eq!(viewport.length_project_to_window(project), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_degenerate_viewport() {
        let viewport = Viewport::new(0, 0, 1, 1);
        assert_relative_eq!(viewport.window_to_project(Vec2::new(0.5, 0.25)), Vec2::new(0.5, 0.25));
    }

    #[test]
    fn test_apply() {
        let mut device = RecordingDevice::new();
        Viewport::default().apply(&mut device);
        assert_eq!(device.current_viewport(), Some((0, 0, 600, 400)));
    }
}
