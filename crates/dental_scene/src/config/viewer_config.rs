//! # Viewer Configuration
//!
//! Settings for a [`crate::viewer::Viewer`] and the subsystems it owns. Every
//! section has working defaults, so a config file only needs to list the
//! values it changes.
//!
//! ```toml
//! home_duration_s = 0.5
//!
//! [manipulator]
//! rotate_speed = 2.0
//! renormalize = { EveryN = 64 }
//!
//! [camera]
//! fovy_degrees = 45.0
//! ```

use serde::{Deserialize, Serialize};

use super::Config;

/// When the manipulator renormalizes its orientation quaternion
///
/// Composing many small rotations accumulates floating point drift in the
/// quaternion norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenormalizePolicy {
    /// Never renormalize; rotations compose exactly as given
    #[default]
    Never,
    /// Renormalize after every composed rotation
    EveryUpdate,
    /// Renormalize after every `n` composed rotations
    EveryN(u32),
}

/// # Manipulator Configuration
///
/// Initial tunables of the trackball camera controller. Distance related
/// values are overwritten whenever a new orbit distance is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulatorConfig {
    /// Radius of the virtual trackball in projected units
    pub trackball_size: f32,
    /// Multiplier applied to trackball angles
    pub rotate_speed: f32,
    /// Zoom step applied per wheel notch
    pub wheel_zoom_factor: f32,
    /// Closest allowed orbit distance
    pub minimum_distance: f32,
    /// Farthest allowed orbit distance
    pub maximum_distance: f32,
    /// Pan moves the orbit center instead of the view offset
    pub rotate_center: bool,
    /// Quaternion drift correction
    pub renormalize: RenormalizePolicy,
}

impl Default for ManipulatorConfig {
    fn default() -> Self {
        Self {
            trackball_size: 0.8,
            rotate_speed: 3.0,
            wheel_zoom_factor: 0.1,
            minimum_distance: 0.001,
            maximum_distance: 100.0,
            rotate_center: false,
            renormalize: RenormalizePolicy::Never,
        }
    }
}

impl ManipulatorConfig {
    /// Set the rotate speed
    pub fn with_rotate_speed(mut self, speed: f32) -> Self {
        self.rotate_speed = speed;
        self
    }

    /// Set the trackball radius
    pub fn with_trackball_size(mut self, size: f32) -> Self {
        self.trackball_size = size;
        self
    }

    /// Set the renormalization policy
    pub fn with_renormalize(mut self, policy: RenormalizePolicy) -> Self {
        self.renormalize = policy;
        self
    }

    /// Pan the orbit center rather than the offset
    pub fn with_rotate_center(mut self, enabled: bool) -> Self {
        self.rotate_center = enabled;
        self
    }
}

/// # Camera Configuration
///
/// Projection parameters used when the scene camera is refit to a viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fovy_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Use an orthographic projection
    pub orthographic: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy_degrees: 90.0,
            near: 8.0,
            far: 1000.0,
            orthographic: false,
        }
    }
}

impl CameraConfig {
    /// Set the field of view
    pub fn with_fovy(mut self, degrees: f32) -> Self {
        self.fovy_degrees = degrees;
        self
    }

    /// Set the clip planes
    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Switch to an orthographic projection
    pub fn with_orthographic(mut self, orthographic: bool) -> Self {
        self.orthographic = orthographic;
        self
    }
}

/// Initial window viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Left edge in pixels
    pub x: i32,
    /// Bottom edge in pixels
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 400,
            height: 300,
        }
    }
}

/// # Viewer Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Manipulator tunables
    pub manipulator: ManipulatorConfig,
    /// Scene camera projection
    pub camera: CameraConfig,
    /// Scene viewport
    pub viewport: ViewportConfig,
    /// Duration of the flight back home on a view reset, 0 jumps immediately
    pub home_duration_s: f32,
    /// Background colour (RGBA)
    pub clear_color: [f32; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            manipulator: ManipulatorConfig::default(),
            camera: CameraConfig::default(),
            viewport: ViewportConfig::default(),
            home_duration_s: 0.0,
            clear_color: [0.45, 0.55, 0.60, 1.0],
        }
    }
}

impl Config for ViewerConfig {}

impl ViewerConfig {
    /// Replace the manipulator section
    pub fn with_manipulator(mut self, manipulator: ManipulatorConfig) -> Self {
        self.manipulator = manipulator;
        self
    }

    /// Replace the camera section
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    /// Set the viewport rectangle
    pub fn with_viewport(mut self, x: i32, y: i32, width: i32, height: i32) -> Self {
        self.viewport = ViewportConfig { x, y, width, height };
        self
    }

    /// Set the home flight duration
    pub fn with_home_duration(mut self, seconds: f32) -> Self {
        self.home_duration_s = seconds;
        self
    }
}
