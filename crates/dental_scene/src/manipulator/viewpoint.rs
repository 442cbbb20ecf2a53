//! Snapshot of where the camera looks from

use std::ops::{Add, Sub};

use crate::foundation::math::{utils, Quat, Vec3};

/// Focal point, orbit distance and orientation
///
/// A range of zero or less marks the viewpoint invalid; the default one is.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewpoint {
    /// Label
    pub name: String,
    /// Point the camera orbits
    pub focal_point: Vec3,
    /// Orientation of the viewed object
    pub rotation: Quat,
    /// Distance from the focal point
    pub range: f32,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            name: String::new(),
            focal_point: Vec3::zeros(),
            rotation: Quat::identity(),
            range: -1.0,
        }
    }
}

impl Viewpoint {
    /// Viewpoint from its parts
    pub fn new(focal_point: Vec3, rotation: Quat, range: f32) -> Self {
        Self {
            name: String::new(),
            focal_point,
            rotation,
            range,
        }
    }

    /// Set the label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// True for a positive range
    pub fn valid(&self) -> bool {
        self.range > 0.0
    }

    /// Interpolate towards `to`: linear on focal point and range, spherical on rotation
    pub fn slerp(&self, t: f32, to: &Viewpoint) -> Viewpoint {
        let rotation = self
            .rotation
            .try_slerp(&to.rotation, t, f32::EPSILON)
            .unwrap_or(if t < 0.5 { self.rotation } else { to.rotation });
        Viewpoint {
            name: self.name.clone(),
            focal_point: self.focal_point.lerp(&to.focal_point, t),
            rotation,
            range: utils::lerp(self.range, to.range, t),
        }
    }

    /// Rotation as XYZ Euler angles in degrees
    pub fn euler_degrees(&self) -> Vec3 {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        Vec3::new(
            utils::rad_to_deg(roll),
            utils::rad_to_deg(pitch),
            utils::rad_to_deg(yaw),
        )
    }

    /// Replace the rotation from XYZ Euler angles in degrees
    pub fn set_euler_degrees(&mut self, degrees: Vec3) {
        self.rotation = Quat::from_euler_angles(
            utils::deg_to_rad(degrees.x),
            utils::deg_to_rad(degrees.y),
            utils::deg_to_rad(degrees.z),
        );
    }
}

impl Sub for &Viewpoint {
    type Output = Viewpoint;

    fn sub(self, other: &Viewpoint) -> Viewpoint {
        Viewpoint {
            name: self.name.clone(),
            focal_point: self.focal_point - other.focal_point,
            rotation: self.rotation * other.rotation.inverse(),
            range: self.range - other.range,
        }
    }
}

impl Add for &Viewpoint {
    type Output = Viewpoint;

    fn add(self, other: &Viewpoint) -> Viewpoint {
        Viewpoint {
            name: self.name.clone(),
            focal_point: self.focal_point + other.focal_point,
            rotation: self.rotation * other.rotation,
            range: self.range + other.range,
        }
    }
}
