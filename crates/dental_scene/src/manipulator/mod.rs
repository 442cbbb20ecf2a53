//! # Camera Manipulator
//!
//! Orbit camera driven by a virtual trackball. The camera sits `distance`
//! away from `center`, looking at it through `rotation`, and can be panned
//! off-axis by `offset`:
//!
//! ```text
//! mv = T(0, 0, -distance) * T(-offset) * R(rotation^-1) * T(-center)
//! ```
//!
//! Setting a [`Viewpoint`] with a duration starts a flight that the
//! manipulator advances every time it is applied. Pointer drags cancel it.

pub mod flight;
pub mod trackball;
pub mod viewpoint;

pub use flight::FlightParams;
pub use viewpoint::Viewpoint;

use crate::bounding::BoundingSphere;
use crate::config::{ManipulatorConfig, RenormalizePolicy};
use crate::events::{Buttons, Event, EventType};
use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Quat, Unit, Vec2, Vec3};
use crate::scene::{Camera, SceneGraph, Transformable};

/// Pointer motion below this is not a rotation
const TRACKBALL_EPSILON: f32 = 1e-7;
/// Narrowest half field of view still used to fit a sphere
const VIEW_ANGLE_EPSILON: f32 = 1e-8;
/// Change in finger spacing, in projected units, that counts as a pinch
const PINCH_EPSILON: f32 = 0.01;

/// Trackball camera controller for one camera node
#[derive(Debug, Clone)]
pub struct Manipulator {
    camera: NodeId,

    center: Vec3,
    offset: Vec3,
    distance: f32,
    rotation: Quat,

    wheel_zoom_factor: f32,
    minimum_distance: f32,
    maximum_distance: f32,
    trackball_size: f32,
    rotate_speed: f32,
    rotate_center: bool,

    renormalize: RenormalizePolicy,
    rotations_since_renormalize: u32,

    flight: FlightParams,

    pointer_pressed: bool,
    last_point0: Vec2,
    last_point1: Vec2,
}

impl Manipulator {
    /// Manipulator driving `camera`, with no distance set yet
    pub fn new(camera: NodeId, config: &ManipulatorConfig) -> Self {
        Self {
            camera,
            center: Vec3::zeros(),
            offset: Vec3::zeros(),
            distance: -1.0,
            rotation: Quat::identity(),
            wheel_zoom_factor: config.wheel_zoom_factor,
            minimum_distance: config.minimum_distance,
            maximum_distance: config.maximum_distance,
            trackball_size: config.trackball_size,
            rotate_speed: config.rotate_speed,
            rotate_center: config.rotate_center,
            renormalize: config.renormalize,
            rotations_since_renormalize: 0,
            flight: FlightParams::default(),
            pointer_pressed: false,
            last_point0: Vec2::zeros(),
            last_point1: Vec2::zeros(),
        }
    }

    /// Node whose matrix is driven
    pub const fn camera(&self) -> NodeId {
        self.camera
    }

    /// Drive a different node
    pub fn set_camera(&mut self, camera: NodeId) {
        self.camera = camera;
    }

    /// True once a positive distance is set
    pub fn valid(&self) -> bool {
        self.distance > 0.0
    }

    /// Orbit pivot
    pub const fn center(&self) -> &Vec3 {
        &self.center
    }

    /// Move the orbit pivot
    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    /// Pan offset in camera space
    pub const fn offset(&self) -> &Vec3 {
        &self.offset
    }

    /// Set the pan offset
    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    /// Orbit radius
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Set the orbit radius
    ///
    /// Wheel step and zoom limits scale with it.
    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance;
        self.wheel_zoom_factor = distance * 0.0001;
        self.minimum_distance = distance * 0.01;
        self.maximum_distance = distance * 3.0;
    }

    /// Orientation of the viewed scene
    pub const fn rotation(&self) -> &Quat {
        &self.rotation
    }

    /// Replace the orientation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Multiplier on trackball angles
    pub const fn rotate_speed(&self) -> f32 {
        self.rotate_speed
    }

    /// Set the trackball multiplier; values up to 0.01 are ignored
    pub fn set_rotate_speed(&mut self, speed: f32) {
        if speed > 0.01 {
            self.rotate_speed = speed;
        }
    }

    /// Radius of the virtual trackball
    pub const fn trackball_size(&self) -> f32 {
        self.trackball_size
    }

    /// Set the trackball radius
    pub fn set_trackball_size(&mut self, size: f32) {
        self.trackball_size = size;
    }

    /// Zoom step per wheel notch
    pub const fn wheel_zoom_factor(&self) -> f32 {
        self.wheel_zoom_factor
    }

    /// Closest orbit distance
    pub const fn minimum_distance(&self) -> f32 {
        self.minimum_distance
    }

    /// Farthest orbit distance
    pub const fn maximum_distance(&self) -> f32 {
        self.maximum_distance
    }

    /// True when panning moves the pivot rather than the offset
    pub const fn rotate_center(&self) -> bool {
        self.rotate_center
    }

    /// Choose what panning moves
    pub fn set_rotate_center(&mut self, enabled: bool) {
        self.rotate_center = enabled;
    }

    /// Quaternion drift correction
    pub const fn renormalize_policy(&self) -> RenormalizePolicy {
        self.renormalize
    }

    /// Change the drift correction
    pub fn set_renormalize_policy(&mut self, policy: RenormalizePolicy) {
        self.renormalize = policy;
        self.rotations_since_renormalize = 0;
    }

    /// Model-view matrix of the camera
    pub fn matrix(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::new_translation(&-self.offset)
            * self.rotation.inverse().to_homogeneous()
            * Mat4::new_translation(&-self.center)
    }

    /// Inverse of [`Manipulator::matrix`]
    pub fn inverse_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.center)
            * self.rotation.to_homogeneous()
            * Mat4::new_translation(&self.offset)
            * Mat4::new_translation(&Vec3::new(0.0, 0.0, self.distance))
    }

    fn composed(&mut self) {
        match self.renormalize {
            RenormalizePolicy::Never => {}
            RenormalizePolicy::EveryUpdate => {
                self.rotation.renormalize();
            }
            RenormalizePolicy::EveryN(n) => {
                self.rotations_since_renormalize += 1;
                if self.rotations_since_renormalize >= n.max(1) {
                    self.rotation.renormalize();
                    self.rotations_since_renormalize = 0;
                }
            }
        }
    }

    /// Rotate by `angle` radians about `axis`, in the current frame
    pub fn rotate(&mut self, axis: &Vec3, angle: f32) {
        let Some(axis) = Unit::try_new(*axis, f32::EPSILON) else {
            return;
        };
        self.rotation *= Quat::from_axis_angle(&axis, angle);
        self.composed();
    }

    /// Compose a rotation onto the current orientation
    pub fn rotate_by(&mut self, quat: &Quat) {
        self.rotation *= *quat;
        self.composed();
    }

    /// Trackball drag from `p1` to `p0`, both in normalized device coordinates
    ///
    /// Returns false, changing nothing, when the points coincide.
    pub fn rotate_trackball(&mut self, p0: Vec2, p1: Vec2) -> bool {
        if (p0.x - p1.x).abs() < TRACKBALL_EPSILON && (p0.y - p1.y).abs() < TRACKBALL_EPSILON {
            return false;
        }
        let (axis, angle) = trackball::trackball(self.trackball_size, p1, p0);
        self.rotate(&axis, angle * self.rotate_speed);
        true
    }

    /// Pan by a camera-space delta
    pub fn pan(&mut self, dx: f32, dy: f32, dz: f32) {
        let delta = Vec3::new(dx, dy, dz);
        if self.rotate_center {
            self.center -= delta;
        } else {
            self.offset -= delta;
        }
    }

    /// Scale the distance by `1 + dt`, within the zoom limits
    pub fn zoom(&mut self, dt: f32) {
        let distance = self.distance * (1.0 + dt);
        self.distance = if distance > self.minimum_distance {
            distance.min(self.maximum_distance)
        } else {
            self.minimum_distance
        };
    }

    /// Viewpoint that frames `sphere` through `camera`
    ///
    /// The sphere fills the narrower of the two fields of view. Invalid
    /// spheres give an invalid viewpoint.
    pub fn create_viewpoint(&self, sphere: &BoundingSphere, camera: &Camera) -> Viewpoint {
        if !sphere.valid() {
            return Viewpoint::default();
        }

        let mut distance = sphere.radius();
        if let Some(f) = camera.split_frustum() {
            let vertical = (f.right - f.left).abs() / f.near / 2.0;
            let horizontal = (f.top - f.bottom).abs() / f.near / 2.0;
            let view_angle = vertical.min(horizontal).atan2(1.0);
            if view_angle.abs() > VIEW_ANGLE_EPSILON {
                distance /= view_angle.sin();
            }
        }

        Viewpoint::new(sphere.center(), Quat::identity(), distance)
    }

    /// Current camera placement
    pub fn viewpoint(&self) -> Viewpoint {
        Viewpoint::new(self.center, self.rotation.inverse(), self.distance)
    }

    /// Move to `viewpoint`, flying there over `duration_s` seconds
    ///
    /// Invalid viewpoints are ignored. A duration of zero jumps straight
    /// there and clears the pan offset.
    pub fn set_viewpoint(&mut self, viewpoint: &Viewpoint, duration_s: f64, now_s: f64) {
        if !viewpoint.valid() {
            return;
        }

        if duration_s > flight::MIN_FLIGHT_DURATION_S {
            self.flight = FlightParams {
                start: self.viewpoint(),
                end: viewpoint.clone(),
                start_offset: self.offset,
                duration_s,
                start_time_s: now_s,
            };
            log::debug!("Flight to '{}' started, {:.2}s", viewpoint.name, duration_s);
        } else {
            self.jump_to(viewpoint);
        }
    }

    fn jump_to(&mut self, viewpoint: &Viewpoint) {
        self.center = viewpoint.focal_point;
        self.set_distance(viewpoint.range);
        self.offset = Vec3::zeros();
        self.rotation = viewpoint.rotation.inverse();
    }

    /// Flight state
    pub const fn flight(&self) -> &FlightParams {
        &self.flight
    }

    /// True while a flight is running
    pub fn is_flying(&self) -> bool {
        self.flight.valid()
    }

    /// Stop a running flight where it is
    pub fn cancel_flight(&mut self) {
        self.flight.cancel();
    }

    /// Advance a running flight to `now_s`
    pub fn fly(&mut self, now_s: f64) {
        if !self.flight.valid() {
            return;
        }

        let tp = self.flight.advance(now_s);
        let viewpoint = self.flight.start.slerp(tp, &self.flight.end);
        self.jump_to(&viewpoint);
        self.offset = self.flight.start_offset * (1.0 - tp);

        if !self.flight.valid() {
            log::debug!("Flight to '{}' finished", self.flight.end.name);
        }
    }

    /// Advance any flight and write the camera matrix into the graph
    ///
    /// Does nothing until a distance is set. Returns true while a flight is
    /// still running, so the caller keeps drawing.
    pub fn apply(&mut self, graph: &mut SceneGraph, now_s: f64) -> bool {
        if !self.valid() {
            return false;
        }
        self.fly(now_s);
        if let Some(node) = graph.node_mut(self.camera) {
            node.set_mv(self.matrix());
        }
        self.is_flying()
    }

    /// React to a pointer event whose project points are already filled in
    ///
    /// Returns true when the view changed; the event is marked handled in
    /// that case. Events someone else handled are skipped.
    pub fn handle_event(&mut self, event: &mut Event, camera: &Camera) -> bool {
        if event.handled {
            return false;
        }

        let handled = match event.event_type {
            EventType::PointerPress => {
                self.last_point0 = event.first_project_point;
                self.pointer_pressed = true;
                false
            }
            EventType::PointerMove => {
                self.flight.cancel();
                self.pointer_move(event, camera)
            }
            EventType::PointerRelease => {
                self.last_point0 = event.first_project_point;
                self.pointer_pressed = false;
                false
            }
            EventType::MultiPointerPress | EventType::MultiPointerRelease => {
                self.last_point0 = event.first_project_point;
                self.last_point1 = event.second_project_point;
                self.pointer_pressed = event.event_type == EventType::MultiPointerPress;
                false
            }
            EventType::MultiPointerMove => {
                self.flight.cancel();
                self.multi_pointer_move(event, camera)
            }
            EventType::PointerScrollUp
            | EventType::PointerScrollDown
            | EventType::PointerScrollLeft
            | EventType::PointerScrollRight => {
                self.last_point0 = event.first_project_point;
                self.last_point1 = event.second_project_point;
                let zoom_in = matches!(
                    event.event_type,
                    EventType::PointerScrollUp | EventType::PointerScrollLeft
                );
                self.zoom(if zoom_in { -self.wheel_zoom_factor } else { self.wheel_zoom_factor });
                true
            }
            EventType::Render | EventType::PointerDoubleClick => false,
        };

        event.handled = handled;
        handled
    }

    fn pointer_move(&mut self, event: &Event, camera: &Camera) -> bool {
        if !self.pointer_pressed {
            return false;
        }

        let point = event.first_project_point;
        if event.buttons.contains(Buttons::LEFT) {
            let rotated = self.rotate_trackball(point, self.last_point0);
            self.last_point0 = point;
            return rotated;
        }

        if event.buttons.contains(Buttons::MIDDLE) {
            let delta = point - self.last_point0;
            self.last_point0 = point;
            return self.pan_projected(delta, camera);
        }

        false
    }

    fn multi_pointer_move(&mut self, event: &Event, camera: &Camera) -> bool {
        if !self.pointer_pressed {
            return false;
        }

        let point0 = self.last_point0;
        let point1 = self.last_point1;
        self.last_point0 = event.first_project_point;
        self.last_point1 = event.second_project_point;

        let e0 = self.last_point0 - point0;
        let e1 = self.last_point1 - point1;
        let viewport = camera.viewport();
        let dist0 = viewport.length_project_to_window(e0).norm();
        let dist1 = viewport.length_project_to_window(e1).norm();
        if dist0 <= 1.0 && dist1 <= 1.0 {
            return false;
        }

        let (min_dist, max_dist) = if dist0 < dist1 { (dist0, dist1) } else { (dist1, dist0) };

        // one finger nearly still: rotate around the midpoint
        if min_dist < 2.0 && max_dist > min_dist * 1.5 {
            let mid = (self.last_point0 + self.last_point1) / 2.0;
            return if dist0 > dist1 {
                self.rotate_trackball(self.last_point0 - mid, point0 - mid)
            } else {
                self.rotate_trackball(self.last_point1 - mid, point1 - mid)
            };
        }

        let mut changed = false;
        let spread = (self.last_point0 - self.last_point1).norm() - (point0 - point1).norm();
        if spread.abs() > PINCH_EPSILON {
            self.zoom(if spread > 0.0 { -self.wheel_zoom_factor } else { self.wheel_zoom_factor });
            changed = true;
        }

        self.pan_projected((e0 + e1) / 2.0, camera) || changed
    }

    /// Pan by a delta in normalized device coordinates
    fn pan_projected(&mut self, delta: Vec2, camera: &Camera) -> bool {
        let Some(f) = camera.split_frustum() else {
            return false;
        };

        let fovy = (f.top / f.near).atan() - (f.bottom / f.near).atan();
        let mut e = delta / f.near * self.distance * (fovy / 2.0).tan();
        e.x *= (f.right - f.left) * 2.0;
        e.y *= (f.top - f.bottom) * 2.0;
        self.pan(e.x, e.y, 0.0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn manipulator(distance: f32) -> Manipulator {
        let graph = SceneGraph::new();
        let mut manipulator = Manipulator::new(graph.root(), &ManipulatorConfig::default());
        manipulator.set_distance(distance);
        manipulator
    }

    fn camera() -> Camera {
        Camera::perspective(0, 0, 400, 300)
    }

    fn press(event_type: EventType, buttons: Buttons, p: Vec2) -> Event {
        Event::pointer(event_type, buttons, Vec2::zeros()).with_project_points(p, Vec2::zeros())
    }

    #[test]
    fn test_defaults_from_config() {
        let graph = SceneGraph::new();
        let manipulator = Manipulator::new(graph.root(), &ManipulatorConfig::default());
        assert!(!manipulator.valid());
        assert_eq!(manipulator.trackball_size(), 0.8);
        assert_eq!(manipulator.rotate_speed(), 3.0);
        assert_eq!(manipulator.wheel_zoom_factor(), 0.1);
        assert_eq!(manipulator.maximum_distance(), 100.0);
    }

    #[test]
    fn test_distance_derives_limits() {
        let manipulator = manipulator(100.0);
        assert!(manipulator.valid());
        assert_relative_eq!(manipulator.wheel_zoom_factor(), 0.01);
        assert_relative_eq!(manipulator.minimum_distance(), 1.0);
        assert_relative_eq!(manipulator.maximum_distance(), 300.0);
    }

    #[test]
    fn test_zoom_in_by_half() {
        let mut manipulator = manipulator(100.0);
        manipulator.zoom(-0.5);
        assert_relative_eq!(manipulator.distance(), 50.0);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut manipulator = manipulator(100.0);
        manipulator.zoom(-0.999);
        assert_relative_eq!(manipulator.distance(), 1.0);
        manipulator.set_distance(100.0);
        manipulator.zoom(10.0);
        assert_relative_eq!(manipulator.distance(), 300.0);
    }

    #[test]
    fn test_rotate_speed_floor() {
        let mut manipulator = manipulator(10.0);
        manipulator.set_rotate_speed(0.005);
        assert_eq!(manipulator.rotate_speed(), 3.0);
        manipulator.set_rotate_speed(1.5);
        assert_eq!(manipulator.rotate_speed(), 1.5);
    }

    #[test]
    fn test_trackball_same_point_is_noop() {
        let mut manipulator = manipulator(10.0);
        let before = *manipulator.rotation();
        let p = Vec2::new(0.3, -0.2);
        assert!(!manipulator.rotate_trackball(p, p));
        assert_eq!(*manipulator.rotation(), before);
    }

    #[test]
    fn test_trackball_drag_rotates() {
        let mut manipulator = manipulator(10.0);
        assert!(manipulator.rotate_trackball(Vec2::new(0.1, 0.0), Vec2::zeros()));
        assert!(manipulator.rotation().angle() > 0.0);
    }

    #[test]
    fn test_matrix() {
        let mut manipulator = manipulator(10.0);
        manipulator.set_center(Vec3::new(1.0, 0.0, 0.0));
        let eye_center = manipulator.matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(eye_center, Vec4::new(0.0, 0.0, -10.0, 1.0), epsilon = 1e-5);

        manipulator.rotate(&Vec3::y(), 0.7);
        manipulator.set_offset(Vec3::new(0.5, 0.0, 0.0));
        let product = manipulator.matrix() * manipulator.inverse_matrix();
        assert_relative_eq!(product, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_pan_modes() {
        let mut manipulator = manipulator(10.0);
        manipulator.pan(1.0, 2.0, 0.0);
        assert_eq!(*manipulator.offset(), Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(*manipulator.center(), Vec3::zeros());

        manipulator.set_rotate_center(true);
        manipulator.pan(1.0, 0.0, 0.0);
        assert_eq!(*manipulator.center(), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(*manipulator.offset(), Vec3::new(-1.0, -2.0, 0.0));
    }

    #[test]
    fn test_renormalize_every_update() {
        let mut manipulator = manipulator(10.0);
        manipulator.set_renormalize_policy(RenormalizePolicy::EveryUpdate);
        for _ in 0..1000 {
            manipulator.rotate(&Vec3::new(0.3, 1.0, 0.2), 0.013);
        }
        assert_relative_eq!(manipulator.rotation().quaternion().norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_create_viewpoint_fills_narrow_fov() {
        let manipulator = manipulator(10.0);
        let sphere = BoundingSphere::new(Vec3::new(1.0, 2.0, 3.0), 10.0);
        let vp = manipulator.create_viewpoint(&sphere, &camera());
        assert!(vp.valid());
        assert_eq!(vp.focal_point, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(vp.range, 10.0 * std::f32::consts::SQRT_2, epsilon = 1e-3);
        assert_eq!(vp.rotation, Quat::identity());

        let invalid = manipulator.create_viewpoint(&BoundingSphere::invalid(), &camera());
        assert!(!invalid.valid());
    }

    #[test]
    fn test_set_viewpoint_jumps() {
        let mut manipulator = manipulator(10.0);
        manipulator.set_offset(Vec3::new(1.0, 1.0, 0.0));
        let rotation = Quat::from_axis_angle(&Vec3::x_axis(), 0.5);
        manipulator.set_viewpoint(&Viewpoint::new(Vec3::new(5.0, 0.0, 0.0), rotation, 40.0), 0.0, 0.0);

        assert_eq!(*manipulator.center(), Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(manipulator.distance(), 40.0);
        assert_eq!(*manipulator.offset(), Vec3::zeros());
        assert_relative_eq!(manipulator.viewpoint().rotation.angle_to(&rotation), 0.0, epsilon = 1e-2);
        assert!(!manipulator.is_flying());

        manipulator.set_viewpoint(&Viewpoint::default(), 0.0, 0.0);
        assert_relative_eq!(manipulator.distance(), 40.0);
    }

    #[test]
    fn test_flight_lands_on_target() {
        let mut manipulator = manipulator(10.0);
        manipulator.set_offset(Vec3::new(2.0, 0.0, 0.0));
        let target = Viewpoint::new(Vec3::new(0.0, 5.0, 0.0), Quat::identity(), 30.0).with_name("home");
        manipulator.set_viewpoint(&target, 1.0, 100.0);
        assert!(manipulator.is_flying());

        manipulator.fly(100.5);
        assert!(manipulator.is_flying());
        assert!(manipulator.distance() > 10.0 && manipulator.distance() < 30.0);
        assert!(manipulator.offset().x > 0.0 && manipulator.offset().x < 2.0);

        manipulator.fly(101.0);
        assert!(!manipulator.is_flying());
        assert_relative_eq!(manipulator.distance(), 30.0, epsilon = 1e-4);
        assert_relative_eq!(*manipulator.center(), Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(manipulator.offset().norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_apply_writes_camera_matrix() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut manipulator = Manipulator::new(root, &ManipulatorConfig::default());
        assert!(!manipulator.apply(&mut graph, 0.0));
        assert_eq!(*graph.node(root).unwrap().mv(), Mat4::identity());

        manipulator.set_distance(100.0);
        manipulator.apply(&mut graph, 0.0);
        assert_eq!(*graph.node(root).unwrap().mv(), manipulator.matrix());
    }

    #[test]
    fn test_left_drag_rotates_and_handles() {
        let mut manipulator = manipulator(10.0);
        let camera = camera();

        let mut down = press(EventType::PointerPress, Buttons::LEFT, Vec2::zeros());
        assert!(!manipulator.handle_event(&mut down, &camera));

        let mut drag = press(EventType::PointerMove, Buttons::LEFT, Vec2::new(0.2, 0.1));
        assert!(manipulator.handle_event(&mut drag, &camera));
        assert!(drag.handled);
        assert!(manipulator.rotation().angle() > 0.0);

        // already handled elsewhere
        let before = *manipulator.rotation();
        let mut seen = press(EventType::PointerMove, Buttons::LEFT, Vec2::new(0.5, 0.5));
        seen.handled = true;
        assert!(!manipulator.handle_event(&mut seen, &camera));
        assert_eq!(*manipulator.rotation(), before);

        let mut up = press(EventType::PointerRelease, Buttons::LEFT, Vec2::new(0.2, 0.1));
        manipulator.handle_event(&mut up, &camera);
        let mut hover = press(EventType::PointerMove, Buttons::LEFT, Vec2::new(0.9, 0.9));
        assert!(!manipulator.handle_event(&mut hover, &camera));
    }

    #[test]
    fn test_middle_drag_pans() {
        let mut manipulator = manipulator(10.0);
        let camera = camera();
        manipulator.handle_event(&mut press(EventType::PointerPress, Buttons::MIDDLE, Vec2::zeros()), &camera);
        let mut drag = press(EventType::PointerMove, Buttons::MIDDLE, Vec2::new(0.1, 0.0));
        assert!(manipulator.handle_event(&mut drag, &camera));
        assert!(manipulator.offset().x < 0.0);
        assert_relative_eq!(manipulator.offset().y, 0.0);
    }

    #[test]
    fn test_scroll_zooms() {
        let mut manipulator = manipulator(100.0);
        let camera = camera();
        let mut up = press(EventType::PointerScrollUp, Buttons::empty(), Vec2::zeros());
        assert!(manipulator.handle_event(&mut up, &camera));
        assert_relative_eq!(manipulator.distance(), 99.0, epsilon = 1e-4);

        let mut down = press(EventType::PointerScrollDown, Buttons::empty(), Vec2::zeros());
        manipulator.handle_event(&mut down, &camera);
        assert_relative_eq!(manipulator.distance(), 99.0 * 1.01, epsilon = 1e-3);
    }

    #[test]
    fn test_drag_cancels_flight() {
        let mut manipulator = manipulator(10.0);
        let camera = camera();
        manipulator.set_viewpoint(&Viewpoint::new(Vec3::zeros(), Quat::identity(), 50.0), 2.0, 0.0);
        assert!(manipulator.is_flying());
        let mut drag = press(EventType::PointerMove, Buttons::LEFT, Vec2::new(0.1, 0.1));
        manipulator.handle_event(&mut drag, &camera);
        assert!(!manipulator.is_flying());
    }

    #[test]
    fn test_pinch_zooms() {
        let mut manipulator = manipulator(100.0);
        let camera = camera();
        let mut down = Event::new(EventType::MultiPointerPress)
            .with_project_points(Vec2::new(-0.1, 0.0), Vec2::new(0.1, 0.0));
        manipulator.handle_event(&mut down, &camera);

        let mut spread = Event::new(EventType::MultiPointerMove)
            .with_project_points(Vec2::new(-0.2, 0.0), Vec2::new(0.2, 0.0));
        assert!(manipulator.handle_event(&mut spread, &camera));
        assert_relative_eq!(manipulator.distance(), 99.0, epsilon = 1e-4);
        assert_relative_eq!(manipulator.offset().norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_tiny_multi_move_ignored() {
        let mut manipulator = manipulator(100.0);
        let camera = camera();
        let mut down = Event::new(EventType::MultiPointerPress)
            .with_project_points(Vec2::new(-0.1, 0.0), Vec2::new(0.1, 0.0));
        manipulator.handle_event(&mut down, &camera);
        let mut nudge = Event::new(EventType::MultiPointerMove)
            .with_project_points(Vec2::new(-0.1001, 0.0), Vec2::new(0.1, 0.0));
        assert!(!manipulator.handle_event(&mut nudge, &camera));
        assert_relative_eq!(manipulator.distance(), 100.0);
    }
}
