//! # Viewer
//!
//! Ties a scene graph to a device, a trackball manipulator and an event
//! queue. Windowing code pushes events from any thread and calls
//! [`Viewer::frame`] on the thread owning the graphics context.

use std::path::Path;
use std::sync::Arc;

use crate::config::{CameraConfig, ViewerConfig, ViewportConfig};
use crate::events::{Event, EventQueue};
use crate::foundation::collections::GeometryId;
use crate::foundation::math::Quat;
use crate::foundation::time::Clock;
use crate::gpu::{GraphicsDevice, RenderState};
use crate::io::{self, Status};
use crate::manipulator::{Manipulator, Viewpoint};
use crate::render::{ProgramCache, RenderContext};
use crate::scene::{Camera, Geometry, SceneGraph};
use crate::visitor::{ComputeBoundingSphereVisitor, RenderVisitor};

/// Scene, camera control and device for one window
pub struct Viewer<D: GraphicsDevice> {
    graph: SceneGraph,
    manipulator: Manipulator,
    events: Arc<EventQueue>,
    programs: ProgramCache,
    device: D,
    clock: Box<dyn Clock>,
    config: ViewerConfig,
    frames: u64,
}

impl<D: GraphicsDevice> Viewer<D> {
    /// Empty scene fitted to the configured viewport
    pub fn new(device: D, clock: Box<dyn Clock>, config: ViewerConfig) -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        if let Some(camera) = graph.node_mut(root).and_then(|node| node.camera_state_mut()) {
            fit_camera(camera, &config.camera, &config.viewport);
        }
        let manipulator = Manipulator::new(root, &config.manipulator);

        Self {
            graph,
            manipulator,
            events: Arc::new(EventQueue::new()),
            programs: ProgramCache::new(),
            device,
            clock,
            config,
            frames: 0,
        }
    }

    /// Scene graph
    pub const fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Scene graph, for editing
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Camera controller
    pub const fn manipulator(&self) -> &Manipulator {
        &self.manipulator
    }

    /// Camera controller, for editing
    pub fn manipulator_mut(&mut self) -> &mut Manipulator {
        &mut self.manipulator
    }

    /// Queue input threads push into
    pub fn events(&self) -> Arc<EventQueue> {
        Arc::clone(&self.events)
    }

    /// Graphics device
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Graphics device, for editing
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Program cache shared by every technique drawn here
    pub const fn programs(&self) -> &ProgramCache {
        &self.programs
    }

    /// Settings the viewer was built with
    pub const fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Frames drawn so far
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Projection state of the scene root
    pub fn scene_camera(&self) -> Option<&Camera> {
        self.graph.node(self.graph.root())?.camera_state()
    }

    /// Show a geometry under the scene root
    pub fn add_geometry(&mut self, geometry: Geometry) -> Option<GeometryId> {
        let root = self.graph.root();
        let id = self.graph.add_geometry_to(root, geometry)?;
        self.graph.dirty_bounding(root);
        self.events.redraw();
        Some(id)
    }

    /// Read a mesh file and show it under the scene root
    pub fn load_mesh(&mut self, path: impl AsRef<Path>) -> (Option<GeometryId>, Status, String) {
        match io::read(path) {
            (Some(geometry), status, message) => (self.add_geometry(geometry), status, message),
            (None, status, message) => (None, status, message),
        }
    }

    /// Refit the scene camera to a new window size
    pub fn resize(&mut self, width: i32, height: i32) {
        self.config.viewport.width = width;
        self.config.viewport.height = height;
        let root = self.graph.root();
        if let Some(camera) = self.graph.node_mut(root).and_then(|node| node.camera_state_mut()) {
            fit_camera(camera, &self.config.camera, &self.config.viewport);
        }
        self.events.redraw();
    }

    /// Frame the whole scene, flying there over `duration_s` seconds
    ///
    /// Returns false when the scene has nothing with a valid bound.
    pub fn home(&mut self, duration_s: f64) -> bool {
        match self.home_viewpoint() {
            Some(viewpoint) => self.go_to(&viewpoint, duration_s),
            None => false,
        }
    }

    /// Frame the whole scene from a fixed orientation
    ///
    /// `scale` multiplies the fitted range, so sub-views can sit closer or
    /// further than the default framing.
    pub fn home_oriented(&mut self, duration_s: f64, rotation: Quat, scale: f32) -> bool {
        match self.home_viewpoint() {
            Some(mut viewpoint) => {
                viewpoint.rotation = rotation;
                viewpoint.range *= scale;
                self.go_to(&viewpoint, duration_s)
            }
            None => false,
        }
    }

    /// Home with the configured flight duration
    pub fn reset_view(&mut self) -> bool {
        self.home(f64::from(self.config.home_duration_s))
    }

    fn home_viewpoint(&mut self) -> Option<Viewpoint> {
        let mut visitor = ComputeBoundingSphereVisitor::new();
        self.graph.accept_root(&mut visitor);
        let sphere = *visitor.bounding_sphere();
        let camera = self.scene_camera()?;
        let viewpoint = self.manipulator.create_viewpoint(&sphere, camera);
        viewpoint.valid().then(|| viewpoint.with_name("Home"))
    }

    fn go_to(&mut self, viewpoint: &Viewpoint, duration_s: f64) -> bool {
        log::info!(
            "Home: focal point {:?}, range {:.3}, {:.2}s",
            viewpoint.focal_point.as_slice(),
            viewpoint.range,
            duration_s
        );
        let now = self.clock.now_s();
        self.manipulator.set_viewpoint(viewpoint, duration_s, now);
        self.events.redraw();
        true
    }

    /// Run one frame
    ///
    /// Homes a manipulator that was never placed, advances any flight,
    /// handles at most one queued event and draws. Returns true while
    /// another frame is wanted: a flight is running or events are waiting.
    pub fn frame(&mut self) -> bool {
        let now = self.clock.now_s();
        if !self.manipulator.valid() {
            self.home(0.0);
        }
        let mut animating = self.manipulator.apply(&mut self.graph, now);

        if let Some(mut event) = self.events.try_pop() {
            if self.dispatch(&mut event) {
                animating |= self.manipulator.apply(&mut self.graph, now);
            }
        }

        self.render();
        animating || !self.events.is_empty()
    }

    /// Hand a pointer event to the manipulator, filling in its projected points
    fn dispatch(&mut self, event: &mut Event) -> bool {
        if !event.is_pointer() {
            return false;
        }
        let Some(camera) = self.scene_camera().copied() else {
            return false;
        };
        let viewport = camera.viewport();
        event.first_project_point = viewport.window_to_project(event.first_point);
        event.second_project_point = viewport.window_to_project(event.second_point);
        self.manipulator.handle_event(event, &camera)
    }

    /// Draw the scene once
    pub fn render(&mut self) {
        if let Some(viewport) = self.scene_camera().map(|camera| *camera.viewport()) {
            viewport.apply(&mut self.device);
        }
        self.device.clear(self.config.clear_color);
        self.device
            .set_render_state(RenderState::CULL_FACE | RenderState::DEPTH_TEST | RenderState::BLEND);

        {
            let ctx = RenderContext::new(&mut self.device, &mut self.programs);
            let mut visitor = RenderVisitor::new(ctx);
            self.graph.accept_root(&mut visitor);
        }

        self.graph.release_orphans(&mut self.device);
        self.frames += 1;
    }

    /// Free every GPU object the scene and programs hold
    pub fn release(&mut self) {
        self.graph.release_all(&mut self.device);
        self.programs.release_all(&mut self.device);
        log::debug!("Viewer released GPU objects after {} frames", self.frames);
    }
}

fn fit_camera(camera: &mut Camera, projection: &CameraConfig, viewport: &ViewportConfig) {
    let ViewportConfig { x, y, width, height } = *viewport;
    if projection.orthographic {
        camera.ortho_viewport(x, y, width, height);
    } else {
        camera.perspective_viewport_with(
            x,
            y,
            width,
            height,
            projection.fovy_degrees,
            projection.near,
            projection.far,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Buttons, EventType};
    use crate::foundation::math::{Vec2, Vec3};
    use crate::foundation::time::ManualClock;
    use crate::gpu::{DeviceCall, PrimitiveMode, RecordingDevice};
    use crate::render::DrawElements;
    use crate::scene::Transformable;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn cube(center: Vec3) -> Geometry {
        let mut geometry = Geometry::with_name("cube");
        let corners = (0..8)
            .map(|i| {
                center
                    + Vec3::new(
                        if i & 1 == 0 { -1.0 } else { 1.0 },
                        if i & 2 == 0 { -1.0 } else { 1.0 },
                        if i & 4 == 0 { -1.0 } else { 1.0 },
                    )
            })
            .collect();
        geometry.set_vertices(corners);
        geometry.add_primitive_set(DrawElements::from_indices(
            PrimitiveMode::Triangles,
            vec![0_u32, 1, 3, 0, 3, 2, 4, 6, 7, 4, 7, 5],
        ));
        geometry
    }

    fn viewer(config: ViewerConfig) -> (Viewer<RecordingDevice>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(0.0));
        let viewer = Viewer::new(RecordingDevice::new(), Box::new(Rc::clone(&clock)), config);
        (viewer, clock)
    }

    #[test]
    fn test_viewport_from_config() {
        let (viewer, _) = viewer(ViewerConfig::default().with_viewport(0, 0, 800, 600));
        let camera = viewer.scene_camera().unwrap();
        assert_eq!(camera.viewport().width, 800);
        assert!(!camera.is_orthogonal());
    }

    #[test]
    fn test_first_frame_homes_and_draws() {
        let (mut viewer, _) = viewer(ViewerConfig::default());
        viewer.add_geometry(cube(Vec3::new(5.0, 0.0, 0.0))).unwrap();

        viewer.frame();
        assert!(viewer.manipulator().valid());
        assert_relative_eq!(*viewer.manipulator().center(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-5);

        let device = viewer.device();
        assert!(device.draw_calls() > 0);
        assert!(device.calls().contains(&DeviceCall::Clear(viewer.config().clear_color)));
        assert!(device.calls().contains(&DeviceCall::SetRenderState(
            RenderState::CULL_FACE | RenderState::DEPTH_TEST | RenderState::BLEND
        )));

        // the scene root now carries the manipulator matrix
        let root = viewer.graph().root();
        let mv = *viewer.graph().node(root).unwrap().mv();
        assert_relative_eq!(mv, viewer.manipulator().matrix(), epsilon = 1e-6);
    }

    #[test]
    fn test_empty_scene_stays_unplaced() {
        let (mut viewer, _) = viewer(ViewerConfig::default());
        assert!(!viewer.home(0.0));
        viewer.frame();
        assert!(!viewer.manipulator().valid());
        assert_eq!(viewer.frames(), 1);
    }

    #[test]
    fn test_animated_home_keeps_frames_coming() {
        let (mut viewer, clock) = viewer(ViewerConfig::default().with_home_duration(1.0));
        viewer.add_geometry(cube(Vec3::zeros()));
        viewer.frame();
        viewer.manipulator_mut().pan(3.0, 0.0, 0.0);

        assert!(viewer.reset_view());
        clock.advance(0.5);
        assert!(viewer.frame());
        clock.advance(1.0);
        viewer.frame();
        assert!(!viewer.manipulator().is_flying());
        assert_relative_eq!(*viewer.manipulator().center(), Vec3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_home_oriented_scales_range() {
        let (mut viewer, _) = viewer(ViewerConfig::default());
        viewer.add_geometry(cube(Vec3::zeros()));
        viewer.home(0.0);
        let range = viewer.manipulator().distance();

        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), 0.5);
        assert!(viewer.home_oriented(0.0, rotation, 2.0));
        assert_relative_eq!(viewer.manipulator().distance(), range * 2.0, epsilon = 1e-4);
        assert_relative_eq!(viewer.manipulator().viewpoint().rotation.angle(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_queued_drag_rotates() {
        let (mut viewer, _) = viewer(ViewerConfig::default());
        viewer.add_geometry(cube(Vec3::zeros()));
        viewer.frame();
        let before = *viewer.manipulator().rotation();

        let queue = viewer.events();
        queue.push(Event::pointer(EventType::PointerPress, Buttons::LEFT, Vec2::new(200.0, 150.0)));
        queue.push(Event::pointer(EventType::PointerMove, Buttons::LEFT, Vec2::new(260.0, 150.0)));
        for _ in 0..10 {
            if !viewer.frame() {
                break;
            }
        }

        assert!(queue.is_empty());
        assert!(viewer.manipulator().rotation().angle_to(&before) > 1e-3);
    }

    #[test]
    fn test_resize_refits_camera() {
        let (mut viewer, _) = viewer(ViewerConfig::default());
        viewer.resize(1024, 768);
        viewer.render();
        assert_eq!(viewer.scene_camera().unwrap().viewport().height, 768);
        assert!(viewer.device().calls().contains(&DeviceCall::Viewport {
            x: 0,
            y: 0,
            width: 1024,
            height: 768
        }));
    }

    #[test]
    fn test_release_frees_buffers() {
        let (mut viewer, _) = viewer(ViewerConfig::default());
        viewer.add_geometry(cube(Vec3::zeros()));
        viewer.frame();
        assert!(viewer.device().stats().live_buffers > 0);
        viewer.release();
        assert_eq!(viewer.device().stats().live_buffers, 0);
    }
}
