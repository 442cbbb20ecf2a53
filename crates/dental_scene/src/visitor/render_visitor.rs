//! Visitor that draws every geometry it reaches

use crate::foundation::math::Mat4;
use crate::render::{RenderContext, RenderInfo, Viewport};
use crate::scene::{Geometry, Transformable};

use super::{Visitor, VisitorState};

/// Draws geometries with the matrices and viewport in effect where they sit
///
/// Every projection or viewport push and pop updates the [`RenderInfo`];
/// viewport changes are applied to the device straight away so nested
/// sub-views restore the outer rectangle on the way back up.
pub struct RenderVisitor<'a> {
    ctx: RenderContext<'a>,
    info: RenderInfo,
    state: VisitorState,
}

impl<'a> RenderVisitor<'a> {
    /// Draw through `ctx`
    pub fn new(ctx: RenderContext<'a>) -> Self {
        Self {
            ctx,
            info: RenderInfo::default(),
            state: VisitorState::new(),
        }
    }

    /// Matrices and viewport of the last draw
    pub const fn info(&self) -> &RenderInfo {
        &self.info
    }
}

impl Visitor for RenderVisitor<'_> {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn push_projection(&mut self, projection: &Mat4) {
        self.state.projections.push(*projection);
        self.info.projection = *projection;
    }

    fn pop_projection(&mut self) {
        self.state.projections.pop();
        if let Some(projection) = self.state.projections.last() {
            self.info.projection = *projection;
        }
    }

    fn push_viewport(&mut self, viewport: &Viewport) {
        self.state.viewports.push(*viewport);
        self.info.viewport = *viewport;
        viewport.apply(self.ctx.device);
    }

    fn pop_viewport(&mut self) {
        self.state.viewports.pop();
        if let Some(viewport) = self.state.viewports.last() {
            self.info.viewport = *viewport;
            viewport.apply(self.ctx.device);
        }
    }

    fn apply_geometry(&mut self, geometry: &mut Geometry) {
        self.state.mvs.push(geometry.mv());
        self.info.mv = self.state.mvs.top_or_identity();
        geometry.render(&self.info, &mut self.ctx);
        self.state.mvs.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::gpu::{PrimitiveMode, RecordingDevice};
    use crate::render::{DrawArrays, ProgramCache};
    use crate::scene::{Camera, Node, SceneGraph};

    fn triangle() -> Geometry {
        let mut geometry = Geometry::with_name("triangle");
        geometry.set_vertices(vec![Vec3::zeros(), Vec3::x(), Vec3::y()]);
        geometry.add_primitive_set(DrawArrays::new(PrimitiveMode::Triangles, 0, 3));
        geometry
    }

    #[test]
    fn test_renders_every_geometry() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph.add_geometry_to(root, triangle());
        let child = graph.add_node_to(root, Node::new("child")).unwrap();
        graph.add_geometry_to(child, triangle());

        let mut visitor = RenderVisitor::new(RenderContext::new(&mut device, &mut programs));
        graph.accept_root(&mut visitor);
        let info = *visitor.info();
        drop(visitor);

        assert_eq!(device.draw_calls(), 2);
        assert_eq!(info.viewport, Viewport::new(0, 0, 400, 300));
        assert_eq!(device.current_viewport(), Some((0, 0, 400, 300)));
    }

    #[test]
    fn test_nested_viewport_restored() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let sub = graph
            .add_node_to(root, Node::camera("sub", Camera::orthographic(10, 10, 100, 80)))
            .unwrap();
        graph.add_geometry_to(sub, triangle());

        let mut visitor = RenderVisitor::new(RenderContext::new(&mut device, &mut programs));
        graph.accept_root(&mut visitor);
        drop(visitor);

        let viewports = device.viewport_history();
        assert_eq!(viewports, [(0, 0, 400, 300), (10, 10, 100, 80), (0, 0, 400, 300)]);
    }

    #[test]
    fn test_geometry_sees_accumulated_mv() {
        let mut device = RecordingDevice::new();
        let mut programs = ProgramCache::new();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph.node_mut(root).unwrap().translate(&Vec3::new(0.0, 0.0, -10.0));
        let mut geometry = triangle();
        geometry.translate(&Vec3::new(1.0, 0.0, 0.0));
        graph.add_geometry_to(root, geometry);

        let mut visitor = RenderVisitor::new(RenderContext::new(&mut device, &mut programs));
        graph.accept_root(&mut visitor);
        assert_eq!(visitor.info().mv, Mat4::new_translation(&Vec3::new(1.0, 0.0, -10.0)));
    }
}
