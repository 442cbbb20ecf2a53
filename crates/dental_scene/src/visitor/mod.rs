//! Scene traversal
//!
//! A [`Visitor`] walks the [`SceneGraph`] depth first, threading three stacks
//! down the tree: accumulated model-view matrices, projections and viewports.
//! Plain nodes push their matrix, cameras and the scene additionally push
//! their projection and viewport. Geometries are handed to
//! [`Visitor::apply_geometry`], a no-op unless a visitor overrides it.

pub mod bounding_visitor;
pub mod matrix_cascade;
pub mod render_visitor;

pub use bounding_visitor::ComputeBoundingSphereVisitor;
pub use matrix_cascade::MatrixCascade;
pub use render_visitor::RenderVisitor;

use crate::foundation::collections::NodeId;
use crate::foundation::math::Mat4;
use crate::render::Viewport;
use crate::scene::{Camera, Geometry, SceneGraph, Transformable};

/// Stacks every visitor carries
#[derive(Debug, Clone, Default)]
pub struct VisitorState {
    /// Accumulated model-view matrices
    pub mvs: MatrixCascade,
    /// Projections of the enclosing cameras
    pub projections: Vec<Mat4>,
    /// Viewports of the enclosing cameras
    pub viewports: Vec<Viewport>,
}

impl VisitorState {
    /// Empty stacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection of the innermost camera
    pub fn projection(&self) -> Option<&Mat4> {
        self.projections.last()
    }

    /// Viewport of the innermost camera
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewports.last()
    }
}

/// Depth-first walker over a scene graph
///
/// Implementors provide access to their [`VisitorState`] and override the
/// hooks they care about. Entry point is [`SceneGraph::accept`].
pub trait Visitor {
    /// Stacks
    fn state(&self) -> &VisitorState;

    /// Stacks, for editing
    fn state_mut(&mut self) -> &mut VisitorState;

    /// Enter a local frame
    fn push_mv(&mut self, mv: &Mat4) {
        self.state_mut().mvs.push(mv);
    }

    /// Leave a local frame
    fn pop_mv(&mut self) {
        self.state_mut().mvs.pop();
    }

    /// Enter a camera's projection
    fn push_projection(&mut self, projection: &Mat4) {
        self.state_mut().projections.push(*projection);
    }

    /// Leave a camera's projection
    fn pop_projection(&mut self) {
        self.state_mut().projections.pop();
    }

    /// Enter a camera's viewport
    fn push_viewport(&mut self, viewport: &Viewport) {
        self.state_mut().viewports.push(*viewport);
    }

    /// Leave a camera's viewport
    fn pop_viewport(&mut self) {
        self.state_mut().viewports.pop();
    }

    /// Visit a plain node: push its matrix, traverse, pop
    fn apply_node(&mut self, graph: &mut SceneGraph, id: NodeId) {
        let Some(mv) = graph.node(id).map(|node| *node.mv()) else {
            return;
        };
        self.push_mv(&mv);
        self.traverse(graph, id);
        self.pop_mv();
    }

    /// Visit a camera: push projection and viewport around the node visit
    fn apply_camera(&mut self, graph: &mut SceneGraph, id: NodeId, camera: &Camera) {
        self.push_projection(camera.projection());
        self.push_viewport(camera.viewport());
        self.apply_node(graph, id);
        self.pop_viewport();
        self.pop_projection();
    }

    /// Visit the scene root, same as a camera
    fn apply_scene(&mut self, graph: &mut SceneGraph, id: NodeId, camera: &Camera) {
        self.apply_camera(graph, id, camera);
    }

    /// Visit a geometry
    fn apply_geometry(&mut self, _geometry: &mut Geometry) {}

    /// Visit the geometries of a node in order, then its children
    fn traverse(&mut self, graph: &mut SceneGraph, id: NodeId) {
        let Some(node) = graph.node(id) else {
            return;
        };
        let geometries = node.geometries().to_vec();
        let children = node.children().to_vec();

        for geometry in geometries {
            if let Some(geometry) = graph.geometry_for_visit(geometry) {
                self.apply_geometry(geometry);
            }
        }
        for child in children {
            graph.accept(child, self);
        }
    }
}
