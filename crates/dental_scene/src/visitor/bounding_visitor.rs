//! Visitor that gathers the bounds of a subtree

use crate::bounding::BoundingSphere;
use crate::foundation::math::Mat4;
use crate::scene::Geometry;

use super::{Visitor, VisitorState};

/// Merges the bounding spheres of every geometry below the start node
///
/// The start node's own matrix is not applied, so the result is in the local
/// space of the node traversal starts from. Nodes further down move their
/// geometries' spheres by their accumulated matrices. Nothing is drawn.
#[derive(Debug, Default)]
pub struct ComputeBoundingSphereVisitor {
    state: VisitorState,
    sphere: BoundingSphere,
}

impl ComputeBoundingSphereVisitor {
    /// Visitor with an empty result
    pub fn new() -> Self {
        Self {
            state: VisitorState::new(),
            sphere: BoundingSphere::invalid(),
        }
    }

    /// Union gathered so far; invalid when no geometry had a valid bound
    pub const fn bounding_sphere(&self) -> &BoundingSphere {
        &self.sphere
    }
}

impl Visitor for ComputeBoundingSphereVisitor {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn push_mv(&mut self, mv: &Mat4) {
        if self.state.mvs.is_empty() {
            self.state.mvs.push(&Mat4::identity());
        } else {
            self.state.mvs.push(mv);
        }
    }

    fn apply_geometry(&mut self, geometry: &mut Geometry) {
        let bound = geometry.bounding_sphere();
        if bound.valid() {
            let moved = bound.transformed(&self.state.mvs.top_or_identity());
            self.sphere.expand_by_sphere(&moved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::{Node, SceneGraph, Transformable};
    use approx::assert_relative_eq;

    fn cube(name: &str, min: Vec3, max: Vec3) -> Geometry {
        let mut geometry = Geometry::with_name(name);
        geometry.set_vertices(vec![min, max]);
        geometry
    }

    #[test]
    fn test_gathers_in_start_space() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        // camera matrix on the root must not leak into the result
        graph.node_mut(root).unwrap().translate(&Vec3::new(0.0, 0.0, -500.0));
        graph.add_geometry_to(root, cube("a", Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)));

        let child = graph.add_node_to(root, Node::new("child")).unwrap();
        graph.node_mut(child).unwrap().translate(&Vec3::new(10.0, 0.0, 0.0));
        graph.add_geometry_to(child, cube("b", Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)));

        let mut visitor = ComputeBoundingSphereVisitor::new();
        graph.accept_root(&mut visitor);
        let sphere = *visitor.bounding_sphere();

        assert!(sphere.contains(&Vec3::new(11.0, 1.0, 1.0)));
        assert!(sphere.contains(&Vec3::new(-1.0, -1.0, -1.0)));
        assert_relative_eq!(sphere.center().z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(sphere.center().x, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_empty_scene_is_invalid() {
        let mut graph = SceneGraph::new();
        let mut visitor = ComputeBoundingSphereVisitor::new();
        graph.accept_root(&mut visitor);
        assert!(!visitor.bounding_sphere().valid());
    }
}
