//! Arena owning every node and geometry of a scene
//!
//! Geometries can be shown by several nodes. Each geometry slot keeps the
//! list of nodes that own it; when the last owner lets go the geometry moves
//! to an orphan queue and [`SceneGraph::release_orphans`] frees its GPU
//! objects the next time a device is at hand.

use crate::bounding::BoundingSphere;
use crate::foundation::collections::{GeometryId, NodeId, SlotMap};
use crate::gpu::GraphicsDevice;
use crate::visitor::Visitor;

use super::geometry::Geometry;
use super::node::{Node, NodeKind};
use super::Transformable;

#[derive(Debug)]
struct GeometrySlot {
    geometry: Geometry,
    owners: Vec<NodeId>,
}

/// Tree of nodes plus the geometries they display
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    geometries: SlotMap<GeometryId, GeometrySlot>,
    orphans: Vec<Geometry>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Graph holding only a scene root
    pub fn new() -> Self {
        Self::with_root(Node::scene("Scene"))
    }

    /// Graph rooted at `root`
    pub fn with_root(root: Node) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Self {
            nodes,
            geometries: SlotMap::with_key(),
            orphans: Vec::new(),
            root,
        }
    }

    /// Root node
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Add a detached node
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    /// Add `node` as the last child of `parent`
    pub fn add_node_to(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        let id = self.nodes.insert(node);
        self.add_child(parent, id);
        Some(id)
    }

    /// Node by key
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Node by key, for editing; invalidates its bounds and its ancestors'
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.dirty_bounding(id);
        self.nodes.get_mut(id)
    }

    /// First node called `name`
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|(_, node)| node.name() == name).map(|(id, _)| id)
    }

    /// Every node, in no particular order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Number of nodes, root included
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Child nodes of `id`
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(Node::children).unwrap_or_default()
    }

    /// Parent of `id`
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(Node::parent)
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Make `child` the last child of `parent`
    ///
    /// Fails when `child` already has a parent, is the root, or is an
    /// ancestor of `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.nodes.contains_key(parent) || child == self.root {
            return false;
        }
        match self.nodes.get(child) {
            Some(node) if node.parent.is_none() => {}
            _ => return false,
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Refusing to add a node below its own descendant");
            return false;
        }

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        self.dirty_bounding(parent);
        true
    }

    /// Detach `child` from `parent`; the subtree stays in the graph
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(pos) = node.children.iter().position(|c| *c == child) else {
            return false;
        };
        node.children.remove(pos);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        self.dirty_bounding(parent);
        true
    }

    /// Remove a node and its whole subtree; the root cannot be removed
    ///
    /// Geometries owned only by removed nodes are queued for release.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.nodes.contains_key(id) {
            return false;
        }
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            self.clear_geometries(current);
            if let Some(node) = self.nodes.remove(current) {
                pending.extend(node.children);
            }
        }
        true
    }

    /// Store a geometry no node shows yet
    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.insert(GeometrySlot {
            geometry,
            owners: Vec::new(),
        })
    }

    /// Store a geometry and show it under `node`
    pub fn add_geometry_to(&mut self, node: NodeId, geometry: Geometry) -> Option<GeometryId> {
        if !self.nodes.contains_key(node) {
            return None;
        }
        let id = self.add_geometry(geometry);
        self.attach_geometry(node, id);
        Some(id)
    }

    /// Geometry by key
    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id).map(|slot| &slot.geometry)
    }

    /// Geometry by key, for editing; invalidates the bounds of every owner
    pub fn geometry_mut(&mut self, id: GeometryId) -> Option<&mut Geometry> {
        let owners = self.geometries.get(id)?.owners.clone();
        for owner in owners {
            self.dirty_bounding(owner);
        }
        self.geometries.get_mut(id).map(|slot| &mut slot.geometry)
    }

    /// Mutable access for traversals, which only touch GPU state and caches
    pub(crate) fn geometry_for_visit(&mut self, id: GeometryId) -> Option<&mut Geometry> {
        self.geometries.get_mut(id).map(|slot| &mut slot.geometry)
    }

    /// Nodes showing a geometry, in attach order
    pub fn owners(&self, id: GeometryId) -> &[NodeId] {
        self.geometries.get(id).map(|slot| slot.owners.as_slice()).unwrap_or_default()
    }

    /// Most recent node to take the geometry
    pub fn geometry_parent(&self, id: GeometryId) -> Option<NodeId> {
        self.owners(id).last().copied()
    }

    /// Every stored geometry
    pub fn geometries(&self) -> impl Iterator<Item = (GeometryId, &Geometry)> {
        self.geometries.iter().map(|(id, slot)| (id, &slot.geometry))
    }

    /// Append a geometry to a node; fails if the node already shows it
    pub fn attach_geometry(&mut self, node: NodeId, geometry: GeometryId) -> bool {
        let len = match self.nodes.get(node) {
            Some(n) => n.geometries.len(),
            None => return false,
        };
        self.insert_geometry_at(node, len, geometry)
    }

    /// Insert a geometry before position `index` of an existing entry
    pub fn insert_geometry(&mut self, node: NodeId, index: usize, geometry: GeometryId) -> bool {
        match self.nodes.get(node) {
            Some(n) if index < n.geometries.len() => self.insert_geometry_at(node, index, geometry),
            _ => false,
        }
    }

    fn insert_geometry_at(&mut self, node: NodeId, index: usize, geometry: GeometryId) -> bool {
        let Some(slot) = self.geometries.get_mut(geometry) else {
            return false;
        };
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        if n.geometries.contains(&geometry) {
            return false;
        }
        n.geometries.insert(index, geometry);
        slot.owners.retain(|owner| *owner != node);
        slot.owners.push(node);
        self.dirty_bounding(node);
        true
    }

    /// Number of geometries a node shows
    pub fn num_geometries(&self, node: NodeId) -> usize {
        self.nodes.get(node).map_or(0, |n| n.geometries.len())
    }

    /// Geometry at `index` of a node
    pub fn geometry_at(&self, node: NodeId, index: usize) -> Option<GeometryId> {
        self.nodes.get(node)?.geometries.get(index).copied()
    }

    /// First geometry of a node called `name`
    pub fn geometry_by_name(&self, node: NodeId, name: &str) -> Option<GeometryId> {
        self.nodes
            .get(node)?
            .geometries
            .iter()
            .copied()
            .find(|id| self.geometry(*id).is_some_and(|g| g.name() == name))
    }

    /// Position of a geometry in a node
    pub fn geometry_index(&self, node: NodeId, geometry: GeometryId) -> Option<usize> {
        self.nodes.get(node)?.geometries.iter().position(|id| *id == geometry)
    }

    /// Detach the geometry at `index` of a node
    pub fn detach_geometry_at(&mut self, node: NodeId, index: usize) -> bool {
        match self.geometry_at(node, index) {
            Some(geometry) => self.detach_geometry(node, geometry),
            None => false,
        }
    }

    /// Detach a geometry from a node
    ///
    /// A geometry left without owners is queued for release.
    pub fn detach_geometry(&mut self, node: NodeId, geometry: GeometryId) -> bool {
        let Some(n) = self.nodes.get_mut(node) else {
            return false;
        };
        let Some(pos) = n.geometries.iter().position(|id| *id == geometry) else {
            return false;
        };
        n.geometries.remove(pos);
        self.dirty_bounding(node);

        let orphaned = match self.geometries.get_mut(geometry) {
            Some(slot) => {
                slot.owners.retain(|owner| *owner != node);
                slot.owners.is_empty()
            }
            None => false,
        };
        if orphaned {
            self.remove_geometry(geometry);
        }
        true
    }

    /// Detach every geometry from a node
    pub fn clear_geometries(&mut self, node: NodeId) {
        let geometries = match self.nodes.get(node) {
            Some(n) => n.geometries.clone(),
            None => return,
        };
        for geometry in geometries {
            self.detach_geometry(node, geometry);
        }
    }

    /// Drop a geometry from every owner and queue it for release
    pub fn remove_geometry(&mut self, geometry: GeometryId) -> bool {
        let Some(slot) = self.geometries.remove(geometry) else {
            return false;
        };
        for owner in &slot.owners {
            if let Some(n) = self.nodes.get_mut(*owner) {
                n.geometries.retain(|id| *id != geometry);
            }
        }
        for owner in &slot.owners {
            self.dirty_bounding(*owner);
        }
        log::debug!("Geometry '{}' queued for release", slot.geometry.name());
        self.orphans.push(slot.geometry);
        true
    }

    /// Geometries waiting for their GPU objects to be freed
    pub fn num_orphans(&self) -> usize {
        self.orphans.len()
    }

    /// Free the GPU objects of every orphaned geometry
    pub fn release_orphans(&mut self, device: &mut dyn GraphicsDevice) {
        for mut geometry in self.orphans.drain(..) {
            geometry.release(device);
        }
    }

    /// Free the GPU objects of every geometry, orphaned or not
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        self.release_orphans(device);
        for (_, slot) in self.geometries.iter_mut() {
            slot.geometry.release(device);
        }
    }

    /// Invalidate the bounds of a node and its ancestors
    pub fn dirty_bounding(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.nodes.get_mut(id) {
                Some(node) => {
                    node.dirty_bounding = true;
                    current = node.parent;
                }
                None => break,
            }
        }
    }

    /// Bounding sphere of a node in its own local space
    ///
    /// Unions the spheres of its geometries and of its children, each child
    /// sphere moved by the child's local matrix. Cached until invalidated.
    pub fn bounding_sphere(&mut self, id: NodeId) -> BoundingSphere {
        let (geometries, children) = match self.nodes.get(id) {
            Some(node) if !node.dirty_bounding && node.bounding_sphere.valid() => {
                return node.bounding_sphere;
            }
            Some(node) => (node.geometries.clone(), node.children.clone()),
            None => return BoundingSphere::invalid(),
        };

        let mut sphere = BoundingSphere::invalid();
        for geometry in geometries {
            if let Some(slot) = self.geometries.get_mut(geometry) {
                sphere.expand_by_sphere(&slot.geometry.bounding_sphere());
            }
        }
        for child in children {
            let child_sphere = self.bounding_sphere(child);
            if let Some(node) = self.nodes.get(child) {
                if child_sphere.valid() {
                    sphere.expand_by_sphere(&child_sphere.transformed(node.mv()));
                }
            }
        }

        if let Some(node) = self.nodes.get_mut(id) {
            node.bounding_sphere = sphere;
            node.dirty_bounding = false;
        }
        sphere
    }

    /// Dispatch a visitor on a node according to its kind
    pub fn accept<V: Visitor + ?Sized>(&mut self, id: NodeId, visitor: &mut V) {
        let Some(kind) = self.nodes.get(id).map(|node| node.kind().clone()) else {
            return;
        };
        match kind {
            NodeKind::Node => visitor.apply_node(self, id),
            NodeKind::Camera(camera) => visitor.apply_camera(self, id, &camera),
            NodeKind::Scene(camera) => visitor.apply_scene(self, id, &camera),
        }
    }

    /// Dispatch a visitor on the root
    pub fn accept_root<V: Visitor + ?Sized>(&mut self, visitor: &mut V) {
        let root = self.root;
        self.accept(root, visitor);
    }
}
