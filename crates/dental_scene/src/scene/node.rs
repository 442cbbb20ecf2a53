//! Scene graph nodes

use crate::bounding::BoundingSphere;
use crate::foundation::collections::{GeometryId, NodeId};
use crate::foundation::math::Mat4;
use crate::foundation::uuid::Uuid;

use super::camera::Camera;
use super::Transformable;

/// Role of a node during traversal
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plain transform group
    Node,
    /// Sub-view with its own projection and viewport
    Camera(Camera),
    /// Traversal root
    Scene(Camera),
}

impl NodeKind {
    /// Type name, as shown in panels
    pub const fn class_name(&self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::Camera(_) => "Camera",
            Self::Scene(_) => "Scene",
        }
    }
}

/// Transform group holding geometries and child nodes
///
/// Links to geometries, children and the parent are keys into the owning
/// [`super::SceneGraph`], which keeps both ends consistent.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    uuid: Uuid,
    mv: Mat4,
    kind: NodeKind,
    pub(crate) geometries: Vec<GeometryId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) bounding_sphere: BoundingSphere,
    pub(crate) dirty_bounding: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self::with_kind(NodeKind::Node)
    }
}

impl Transformable for Node {
    fn mv(&self) -> &Mat4 {
        &self.mv
    }

    fn set_mv(&mut self, mv: Mat4) {
        self.mv = mv;
    }
}

impl Node {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            name: String::new(),
            uuid: Uuid::new_v4(),
            mv: Mat4::identity(),
            kind,
            geometries: Vec::new(),
            children: Vec::new(),
            parent: None,
            bounding_sphere: BoundingSphere::invalid(),
            dirty_bounding: true,
        }
    }

    /// Plain node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::with_kind(NodeKind::Node)
        }
    }

    /// Camera node
    pub fn camera(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            ..Self::with_kind(NodeKind::Camera(camera))
        }
    }

    /// Scene root with a 400x300 perspective
    pub fn scene(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::with_kind(NodeKind::Scene(Camera::perspective(0, 0, 400, 300)))
        }
    }

    /// Name used for lookups
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Unique identifier
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Role
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Type name
    pub const fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Projection state of camera and scene nodes
    pub const fn camera_state(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(camera) | NodeKind::Scene(camera) => Some(camera),
            NodeKind::Node => None,
        }
    }

    /// Projection state of camera and scene nodes, for editing
    pub fn camera_state_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.kind {
            NodeKind::Camera(camera) | NodeKind::Scene(camera) => Some(camera),
            NodeKind::Node => None,
        }
    }

    /// Geometries in draw order
    pub fn geometries(&self) -> &[GeometryId] {
        &self.geometries
    }

    /// Child nodes in traversal order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent node
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// True when the cached bounding sphere must be recomputed
    pub const fn is_bounding_dirty(&self) -> bool {
        self.dirty_bounding
    }

    /// Move a camera back so the viewport shows one unit per pixel at z = 0
    ///
    /// Plain nodes are left alone.
    pub fn home(&mut self) {
        if let Some(origin) = self.camera_state().map(Camera::home_origin) {
            self.set_origin(origin);
        }
    }
}
