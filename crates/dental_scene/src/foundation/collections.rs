//! Arena keys
//!
//! Scene objects live in slot maps and refer to each other through these
//! generational keys instead of pointers.

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Key of a node (plain node, camera or scene) in a [`crate::scene::SceneGraph`]
    pub struct NodeId;

    /// Key of a geometry in a [`crate::scene::SceneGraph`]
    pub struct GeometryId;

    /// Key of a shader program in a [`crate::render::ProgramCache`]
    pub struct ProgramKey;
}
