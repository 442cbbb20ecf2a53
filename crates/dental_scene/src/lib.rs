//! # Dental Scene
//!
//! Scene-graph renderer core for a dental CAD viewer.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena of nodes, cameras and shared geometries
//! - **Lazy GPU Objects**: Buffers, programs, textures and framebuffers
//!   created on first bind and re-uploaded only when dirty
//! - **Visitors**: Matrix cascade, bounding sphere gathering and rendering
//! - **Trackball Manipulator**: Orbit, pan, zoom and animated viewpoint flights
//! - **Mesh I/O**: OBJ, PLY and STL, with STL face colours
//!
//! Everything that talks to a GPU goes through [`gpu::GraphicsDevice`];
//! [`gpu::RecordingDevice`] runs the whole pipeline headless.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dental_scene::prelude::*;
//!
//! let mut viewer = Viewer::new(RecordingDevice::new(), Box::new(SystemClock::new()), ViewerConfig::default());
//! let (_, status, message) = viewer.load_mesh("upper_jaw.stl");
//! if status != Status::FileLoaded {
//!     eprintln!("{}", message);
//! }
//! while viewer.frame() {}
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod bounding;
pub mod gpu;
pub mod render;
pub mod scene;
pub mod visitor;
pub mod manipulator;
pub mod events;
pub mod io;

mod viewer;

pub use viewer::Viewer;

/// Common imports for viewer users
pub mod prelude {
    pub use crate::{
        bounding::{BoundingBox, BoundingSphere},
        config::{Config, ViewerConfig},
        events::{Buttons, Event, EventQueue, EventType},
        foundation::{
            collections::{GeometryId, NodeId},
            math::{Mat4, Quat, Vec2, Vec3, Vec4},
            time::{Clock, ManualClock, SystemClock},
        },
        gpu::{GraphicsDevice, PrimitiveMode, RecordingDevice},
        io::{Status, WriteOptions},
        manipulator::{Manipulator, Viewpoint},
        render::{DrawArrays, DrawElements, PrimitiveSet, RenderTechnique},
        scene::{Camera, Geometry, Node, SceneGraph, Transformable},
        visitor::Visitor,
        Viewer,
    };
}
