//! Input events
//!
//! The windowing side pushes [`Event`]s into a shared [`EventQueue`]; the
//! viewer pops one per frame on the render thread.

pub mod event;
pub mod queue;

pub use event::{Buttons, Event, EventType, POINTER_MASK};
pub use queue::EventQueue;
