//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and operations
//! - Arena keys for the scene graph
//! - Time sources
//! - Unique identifiers
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod uuid;
pub mod logging;
