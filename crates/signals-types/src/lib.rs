//! Shared type definitions for the rail signals network.
//!
//! This crate holds the primitives every other crate in the workspace agrees
//! on: grid positions and headings, lamp statuses, signal kinds, rail shapes
//! and train identifiers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Lamp statuses, signal kinds and rail shapes
//! - [`position`] -- Grid positions with a total order, and headings

pub mod enums;
pub mod ids;
pub mod position;

// Re-export all public types at crate root for convenience.
pub use enums::{LampStatus, RailShape, SignalKind};
pub use ids::TrainId;
pub use position::{Heading, Position};
