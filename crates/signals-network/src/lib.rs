//! Track graph compilation and signal evaluation for the rail signals network.
//!
//! This crate turns raw track connectivity into a minimal routable graph and
//! computes, once per tick, the lamp status of every signal given the trains
//! currently on the network.
//!
//! # Modules
//!
//! - [`demo`] -- Small passing-loop network used by the engine and tests.
//! - [`edge`] -- [`Edge`] compilation with derived directionality, and
//!   entry/exit sub-edges for route search.
//! - [`error`] -- Error types for network construction.
//! - [`graph`] -- The compiled [`NetworkGraph`] snapshot.
//! - [`index`] -- [`NetworkIndex`], the spatial lookup of network objects.
//! - [`object`] -- The closed set of network object kinds.
//! - [`section`] -- Signal-bounded [`RailSection`]s.
//! - [`state`] -- The per-tick [`NetworkState`] evaluator.
//! - [`train`] -- Trains and their reserved routes.

pub mod demo;
pub mod edge;
pub mod error;
pub mod graph;
pub mod index;
pub mod object;
pub mod section;
pub mod state;
pub mod train;

// Re-export primary types at crate root.
pub use demo::{DemoSignals, create_demo_network, demo_trains};
pub use edge::{Directionality, Edge, EdgeBuilder, ZeroDirectionalPolicy};
pub use error::NetworkError;
pub use graph::NetworkGraph;
pub use index::NetworkIndex;
pub use object::{NetworkObject, RailCell, RailLink, Signal};
pub use section::RailSection;
pub use state::{NetworkState, evaluate};
pub use train::{Route, Train};
