//! Configuration, graph snapshots and the evaluation tick loop for the rail
//! signals network.
//!
//! The network crate evaluates one tick; this crate decides which graph and
//! which trains a tick sees and where its result goes.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `signals-config.yaml` into
//!   strongly-typed structs.
//! - [`snapshot`] -- [`NetworkHandle`] and [`LampBoard`], the copy-on-write
//!   holders of the current graph and the published lamps.
//! - [`tick`] -- [`SignalTicker`], one evaluate-and-publish cycle.
//! - [`runner`] -- The async tick loop.
//!
//! [`NetworkHandle`]: snapshot::NetworkHandle
//! [`LampBoard`]: snapshot::LampBoard
//! [`SignalTicker`]: tick::SignalTicker

pub mod config;
pub mod runner;
pub mod snapshot;
pub mod tick;
