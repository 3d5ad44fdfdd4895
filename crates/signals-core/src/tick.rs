//! One evaluation tick: snapshot, evaluate, diff, publish.
//!
//! Each tick takes the current graph snapshot and a train snapshot from a
//! [`TrainSource`], runs [`signals_network::evaluate`] over them, compares
//! the result with the last published state and publishes the new one as a
//! whole. Nothing from the previous tick feeds into the evaluation itself;
//! it is only used to report which lamps changed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use signals_network::{NetworkError, NetworkGraph, NetworkIndex, Train, evaluate};
use signals_types::{LampStatus, Position};
use tracing::{debug, warn};

use crate::snapshot::{LampBoard, NetworkHandle, PublishedState};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Compiling a replacement graph failed.
    #[error("graph rebuild failed: {source}")]
    Rebuild {
        /// The underlying network error.
        #[from]
        source: NetworkError,
    },
}

/// Supplies the trains on the network for one tick.
///
/// Implementations return a snapshot; the evaluation never sees trains
/// move while it runs.
pub trait TrainSource: Send + Sync {
    /// Trains currently on `graph`.
    fn trains(&self, graph: &NetworkGraph) -> Vec<Train>;
}

/// A fixed set of trains, returned unchanged every tick.
#[derive(Debug, Clone, Default)]
pub struct StaticTrainSource {
    trains: Vec<Train>,
}

impl StaticTrainSource {
    /// Always report `trains`.
    pub const fn new(trains: Vec<Train>) -> Self {
        Self { trains }
    }
}

impl TrainSource for StaticTrainSource {
    fn trains(&self, _graph: &NetworkGraph) -> Vec<Train> {
        self.trains.clone()
    }
}

/// A lamp whose status differs from the previous publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampChange {
    /// The signal.
    pub position: Position,
    /// Previously published status.
    pub from: LampStatus,
    /// Newly published status.
    pub to: LampStatus,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Graph generation evaluated.
    pub generation: u64,
    /// Number of signals with a published status.
    pub signals: usize,
    /// Number of trains in the snapshot.
    pub trains: usize,
    /// Lamps that changed since the previous publication.
    pub changes: Vec<LampChange>,
    /// Chain signals forced to green to break a dependency cycle.
    pub forced: Vec<Position>,
}

/// Drives evaluation ticks against a shared graph and lamp board.
#[derive(Debug)]
pub struct SignalTicker {
    network: Arc<NetworkHandle>,
    board: Arc<LampBoard>,
    tick: u64,
}

impl SignalTicker {
    /// A ticker that has not run yet.
    pub const fn new(network: Arc<NetworkHandle>, board: Arc<LampBoard>) -> Self {
        Self {
            network,
            board,
            tick: 0,
        }
    }

    /// Continue tick numbering after `tick`.
    #[must_use]
    pub const fn starting_after(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    /// The last tick executed (0 before the first).
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The graph holder.
    pub const fn network(&self) -> &Arc<NetworkHandle> {
        &self.network
    }

    /// The lamp board this ticker publishes to.
    pub const fn board(&self) -> &Arc<LampBoard> {
        &self.board
    }

    /// Replace the graph; the next tick evaluates against it.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Rebuild`] if the new graph fails to compile.
    pub fn rebuild(&self, index: NetworkIndex) -> Result<u64, TickError> {
        Ok(self.network.rebuild(index)?)
    }

    /// Execute one tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::TickOverflow`] if the tick counter is exhausted.
    pub fn run_tick(&mut self, source: &dyn TrainSource) -> Result<TickSummary, TickError> {
        let tick = self.tick.checked_add(1).ok_or(TickError::TickOverflow)?;

        let snapshot = self.network.snapshot();
        let trains = source.trains(&snapshot.graph);
        let state = evaluate(&snapshot.graph, &trains);

        let previous = self.board.current();
        let changes = diff(previous.lamps(), state.lamps());
        let forced = state.forced_resolutions().to_vec();
        if !forced.is_empty() {
            warn!(
                tick,
                forced = forced.len(),
                "Chain signals forced this tick"
            );
        }

        let summary = TickSummary {
            tick,
            generation: snapshot.generation,
            signals: state.len(),
            trains: trains.len(),
            changes,
            forced,
        };

        self.board.publish(PublishedState {
            tick,
            generation: snapshot.generation,
            state,
        });
        self.tick = tick;

        for change in &summary.changes {
            debug!(
                tick,
                signal = %change.position,
                from = %change.from,
                to = %change.to,
                "Lamp changed"
            );
        }
        debug!(
            tick,
            generation = summary.generation,
            signals = summary.signals,
            trains = summary.trains,
            changes = summary.changes.len(),
            "Tick complete"
        );

        Ok(summary)
    }
}

/// Lamps whose status differs between two publications, in position order.
///
/// Signals missing from one side read as [`LampStatus::YellowBlinking`].
fn diff(
    previous: &BTreeMap<Position, LampStatus>,
    next: &BTreeMap<Position, LampStatus>,
) -> Vec<LampChange> {
    let positions: BTreeSet<Position> = previous.keys().chain(next.keys()).copied().collect();
    positions
        .into_iter()
        .filter_map(|position| {
            let from = previous.get(&position).copied().unwrap_or_default();
            let to = next.get(&position).copied().unwrap_or_default();
            (from != to).then_some(LampChange { position, from, to })
        })
        .collect()
}
