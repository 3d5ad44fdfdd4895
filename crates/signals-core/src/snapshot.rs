//! Shared, copy-on-write snapshots of the graph and of published lamps.
//!
//! Readers never see a graph being built or a state being evaluated: both
//! holders swap a whole new [`Arc`] in once the value is complete, and
//! readers keep whatever `Arc` they cloned for as long as they need it.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use signals_network::{
    NetworkError, NetworkGraph, NetworkIndex, NetworkState, ZeroDirectionalPolicy,
};
use signals_types::{LampStatus, Position};
use tracing::info;

/// A compiled graph together with the rebuild that produced it.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    /// Number of rebuilds before this graph; the initial graph is 0.
    pub generation: u64,
    /// The immutable graph.
    pub graph: Arc<NetworkGraph>,
}

/// Holder of the current [`NetworkGraph`].
///
/// Topology edits call [`NetworkHandle::rebuild`], which compiles the new
/// graph before taking the write lock, so evaluations in progress keep the
/// snapshot they started with.
#[derive(Debug)]
pub struct NetworkHandle {
    current: RwLock<GraphSnapshot>,
    policy: ZeroDirectionalPolicy,
}

impl NetworkHandle {
    /// Wrap an already compiled graph as generation 0.
    pub fn new(graph: NetworkGraph) -> Self {
        let policy = graph.policy();
        Self {
            current: RwLock::new(GraphSnapshot {
                generation: 0,
                graph: Arc::new(graph),
            }),
            policy,
        }
    }

    /// Compile `index` and wrap it as generation 0.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if the graph fails to compile.
    pub fn compile(
        index: NetworkIndex,
        policy: ZeroDirectionalPolicy,
    ) -> Result<Self, NetworkError> {
        Ok(Self::new(NetworkGraph::compile(index, policy)?))
    }

    /// The current graph snapshot.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Generation of the current graph.
    pub fn generation(&self) -> u64 {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Compile `index` into a new graph and make it current.
    ///
    /// On failure the previous graph stays current.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if the graph fails to compile.
    pub fn rebuild(&self, index: NetworkIndex) -> Result<u64, NetworkError> {
        let graph = Arc::new(NetworkGraph::compile(index, self.policy)?);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = current.generation.saturating_add(1);
        *current = GraphSnapshot { generation, graph };
        drop(current);
        info!(generation, "Network graph replaced");
        Ok(generation)
    }
}

/// Lamp statuses as published after one complete evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishedState {
    /// Tick that produced the state; 0 before the first tick.
    pub tick: u64,
    /// Graph generation the state was evaluated against.
    pub generation: u64,
    /// The evaluated state.
    pub state: NetworkState,
}

impl PublishedState {
    /// Status of the signal at `position`.
    pub fn lamp_status(&self, position: Position) -> LampStatus {
        self.state.lamp_status(position)
    }

    /// All published statuses.
    pub const fn lamps(&self) -> &BTreeMap<Position, LampStatus> {
        self.state.lamps()
    }
}

/// Holder of the most recently published lamp statuses.
#[derive(Debug, Default)]
pub struct LampBoard {
    current: RwLock<Arc<PublishedState>>,
}

impl LampBoard {
    /// An empty board: every lamp reads [`LampStatus::YellowBlinking`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The last published state.
    pub fn current(&self) -> Arc<PublishedState> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the published state as a whole.
    pub fn publish(&self, state: PublishedState) {
        let state = Arc::new(state);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
