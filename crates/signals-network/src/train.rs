//! Trains and the routes they intend to follow.
//!
//! Trains are supplied by the host for each evaluation. The network only
//! cares where a train is and, optionally, which edges it plans to use.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use signals_types::{Position, TrainId};

use crate::edge::Edge;

/// An ordered sequence of edges a train intends to traverse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    edges: Vec<Edge>,
}

impl Route {
    /// Build a route from its edges in travel order.
    pub const fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// The edges in travel order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether any edge of the route passes through `position`.
    pub fn contains(&self, position: Position) -> bool {
        self.edges.iter().any(|edge| edge.contains(position))
    }

    /// Number of edges.
    pub const fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the route has no edges.
    pub const fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sum of the edge lengths.
    pub fn total_length(&self) -> usize {
        self.edges
            .iter()
            .fold(0_usize, |total, edge| total.saturating_add(edge.length()))
    }
}

/// A train on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    /// Stable identity across ticks.
    pub id: TrainId,
    /// Rail cells the train currently covers.
    pub positions: BTreeSet<Position>,
    /// Where the train is going, if it has a route.
    pub route: Option<Route>,
}

impl Train {
    /// A new unrouted train covering `positions`.
    pub fn new(positions: impl IntoIterator<Item = Position>) -> Self {
        Self {
            id: TrainId::new(),
            positions: positions.into_iter().collect(),
            route: None,
        }
    }

    /// Attach a route.
    #[must_use]
    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    /// Whether the train covers `position`.
    pub fn occupies(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    /// Whether the train's route passes through `position`.
    pub fn routes_through(&self, position: Position) -> bool {
        self.route.as_ref().is_some_and(|route| route.contains(position))
    }
}
