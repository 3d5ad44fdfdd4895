//! Compiled edges of the track graph.
//!
//! An [`Edge`] collapses a run of rail cells between two nodes (junctions,
//! dead ends, rails beside a link) into one weighted connection. Its
//! directionality is never declared: the [`EdgeBuilder`] derives it from the
//! signals standing along straight stretches of the run.
//!
//! # Canonical form
//!
//! Unidirectional edges are stored so that travel always runs from `start`
//! to `end`. All other edges are stored with `start < end` under the
//! [`Position`] order, so building the same run from either end yields
//! equal edges. Equality, ordering and hashing look only at the endpoints,
//! their headings and the directionality.
//!
//! # Sub-edges
//!
//! Route search needs to start or stop partway along an edge. The builder
//! splits an edge at a position and re-derives the directionality of each
//! piece; see [`EdgeBuilder::entry_points`] and [`EdgeBuilder::exit_point`].

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use signals_types::{Heading, Position};
use tracing::trace;

use crate::error::NetworkError;
use crate::index::NetworkIndex;

/// Which way trains may be routed along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directionality {
    /// Both ways.
    Bidirectional,
    /// Only from `start` to `end`.
    Unidirectional,
    /// Neither way: signals along the run face each other.
    Impassable,
}

/// What to do with a run whose signals forbid both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDirectionalPolicy {
    /// Keep the edge in the graph but permit no travel over it.
    #[default]
    Impassable,
    /// Fail the build with [`NetworkError::ZeroDirectional`].
    Reject,
    /// Treat the run as bidirectional.
    Bidirectional,
}

/// Outcome of scanning a run for signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// No signal restricts the run.
    Both,
    /// Only travel from the first to the last element is allowed.
    ForwardsOnly,
    /// Only travel from the last to the first element is allowed.
    BackwardsOnly,
    /// Signals forbid both directions.
    Neither,
}

/// A compiled run of rail cells between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Rail cells in travel (or canonical) order.
    cells: Vec<Position>,
    /// First cell.
    start: Position,
    /// Last cell.
    end: Position,
    /// Outward heading at `start`.
    start_heading: Heading,
    /// Outward heading at `end`.
    end_heading: Heading,
    /// Which way trains may be routed.
    directionality: Directionality,
}

impl Edge {
    /// First cell of the edge.
    pub const fn start(&self) -> Position {
        self.start
    }

    /// Last cell of the edge.
    pub const fn end(&self) -> Position {
        self.end
    }

    /// Heading pointing out of the edge at `start`.
    pub const fn start_heading(&self) -> Heading {
        self.start_heading
    }

    /// Heading pointing out of the edge at `end`.
    pub const fn end_heading(&self) -> Heading {
        self.end_heading
    }

    /// Number of rail cells; the pathfinding weight.
    pub const fn length(&self) -> usize {
        self.cells.len()
    }

    /// Which way trains may be routed.
    pub const fn directionality(&self) -> Directionality {
        self.directionality
    }

    /// Whether travel is only permitted from `start` to `end`.
    pub const fn is_unidirectional(&self) -> bool {
        matches!(self.directionality, Directionality::Unidirectional)
    }

    /// The rail cells in stored order.
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// Whether `position` is one of the edge's cells.
    pub fn contains(&self, position: Position) -> bool {
        self.cells.contains(&position)
    }

    /// Index of `position` within [`Edge::cells`].
    pub fn index_of(&self, position: Position) -> Option<usize> {
        self.cells.iter().position(|&cell| cell == position)
    }

    /// The endpoint opposite `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::PositionNotOnEdge`] if `endpoint` is not an
    /// endpoint of this edge.
    pub fn other_end(&self, endpoint: Position) -> Result<Position, NetworkError> {
        if endpoint == self.start {
            Ok(self.end)
        } else if endpoint == self.end {
            Ok(self.start)
        } else {
            Err(self.not_on_edge(endpoint))
        }
    }

    /// Outward heading at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::PositionNotOnEdge`] if `endpoint` is not an
    /// endpoint of this edge.
    pub fn heading_at(&self, endpoint: Position) -> Result<Heading, NetworkError> {
        if endpoint == self.start {
            Ok(self.start_heading)
        } else if endpoint == self.end {
            Ok(self.end_heading)
        } else {
            Err(self.not_on_edge(endpoint))
        }
    }

    /// Whether a train standing on `position` may leave it along this edge.
    pub fn permits_departure_from(&self, position: Position) -> bool {
        match self.directionality {
            Directionality::Bidirectional => self.contains(position),
            Directionality::Unidirectional => position != self.end && self.contains(position),
            Directionality::Impassable => false,
        }
    }

    const fn not_on_edge(&self, position: Position) -> NetworkError {
        NetworkError::PositionNotOnEdge {
            position,
            start: self.start,
            end: self.end,
        }
    }

    const fn key(&self) -> (Position, Position, Heading, Heading, Directionality) {
        (
            self.start,
            self.end,
            self.start_heading,
            self.end_heading,
            self.directionality,
        )
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl core::fmt::Display for Edge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

/// Builds [`Edge`]s against one [`NetworkIndex`].
#[derive(Debug, Clone, Copy)]
pub struct EdgeBuilder<'a> {
    index: &'a NetworkIndex,
    policy: ZeroDirectionalPolicy,
}

impl<'a> EdgeBuilder<'a> {
    /// Create a builder using the default zero-directional policy.
    pub fn new(index: &'a NetworkIndex) -> Self {
        Self {
            index,
            policy: ZeroDirectionalPolicy::default(),
        }
    }

    /// Use `policy` for runs whose signals forbid both directions.
    #[must_use]
    pub const fn with_policy(mut self, policy: ZeroDirectionalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The index this builder reads signals from.
    pub const fn index(&self) -> &'a NetworkIndex {
        self.index
    }

    /// Compile a run of adjacent rail cells into an edge.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::MalformedPath`] for fewer than two cells,
    /// [`NetworkError::NotARail`] or [`NetworkError::NotAdjacent`] for a
    /// broken run, [`NetworkError::DegenerateEdge`] if the run starts where
    /// it ends, and [`NetworkError::ZeroDirectional`] under the
    /// [`ZeroDirectionalPolicy::Reject`] policy.
    pub fn build(&self, path: &[Position]) -> Result<Edge, NetworkError> {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return Err(NetworkError::MalformedPath { length: 0 });
        };
        if path.len() < 2 {
            return Err(NetworkError::MalformedPath { length: path.len() });
        }
        if let Some(&cell) = path.iter().find(|&&cell| !self.index.is_rail(cell)) {
            return Err(NetworkError::NotARail(cell));
        }
        for pair in path.windows(2) {
            if let [from, to] = *pair
                && !self.index.connects(from, to)
            {
                return Err(NetworkError::NotAdjacent { from, to });
            }
        }
        if first == last {
            return Err(NetworkError::DegenerateEdge(first));
        }

        let mut cells = path.to_vec();
        let directionality = match self.scan(&cells) {
            Scan::Both => Directionality::Bidirectional,
            Scan::ForwardsOnly => Directionality::Unidirectional,
            Scan::BackwardsOnly => {
                cells.reverse();
                Directionality::Unidirectional
            }
            Scan::Neither => match self.policy {
                ZeroDirectionalPolicy::Reject => {
                    return Err(NetworkError::ZeroDirectional {
                        start: first,
                        end: last,
                    });
                }
                ZeroDirectionalPolicy::Impassable => Directionality::Impassable,
                ZeroDirectionalPolicy::Bidirectional => Directionality::Bidirectional,
            },
        };

        if directionality != Directionality::Unidirectional {
            match first.cmp(&last) {
                Ordering::Less => {}
                Ordering::Greater => cells.reverse(),
                Ordering::Equal => {
                    return Err(NetworkError::AmbiguousOrientation { first, last });
                }
            }
        }

        let (start, second) = endpoint_pair(cells.iter().copied())?;
        let (end, second_last) = endpoint_pair(cells.iter().rev().copied())?;
        let start_heading = start
            .relative_heading(second)
            .ok_or(NetworkError::NotAdjacent { from: second, to: start })?;
        let end_heading = end
            .relative_heading(second_last)
            .ok_or(NetworkError::NotAdjacent { from: second_last, to: end })?;

        trace!(%start, %end, ?directionality, length = cells.len(), "edge built");

        Ok(Edge {
            cells,
            start,
            end,
            start_heading,
            end_heading,
            directionality,
        })
    }

    /// Sub-edges that let route search stop at `destination` partway along
    /// `edge`.
    ///
    /// Always yields `[start..destination]`; yields `[destination..end]`
    /// only when that piece, re-evaluated on its own, is bidirectional. A
    /// destination at an endpoint yields only the non-degenerate piece.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::PositionNotOnEdge`] if `destination` is not on
    /// the edge.
    pub fn entry_points(
        &self,
        edge: &Edge,
        destination: Position,
    ) -> Result<Vec<Edge>, NetworkError> {
        let at = edge
            .index_of(destination)
            .ok_or_else(|| edge.not_on_edge(destination))?;
        let last = edge.cells.len().saturating_sub(1);

        let mut entries = Vec::with_capacity(2);
        if at > 0 {
            entries.push(self.sub_edge(edge, 0, at)?);
        }
        if at < last {
            let tail = self.sub_edge(edge, at, last)?;
            if tail.directionality == Directionality::Bidirectional {
                entries.push(tail);
            }
        }
        Ok(entries)
    }

    /// The sub-edge a train standing at `from` can leave by, optionally
    /// restricted to leaving in `direction`.
    ///
    /// Prefers the piece towards `end`, which is returned when `direction`
    /// is absent or points at the next cell and the piece permits departure
    /// from `from`. Otherwise, when `direction` points at the previous cell,
    /// the piece towards `start` is returned only if it is bidirectional.
    /// `Ok(None)` means there is no exit.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::PositionNotOnEdge`] if `from` is not on the
    /// edge.
    pub fn exit_point(
        &self,
        edge: &Edge,
        from: Position,
        direction: Option<Heading>,
    ) -> Result<Option<Edge>, NetworkError> {
        let at = edge.index_of(from).ok_or_else(|| edge.not_on_edge(from))?;
        let last = edge.cells.len().saturating_sub(1);

        let next = at.checked_add(1).and_then(|i| edge.cells.get(i)).copied();
        if let Some(next) = next
            && (direction.is_none() || next.relative_heading(from) == direction)
        {
            let forward = self.sub_edge(edge, at, last)?;
            return Ok(forward.permits_departure_from(from).then_some(forward));
        }

        let previous = at.checked_sub(1).and_then(|i| edge.cells.get(i)).copied();
        if let Some(previous) = previous
            && (direction.is_none() || previous.relative_heading(from) == direction)
        {
            let backward = self.sub_edge(edge, 0, at)?;
            if backward.directionality == Directionality::Bidirectional {
                return Ok(Some(backward));
            }
        }
        Ok(None)
    }

    fn sub_edge(&self, edge: &Edge, from: usize, to: usize) -> Result<Edge, NetworkError> {
        let cells = edge
            .cells
            .get(from..=to)
            .ok_or_else(|| NetworkError::MalformedPath {
                length: to.saturating_sub(from),
            })?;
        self.build(cells)
    }

    /// Walk the straight interior points of a run and collect which travel
    /// directions its signals forbid.
    fn scan(&self, cells: &[Position]) -> Scan {
        let mut forwards_ok = true;
        let mut backwards_ok = true;
        for window in cells.windows(3) {
            let [previous, current, next] = *window else {
                continue;
            };
            let incoming = current.relative_heading(previous);
            let outgoing = next.relative_heading(current);
            let Some(travel) = outgoing else {
                continue;
            };
            if incoming != outgoing {
                continue;
            }
            for signal in self.index.signals_at_rail(current) {
                if signal.heading == travel {
                    backwards_ok = false;
                } else if signal.heading == travel.opposite() {
                    forwards_ok = false;
                }
            }
        }
        match (forwards_ok, backwards_ok) {
            (true, true) => Scan::Both,
            (true, false) => Scan::ForwardsOnly,
            (false, true) => Scan::BackwardsOnly,
            (false, false) => Scan::Neither,
        }
    }
}

/// First two items of a run of cells.
fn endpoint_pair(
    mut cells: impl Iterator<Item = Position>,
) -> Result<(Position, Position), NetworkError> {
    match (cells.next(), cells.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(NetworkError::MalformedPath { length: 1 }),
    }
}
