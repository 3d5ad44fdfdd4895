//! The compiled track graph.
//!
//! A [`NetworkGraph`] pairs the [`NetworkIndex`] it was compiled from with
//! the [`Edge`]s found in it. Nodes are junctions, dead ends and rails
//! beside a link; every run of plain rail between two nodes becomes one
//! edge. The graph is immutable once compiled: topology edits compile a new
//! graph rather than patching this one.

use std::collections::{BTreeMap, BTreeSet};

use signals_types::Position;
use tracing::{debug, info};

use crate::edge::{Edge, EdgeBuilder, ZeroDirectionalPolicy};
use crate::error::NetworkError;
use crate::index::NetworkIndex;
use crate::object::Signal;
use crate::section::RailSection;

/// Edges compiled from a network index.
#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    /// The objects the graph was compiled from.
    index: NetworkIndex,
    /// How zero-directional runs were treated.
    policy: ZeroDirectionalPolicy,
    /// Compiled edges in canonical order.
    edges: Vec<Edge>,
    /// Edge indices keyed by each endpoint.
    endpoints: BTreeMap<Position, Vec<usize>>,
}

impl NetworkGraph {
    /// A graph with no objects and no edges.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile every rail run in `index` into edges.
    ///
    /// # Errors
    ///
    /// Propagates edge construction failures, including
    /// [`NetworkError::ZeroDirectional`] under the `reject` policy.
    pub fn compile(
        index: NetworkIndex,
        policy: ZeroDirectionalPolicy,
    ) -> Result<Self, NetworkError> {
        let builder = EdgeBuilder::new(&index).with_policy(policy);
        let mut found: BTreeSet<Edge> = BTreeSet::new();
        let mut visited: BTreeSet<Position> = BTreeSet::new();
        let rail_count = index.rails().count();

        let nodes: Vec<Position> = index
            .rails()
            .map(|rail| rail.position)
            .filter(|&position| is_node(&index, position))
            .collect();

        for &node in &nodes {
            visited.insert(node);
            for (_, first) in index.adjacent_rails(node) {
                let path = walk(&index, node, first, rail_count, |p| is_node(&index, p));
                visited.extend(path.iter().copied());
                for piece in split_loop(&path) {
                    found.insert(builder.build(piece)?);
                }
            }
        }

        // Rings with no junction on them are never reached from a node.
        let ring_starts: Vec<Position> = index
            .rails()
            .map(|rail| rail.position)
            .filter(|position| !visited.contains(position))
            .collect();
        for start in ring_starts {
            if visited.contains(&start) {
                continue;
            }
            let Some((_, first)) = index.adjacent_rails(start).into_iter().next() else {
                continue;
            };
            let path = walk(&index, start, first, rail_count, |p| p == start);
            visited.extend(path.iter().copied());
            for piece in split_loop(&path) {
                found.insert(builder.build(piece)?);
            }
        }

        let edges: Vec<Edge> = found.into_iter().collect();
        let mut endpoints: BTreeMap<Position, Vec<usize>> = BTreeMap::new();
        for (i, edge) in edges.iter().enumerate() {
            debug!(
                start = %edge.start(),
                end = %edge.end(),
                length = edge.length(),
                directionality = ?edge.directionality(),
                "Compiled edge"
            );
            endpoints.entry(edge.start()).or_default().push(i);
            endpoints.entry(edge.end()).or_default().push(i);
        }

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            signals = index.signals().count(),
            ?policy,
            "Network graph compiled"
        );

        Ok(Self {
            index,
            policy,
            edges,
            endpoints,
        })
    }

    // ---- Accessors ----

    /// The index the graph was compiled from.
    pub const fn index(&self) -> &NetworkIndex {
        &self.index
    }

    /// The zero-directional policy used at compile time.
    pub const fn policy(&self) -> ZeroDirectionalPolicy {
        self.policy
    }

    /// An edge builder over this graph's index and policy, for sub-edge
    /// extraction.
    pub fn edge_builder(&self) -> EdgeBuilder<'_> {
        EdgeBuilder::new(&self.index).with_policy(self.policy)
    }

    /// All edges in canonical order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges.
    pub const fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ---- Queries ----

    /// Edges with an endpoint at `node`.
    pub fn edges_at(&self, node: Position) -> Vec<&Edge> {
        self.endpoints
            .get(&node)
            .map(|indices| indices.iter().filter_map(|&i| self.edges.get(i)).collect())
            .unwrap_or_default()
    }

    /// The first edge passing through `rail`.
    pub fn edge_containing(&self, rail: Position) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.contains(rail))
    }

    /// Positions where edges meet, in position order.
    pub fn nodes(&self) -> Vec<Position> {
        self.endpoints.keys().copied().collect()
    }

    /// Jumps a train can make through links: `(rail beside link, destination)`.
    pub fn link_transitions(&self) -> Vec<(Position, Position)> {
        self.index
            .rails()
            .flat_map(|rail| {
                self.index
                    .linked_rails(rail.position)
                    .into_iter()
                    .map(move |destination| (rail.position, destination))
            })
            .collect()
    }

    /// All signals in position order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.index.signals()
    }

    /// The section a signal protects, or `None` if it is detached.
    pub fn section_ahead(&self, signal: &Signal) -> Option<RailSection> {
        RailSection::ahead_of(&self.index, signal)
    }
}

/// Junctions, dead ends and rails beside a link.
fn is_node(index: &NetworkIndex, position: Position) -> bool {
    index.adjacent_rails(position).len() != 2 || index.is_beside_link(position)
}

/// Follow plain rail from `origin` through `first` until `stop` holds.
///
/// The walk is bounded by the number of rails, so a malformed layout cannot
/// loop forever.
fn walk(
    index: &NetworkIndex,
    origin: Position,
    first: Position,
    rail_count: usize,
    stop: impl Fn(Position) -> bool,
) -> Vec<Position> {
    let mut path = vec![origin, first];
    let mut previous = origin;
    let mut current = first;
    while !stop(current) && path.len() <= rail_count {
        let Some((_, next)) = index
            .adjacent_rails(current)
            .into_iter()
            .find(|&(_, rail)| rail != previous)
        else {
            break;
        };
        path.push(next);
        previous = current;
        current = next;
    }
    path
}

/// Split a path that ends where it started into two halves; other paths
/// pass through unchanged.
fn split_loop(path: &[Position]) -> Vec<&[Position]> {
    if path.first() != path.last() {
        return vec![path];
    }
    let mid = path.len() / 2;
    [path.get(..=mid), path.get(mid..)]
        .into_iter()
        .flatten()
        .filter(|piece| piece.len() >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use signals_types::{Heading, RailShape, SignalKind};

    use super::*;
    use crate::edge::Directionality;

    fn compile(index: NetworkIndex) -> NetworkGraph {
        NetworkGraph::compile(index, ZeroDirectionalPolicy::default()).unwrap_or_default()
    }

    /// A T junction at (5, 0): line x 0..=10 plus a spur north to (5, -4).
    fn junction() -> NetworkIndex {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(Position::new(0, 0), Heading::East, 11);
        let _ = index.add_rail_run(Position::new(5, -1), Heading::North, 4);
        index
    }

    /// A 5 x 5 ring of rails with no junction, corners (0, 0) and (4, 4).
    fn ring(index: &mut NetworkIndex) {
        let _ = index.add_rail_run(Position::new(0, 0), Heading::East, 5);
        let _ = index.add_rail_run(Position::new(4, 1), Heading::South, 4);
        let _ = index.add_rail_run(Position::new(3, 4), Heading::West, 4);
        let _ = index.add_rail_run(Position::new(0, 3), Heading::North, 3);
    }

    #[test]
    fn straight_line_is_one_edge() {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(Position::new(0, 0), Heading::East, 6);
        let graph = compile(index);
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges().first();
        assert_eq!(edge.map(Edge::start), Some(Position::new(0, 0)));
        assert_eq!(edge.map(Edge::end), Some(Position::new(5, 0)));
        assert_eq!(edge.map(Edge::length), Some(6));
    }

    #[test]
    fn junction_splits_into_three_edges() {
        let graph = compile(junction());
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edges_at(Position::new(5, 0)).len(), 3);
        assert_eq!(graph.edges_at(Position::new(0, 0)).len(), 1);
        assert!(graph.edges_at(Position::new(3, 0)).is_empty());
        assert_eq!(
            graph.nodes(),
            vec![
                Position::new(0, 0),
                Position::new(5, -4),
                Position::new(5, 0),
                Position::new(10, 0)
            ]
        );
    }

    #[test]
    fn edge_containing_finds_interior_rail() {
        let graph = compile(junction());
        let edge = graph.edge_containing(Position::new(7, 0));
        assert_eq!(edge.map(Edge::start), Some(Position::new(5, 0)));
        assert_eq!(edge.map(Edge::end), Some(Position::new(10, 0)));
        assert!(graph.edge_containing(Position::new(7, 7)).is_none());
    }

    #[test]
    fn junction_free_ring_is_split_in_two() {
        let mut index = NetworkIndex::new();
        ring(&mut index);
        let graph = compile(index);
        assert_eq!(graph.edge_count(), 2);
        let covered: usize = graph.edges().iter().map(Edge::length).sum();
        // 16 ring cells, two shared split points.
        assert_eq!(covered, 18);
    }

    #[test]
    fn balloon_loop_from_junction() {
        // Stem from (2, 6) north to (2, 5), entering a ring at (2, 4).
        let mut index = NetworkIndex::new();
        ring(&mut index);
        let _ = index.add_rail_run(Position::new(2, 5), Heading::South, 2);
        let graph = compile(index);
        // The stem plus the loop split in two.
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edges_at(Position::new(2, 4)).len(), 3);
    }

    #[test]
    fn signals_make_edges_unidirectional() {
        let mut index = junction();
        let _ = index.add_signal(Position::new(7, 1), Heading::West, SignalKind::Block);
        let graph = compile(index);
        let edge = graph.edge_containing(Position::new(8, 0));
        assert_eq!(
            edge.map(Edge::directionality),
            Some(Directionality::Unidirectional)
        );
        assert_eq!(edge.map(Edge::start), Some(Position::new(10, 0)));
    }

    #[test]
    fn reject_policy_fails_compile() {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(Position::new(0, 0), Heading::East, 8);
        let _ = index.add_signal(Position::new(2, 1), Heading::East, SignalKind::Block);
        let _ = index.add_signal(Position::new(5, 1), Heading::West, SignalKind::Block);
        let result = NetworkGraph::compile(index, ZeroDirectionalPolicy::Reject);
        assert!(matches!(result, Err(NetworkError::ZeroDirectional { .. })));
    }

    #[test]
    fn link_transitions_listed() {
        let mut index = junction();
        let _ = index.add_rail_run(Position::new(20, 20), Heading::East, 3);
        let _ = index.add_link(Position::new(10, 1), Some(Position::new(20, 20)));
        let graph = compile(index);
        assert_eq!(
            graph.link_transitions(),
            vec![(Position::new(10, 0), Position::new(20, 20))]
        );
    }

    #[test]
    fn section_ahead_of_signal() {
        let mut index = junction();
        let _ = index.add_signal(Position::new(2, 1), Heading::East, SignalKind::Block);
        let graph = compile(index);
        let signal = graph.signals().next().copied();
        let section = signal.and_then(|s| graph.section_ahead(&s));
        // Everything east of the signal, including the spur.
        assert_eq!(section.map(|s| s.len()), Some(13));
    }

    #[test]
    fn double_track_compiles_to_two_lines() {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(Position::new(0, 0), Heading::East, 6);
        let _ = index.add_rail_run(Position::new(0, 1), Heading::East, 6);
        let graph = compile(index);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edges().iter().all(|edge| edge.length() == 6));
        assert_eq!(
            graph.nodes(),
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(5, 0),
                Position::new(5, 1),
            ]
        );
    }

    #[test]
    fn isolated_rail_has_no_edges() {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail(Position::new(0, 0), RailShape::EastWest);
        let graph = compile(index);
        assert_eq!(graph.edge_count(), 0);
        assert!(NetworkGraph::empty().edges().is_empty());
    }
}
