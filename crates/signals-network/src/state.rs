//! Per-tick lamp evaluation.
//!
//! [`evaluate`] derives the lamp status of every signal from a compiled
//! [`NetworkGraph`] and a snapshot of the trains on it. The result is a pure
//! function of those two inputs: nothing is carried over between ticks.
//!
//! Block signals only look at the section they protect. Chain signals look
//! further ahead, at the signals leading out of their section, and may
//! depend on each other. They are resolved by repeated passes over a pending
//! set; when a pass commits nothing the lowest pending signal is forced to
//! [`LampStatus::Green`] so that cycles of chain signals always settle.

use std::collections::{BTreeMap, BTreeSet};

use signals_types::{LampStatus, Position};
use tracing::{debug, warn};

use crate::graph::NetworkGraph;
use crate::index::NetworkIndex;
use crate::object::Signal;
use crate::section::RailSection;
use crate::train::{Route, Train};

/// Lamp statuses for one evaluation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkState {
    /// Committed status per signal position.
    lamps: BTreeMap<Position, LampStatus>,
    /// Chain signals whose status was forced to break a dependency cycle,
    /// in the order they were forced.
    forced: Vec<Position>,
}

impl NetworkState {
    /// Evaluate every signal of `graph` against `trains`.
    pub fn evaluate(graph: &NetworkGraph, trains: &[Train]) -> Self {
        evaluate(graph, trains)
    }

    /// Status of the signal at `position`.
    ///
    /// Unknown positions answer [`LampStatus::YellowBlinking`].
    pub fn lamp_status(&self, position: Position) -> LampStatus {
        self.lamps.get(&position).copied().unwrap_or_default()
    }

    /// All committed statuses in position order.
    pub const fn lamps(&self) -> &BTreeMap<Position, LampStatus> {
        &self.lamps
    }

    /// Chain signals forced to green during this evaluation.
    pub fn forced_resolutions(&self) -> &[Position] {
        &self.forced
    }

    /// Number of signals with a status.
    pub fn len(&self) -> usize {
        self.lamps.len()
    }

    /// Whether no signal has a status.
    pub fn is_empty(&self) -> bool {
        self.lamps.is_empty()
    }
}

/// What one signal sees of the network, computed once per evaluation.
struct SignalView<'g> {
    signal: &'g Signal,
    rail: Option<Position>,
    section: Option<RailSection>,
    next: Vec<Position>,
}

impl<'g> SignalView<'g> {
    fn new(index: &'g NetworkIndex, signal: &'g Signal) -> Self {
        let rail = index.signal_rail(signal);
        let section = RailSection::ahead_of(index, signal);
        let next = section
            .as_ref()
            .map(|s| s.next_signals(index).iter().map(|n| n.position).collect())
            .unwrap_or_default();
        Self {
            signal,
            rail,
            section,
            next,
        }
    }

    /// Red when a train stands in the section without also covering the
    /// signal's own rail.
    fn block_status(&self, trains: &[Train]) -> LampStatus {
        let (Some(section), Some(rail)) = (&self.section, self.rail) else {
            return LampStatus::Green;
        };
        if section.trains(trains).any(|train| !train.occupies(rail)) {
            LampStatus::Red
        } else {
            LampStatus::Green
        }
    }
}

/// Evaluate every signal of `graph` against `trains`.
pub fn evaluate(graph: &NetworkGraph, trains: &[Train]) -> NetworkState {
    let index = graph.index();
    let views: BTreeMap<Position, SignalView<'_>> = graph
        .signals()
        .map(|signal| (signal.position, SignalView::new(index, signal)))
        .collect();

    let mut lamps: BTreeMap<Position, LampStatus> = BTreeMap::new();
    let mut pending: BTreeSet<Position> = BTreeSet::new();

    for (&position, view) in &views {
        let status = view.block_status(trains);
        if view.signal.is_chain() && status != LampStatus::Red {
            pending.insert(position);
        } else {
            lamps.insert(position, status);
        }
    }

    let mut forced = Vec::new();
    let mut passes: usize = 0;
    while !pending.is_empty() {
        passes = passes.saturating_add(1);
        let mut committed = false;
        let batch: Vec<Position> = pending.iter().copied().collect();
        for position in batch {
            let Some(view) = views.get(&position) else {
                pending.remove(&position);
                continue;
            };
            let status = chain_status(view, &views, &lamps, trains);
            if !status.is_unresolved() {
                lamps.insert(position, status);
                pending.remove(&position);
                committed = true;
            }
        }

        if !committed && let Some(position) = pending.pop_first() {
            warn!(
                signal = %position,
                remaining = pending.len(),
                "Chain signal dependency cycle; forcing green"
            );
            lamps.insert(position, LampStatus::Green);
            forced.push(position);
        }
    }

    debug!(
        signals = lamps.len(),
        trains = trains.len(),
        passes,
        forced = forced.len(),
        "Network state evaluated"
    );

    NetworkState { lamps, forced }
}

/// Status of a chain signal whose block status is not red, or
/// [`LampStatus::YellowBlinking`] if it has to wait for a signal ahead.
fn chain_status(
    view: &SignalView<'_>,
    views: &BTreeMap<Position, SignalView<'_>>,
    lamps: &BTreeMap<Position, LampStatus>,
    trains: &[Train],
) -> LampStatus {
    let ahead: BTreeSet<LampStatus> = view
        .next
        .iter()
        .map(|position| committed(lamps, *position))
        .collect();

    if ahead.contains(&LampStatus::YellowBlinking) {
        return LampStatus::YellowBlinking;
    }
    let mut distinct = ahead.iter().copied();
    match (distinct.next(), distinct.next()) {
        (None, _) => LampStatus::Green,
        (Some(only), None) => only,
        (Some(_), Some(_)) => routed_status(view, views, lamps, trains),
    }
}

/// Resolve a chain signal with diverging exits by following the route of
/// the train waiting at it.
fn routed_status(
    view: &SignalView<'_>,
    views: &BTreeMap<Position, SignalView<'_>>,
    lamps: &BTreeMap<Position, LampStatus>,
    trains: &[Train],
) -> LampStatus {
    let Some(route) = waiting_route(view, trains) else {
        return LampStatus::Yellow;
    };

    let mut visited = BTreeSet::from([view.signal.position]);
    let mut current = view;
    loop {
        let on_route = current
            .next
            .iter()
            .filter_map(|position| views.get(position))
            .find(|next| next.rail.is_some_and(|rail| route.contains(rail)));
        let Some(next) = on_route else {
            return LampStatus::Green;
        };
        let status = committed(lamps, next.signal.position);
        if status != LampStatus::Yellow {
            return status;
        }
        if !visited.insert(next.signal.position) {
            return LampStatus::YellowBlinking;
        }
        current = next;
    }
}

/// Route of the first routed train covering the signal's rail.
fn waiting_route<'t>(view: &SignalView<'_>, trains: &'t [Train]) -> Option<&'t Route> {
    let rail = view.rail?;
    trains
        .iter()
        .filter(|train| train.occupies(rail))
        .find_map(|train| train.route.as_ref())
}

fn committed(lamps: &BTreeMap<Position, LampStatus>, position: Position) -> LampStatus {
    lamps.get(&position).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use signals_types::{Heading, SignalKind};

    use super::*;
    use crate::edge::{Edge, ZeroDirectionalPolicy};

    fn compile(index: NetworkIndex) -> NetworkGraph {
        NetworkGraph::compile(index, ZeroDirectionalPolicy::default()).unwrap_or_default()
    }

    fn at(x: i32, z: i32) -> Position {
        Position::new(x, z)
    }

    fn route_through(graph: &NetworkGraph, rails: &[Position]) -> Route {
        Route::new(
            rails
                .iter()
                .filter_map(|&rail| graph.edge_containing(rail))
                .cloned()
                .collect::<Vec<Edge>>(),
        )
    }

    /// Line x 0..10 with an eastbound block signal on (2, 0).
    fn block_line() -> NetworkGraph {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 10);
        let _ = index.add_signal(at(2, 1), Heading::East, SignalKind::Block);
        compile(index)
    }

    /// Line x 0..15: chain on (2, 0) then block on (6, 0).
    fn chain_line() -> NetworkGraph {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 15);
        let _ = index.add_signal(at(2, 1), Heading::East, SignalKind::Chain);
        let _ = index.add_signal(at(6, 1), Heading::East, SignalKind::Block);
        compile(index)
    }

    /// Line x 0..=10 with a spur north from (5, 0) to (5, -4).
    ///
    /// Chain signals on (1, 0) and (2, 0) face east; block signals guard
    /// the main line at (7, 0) and the spur at (5, -2).
    fn switch() -> NetworkGraph {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 11);
        let _ = index.add_rail_run(at(5, -1), Heading::North, 4);
        let _ = index.add_signal(at(1, 1), Heading::East, SignalKind::Chain);
        let _ = index.add_signal(at(2, 1), Heading::East, SignalKind::Chain);
        let _ = index.add_signal(at(7, 1), Heading::East, SignalKind::Block);
        let _ = index.add_signal(at(4, -2), Heading::North, SignalKind::Block);
        compile(index)
    }

    /// Line x 0..=20 with spurs north from (5, 0) and (12, 0).
    ///
    /// Eastbound chain signals on (2, 0) and (8, 0) each guard a switch.
    /// Block signals guard the spurs at (5, -2) and (12, -2) and the main
    /// line at (15, 0).
    fn two_switches() -> NetworkGraph {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 21);
        let _ = index.add_rail_run(at(5, -1), Heading::North, 4);
        let _ = index.add_rail_run(at(12, -1), Heading::North, 4);
        let _ = index.add_signal(at(2, 1), Heading::East, SignalKind::Chain);
        let _ = index.add_signal(at(8, 1), Heading::East, SignalKind::Chain);
        let _ = index.add_signal(at(4, -2), Heading::North, SignalKind::Block);
        let _ = index.add_signal(at(11, -2), Heading::North, SignalKind::Block);
        let _ = index.add_signal(at(15, 1), Heading::East, SignalKind::Block);
        compile(index)
    }

    /// Clockwise ring with corners (0, 0) and (12, 6) and a spur off each
    /// long side.
    ///
    /// Chain signals on (3, 0) and (12, 3) wait on each other. Block
    /// signals guard the spurs at (6, -2) and (6, 8).
    fn switched_ring() -> NetworkGraph {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 13);
        let _ = index.add_rail_run(at(12, 1), Heading::South, 6);
        let _ = index.add_rail_run(at(11, 6), Heading::West, 12);
        let _ = index.add_rail_run(at(0, 5), Heading::North, 5);
        let _ = index.add_rail_run(at(6, -1), Heading::North, 3);
        let _ = index.add_rail_run(at(6, 7), Heading::South, 3);
        let _ = index.add_signal(at(3, -1), Heading::East, SignalKind::Chain);
        let _ = index.add_signal(at(13, 3), Heading::South, SignalKind::Chain);
        let _ = index.add_signal(at(5, -2), Heading::North, SignalKind::Block);
        let _ = index.add_signal(at(7, 8), Heading::South, SignalKind::Block);
        compile(index)
    }

    /// 5 x 5 ring with four chain signals facing clockwise.
    fn chain_ring() -> NetworkGraph {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 5);
        let _ = index.add_rail_run(at(4, 1), Heading::South, 4);
        let _ = index.add_rail_run(at(3, 4), Heading::West, 4);
        let _ = index.add_rail_run(at(0, 3), Heading::North, 3);
        let _ = index.add_signal(at(2, -1), Heading::East, SignalKind::Chain);
        let _ = index.add_signal(at(5, 2), Heading::South, SignalKind::Chain);
        let _ = index.add_signal(at(2, 5), Heading::West, SignalKind::Chain);
        let _ = index.add_signal(at(-1, 2), Heading::North, SignalKind::Chain);
        compile(index)
    }

    // ---- Block signals ----

    #[test]
    fn block_green_without_trains() {
        let state = evaluate(&block_line(), &[]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn block_red_with_train_ahead() {
        let state = evaluate(&block_line(), &[Train::new([at(5, 0)])]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Red);
    }

    #[test]
    fn block_green_when_train_covers_signal_rail() {
        let state = evaluate(&block_line(), &[Train::new([at(2, 0), at(3, 0)])]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);
    }

    #[test]
    fn block_green_with_train_behind() {
        let state = evaluate(&block_line(), &[Train::new([at(0, 0), at(1, 0)])]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);
    }

    #[test]
    fn block_red_if_any_train_ahead_is_clear_of_signal() {
        let trains = [Train::new([at(2, 0), at(3, 0)]), Train::new([at(8, 0)])];
        let state = evaluate(&block_line(), &trains);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Red);
    }

    #[test]
    fn detached_block_signal_is_green() {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 4);
        let _ = index.add_signal(at(2, 9), Heading::East, SignalKind::Block);
        let state = evaluate(&compile(index), &[Train::new([at(2, 0)])]);
        assert_eq!(state.lamp_status(at(2, 9)), LampStatus::Green);
    }

    // ---- Chain signals ----

    #[test]
    fn chain_copies_single_next_status() {
        let graph = chain_line();
        let clear = evaluate(&graph, &[]);
        assert_eq!(clear.lamp_status(at(2, 1)), LampStatus::Green);

        let blocked = evaluate(&graph, &[Train::new([at(10, 0)])]);
        assert_eq!(blocked.lamp_status(at(6, 1)), LampStatus::Red);
        assert_eq!(blocked.lamp_status(at(2, 1)), LampStatus::Red);
    }

    #[test]
    fn chain_red_when_own_section_occupied() {
        let state = evaluate(&chain_line(), &[Train::new([at(4, 0)])]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Red);
        assert_eq!(state.lamp_status(at(6, 1)), LampStatus::Green);
    }

    #[test]
    fn chain_without_next_signals_is_green() {
        let mut index = NetworkIndex::new();
        let _ = index.add_rail_run(at(0, 0), Heading::East, 6);
        let _ = index.add_signal(at(2, 1), Heading::East, SignalKind::Chain);
        let state = evaluate(&compile(index), &[]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);
        assert!(state.forced_resolutions().is_empty());
    }

    #[test]
    fn switch_agreeing_exits_copy_status() {
        let state = evaluate(&switch(), &[]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);
        assert_eq!(state.lamp_status(at(1, 1)), LampStatus::Green);
    }

    #[test]
    fn switch_ambiguity_without_route_is_yellow() {
        let state = evaluate(&switch(), &[Train::new([at(9, 0)])]);
        assert_eq!(state.lamp_status(at(7, 1)), LampStatus::Red);
        assert_eq!(state.lamp_status(at(4, -2)), LampStatus::Green);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Yellow);
        // The chain behind copies the yellow.
        assert_eq!(state.lamp_status(at(1, 1)), LampStatus::Yellow);
    }

    #[test]
    fn routed_train_resolves_switch() {
        let graph = switch();
        let blocker = Train::new([at(9, 0)]);

        let route = route_through(&graph, &[at(1, 0), at(5, -2)]);
        let via_spur = Train::new([at(2, 0)]).with_route(route);
        let state = evaluate(&graph, &[blocker.clone(), via_spur]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);

        let route = route_through(&graph, &[at(1, 0), at(7, 0)]);
        let via_main = Train::new([at(2, 0)]).with_route(route);
        let state = evaluate(&graph, &[blocker, via_main]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Red);
    }

    #[test]
    fn route_missing_every_exit_is_green() {
        let graph = switch();
        let short = Train::new([at(2, 0)]).with_route(route_through(&graph, &[at(1, 0)]));
        let state = evaluate(&graph, &[Train::new([at(9, 0)]), short]);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);
    }

    #[test]
    fn routed_walk_passes_yellow_chain_signals() {
        let graph = two_switches();
        let blocker = Train::new([at(17, 0)]);

        let main = route_through(&graph, &[at(1, 0), at(8, 0), at(16, 0)]);
        let waiting = Train::new([at(2, 0)]).with_route(main);
        let state = evaluate(&graph, &[blocker.clone(), waiting]);
        assert_eq!(state.lamp_status(at(15, 1)), LampStatus::Red);
        assert_eq!(state.lamp_status(at(11, -2)), LampStatus::Green);
        // Nobody waits at the second chain, so its switch stays ambiguous.
        assert_eq!(state.lamp_status(at(8, 1)), LampStatus::Yellow);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Red);

        let spur = route_through(&graph, &[at(1, 0), at(8, 0), at(12, -3)]);
        let waiting = Train::new([at(2, 0)]).with_route(spur);
        let state = evaluate(&graph, &[blocker, waiting]);
        assert_eq!(state.lamp_status(at(8, 1)), LampStatus::Yellow);
        assert_eq!(state.lamp_status(at(2, 1)), LampStatus::Green);
        assert!(state.forced_resolutions().is_empty());
    }

    #[test]
    fn routed_walk_stops_on_revisited_signal() {
        let graph = switched_ring();
        let index = graph.index();
        let views: BTreeMap<Position, SignalView<'_>> = graph
            .signals()
            .map(|signal| (signal.position, SignalView::new(index, signal)))
            .collect();
        let lamps = BTreeMap::from([
            (at(3, -1), LampStatus::Yellow),
            (at(13, 3), LampStatus::Yellow),
            (at(5, -2), LampStatus::Green),
            (at(7, 8), LampStatus::Red),
        ]);
        let around = route_through(&graph, &[at(3, 0), at(12, 3)]);
        let trains = [Train::new([at(3, 0)]).with_route(around)];

        let start = views.get(&at(3, -1));
        assert!(start.is_some());
        if let Some(start) = start {
            assert_eq!(
                routed_status(start, &views, &lamps, &trains),
                LampStatus::YellowBlinking
            );
        }
    }

    #[test]
    fn unresolvable_ring_is_forced_green() {
        let graph = switched_ring();
        let around = route_through(&graph, &[at(3, 0), at(12, 3)]);
        let trains = [
            Train::new([at(3, 0)]).with_route(around),
            Train::new([at(6, 9)]),
        ];
        let state = evaluate(&graph, &trains);
        assert_eq!(state.lamp_status(at(7, 8)), LampStatus::Red);
        assert_eq!(state.forced_resolutions(), &[at(3, -1)]);
        assert_eq!(state.lamp_status(at(3, -1)), LampStatus::Green);
        // The other chain sees a red spur and a green ring ahead.
        assert_eq!(state.lamp_status(at(13, 3)), LampStatus::Yellow);
    }

    // ---- Fixed point ----

    #[test]
    fn chain_ring_terminates_with_one_forced_signal() {
        let state = evaluate(&chain_ring(), &[]);
        assert_eq!(state.len(), 4);
        assert!(state.lamps().values().all(|&s| s == LampStatus::Green));
        assert_eq!(state.forced_resolutions(), &[at(-1, 2)]);
    }

    #[test]
    fn occupied_ring_needs_no_forcing() {
        let state = evaluate(&chain_ring(), &[Train::new([at(3, 0)])]);
        assert_eq!(state.lamp_status(at(2, -1)), LampStatus::Red);
        assert!(state.forced_resolutions().is_empty());
        assert!(state.lamps().values().all(|&s| s == LampStatus::Red));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let graph = switch();
        let trains = [Train::new([at(9, 0)])];
        assert_eq!(evaluate(&graph, &trains), evaluate(&graph, &trains));
        assert_eq!(
            NetworkState::evaluate(&graph, &trains),
            evaluate(&graph, &trains)
        );
    }

    #[test]
    fn unknown_position_is_yellow_blinking() {
        let state = evaluate(&NetworkGraph::empty(), &[]);
        assert!(state.is_empty());
        assert_eq!(state.lamp_status(at(0, 0)), LampStatus::YellowBlinking);
    }
}
