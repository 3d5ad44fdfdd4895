//! Demonstration layout: a main line with a passing loop.
//!
//! ```text
//!   z=-4            B(8,-4)>       B(13,-4)>
//!   z=-3      +-------------------------+
//!   z=-2      |                         |
//!   z=-1      |                         |
//!   z= 0  +---+-------------------------+----+   x = 0 .. 20
//!   z= 1    C(3,1)>    B(8,1)>   B(13,1)>  B(17,1)>
//! ```
//!
//! An eastbound chain signal guards the switch at (5, 0). One train stands
//! on the main line between the block signals; a second waits at the chain
//! signal, routed around the loop.

use signals_types::{Heading, Position, SignalKind};

use crate::error::NetworkError;
use crate::graph::NetworkGraph;
use crate::index::NetworkIndex;
use crate::train::{Route, Train};

/// Positions of the demo signals, for looking up their lamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoSignals {
    /// Chain signal in front of the switch.
    pub approach: Position,
    /// Block signal entering the main line.
    pub main_entry: Position,
    /// Block signal entering the loop.
    pub loop_entry: Position,
    /// Block signal leaving the main line towards the merge.
    pub main_exit: Position,
    /// Block signal leaving the loop towards the merge.
    pub loop_exit: Position,
    /// Block signal beyond the merge.
    pub departure: Position,
}

impl DemoSignals {
    /// Every demo signal with a short name, for logging.
    pub const fn named(&self) -> [(&'static str, Position); 6] {
        [
            ("approach", self.approach),
            ("main_entry", self.main_entry),
            ("loop_entry", self.loop_entry),
            ("main_exit", self.main_exit),
            ("loop_exit", self.loop_exit),
            ("departure", self.departure),
        ]
    }
}

/// Build the demo index.
///
/// # Errors
///
/// Returns [`NetworkError`] if the hard-coded layout overlaps itself.
pub fn create_demo_network() -> Result<(NetworkIndex, DemoSignals), NetworkError> {
    let mut index = NetworkIndex::new();

    // Main line and passing loop.
    index.add_rail_run(Position::new(0, 0), Heading::East, 21)?;
    index.add_rail_run(Position::new(5, -1), Heading::North, 2)?;
    index.add_rail_run(Position::new(5, -3), Heading::East, 11)?;
    index.add_rail_run(Position::new(15, -2), Heading::South, 2)?;

    let signals = DemoSignals {
        approach: Position::new(3, 1),
        main_entry: Position::new(8, 1),
        loop_entry: Position::new(8, -4),
        main_exit: Position::new(13, 1),
        loop_exit: Position::new(13, -4),
        departure: Position::new(17, 1),
    };

    index.add_signal(signals.approach, Heading::East, SignalKind::Chain)?;
    for block in [
        signals.main_entry,
        signals.loop_entry,
        signals.main_exit,
        signals.loop_exit,
        signals.departure,
    ] {
        index.add_signal(block, Heading::East, SignalKind::Block)?;
    }

    Ok((index, signals))
}

/// Trains for the demo: one blocking the main line, one routed via the loop
/// and waiting at the approach signal.
pub fn demo_trains(graph: &NetworkGraph) -> Vec<Train> {
    let blocker = Train::new([Position::new(10, 0), Position::new(11, 0)]);

    let route = Route::new(
        [
            Position::new(1, 0),
            Position::new(10, -3),
            Position::new(18, 0),
        ]
        .into_iter()
        .filter_map(|rail| graph.edge_containing(rail))
        .cloned()
        .collect(),
    );
    let waiting = Train::new([Position::new(2, 0), Position::new(3, 0)]);

    vec![blocker, waiting.with_route(route)]
}

#[cfg(test)]
mod tests {
    use signals_types::LampStatus;

    use super::*;
    use crate::edge::{Edge, ZeroDirectionalPolicy};
    use crate::state::evaluate;

    fn demo_graph() -> Option<(NetworkGraph, DemoSignals)> {
        let (index, signals) = create_demo_network().ok()?;
        let graph = NetworkGraph::compile(index, ZeroDirectionalPolicy::default()).ok()?;
        Some((graph, signals))
    }

    #[test]
    fn demo_network_builds() {
        let result = create_demo_network();
        assert!(result.is_ok());
        if let Ok((index, signals)) = result {
            assert_eq!(index.rails().count(), 36);
            assert_eq!(index.signals().count(), 6);
            assert!(signals.named().iter().all(|&(_, p)| index.signal(p).is_some()));
        }
    }

    #[test]
    fn demo_graph_has_loop_and_main_line() {
        let demo = demo_graph();
        assert!(demo.is_some());
        if let Some((graph, _)) = demo {
            // Approach, main, loop, departure.
            assert_eq!(graph.edge_count(), 4);
            assert!(graph.edges().iter().all(Edge::is_unidirectional));
            assert_eq!(graph.edges_at(Position::new(5, 0)).len(), 3);
        }
    }

    #[test]
    fn demo_route_spans_three_edges() {
        if let Some((graph, _)) = demo_graph() {
            let trains = demo_trains(&graph);
            let route = trains.get(1).and_then(|train| train.route.as_ref());
            assert_eq!(route.map(Route::len), Some(3));
        }
    }

    #[test]
    fn demo_lamps() {
        let demo = demo_graph();
        assert!(demo.is_some());
        if let Some((graph, signals)) = demo {
            let trains = demo_trains(&graph);
            let state = evaluate(&graph, &trains);
            assert_eq!(state.lamp_status(signals.main_entry), LampStatus::Red);
            assert_eq!(state.lamp_status(signals.loop_entry), LampStatus::Green);
            assert_eq!(state.lamp_status(signals.departure), LampStatus::Green);
            // Routed around the loop.
            assert_eq!(state.lamp_status(signals.approach), LampStatus::Green);

            let unrouted: Vec<Train> = trains
                .into_iter()
                .map(|mut train| {
                    train.route = None;
                    train
                })
                .collect();
            let state = evaluate(&graph, &unrouted);
            assert_eq!(state.lamp_status(signals.approach), LampStatus::Yellow);
        }
    }
}
