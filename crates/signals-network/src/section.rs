//! Signal-bounded rail sections.
//!
//! A [`RailSection`] is the set of rails a train can reach from a signal's
//! rail without passing another signal. The section ahead of a signal is
//! what a block signal protects; the signals leading out of it are what a
//! chain signal looks at next.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use signals_types::Position;

use crate::index::NetworkIndex;
use crate::object::Signal;
use crate::train::Train;

/// Rails between one set of signals and the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RailSection {
    rails: BTreeSet<Position>,
}

impl RailSection {
    /// The section immediately ahead of `signal`, or `None` for a detached
    /// signal.
    pub fn ahead_of(index: &NetworkIndex, signal: &Signal) -> Option<Self> {
        index
            .signal_rail(signal)
            .map(|rail| Self::flood_from(index, rail))
    }

    /// Every rail connected to `start` without crossing a signal boundary.
    pub fn flood_from(index: &NetworkIndex, start: Position) -> Self {
        let mut rails = BTreeSet::new();
        if !index.is_rail(start) {
            return Self { rails };
        }

        let mut queue = VecDeque::new();
        rails.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let adjacent = index
                .adjacent_rails(current)
                .into_iter()
                .map(|(_, rail)| rail)
                .filter(|&rail| !index.is_boundary(current, rail));
            let linked = index.linked_rails(current);
            for rail in adjacent.chain(linked) {
                if rails.insert(rail) {
                    queue.push_back(rail);
                }
            }
        }

        Self { rails }
    }

    /// Whether `position` lies in the section.
    pub fn contains(&self, position: Position) -> bool {
        self.rails.contains(&position)
    }

    /// The rails of the section in position order.
    pub fn rails(&self) -> impl Iterator<Item = Position> + '_ {
        self.rails.iter().copied()
    }

    /// Number of rails in the section.
    pub fn len(&self) -> usize {
        self.rails.len()
    }

    /// Whether the section has no rails.
    pub fn is_empty(&self) -> bool {
        self.rails.is_empty()
    }

    /// Signals a train passes when leaving the section, in position order.
    ///
    /// A signal leads out of the section when it faces away from a section
    /// rail it borders: attached to rail `n`, facing `d`, with `n - d` in
    /// the section.
    pub fn next_signals<'a>(&self, index: &'a NetworkIndex) -> Vec<&'a Signal> {
        let mut found: BTreeMap<Position, &'a Signal> = BTreeMap::new();
        for &rail in &self.rails {
            for (travel, neighbor) in index.adjacent_rails(rail) {
                for signal in index.signals_at_rail(neighbor) {
                    if signal.heading == travel {
                        found.entry(signal.position).or_insert(signal);
                    }
                }
            }
        }
        found.into_values().collect()
    }

    /// Whether `train` occupies any rail of the section.
    pub fn is_occupied_by(&self, train: &Train) -> bool {
        train.positions.iter().any(|p| self.rails.contains(p))
    }

    /// Trains occupying any rail of the section.
    pub fn trains<'t>(&self, trains: &'t [Train]) -> impl Iterator<Item = &'t Train> {
        trains.iter().filter(|train| self.is_occupied_by(train))
    }
}
