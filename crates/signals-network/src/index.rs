//! Spatial index of network objects.
//!
//! The [`NetworkIndex`] is what the world binding fills in: one
//! [`NetworkObject`] per cell, keyed by [`Position`]. Two adjacent rails
//! connect when either one's [`RailShape`] leads towards the other, so
//! parallel tracks stay apart while a rail running into the side of a track
//! forms a switch. Links additionally connect the rails beside them to their
//! destination rail.
//!
//! Signals mark section boundaries. A signal attached to rail `B` and facing
//! `h` separates `B - h` from `B`: a train travelling in `h` passes the
//! signal as it enters `B`.

use std::collections::BTreeMap;

use signals_types::{Heading, Position, RailShape, SignalKind};

use crate::error::NetworkError;
use crate::object::{NetworkObject, RailCell, RailLink, Signal};

/// Lookup from position to the network object occupying it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkIndex {
    /// All objects indexed by their position.
    objects: BTreeMap<Position, NetworkObject>,
}

impl NetworkIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Insert an object into its cell.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateObject`] if the cell is taken.
    pub fn insert(&mut self, object: impl Into<NetworkObject>) -> Result<(), NetworkError> {
        let object = object.into();
        let position = object.position();
        if self.objects.contains_key(&position) {
            return Err(NetworkError::DuplicateObject(position));
        }
        self.objects.insert(position, object);
        Ok(())
    }

    /// Remove and return the object at `position`.
    pub fn remove(&mut self, position: Position) -> Option<NetworkObject> {
        self.objects.remove(&position)
    }

    /// Add a rail cell.
    pub fn add_rail(&mut self, position: Position, shape: RailShape) -> Result<(), NetworkError> {
        self.insert(RailCell { position, shape })
    }

    /// Lay `count` straight rails from `start` towards `heading`.
    ///
    /// Returns the position of the last rail laid.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::MalformedPath`] for an empty run, or
    /// [`NetworkError::DuplicateObject`] if a cell is taken.
    pub fn add_rail_run(
        &mut self,
        start: Position,
        heading: Heading,
        count: usize,
    ) -> Result<Position, NetworkError> {
        if count == 0 {
            return Err(NetworkError::MalformedPath { length: 0 });
        }
        let shape = match heading {
            Heading::North | Heading::South => RailShape::NorthSouth,
            Heading::East | Heading::West => RailShape::EastWest,
        };
        let mut position = start;
        let mut last = start;
        for _ in 0..count {
            self.add_rail(position, shape)?;
            last = position;
            position = position.offset(heading);
        }
        Ok(last)
    }

    /// Add a signal.
    pub fn add_signal(
        &mut self,
        position: Position,
        heading: Heading,
        kind: SignalKind,
    ) -> Result<(), NetworkError> {
        self.insert(Signal {
            position,
            heading,
            kind,
        })
    }

    /// Add a rail link.
    pub fn add_link(
        &mut self,
        position: Position,
        destination: Option<Position>,
    ) -> Result<(), NetworkError> {
        self.insert(RailLink {
            position,
            destination,
        })
    }

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    /// The object at `position`, if any.
    pub fn get(&self, position: Position) -> Option<&NetworkObject> {
        self.objects.get(&position)
    }

    /// Whether a rail lies at `position`.
    pub fn is_rail(&self, position: Position) -> bool {
        self.get(position).is_some_and(|object| object.as_rail().is_some())
    }

    /// The signal at `position`, if any.
    pub fn signal(&self, position: Position) -> Option<&Signal> {
        self.get(position).and_then(NetworkObject::as_signal)
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the index holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all objects in position order.
    pub fn objects(&self) -> impl Iterator<Item = &NetworkObject> {
        self.objects.values()
    }

    /// Iterate over all rail cells in position order.
    pub fn rails(&self) -> impl Iterator<Item = &RailCell> {
        self.objects.values().filter_map(NetworkObject::as_rail)
    }

    /// Iterate over all signals in position order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.objects.values().filter_map(NetworkObject::as_signal)
    }

    /// Iterate over all links in position order.
    pub fn links(&self) -> impl Iterator<Item = &RailLink> {
        self.objects.values().filter_map(NetworkObject::as_link)
    }

    // -------------------------------------------------------------------
    // Adjacency
    // -------------------------------------------------------------------

    /// The rail cell at `position`, if any.
    pub fn rail(&self, position: Position) -> Option<&RailCell> {
        self.get(position).and_then(NetworkObject::as_rail)
    }

    /// Whether the rails at `from` and the adjacent `to` are joined.
    ///
    /// Either rail leading towards the other is enough; a rail ending
    /// against the side of a track joins it as a switch.
    pub fn connects(&self, from: Position, to: Position) -> bool {
        let (Some(from_rail), Some(to_rail)) = (self.rail(from), self.rail(to)) else {
            return false;
        };
        to.relative_heading(from).is_some_and(|travel| {
            from_rail.shape.leads(travel) || to_rail.shape.leads(travel.opposite())
        })
    }

    /// Rails joined to the rail at `position`, with the heading leading to
    /// each.
    pub fn adjacent_rails(&self, position: Position) -> Vec<(Heading, Position)> {
        position
            .neighbors()
            .filter(|&(_, neighbor)| self.connects(position, neighbor))
            .collect()
    }

    /// Destination rails of the links standing beside `position`.
    pub fn linked_rails(&self, position: Position) -> Vec<Position> {
        position
            .neighbors()
            .filter_map(|(_, neighbor)| self.get(neighbor).and_then(NetworkObject::as_link))
            .filter_map(|link| link.destination)
            .filter(|&destination| destination != position && self.is_rail(destination))
            .collect()
    }

    /// Whether a link stands beside `position`.
    pub fn is_beside_link(&self, position: Position) -> bool {
        position
            .neighbors()
            .any(|(_, neighbor)| self.get(neighbor).is_some_and(|o| o.as_link().is_some()))
    }

    /// The rail a signal is attached to.
    ///
    /// Looks clockwise of the signal's heading first, then
    /// counter-clockwise. A signal with no rail on either side is detached.
    pub fn signal_rail(&self, signal: &Signal) -> Option<Position> {
        [signal.heading.rotate_cw(), signal.heading.rotate_ccw()]
            .into_iter()
            .map(|side| signal.position.offset(side))
            .find(|&candidate| self.is_rail(candidate))
    }

    /// Signals attached to the rail at `rail`.
    pub fn signals_at_rail(&self, rail: Position) -> Vec<&Signal> {
        rail.neighbors()
            .filter_map(|(_, neighbor)| self.signal(neighbor))
            .filter(|signal| self.signal_rail(signal) == Some(rail))
            .collect()
    }

    /// Whether moving from rail `from` to the adjacent rail `to` passes a
    /// signal and therefore leaves the current section.
    ///
    /// Non-adjacent moves (through links) never cross a boundary.
    pub fn is_boundary(&self, from: Position, to: Position) -> bool {
        let Some(travel) = to.relative_heading(from) else {
            return false;
        };
        self.signals_at_rail(to).iter().any(|s| s.heading == travel)
            || self
                .signals_at_rail(from)
                .iter()
                .any(|s| s.heading == travel.opposite())
    }
}
