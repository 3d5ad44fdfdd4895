//! The closed set of network object kinds.
//!
//! Every cell of the network holds at most one [`NetworkObject`]. The kind
//! set is fixed, so call sites match exhaustively; adding a kind forces each
//! of them to be revisited.

use serde::{Deserialize, Serialize};
use signals_types::{Heading, Position, RailShape, SignalKind};

/// A single piece of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RailCell {
    /// Where the rail lies.
    pub position: Position,
    /// Curvature and ascent; decides which neighbours the rail joins.
    pub shape: RailShape,
}

/// A signal standing beside a rail.
///
/// The signal is attached to the rail on either side of it, perpendicular to
/// its heading; see [`NetworkIndex::signal_rail`].
///
/// [`NetworkIndex::signal_rail`]: crate::index::NetworkIndex::signal_rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal {
    /// Where the signal stands.
    pub position: Position,
    /// Direction a train must travel to obey this signal.
    pub heading: Heading,
    /// Block or chain.
    pub kind: SignalKind,
}

impl Signal {
    /// Whether this is a chain signal.
    pub const fn is_chain(&self) -> bool {
        matches!(self.kind, SignalKind::Chain)
    }
}

/// A device beside a rail that joins it to a distant rail cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RailLink {
    /// Where the link stands.
    pub position: Position,
    /// The rail cell trains reappear on, if the link is configured.
    pub destination: Option<Position>,
}

/// Anything that can occupy a network cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkObject {
    /// A rail cell.
    Rail(RailCell),
    /// A block or chain signal.
    Signal(Signal),
    /// A rail link.
    Link(RailLink),
}

impl NetworkObject {
    /// The cell this object occupies.
    pub const fn position(&self) -> Position {
        match self {
            Self::Rail(rail) => rail.position,
            Self::Signal(signal) => signal.position,
            Self::Link(link) => link.position,
        }
    }

    /// The rail cell, if this object is one.
    pub const fn as_rail(&self) -> Option<&RailCell> {
        match self {
            Self::Rail(rail) => Some(rail),
            Self::Signal(_) | Self::Link(_) => None,
        }
    }

    /// The signal, if this object is one.
    pub const fn as_signal(&self) -> Option<&Signal> {
        match self {
            Self::Signal(signal) => Some(signal),
            Self::Rail(_) | Self::Link(_) => None,
        }
    }

    /// The link, if this object is one.
    pub const fn as_link(&self) -> Option<&RailLink> {
        match self {
            Self::Link(link) => Some(link),
            Self::Rail(_) | Self::Signal(_) => None,
        }
    }
}

impl From<RailCell> for NetworkObject {
    fn from(rail: RailCell) -> Self {
        Self::Rail(rail)
    }
}

impl From<Signal> for NetworkObject {
    fn from(signal: Signal) -> Self {
        Self::Signal(signal)
    }
}

impl From<RailLink> for NetworkObject {
    fn from(link: RailLink) -> Self {
        Self::Link(link)
    }
}
