//! Enumeration types for the rail signals network.

use serde::{Deserialize, Serialize};

use crate::position::Heading;

// ---------------------------------------------------------------------------
// Lamp status
// ---------------------------------------------------------------------------

/// The displayed state of a signal for one evaluation tick.
///
/// [`LampStatus::YellowBlinking`] is the default for any signal without a
/// committed status. The evaluator also uses it as its "not yet resolved"
/// marker while chain signals wait on each other. Renderers treat it as a
/// distinct visible state, not an error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LampStatus {
    /// Blocked: a train occupies the section ahead.
    Red,
    /// Provisionally clear; the next section is controlled by a chain
    /// signal whose outcome is not certain.
    Yellow,
    /// Clear.
    Green,
    /// Indeterminate.
    #[default]
    YellowBlinking,
}

impl LampStatus {
    /// Whether this status is the indeterminate marker.
    pub const fn is_unresolved(self) -> bool {
        matches!(self, Self::YellowBlinking)
    }
}

impl core::fmt::Display for LampStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::YellowBlinking => "yellow_blinking",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Signal kind
// ---------------------------------------------------------------------------

/// How a signal decides its lamp status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Depends only on occupancy of the section immediately ahead.
    Block,
    /// Additionally looks at the next signal(s) ahead.
    Chain,
}

// ---------------------------------------------------------------------------
// Rail shape
// ---------------------------------------------------------------------------

/// Curvature and ascent of a rail cell.
///
/// Each shape leads out of two sides of its cell. Ascending rails lead out of
/// the same sides as the flat rail they rise along.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RailShape {
    /// Straight, running north-south.
    #[default]
    NorthSouth,
    /// Straight, running east-west.
    EastWest,
    /// Straight and rising towards north.
    AscendingNorth,
    /// Straight and rising towards east.
    AscendingEast,
    /// Straight and rising towards south.
    AscendingSouth,
    /// Straight and rising towards west.
    AscendingWest,
    /// Curve joining the north and east sides.
    NorthEast,
    /// Curve joining the south and east sides.
    SouthEast,
    /// Curve joining the south and west sides.
    SouthWest,
    /// Curve joining the north and west sides.
    NorthWest,
}

impl RailShape {
    /// Whether the rail rises one block along its length.
    pub const fn is_ascending(self) -> bool {
        matches!(
            self,
            Self::AscendingNorth | Self::AscendingEast | Self::AscendingSouth | Self::AscendingWest
        )
    }

    /// Whether the rail bends.
    pub const fn is_curve(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// The two sides of the cell this rail leads out of.
    pub const fn sides(self) -> [Heading; 2] {
        match self {
            Self::NorthSouth | Self::AscendingNorth | Self::AscendingSouth => {
                [Heading::North, Heading::South]
            }
            Self::EastWest | Self::AscendingEast | Self::AscendingWest => {
                [Heading::East, Heading::West]
            }
            Self::NorthEast => [Heading::North, Heading::East],
            Self::SouthEast => [Heading::South, Heading::East],
            Self::SouthWest => [Heading::South, Heading::West],
            Self::NorthWest => [Heading::North, Heading::West],
        }
    }

    /// Whether the rail leads out of its cell towards `heading`.
    pub fn leads(self, heading: Heading) -> bool {
        self.sides().contains(&heading)
    }
}
