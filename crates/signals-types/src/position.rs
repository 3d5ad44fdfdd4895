//! Grid positions and headings.
//!
//! The network lives on a 4-connected horizontal grid. A [`Position`] has a
//! total order (lexicographic on `x`, then `z`) which the edge builder uses
//! to pick one canonical orientation for bidirectional edges. The order has
//! no geographic meaning.

use serde::{Deserialize, Serialize};

/// One of the four grid directions.
///
/// `North` decreases `z`, `South` increases it; `West` decreases `x`,
/// `East` increases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// Towards negative `z`.
    North,
    /// Towards positive `x`.
    East,
    /// Towards positive `z`.
    South,
    /// Towards negative `x`.
    West,
}

impl Heading {
    /// All headings in clockwise order starting at [`Heading::North`].
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// The heading pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// The heading a quarter turn clockwise.
    #[must_use]
    pub const fn rotate_cw(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// The heading a quarter turn counter-clockwise.
    #[must_use]
    pub const fn rotate_ccw(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
        }
    }

    /// Unit step `(dx, dz)` for this heading.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

impl core::fmt::Display for Heading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(name)
    }
}

/// A cell on the network grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// East-west coordinate.
    pub x: i32,
    /// North-south coordinate.
    pub z: i32,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The adjacent position one step in `heading`.
    ///
    /// Coordinates saturate at the grid limits.
    #[must_use]
    pub const fn offset(self, heading: Heading) -> Self {
        let (dx, dz) = heading.delta();
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// The position `steps` cells away in `heading`.
    #[must_use]
    pub const fn offset_by(self, heading: Heading, steps: i32) -> Self {
        let (dx, dz) = heading.delta();
        Self {
            x: self.x.saturating_add(dx.saturating_mul(steps)),
            z: self.z.saturating_add(dz.saturating_mul(steps)),
        }
    }

    /// The heading from `other` to `self`, when the two are 4-adjacent.
    ///
    /// Returns `None` for equal, diagonal or distant positions.
    pub fn relative_heading(self, other: Self) -> Option<Heading> {
        let dx = self.x.checked_sub(other.x)?;
        let dz = self.z.checked_sub(other.z)?;
        Heading::ALL
            .into_iter()
            .find(|heading| heading.delta() == (dx, dz))
    }

    /// The adjacent position one step in `heading`, or `None` past the
    /// grid limits.
    pub fn checked_offset(self, heading: Heading) -> Option<Self> {
        let (dx, dz) = heading.delta();
        Some(Self {
            x: self.x.checked_add(dx)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// The adjacent positions, paired with the heading that leads there.
    ///
    /// Cells on the grid limits have fewer than four.
    pub fn neighbors(self) -> impl Iterator<Item = (Heading, Self)> {
        Heading::ALL
            .into_iter()
            .filter_map(move |heading| Some((heading, self.checked_offset(heading)?)))
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        for heading in Heading::ALL {
            assert_eq!(heading.opposite().opposite(), heading);
            assert_ne!(heading.opposite(), heading);
        }
    }

    #[test]
    fn rotations_cancel() {
        for heading in Heading::ALL {
            assert_eq!(heading.rotate_cw().rotate_ccw(), heading);
            assert_eq!(heading.rotate_cw().rotate_cw(), heading.opposite());
        }
    }

    #[test]
    fn relative_heading_points_from_other_to_self() {
        let origin = Position::new(0, 0);
        assert_eq!(
            Position::new(1, 0).relative_heading(origin),
            Some(Heading::East)
        );
        assert_eq!(
            Position::new(0, -1).relative_heading(origin),
            Some(Heading::North)
        );
        assert_eq!(
            origin.relative_heading(Position::new(0, -1)),
            Some(Heading::South)
        );
    }

    #[test]
    fn relative_heading_requires_adjacency() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.relative_heading(origin), None);
        assert_eq!(Position::new(1, 1).relative_heading(origin), None);
        assert_eq!(Position::new(2, 0).relative_heading(origin), None);
    }

    #[test]
    fn offset_then_heading_agree() {
        let start = Position::new(4, -7);
        for heading in Heading::ALL {
            assert_eq!(start.offset(heading).relative_heading(start), Some(heading));
        }
        assert_eq!(start.offset_by(Heading::East, 3), Position::new(7, -7));
    }

    #[test]
    fn neighbors_stop_at_grid_limits() {
        assert_eq!(Position::new(0, 0).neighbors().count(), 4);
        let corner = Position::new(i32::MAX, i32::MIN);
        let around: Vec<(Heading, Position)> = corner.neighbors().collect();
        assert_eq!(
            around,
            vec![
                (Heading::South, Position::new(i32::MAX, -2_147_483_647)),
                (Heading::West, Position::new(2_147_483_646, i32::MIN)),
            ]
        );
        assert!(around.iter().all(|&(_, p)| p != corner));
    }

    #[test]
    fn order_is_x_then_z() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(1, 0) < Position::new(1, 1));
    }
}
