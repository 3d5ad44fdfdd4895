//! Error types for the `signals-network` crate.
//!
//! All fallible operations in this crate return [`NetworkError`]. Every
//! variant is a construction error: evaluation never fails.

use signals_types::Position;

/// Errors that can occur while indexing objects or compiling edges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// A raw path had fewer than two elements.
    #[error("malformed path: {length} element(s), at least 2 required")]
    MalformedPath {
        /// Number of elements in the rejected path.
        length: usize,
    },

    /// A path element is not a rail cell in the index.
    #[error("no rail at {0}")]
    NotARail(Position),

    /// Two consecutive path elements are not joined rails.
    #[error("path elements {from} and {to} are not adjacent")]
    NotAdjacent {
        /// Earlier element.
        from: Position,
        /// Later element.
        to: Position,
    },

    /// The path starts and ends at the same position.
    #[error("degenerate edge: starts and ends at {0}")]
    DegenerateEdge(Position),

    /// Distinct endpoints compared equal, so no canonical orientation exists.
    #[error("endpoints {first} and {last} have no canonical orientation")]
    AmbiguousOrientation {
        /// First element of the path.
        first: Position,
        /// Last element of the path.
        last: Position,
    },

    /// A position expected on an edge is not part of it.
    #[error("edge {start} -> {end} does not contain {position}")]
    PositionNotOnEdge {
        /// The missing position.
        position: Position,
        /// Start of the edge.
        start: Position,
        /// End of the edge.
        end: Position,
    },

    /// Signals along a run forbid travel in both directions and the
    /// configured policy rejects such runs.
    #[error("zero-directional edge between {start} and {end}")]
    ZeroDirectional {
        /// First element of the run.
        start: Position,
        /// Last element of the run.
        end: Position,
    },

    /// An object was inserted where one already exists.
    #[error("duplicate network object at {0}")]
    DuplicateObject(Position),
}
