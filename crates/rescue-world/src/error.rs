//! Error types for the `rescue-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use rescue_types::Cell;

/// Errors that can occur while building or editing a grid.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The requested grid shape is empty or too large.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// More obstacles were requested than the grid interior can hold.
    #[error("cannot place {requested} obstacles, interior holds {capacity}")]
    TooManyObstacles {
        /// Requested obstacle count.
        requested: u32,
        /// Interior cells available.
        capacity: u32,
    },

    /// More hazards were requested than there are obstacle-free cells.
    #[error("cannot place {requested} hazards, only {capacity} free cells")]
    TooManyHazards {
        /// Requested hazard count.
        requested: u32,
        /// Obstacle-free cells available.
        capacity: u32,
    },

    /// A cell outside the grid was addressed.
    #[error("cell {0} is outside the grid")]
    OutOfBounds(Cell),
}
