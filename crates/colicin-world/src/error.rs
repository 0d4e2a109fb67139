//! Error types for the `colicin-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type.

use colicin_types::{Position, Strain};

/// Errors that can occur during grid construction, access, and seeding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// More cells were supplied than the grid can hold.
    #[error("{supplied} cells supplied for a grid of {capacity} sites")]
    TooManyCells {
        /// Number of cells supplied.
        supplied: usize,
        /// Grid capacity (`width * height`).
        capacity: usize,
    },

    /// A position lies outside the grid.
    #[error("position {position} is outside a {width}x{height} grid")]
    OutOfBounds {
        /// The offending position.
        position: Position,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// Not enough non-focal sites exist to draw the requested sample.
    #[error("cannot draw {requested} distinct neighbors from {available} non-focal sites")]
    InsufficientPositions {
        /// Number of distinct positions requested.
        requested: usize,
        /// Number of non-focal positions on the grid.
        available: usize,
    },

    /// A seed proportion is negative, above 1, or not finite.
    #[error("seed proportion {proportion} for {strain} is outside [0, 1]")]
    InvalidProportion {
        /// The strain whose proportion is invalid.
        strain: Strain,
        /// The invalid value.
        proportion: f64,
    },

    /// Seed proportions add up to more than 1.
    #[error("seed proportions sum to {total}, which exceeds 1")]
    ProportionsExceedOne {
        /// The offending total.
        total: f64,
    },
}
