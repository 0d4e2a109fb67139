//! Shared type definitions for the colicin/phage competition simulation.
//!
//! This crate holds the leaf types every other crate in the workspace
//! builds on: the fixed set of bacterial genotypes and their derived
//! capabilities, the per-site state stored in the grid, and grid positions.
//!
//! # Modules
//!
//! - [`strain`] -- The 7 genotype tags, capability queries, and replication
//!   probability.
//! - [`cell`] -- Per-site state: occupant strain plus colicin and phage
//!   persistence counters.
//! - [`position`] -- Grid coordinates.

pub mod cell;
pub mod position;
pub mod strain;

// Re-export all public types at crate root for convenience.
pub use cell::Cell;
pub use position::Position;
pub use strain::{
    DEFAULT_COLICIN_COST, DEFAULT_PHAGE_COST, ParseStrainError, Strain, StrainCosts,
};
