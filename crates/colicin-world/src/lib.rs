//! The spatial grid for the colicin/phage competition simulation.
//!
//! This crate owns the toroidal grid of sites and every query the
//! generation engine makes against it. Neighbor queries return
//! [`Position`] lists, never live references into the grid; all mutation
//! goes through [`World::cell_mut`] and friends.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid construction, access, and seeding.
//! - [`world`] -- [`World`]: flat site storage, wraparound addressing,
//!   row-major enumeration, and neighbor queries.
//! - [`seeding`] -- Initial population from strain proportions.
//! - [`observation`] -- Per-strain counts and row-major layouts.
//!
//! [`Position`]: colicin_types::Position

pub mod error;
pub mod observation;
pub mod seeding;
pub mod world;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use observation::StrainCounts;
pub use seeding::{SeedProportions, seed_cells, seed_world};
pub use world::World;
