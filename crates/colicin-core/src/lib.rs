//! Generation cycle and orchestration for the colicin/phage competition
//! simulation.
//!
//! This crate owns the 4-phase generation cycle that drives the grid:
//! Induction, Death, Decay, and Replication.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `colicin-config.yaml` into
//!   strongly-typed structs.
//! - [`generation`] -- The 4-phase generation engine and its parameters.
//! - [`runner`] -- Seeds a world, advances it generation by generation, and
//!   reports every step to a [`GenerationCallback`].
//!
//! [`GenerationCallback`]: runner::GenerationCallback

pub mod config;
pub mod generation;
pub mod runner;
