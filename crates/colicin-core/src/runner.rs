//! Replicate runner.
//!
//! [`run_replicate`] seeds a fresh world, reports its initial state as
//! generation 0, then advances it one generation at a time, reporting each
//! to a [`GenerationCallback`]. Replicates share nothing: each owns its
//! world and its random stream, derived from the base seed with
//! [`derive_replicate_seed`].

use colicin_world::{StrainCounts, World, WorldError, seed_world};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::config::SimulationConfig;
use crate::generation::{self, GenerationError, SimulationState};

/// Odd multiplier spreading replicate indices across the seed space.
const REPLICATE_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Error type callbacks may return to abort a run.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during a replicate run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Building or seeding the world failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A generation failed.
    #[error("generation error: {source}")]
    Generation {
        /// The underlying generation error.
        #[from]
        source: GenerationError,
    },

    /// The callback rejected an observation.
    #[error("callback failed at generation {generation}: {source}")]
    Callback {
        /// Generation being reported.
        generation: u64,
        /// The error returned by the callback.
        source: CallbackError,
    },
}

/// A read-only view of a replicate after a generation.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    /// Generation just completed; 0 is the freshly seeded world.
    pub generation: u64,
    /// Occupant counts of `world`.
    pub counts: &'a StrainCounts,
    /// The grid itself.
    pub world: &'a World,
}

/// Callback invoked for the seeded world and after each generation.
///
/// Implementations write output files, collect time series, and the like.
pub trait GenerationCallback: Send {
    /// Called once per generation, starting with generation 0.
    ///
    /// # Errors
    ///
    /// Any error aborts the replicate.
    fn on_generation(&mut self, observation: &Observation<'_>) -> Result<(), CallbackError>;
}

/// A no-op callback for testing.
pub struct NoOpCallback;

impl GenerationCallback for NoOpCallback {
    fn on_generation(&mut self, _observation: &Observation<'_>) -> Result<(), CallbackError> {
        Ok(())
    }
}

/// Outcome of one replicate.
#[derive(Debug, Clone)]
pub struct ReplicateResult {
    /// Counts for generations `0..=generations`, indexed by generation.
    pub counts: Vec<StrainCounts>,
    /// The grid after the last generation.
    pub final_world: World,
}

impl ReplicateResult {
    /// Counts after the last generation.
    pub fn final_counts(&self) -> Option<&StrainCounts> {
        self.counts.last()
    }
}

/// Seed a world from `config` and run it for the configured number of
/// generations.
///
/// `callback` sees generation 0 (the seeded world) and every generation
/// after it, so it is called `generations + 1` times.
///
/// # Errors
///
/// Returns [`RunnerError`] if the world cannot be built or seeded, a
/// generation fails, or the callback returns an error.
pub fn run_replicate(
    config: &SimulationConfig,
    rng: &mut StdRng,
    callback: &mut dyn GenerationCallback,
) -> Result<ReplicateResult, RunnerError> {
    let run = &config.simulation;
    let mut world = World::new(run.width, run.height)?;
    seed_world(&mut world, &config.seed_proportions, rng)?;

    let mut state = SimulationState::new(world, config.to_dynamics())?;
    let mut counts = Vec::new();

    let initial = state.world.strain_counts();
    report(callback, 0, &initial, &state.world)?;
    counts.push(initial);

    while state.generation < run.generations {
        let summary = generation::run_generation(&mut state, rng)?;
        report(callback, summary.generation, &summary.counts, &state.world)?;
        counts.push(summary.counts);
    }

    if let Some(last) = counts.last() {
        info!(
            generations = state.generation,
            occupied = last.occupied(),
            "Replicate finished"
        );
    }

    Ok(ReplicateResult {
        counts,
        final_world: state.world,
    })
}

fn report(
    callback: &mut dyn GenerationCallback,
    generation: u64,
    counts: &StrainCounts,
    world: &World,
) -> Result<(), RunnerError> {
    let observation = Observation {
        generation,
        counts,
        world,
    };
    callback
        .on_generation(&observation)
        .map_err(|source| RunnerError::Callback { generation, source })
}

/// Seed of replicate `replicate` for a run with base seed `base`.
///
/// Replicate 0 uses the base seed itself.
pub fn derive_replicate_seed(base: u64, replicate: u32) -> u64 {
    let offset = u64::from(replicate).wrapping_mul(REPLICATE_SEED_STRIDE);
    base.wrapping_add(offset)
}

/// Independent random stream for one replicate.
pub fn replicate_rng(base: u64, replicate: u32) -> StdRng {
    StdRng::seed_from_u64(derive_replicate_seed(base, replicate))
}
