//! Generation cycle: the 4-phase engine loop that drives the simulation.
//!
//! Each generation runs these phases in order, each a full pass over the
//! grid:
//!
//! 1. **Induction** -- every site is induced with probability
//!    `induction_probability`. An induced lysogen releases colicin and/or
//!    phage onto its own site and its lysis neighborhood, and any strain
//!    that can lyse is replaced by an empty site.
//!
//! 2. **Death** -- a cell dies if its site carries colicin and it is not
//!    colicin-immune, or carries phage and it is not phage-immune. Each site
//!    only reads itself, so visiting order does not matter.
//!
//! 3. **Decay** -- free colicin and phage age by one generation.
//!
//! 4. **Replication** -- sites are visited in a freshly shuffled order.
//!    A cell replicates with its strain's replication probability into one
//!    site chosen uniformly from its dispersal candidates, overwriting
//!    whatever lives there.
//!
//! The cycle is deterministic given the same initial state and random
//! source.

use colicin_types::{Position, StrainCosts};
use colicin_world::{StrainCounts, World, WorldError};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Probability that a site is induced in a generation.
pub const DEFAULT_INDUCTION_PROBABILITY: f64 = 0.0037;

/// Generations free colicin lingers after release.
pub const DEFAULT_COLICIN_PERSISTENCE: u32 = 10;

/// Generations free phage lingers after release.
pub const DEFAULT_PHAGE_PERSISTENCE: u32 = 3;

/// Radius of the default square lysis neighborhood.
pub const DEFAULT_LYSIS_RADIUS: u32 = 2;

/// Candidate sites drawn per replication in a well-mixed world.
pub const DEFAULT_MIXED_DISPERSAL_TARGETS: usize = 4;

/// Errors that can occur during generation execution.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The engine parameters cannot be used with this world.
    #[error("invalid dynamics: {reason}")]
    InvalidDynamics {
        /// Explanation of what is wrong.
        reason: String,
    },
}

/// Which sites receive colicin and phage when a cell lyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LysisSpread {
    /// The four adjacent sites.
    VonNeumann,
    /// The square block of the given radius around the lysing cell.
    Radius(u32),
}

impl LysisSpread {
    /// The sites (other than the lysing one) reached from `position`.
    pub fn targets(self, world: &World, position: Position) -> Vec<Position> {
        match self {
            Self::VonNeumann => world.four_neighbors(position).to_vec(),
            Self::Radius(radius) => world.radius_neighbors(position, radius),
        }
    }
}

/// How offspring are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispersalMode {
    /// Spatially structured: offspring land on one of the four adjacent
    /// sites.
    Structured,
    /// Well-mixed: offspring land on one of `targets` sites drawn from the
    /// whole grid.
    Mixed {
        /// Number of distinct candidate sites drawn per replication.
        targets: usize,
    },
}

/// Parameters of the generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dynamics {
    /// Per-site, per-generation induction probability.
    pub induction_probability: f64,
    /// Counter value written when colicin is released onto a site.
    pub colicin_persistence: u32,
    /// Counter value written when phage is released onto a site.
    pub phage_persistence: u32,
    /// Lysis neighborhood.
    pub lysis_spread: LysisSpread,
    /// Offspring placement.
    pub dispersal: DispersalMode,
    /// Replication costs.
    pub costs: StrainCosts,
}

impl Default for Dynamics {
    fn default() -> Self {
        Self {
            induction_probability: DEFAULT_INDUCTION_PROBABILITY,
            colicin_persistence: DEFAULT_COLICIN_PERSISTENCE,
            phage_persistence: DEFAULT_PHAGE_PERSISTENCE,
            lysis_spread: LysisSpread::Radius(DEFAULT_LYSIS_RADIUS),
            dispersal: DispersalMode::Structured,
            costs: StrainCosts::default(),
        }
    }
}

impl Dynamics {
    /// Check these parameters can drive `world`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidDynamics`] if the induction
    /// probability is outside `[0, 1]`, a well-mixed dispersal asks for
    /// zero candidates or at least as many candidates as the grid has sites,
    /// the lysis radius exceeds the longest grid side, or the replication
    /// costs could make a replication rate negative.
    pub fn validate_for(&self, world: &World) -> Result<(), GenerationError> {
        if !(0.0..=1.0).contains(&self.induction_probability) {
            return Err(GenerationError::InvalidDynamics {
                reason: format!(
                    "induction probability {} is outside [0, 1]",
                    self.induction_probability
                ),
            });
        }
        if let DispersalMode::Mixed { targets } = self.dispersal {
            if targets == 0 {
                return Err(GenerationError::InvalidDynamics {
                    reason: "well-mixed dispersal needs at least one target".to_owned(),
                });
            }
            if targets >= world.site_count() {
                return Err(GenerationError::InvalidDynamics {
                    reason: format!(
                        "well-mixed dispersal draws {targets} targets from {} sites",
                        world.site_count()
                    ),
                });
            }
        }
        if let LysisSpread::Radius(radius) = self.lysis_spread {
            let longest_side = world.width().max(world.height());
            if usize::try_from(radius).unwrap_or(usize::MAX) > longest_side {
                return Err(GenerationError::InvalidDynamics {
                    reason: format!("lysis radius {radius} exceeds the grid side {longest_side}"),
                });
            }
        }
        let StrainCosts { colicin, phage } = self.costs;
        let unit = 0.0..=1.0;
        if !unit.contains(&colicin) || !unit.contains(&phage) || colicin + phage > 1.0 {
            return Err(GenerationError::InvalidDynamics {
                reason: format!("replication costs {colicin} and {phage} are out of range"),
            });
        }
        Ok(())
    }
}

/// Deaths recorded by one death phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathTally {
    /// Cells killed by colicin.
    pub colicin: usize,
    /// Cells killed by phage (and not already by colicin).
    pub phage: usize,
}

/// Summary of a single generation's execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// The generation that just completed (the first advance is 1).
    pub generation: u64,
    /// Cells that lysed during induction.
    pub lysed: usize,
    /// Deaths in the death phase.
    pub deaths: DeathTally,
    /// Successful replications.
    pub replications: usize,
    /// Occupant counts after the generation.
    pub counts: StrainCounts,
}

/// The mutable simulation state passed through the generation cycle.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Number of generations completed.
    pub generation: u64,
    /// The grid.
    pub world: World,
    /// Cycle parameters.
    pub dynamics: Dynamics,
}

impl SimulationState {
    /// Bundle a seeded world with its cycle parameters at generation 0.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidDynamics`] if `dynamics` cannot
    /// drive `world`.
    pub fn new(world: World, dynamics: Dynamics) -> Result<Self, GenerationError> {
        dynamics.validate_for(&world)?;
        Ok(Self {
            generation: 0,
            world,
            dynamics,
        })
    }
}

/// Execute one complete generation.
///
/// Runs Induction, Death, Decay, and Replication in order, advances the
/// generation counter, and returns a summary.
pub fn run_generation(
    state: &mut SimulationState,
    rng: &mut impl Rng,
) -> Result<GenerationSummary, GenerationError> {
    let generation = state.generation.saturating_add(1);
    let SimulationState {
        world, dynamics, ..
    } = state;

    // --- Phase 1: Induction ---
    let lysed = phase_induction(world, dynamics, rng)?;
    trace!(generation, lysed, "Induction phase complete");

    // --- Phase 2: Death ---
    let deaths = phase_death(world);
    trace!(
        generation,
        colicin = deaths.colicin,
        phage = deaths.phage,
        "Death phase complete"
    );

    // --- Phase 3: Decay ---
    phase_decay(world);

    // --- Phase 4: Replication ---
    let replications = phase_replication(world, dynamics, rng)?;
    trace!(generation, replications, "Replication phase complete");

    state.generation = generation;
    let counts = state.world.strain_counts();
    debug!(
        generation,
        lysed,
        colicin_deaths = deaths.colicin,
        phage_deaths = deaths.phage,
        replications,
        occupied = counts.occupied(),
        "Generation complete"
    );

    Ok(GenerationSummary {
        generation,
        lysed,
        deaths,
        replications,
        counts,
    })
}

/// Phase 1: Induction.
///
/// Visits every site in row-major order and induces it with probability
/// `induction_probability`. Returns the number of cells that lysed.
pub fn phase_induction(
    world: &mut World,
    dynamics: &Dynamics,
    rng: &mut impl Rng,
) -> Result<usize, GenerationError> {
    let mut lysed: usize = 0;
    for position in world.positions() {
        let induced = rng.random::<f64>() < dynamics.induction_probability;
        if induced && induce_lysis(world, dynamics, position)? {
            lysed = lysed.saturating_add(1);
        }
    }
    Ok(lysed)
}

/// Induce the cell at `position`.
///
/// If the occupant releases colicin or phage, the agent is written onto the
/// focal site and every site of its lysis neighborhood. If the occupant can
/// lyse it is replaced by an empty site. Returns whether it lysed.
pub fn induce_lysis(
    world: &mut World,
    dynamics: &Dynamics,
    position: Position,
) -> Result<bool, GenerationError> {
    let strain = world.try_cell(position)?.strain;
    let release_colicin = strain.can_release_colicin();
    let release_phage = strain.can_release_phage();

    if release_colicin || release_phage {
        let mut reached = dynamics.lysis_spread.targets(world, position);
        reached.push(position);
        for target in reached {
            let cell = world.try_cell_mut(target)?;
            if release_colicin {
                cell.colicin = dynamics.colicin_persistence;
            }
            if release_phage {
                cell.phage = dynamics.phage_persistence;
            }
        }
    }

    if strain.can_lyse() {
        world.try_cell_mut(position)?.clear_occupant();
        return Ok(true);
    }
    Ok(false)
}

/// Phase 2: Death.
///
/// Kills every cell standing on colicin it is not immune to, or on phage it
/// is not immune to.
pub fn phase_death(world: &mut World) -> DeathTally {
    let mut tally = DeathTally::default();
    for cell in world.cells_mut() {
        let strain = cell.strain;
        if strain.is_empty() {
            continue;
        }
        if cell.has_colicin() && !strain.is_immune_to_colicin() {
            cell.clear_occupant();
            tally.colicin = tally.colicin.saturating_add(1);
        } else if cell.has_phage() && !strain.is_immune_to_phage() {
            cell.clear_occupant();
            tally.phage = tally.phage.saturating_add(1);
        }
    }
    tally
}

/// Phase 3: Decay.
///
/// Lowers every colicin and phage counter by one, stopping at zero.
pub fn phase_decay(world: &mut World) {
    for cell in world.cells_mut() {
        cell.decay();
    }
}

/// Phase 4: Replication.
///
/// Visits every site once in a shuffled order. The occupant at visit time
/// replicates if a uniform draw falls below its replication rate; the copy
/// overwrites one randomly chosen dispersal candidate. Returns the number
/// of successful replications.
pub fn phase_replication(
    world: &mut World,
    dynamics: &Dynamics,
    rng: &mut impl Rng,
) -> Result<usize, GenerationError> {
    let mut order: Vec<Position> = world.positions().collect();
    order.shuffle(rng);

    let mut replications: usize = 0;
    for position in order {
        let strain = world.try_cell(position)?.strain;
        if rng.random::<f64>() >= strain.replication_rate(&dynamics.costs) {
            continue;
        }
        if let Some(target) = dispersal_target(world, dynamics.dispersal, position, rng)? {
            world.set_strain(target, strain)?;
            replications = replications.saturating_add(1);
        }
    }
    Ok(replications)
}

/// Pick the site an offspring of the cell at `position` lands on.
fn dispersal_target(
    world: &World,
    dispersal: DispersalMode,
    position: Position,
    rng: &mut impl Rng,
) -> Result<Option<Position>, GenerationError> {
    let target = match dispersal {
        DispersalMode::Structured => world.four_neighbors(position).choose(rng).copied(),
        DispersalMode::Mixed { targets } => world
            .random_distinct_neighbors(position, targets, rng)?
            .choose(rng)
            .copied(),
    };
    Ok(target)
}
