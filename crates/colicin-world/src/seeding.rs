//! Initial population of a world from strain proportions.
//!
//! Each strain receives `floor(sites * proportion)` positions. Whatever is
//! left over stays empty, and the resulting cells are shuffled across the
//! grid so placement is uniform.

use std::collections::BTreeMap;

use colicin_types::{Cell, Strain};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorldError;
use crate::world::World;

/// Slack allowed when checking that proportions add up to at most 1, to
/// absorb floating-point accumulation in sums such as ten times `0.1`.
const TOTAL_TOLERANCE: f64 = 1e-9;

/// Fraction of the grid each strain occupies at seeding time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedProportions(BTreeMap<Strain, f64>);

impl SeedProportions {
    /// Build validated proportions.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn new(proportions: BTreeMap<Strain, f64>) -> Result<Self, WorldError> {
        let seeds = Self(proportions);
        seeds.validate()?;
        Ok(seeds)
    }

    /// Build validated proportions from `(strain, proportion)` pairs.
    ///
    /// A strain listed twice keeps its last proportion.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Strain, f64)>,
    ) -> Result<Self, WorldError> {
        Self::new(pairs.into_iter().collect())
    }

    /// Check every proportion lies in `[0, 1]` and the total is at most 1.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidProportion`] for a single bad value or
    /// [`WorldError::ProportionsExceedOne`] if the total exceeds 1.
    pub fn validate(&self) -> Result<(), WorldError> {
        for (&strain, &proportion) in &self.0 {
            if !proportion.is_finite() || !(0.0..=1.0).contains(&proportion) {
                return Err(WorldError::InvalidProportion { strain, proportion });
            }
        }
        let total = self.total();
        if total > 1.0 + TOTAL_TOLERANCE {
            return Err(WorldError::ProportionsExceedOne { total });
        }
        Ok(())
    }

    /// Sum of all proportions.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Proportion for one strain (0 when unlisted).
    pub fn get(&self, strain: Strain) -> f64 {
        self.0.get(&strain).copied().unwrap_or(0.0)
    }

    /// Iterate over `(strain, proportion)` in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (Strain, f64)> + '_ {
        self.0.iter().map(|(&strain, &proportion)| (strain, proportion))
    }

    /// Whether no strain is listed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Strain, f64)> for SeedProportions {
    /// Collect pairs without validating them; [`seed_cells`] validates
    /// before use.
    fn from_iter<I: IntoIterator<Item = (Strain, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build the unshuffled cell list for a grid of `site_count` sites.
///
/// Strains appear in tag order, each as a contiguous run of
/// `floor(site_count * proportion)` cells, followed by empty cells up to
/// `site_count`.
///
/// # Errors
///
/// Returns the validation errors of [`SeedProportions::validate`].
pub fn seed_cells(
    site_count: usize,
    proportions: &SeedProportions,
) -> Result<Vec<Cell>, WorldError> {
    proportions.validate()?;

    let mut cells = Vec::with_capacity(site_count);
    for (strain, proportion) in proportions.iter() {
        let count = share_of(site_count, proportion);
        cells.extend(std::iter::repeat_n(Cell::with_strain(strain), count));
    }
    cells.truncate(site_count);
    cells.resize(site_count, Cell::empty());
    Ok(cells)
}

/// Populate `world` from `proportions` and shuffle placement with `rng`.
///
/// Every site is overwritten; colicin and phage are cleared.
///
/// # Errors
///
/// Returns the validation errors of [`SeedProportions::validate`].
pub fn seed_world(
    world: &mut World,
    proportions: &SeedProportions,
    rng: &mut impl Rng,
) -> Result<(), WorldError> {
    let mut cells = seed_cells(world.site_count(), proportions)?;
    cells.shuffle(rng);
    world.replace_cells(cells)?;
    info!(
        width = world.width(),
        height = world.height(),
        total_proportion = proportions.total(),
        "World seeded"
    );
    Ok(())
}

/// `floor(site_count * proportion)`, truncating toward zero.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn share_of(site_count: usize, proportion: f64) -> usize {
    let share = (site_count as f64 * proportion).floor();
    if share <= 0.0 { 0 } else { share as usize }
}
