//! Read-only views of a world for reporting between generations.

use std::collections::BTreeMap;

use colicin_types::Strain;
use serde::{Deserialize, Serialize};

use crate::world::World;

/// Number of sites occupied by each strain.
///
/// Always holds an entry for every strain, including zero counts, so
/// reports list all seven tags in the same order every generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrainCounts(BTreeMap<Strain, usize>);

impl StrainCounts {
    /// All-zero counts.
    pub fn zeroed() -> Self {
        Self(Strain::ALL.into_iter().map(|s| (s, 0)).collect())
    }

    /// Tally a sequence of occupants.
    pub fn from_strains(strains: impl IntoIterator<Item = Strain>) -> Self {
        let mut counts = Self::zeroed();
        for strain in strains {
            counts.increment(strain);
        }
        counts
    }

    /// Tally every site of `world`.
    pub fn from_world(world: &World) -> Self {
        Self::from_strains(world.cells().iter().map(|cell| cell.strain))
    }

    /// Count for one strain.
    pub fn get(&self, strain: Strain) -> usize {
        self.0.get(&strain).copied().unwrap_or(0)
    }

    /// Sum over all strains, including empty sites.
    pub fn total(&self) -> usize {
        self.0.values().copied().fold(0, usize::saturating_add)
    }

    /// Number of sites holding a living cell.
    pub fn occupied(&self) -> usize {
        self.total().saturating_sub(self.get(Strain::Empty))
    }

    /// `(strain, count)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (Strain, usize)> + '_ {
        self.0.iter().map(|(&strain, &count)| (strain, count))
    }

    fn increment(&mut self, strain: Strain) {
        let entry = self.0.entry(strain).or_insert(0);
        *entry = entry.saturating_add(1);
    }
}

impl Default for StrainCounts {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl World {
    /// Per-strain occupant counts across the whole grid.
    pub fn strain_counts(&self) -> StrainCounts {
        StrainCounts::from_world(self)
    }

    /// Occupant of every site, row-major.
    pub fn strain_layout(&self) -> Vec<Strain> {
        self.cells().iter().map(|cell| cell.strain).collect()
    }

    /// Occupants grouped into rows, top row first.
    pub fn rows(&self) -> Vec<Vec<Strain>> {
        self.cells()
            .chunks(self.width())
            .map(|row| row.iter().map(|cell| cell.strain).collect())
            .collect()
    }
}
