//! Per-site state.
//!
//! A [`Cell`] is one grid site: the strain occupying it and how many more
//! generations free colicin and free phage linger there. A counter of `0`
//! means the agent is absent. Marking sets a counter to its configured
//! persistence; each decay step lowers it by one, never below zero. With a
//! persistence of 1 this is exactly a present/absent flag cleared every
//! generation.

use serde::{Deserialize, Serialize};

use crate::strain::Strain;

/// One grid site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Current occupant; [`Strain::Empty`] when nothing lives here.
    pub strain: Strain,
    /// Generations of free colicin remaining at this site.
    pub colicin: u32,
    /// Generations of free phage remaining at this site.
    pub phage: u32,
}

impl Cell {
    /// An empty site with no colicin or phage.
    pub const fn empty() -> Self {
        Self {
            strain: Strain::Empty,
            colicin: 0,
            phage: 0,
        }
    }

    /// A clean site occupied by `strain`.
    pub const fn with_strain(strain: Strain) -> Self {
        Self {
            strain,
            colicin: 0,
            phage: 0,
        }
    }

    /// Whether free colicin is present.
    pub const fn has_colicin(&self) -> bool {
        self.colicin > 0
    }

    /// Whether free phage is present.
    pub const fn has_phage(&self) -> bool {
        self.phage > 0
    }

    /// Age free colicin and phage by one generation.
    pub const fn decay(&mut self) {
        self.colicin = self.colicin.saturating_sub(1);
        self.phage = self.phage.saturating_sub(1);
    }

    /// Replace the occupant with [`Strain::Empty`], keeping colicin and phage.
    pub const fn clear_occupant(&mut self) {
        self.strain = Strain::Empty;
    }
}
