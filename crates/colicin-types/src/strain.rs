//! Bacterial genotypes and the capabilities derived from them.
//!
//! A [`Strain`] is one of seven fixed tags. Every capability is computed
//! from the tag on demand; nothing is stored alongside it. The tag text is
//! built from two markers:
//!
//! | Marker | Meaning                                   |
//! |--------|-------------------------------------------|
//! | `C`    | carries the colicin plasmid (immune)       |
//! | `L`    | carries a prophage (immune to phage)       |
//! | `+`    | the prophage is active and can be released |
//! | `-`    | the prophage is defective                  |
//!
//! `S` is the plain sensitive strain and `E` marks an empty site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Replication cost of carrying the colicin plasmid.
pub const DEFAULT_COLICIN_COST: f64 = 0.05;

/// Replication cost of carrying a prophage.
pub const DEFAULT_PHAGE_COST: f64 = 0.03;

/// A bacterial genotype occupying a grid site.
///
/// Variants are declared in lexicographic tag order, so the derived [`Ord`]
/// sorts strains the same way their tags sort as text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Strain {
    /// Colicin-immune non-producer (`C`).
    #[serde(rename = "C")]
    ColicinImmune,
    /// Colicin-producing lysogen with an active prophage (`CL+`).
    #[serde(rename = "CL+")]
    ColicinLysogenActive,
    /// Colicin-producing lysogen with a defective prophage (`CL-`).
    #[serde(rename = "CL-")]
    ColicinLysogenDefective,
    /// Empty site, or a dead cell (`E`).
    #[default]
    #[serde(rename = "E")]
    Empty,
    /// Lysogen with an active prophage (`L+`).
    #[serde(rename = "L+")]
    LysogenActive,
    /// Lysogen with a defective prophage (`L-`).
    #[serde(rename = "L-")]
    LysogenDefective,
    /// Plain sensitive strain (`S`).
    #[serde(rename = "S")]
    Sensitive,
}

/// Error returned when parsing text that is not one of the 7 strain tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strain tag: {tag:?}")]
pub struct ParseStrainError {
    /// The text that failed to parse.
    pub tag: String,
}

impl Strain {
    /// Every strain, in tag order.
    pub const ALL: [Self; 7] = [
        Self::ColicinImmune,
        Self::ColicinLysogenActive,
        Self::ColicinLysogenDefective,
        Self::Empty,
        Self::LysogenActive,
        Self::LysogenDefective,
        Self::Sensitive,
    ];

    /// The short tag used in configuration and output files.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::ColicinImmune => "C",
            Self::ColicinLysogenActive => "CL+",
            Self::ColicinLysogenDefective => "CL-",
            Self::Empty => "E",
            Self::LysogenActive => "L+",
            Self::LysogenDefective => "L-",
            Self::Sensitive => "S",
        }
    }

    /// Whether the site holds no living cell.
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether the strain carries the colicin marker.
    pub const fn is_immune_to_colicin(self) -> bool {
        matches!(
            self,
            Self::ColicinImmune | Self::ColicinLysogenActive | Self::ColicinLysogenDefective
        )
    }

    /// Whether the strain carries a prophage, active or not.
    pub const fn is_immune_to_phage(self) -> bool {
        matches!(
            self,
            Self::LysogenActive
                | Self::LysogenDefective
                | Self::ColicinLysogenActive
                | Self::ColicinLysogenDefective
        )
    }

    /// Whether lysis of this strain releases colicin.
    pub const fn can_release_colicin(self) -> bool {
        matches!(
            self,
            Self::ColicinLysogenActive | Self::ColicinLysogenDefective
        )
    }

    /// Whether lysis of this strain releases phage (the tag contains `L+`).
    pub const fn can_release_phage(self) -> bool {
        matches!(self, Self::LysogenActive | Self::ColicinLysogenActive)
    }

    /// Whether induction kills the cell.
    ///
    /// `L-` lyses without releasing colicin or phage.
    pub const fn can_lyse(self) -> bool {
        self.can_release_colicin()
            || self.can_release_phage()
            || matches!(self, Self::LysogenDefective)
    }

    /// Whether phage infection can turn this strain into a lysogen.
    pub const fn can_become_lysogen(self) -> bool {
        matches!(self, Self::Sensitive | Self::ColicinImmune)
    }

    /// The lysogen this strain becomes after phage integration.
    ///
    /// Returns `None` for strains where [`can_become_lysogen`] is false.
    ///
    /// [`can_become_lysogen`]: Self::can_become_lysogen
    pub const fn to_lysogen(self) -> Option<Self> {
        match self {
            Self::Sensitive => Some(Self::LysogenActive),
            Self::ColicinImmune => Some(Self::ColicinLysogenActive),
            _ => None,
        }
    }

    /// Probability that this strain replicates in a generation.
    ///
    /// `E` never replicates and `S` always does. Every other strain starts
    /// from 1.0 and pays the colicin cost if it is colicin-immune and the
    /// phage cost if it carries a prophage.
    pub fn replication_rate(self, costs: &StrainCosts) -> f64 {
        match self {
            Self::Empty => 0.0,
            Self::Sensitive => 1.0,
            _ => {
                let mut rate = 1.0;
                if self.is_immune_to_colicin() {
                    rate -= costs.colicin;
                }
                if self.is_immune_to_phage() {
                    rate -= costs.phage;
                }
                rate
            }
        }
    }
}

impl fmt::Display for Strain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Strain {
    type Err = ParseStrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strain| strain.tag() == s)
            .ok_or_else(|| ParseStrainError { tag: s.to_owned() })
    }
}

/// Replication costs paid for carrying colicin and phage genes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrainCosts {
    /// Cost of the colicin plasmid.
    #[serde(default = "default_colicin_cost")]
    pub colicin: f64,
    /// Cost of a prophage.
    #[serde(default = "default_phage_cost")]
    pub phage: f64,
}

impl Default for StrainCosts {
    fn default() -> Self {
        Self {
            colicin: DEFAULT_COLICIN_COST,
            phage: DEFAULT_PHAGE_COST,
        }
    }
}

const fn default_colicin_cost() -> f64 {
    DEFAULT_COLICIN_COST
}

const fn default_phage_cost() -> f64 {
    DEFAULT_PHAGE_COST
}
