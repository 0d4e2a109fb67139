//! Configuration loading and typed config structures for colicin runs.
//!
//! The canonical configuration lives in `colicin-config.yaml` at the project
//! root. Every field has a default, so an empty file describes the standard
//! 10x10 structured experiment.

use std::path::Path;

use colicin_types::{Strain, StrainCosts};
use colicin_world::SeedProportions;
use serde::{Deserialize, Serialize};

use crate::generation::{
    DEFAULT_COLICIN_PERSISTENCE, DEFAULT_INDUCTION_PROBABILITY, DEFAULT_LYSIS_RADIUS,
    DEFAULT_MIXED_DISPERSAL_TARGETS, DEFAULT_PHAGE_PERSISTENCE, DispersalMode, Dynamics,
    LysisSpread,
};

/// Environment variable overriding `simulation.seed`.
pub const SEED_ENV: &str = "COLICIN_SEED";

/// Environment variable overriding `output.directory`.
pub const OUTPUT_DIR_ENV: &str = "COLICIN_OUTPUT_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible run.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Top-level run configuration.
///
/// Mirrors the structure of `colicin-config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Grid size, run length, and replicate count.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Induction, persistence, and dispersal parameters.
    #[serde(default)]
    pub dynamics: DynamicsConfig,

    /// Replication costs.
    #[serde(default)]
    pub costs: StrainCosts,

    /// Initial share of the grid per strain tag.
    #[serde(default = "default_seed_proportions")]
    pub seed_proportions: SeedProportions,

    /// Where and what to write.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation: RunConfig::default(),
            dynamics: DynamicsConfig::default(),
            costs: StrainCosts::default(),
            seed_proportions: default_seed_proportions(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values after parsing:
    /// - `COLICIN_SEED` overrides `simulation.seed`
    /// - `COLICIN_OUTPUT_DIR` overrides `output.directory`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or the resulting
    /// configuration is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if it describes an impossible run.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the seed and output directory from the environment when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `COLICIN_SEED` is not an
    /// unsigned integer.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var(SEED_ENV) {
            self.simulation.seed = val
                .trim()
                .parse()
                .map_err(|err| {
                    invalid(format!("{SEED_ENV}={val:?} is not a valid seed: {err}"))
                })?;
        }
        if let Ok(val) = std::env::var(OUTPUT_DIR_ENV) {
            self.output.directory = val;
        }
        Ok(())
    }

    /// Reject configurations no run could execute.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let run = &self.simulation;
        if run.width == 0 || run.height == 0 {
            return Err(invalid(format!(
                "grid dimensions must be positive, got {}x{}",
                run.width, run.height
            )));
        }
        let site_count = run
            .width
            .checked_mul(run.height)
            .ok_or_else(|| invalid("grid dimensions overflow"))?;
        if run.replicates == 0 {
            return Err(invalid("at least one replicate is required"));
        }

        let dynamics = &self.dynamics;
        let p = dynamics.induction_probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(invalid(format!(
                "induction_probability {p} is outside [0, 1]"
            )));
        }
        if dynamics.persistence == PersistenceModel::Countdown
            && (dynamics.colicin_persistence == 0 || dynamics.phage_persistence == 0)
        {
            return Err(invalid(
                "countdown persistence needs colicin and phage persistence of at least 1",
            ));
        }
        if run.mode == SimulationMode::Mixed {
            let targets = dynamics.mixed_dispersal_targets;
            if targets == 0 || targets >= site_count {
                return Err(invalid(format!(
                    "mixed_dispersal_targets must be in 1..{site_count}, got {targets}"
                )));
            }
        }

        if dynamics.lysis_spread == LysisSpreadKind::Radius {
            let radius = usize::try_from(dynamics.lysis_radius).unwrap_or(usize::MAX);
            let longest_side = run.width.max(run.height);
            if radius > longest_side {
                return Err(invalid(format!(
                    "lysis_radius {} exceeds the longest grid side {longest_side}",
                    dynamics.lysis_radius
                )));
            }
        }

        let costs = &self.costs;
        for (name, cost) in [("colicin", costs.colicin), ("phage", costs.phage)] {
            if !cost.is_finite() || !(0.0..=1.0).contains(&cost) {
                return Err(invalid(format!("{name} cost {cost} is outside [0, 1]")));
            }
        }
        if costs.colicin + costs.phage > 1.0 {
            return Err(invalid(format!(
                "colicin and phage costs sum to {}, above 1",
                costs.colicin + costs.phage
            )));
        }

        self.seed_proportions
            .validate()
            .map_err(|err| invalid(format!("seed_proportions: {err}")))?;

        if self.output.max_concurrent_replicates == 0 {
            return Err(invalid("max_concurrent_replicates must be at least 1"));
        }
        Ok(())
    }

    /// The generation-cycle parameters this configuration describes.
    pub const fn to_dynamics(&self) -> Dynamics {
        let d = &self.dynamics;
        let (colicin_persistence, phage_persistence) = match d.persistence {
            PersistenceModel::Countdown => (d.colicin_persistence, d.phage_persistence),
            PersistenceModel::Flag => (1, 1),
        };
        let lysis_spread = match d.lysis_spread {
            LysisSpreadKind::Radius => LysisSpread::Radius(d.lysis_radius),
            LysisSpreadKind::VonNeumann => LysisSpread::VonNeumann,
        };
        let dispersal = match self.simulation.mode {
            SimulationMode::Structured => DispersalMode::Structured,
            SimulationMode::Mixed => DispersalMode::Mixed {
                targets: d.mixed_dispersal_targets,
            },
        };
        Dynamics {
            induction_probability: d.induction_probability,
            colicin_persistence,
            phage_persistence,
            lysis_spread,
            dispersal,
            costs: self.costs,
        }
    }
}

/// Spatial arrangement of the experiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Offspring land next to their parent.
    #[default]
    Structured,
    /// Offspring land anywhere on the grid.
    Mixed,
}

/// How long free colicin and phage linger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceModel {
    /// Counters start at the configured persistence and count down.
    #[default]
    Countdown,
    /// Agents are present for exactly one generation.
    Flag,
}

/// Shape of the lysis neighborhood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LysisSpreadKind {
    /// Square block of `lysis_radius`.
    #[default]
    Radius,
    /// The four adjacent sites.
    VonNeumann,
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base random seed; each replicate derives its own from it.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Generations per replicate.
    #[serde(default = "default_generations")]
    pub generations: u64,

    /// Grid width in sites.
    #[serde(default = "default_dimension")]
    pub width: usize,

    /// Grid height in sites.
    #[serde(default = "default_dimension")]
    pub height: usize,

    /// Number of independent replicates.
    #[serde(default = "default_replicates")]
    pub replicates: u32,

    /// Structured or well-mixed dispersal.
    #[serde(default)]
    pub mode: SimulationMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            generations: default_generations(),
            width: default_dimension(),
            height: default_dimension(),
            replicates: default_replicates(),
            mode: SimulationMode::default(),
        }
    }
}

/// Generation-cycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicsConfig {
    /// Per-site, per-generation induction probability.
    #[serde(default = "default_induction_probability")]
    pub induction_probability: f64,

    /// Countdown or single-generation agents.
    #[serde(default)]
    pub persistence: PersistenceModel,

    /// Generations colicin lingers (countdown mode).
    #[serde(default = "default_colicin_persistence")]
    pub colicin_persistence: u32,

    /// Generations phage lingers (countdown mode).
    #[serde(default = "default_phage_persistence")]
    pub phage_persistence: u32,

    /// Lysis neighborhood shape.
    #[serde(default)]
    pub lysis_spread: LysisSpreadKind,

    /// Radius used when `lysis_spread` is `radius`.
    #[serde(default = "default_lysis_radius")]
    pub lysis_radius: u32,

    /// Candidate sites drawn per replication in mixed mode.
    #[serde(default = "default_mixed_dispersal_targets")]
    pub mixed_dispersal_targets: usize,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            induction_probability: default_induction_probability(),
            persistence: PersistenceModel::default(),
            colicin_persistence: default_colicin_persistence(),
            phage_persistence: default_phage_persistence(),
            lysis_spread: LysisSpreadKind::default(),
            lysis_radius: default_lysis_radius(),
            mixed_dispersal_targets: default_mixed_dispersal_targets(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory; each replicate writes to a subdirectory.
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// File name prefix of the per-generation counts table.
    #[serde(default = "default_counts_file_prefix")]
    pub counts_file_prefix: String,

    /// Write a strain map for every generation.
    #[serde(default = "default_true")]
    pub write_maps: bool,

    /// Upper bound on replicates running at once.
    #[serde(default = "default_max_concurrent_replicates")]
    pub max_concurrent_replicates: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            counts_file_prefix: default_counts_file_prefix(),
            write_maps: true,
            max_concurrent_replicates: default_max_concurrent_replicates(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_generations() -> u64 {
    1000
}

const fn default_dimension() -> usize {
    10
}

const fn default_replicates() -> u32 {
    2
}

const fn default_induction_probability() -> f64 {
    DEFAULT_INDUCTION_PROBABILITY
}

const fn default_colicin_persistence() -> u32 {
    DEFAULT_COLICIN_PERSISTENCE
}

const fn default_phage_persistence() -> u32 {
    DEFAULT_PHAGE_PERSISTENCE
}

const fn default_lysis_radius() -> u32 {
    DEFAULT_LYSIS_RADIUS
}

const fn default_mixed_dispersal_targets() -> usize {
    DEFAULT_MIXED_DISPERSAL_TARGETS
}

fn default_seed_proportions() -> SeedProportions {
    [
        (Strain::ColicinImmune, 0.25),
        (Strain::Sensitive, 0.25),
        (Strain::ColicinLysogenDefective, 0.25),
    ]
    .into_iter()
    .collect()
}

fn default_output_directory() -> String {
    "output".to_owned()
}

fn default_counts_file_prefix() -> String {
    "structured".to_owned()
}

const fn default_max_concurrent_replicates() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.generations, 1000);
        assert_eq!(config.simulation.width, 10);
        assert_eq!(config.simulation.height, 10);
        assert_eq!(config.dynamics.colicin_persistence, 10);
        assert_eq!(config.output.counts_file_prefix, "structured");
    }

    #[test]
    fn default_dynamics_match_engine_defaults() {
        assert_eq!(
            SimulationConfig::default().to_dynamics(),
            Dynamics::default()
        );
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
simulation:
  seed: 7
  generations: 250
  width: 20
  height: 15
  replicates: 5
  mode: mixed

dynamics:
  induction_probability: 0.01
  persistence: countdown
  colicin_persistence: 6
  phage_persistence: 2
  lysis_spread: von_neumann
  lysis_radius: 3
  mixed_dispersal_targets: 8

costs:
  colicin: 0.1
  phage: 0.02

seed_proportions:
  "CL+": 0.1
  "L-": 0.2
  S: 0.5

output:
  directory: "runs"
  counts_file_prefix: "mixed"
  write_maps: false
  max_concurrent_replicates: 2

logging:
  level: "debug"
  json: true
"#;
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.replicates, 5);
        assert_eq!(config.simulation.mode, SimulationMode::Mixed);
        assert_eq!(config.dynamics.lysis_spread, LysisSpreadKind::VonNeumann);
        assert!((config.costs.colicin - 0.1).abs() < f64::EPSILON);
        let defective = config.seed_proportions.get(Strain::LysogenDefective);
        assert!((defective - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.output.directory, "runs");
        assert!(!config.output.write_maps);
        assert!(config.logging.json);

        let dynamics = config.to_dynamics();
        assert_eq!(dynamics.lysis_spread, LysisSpread::VonNeumann);
        assert_eq!(dynamics.dispersal, DispersalMode::Mixed { targets: 8 });
        assert_eq!(dynamics.colicin_persistence, 6);
        assert_eq!(dynamics.phage_persistence, 2);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "simulation:\n  generations: 3\n";
        let config = SimulationConfig::parse(yaml).unwrap();

        // Generations is overridden
        assert_eq!(config.simulation.generations, 3);
        // Everything else uses defaults
        assert_eq!(config.simulation.seed, 42);
        let immune = config.seed_proportions.get(Strain::ColicinImmune);
        assert!((immune - 0.25).abs() < f64::EPSILON);
        assert!(config.seed_proportions.get(Strain::Sensitive) > 0.0);
        let induction = config.dynamics.induction_probability;
        assert!((induction - 0.0037).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SimulationConfig::parse("").unwrap();
        assert_eq!(config.simulation, RunConfig::default());
    }

    #[test]
    fn flag_persistence_lasts_one_generation() {
        let yaml = "dynamics:\n  persistence: flag\n  colicin_persistence: 0\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        let dynamics = config.to_dynamics();
        assert_eq!(dynamics.colicin_persistence, 1);
        assert_eq!(dynamics.phage_persistence, 1);
    }

    #[test]
    fn zero_persistence_is_rejected_in_countdown_mode() {
        let yaml = "dynamics:\n  phage_persistence: 0\n";
        assert!(matches!(
            SimulationConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for yaml in [
            "simulation:\n  width: 0\n",
            "simulation:\n  replicates: 0\n",
            "dynamics:\n  induction_probability: 1.5\n",
            "costs:\n  phage: -0.1\n",
            "costs:\n  colicin: 1.5\n",
            "costs:\n  phage: 1.2\n",
            "costs:\n  colicin: 0.9\n  phage: 0.9\n",
            "dynamics:\n  lysis_radius: 11\n",
            "dynamics:\n  lysis_radius: 4294967295\n",
            "seed_proportions:\n  S: 0.6\n  C: 0.6\n",
            "output:\n  max_concurrent_replicates: 0\n",
            "simulation:\n  mode: mixed\n  width: 2\n  height: 2\ndynamics:\n  mixed_dispersal_targets: 4\n",
        ] {
            assert!(
                matches!(
                    SimulationConfig::parse(yaml),
                    Err(ConfigError::Invalid { .. })
                ),
                "accepted {yaml:?}"
            );
        }
    }

    #[test]
    fn accepted_costs_keep_every_replication_rate_a_probability() {
        for yaml in [
            "costs:\n  colicin: 1.0\n  phage: 0.0\n",
            "costs:\n  colicin: 0.5\n  phage: 0.5\n",
            "costs:\n  colicin: 0.0\n  phage: 1.0\n",
        ] {
            let config = SimulationConfig::parse(yaml).unwrap();
            for strain in Strain::ALL {
                let rate = strain.replication_rate(&config.costs);
                assert!(
                    (0.0..=1.0).contains(&rate),
                    "{strain} rate {rate} for {yaml:?}"
                );
            }
        }
    }

    #[test]
    fn lysis_radius_is_bounded_by_the_grid() {
        let config = SimulationConfig::parse("dynamics:\n  lysis_radius: 10\n").unwrap();
        assert_eq!(config.to_dynamics().lysis_spread, LysisSpread::Radius(10));

        let yaml = "simulation:\n  width: 30\n  height: 4\ndynamics:\n  lysis_radius: 30\n";
        assert!(SimulationConfig::parse(yaml).is_ok());

        let err = SimulationConfig::parse("dynamics:\n  lysis_radius: 4294967295\n").unwrap_err();
        assert!(err.to_string().contains("lysis_radius"), "{err}");

        // The radius is unused by the four-neighbor spread.
        let yaml = "dynamics:\n  lysis_spread: von_neumann\n  lysis_radius: 4294967295\n";
        let dynamics = SimulationConfig::parse(yaml).unwrap().to_dynamics();
        assert_eq!(dynamics.lysis_spread, LysisSpread::VonNeumann);
    }

    #[test]
    fn mixed_targets_are_ignored_in_structured_mode() {
        let yaml =
            "simulation:\n  width: 2\n  height: 2\ndynamics:\n  mixed_dispersal_targets: 10\n";
        assert!(SimulationConfig::parse(yaml).is_ok());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            SimulationConfig::parse("simulation: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
        assert!(matches!(
            SimulationConfig::parse("simulation:\n  mode: diagonal\n"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("colicin-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
