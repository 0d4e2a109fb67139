//! Engine binary for the colicin/phage competition simulation.
//!
//! Loads configuration, runs every replicate, and writes per-replicate
//! CSV tables and a JSON summary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `COLICIN_CONFIG` or `colicin-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Run the replicates on the blocking pool
//! 4. Log the final counts of each replicate

mod error;
mod output;
mod replicates;

use std::path::{Path, PathBuf};

use colicin_core::config::{LoggingConfig, SimulationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::error::EngineError;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "COLICIN_CONFIG";

/// Configuration file used when `COLICIN_CONFIG` is unset.
const DEFAULT_CONFIG_FILE: &str = "colicin-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a replicate fails, or
/// output cannot be written.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let (config, loaded_from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("colicin-engine starting");
    if loaded_from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        seed = config.simulation.seed,
        generations = config.simulation.generations,
        width = config.simulation.width,
        height = config.simulation.height,
        replicates = config.simulation.replicates,
        mode = ?config.simulation.mode,
        output = config.output.directory,
        "Run configured"
    );

    // 3. Run the replicates.
    let experiment_id = Uuid::now_v7();
    let outcomes = replicates::run_all(config, experiment_id).await?;

    // 4. Log results.
    for outcome in &outcomes {
        let counts: Vec<String> = outcome
            .final_counts
            .iter()
            .map(|(strain, count)| format!("{strain}: {count}"))
            .collect();
        info!(
            replicate = outcome.replicate,
            seed = outcome.seed,
            directory = %outcome.directory.display(),
            counts = counts.join(", "),
            "Final tally"
        );
    }
    info!(
        %experiment_id,
        replicates = outcomes.len(),
        "colicin-engine shutdown complete"
    );

    Ok(())
}

/// Path of the configuration file.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}

/// Load configuration from `path`, or defaults if it does not exist.
///
/// Returns whether the file was read.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok((config, false))
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
