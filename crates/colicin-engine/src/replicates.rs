//! Replicate fan-out.
//!
//! Replicates are CPU-bound and independent, so each runs on the blocking
//! pool. A semaphore caps how many run at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use colicin_core::config::SimulationConfig;
use colicin_core::runner::{derive_replicate_seed, replicate_rng, run_replicate};
use colicin_world::StrainCounts;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;
use uuid::Uuid;

use crate::error::EngineError;
use crate::output::{ReplicateSummary, ReplicateWriter, write_summary};

/// What one finished replicate left behind.
#[derive(Debug, Clone)]
pub struct ReplicateOutcome {
    /// Replicate index.
    pub replicate: u32,
    /// Seed of its random stream.
    pub seed: u64,
    /// Counts after the last generation.
    pub final_counts: StrainCounts,
    /// Directory holding its output files.
    pub directory: PathBuf,
}

/// Run replicate `replicate` to completion and write its output.
///
/// # Errors
///
/// Returns [`EngineError`] if the replicate fails or any output file
/// cannot be written.
pub fn run_one(
    config: &SimulationConfig,
    experiment_id: Uuid,
    replicate: u32,
) -> Result<ReplicateOutcome, EngineError> {
    let seed = derive_replicate_seed(config.simulation.seed, replicate);
    let mut rng = replicate_rng(config.simulation.seed, replicate);
    let started_at = Utc::now();

    let mut writer = ReplicateWriter::create(
        Path::new(&config.output.directory),
        &config.output.counts_file_prefix,
        replicate,
        config.output.write_maps,
    )?;
    info!(replicate, seed, "Replicate starting");

    let result = run_replicate(config, &mut rng, &mut writer)?;
    let directory = writer.finish()?;
    let final_counts = result.final_counts().cloned().unwrap_or_default();

    write_summary(
        &directory,
        &ReplicateSummary {
            experiment_id,
            replicate,
            seed,
            started_at,
            finished_at: Utc::now(),
            generations: config.simulation.generations,
            final_counts: &final_counts,
            config,
        },
    )?;
    info!(
        replicate,
        directory = %directory.display(),
        occupied = final_counts.occupied(),
        "Replicate output written"
    );

    Ok(ReplicateOutcome {
        replicate,
        seed,
        final_counts,
        directory,
    })
}

/// Run every configured replicate, at most
/// `output.max_concurrent_replicates` at a time.
///
/// Outcomes are returned in replicate order.
///
/// # Errors
///
/// Returns the first [`EngineError`] any replicate reports.
pub async fn run_all(
    config: SimulationConfig,
    experiment_id: Uuid,
) -> Result<Vec<ReplicateOutcome>, EngineError> {
    let config = Arc::new(config);
    let semaphore = Arc::new(Semaphore::new(config.output.max_concurrent_replicates));
    let mut tasks = JoinSet::new();

    for replicate in 0..config.simulation.replicates {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let config = Arc::clone(&config);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            run_one(&config, experiment_id, replicate)
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined??);
    }
    outcomes.sort_by_key(|outcome| outcome.replicate);
    Ok(outcomes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use super::*;

    fn small_config(root: &Path, replicates: u32) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.simulation.width = 5;
        config.simulation.height = 5;
        config.simulation.generations = 4;
        config.simulation.replicates = replicates;
        config.output.directory = root.display().to_string();
        config.output.max_concurrent_replicates = 2;
        config
    }

    #[test]
    fn single_replicate_writes_all_files() {
        let root = tempfile::tempdir().unwrap();
        let config = small_config(root.path(), 1);
        let outcome = run_one(&config, Uuid::now_v7(), 0).unwrap();

        assert_eq!(outcome.seed, 42);
        assert_eq!(outcome.final_counts.total(), 25);
        let counts = fs::read_to_string(outcome.directory.join("structured_0.csv")).unwrap();
        assert_eq!(counts.lines().count(), 1 + 5 * 7);
        for generation in 1..=4 {
            let map = outcome.directory.join(format!("Map_{generation}.csv"));
            assert!(map.exists());
        }
        assert!(outcome.directory.join("summary.json").exists());
    }

    #[test]
    fn rerunning_a_replicate_reproduces_its_counts() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = run_one(&small_config(first.path(), 1), Uuid::now_v7(), 3).unwrap();
        let b = run_one(&small_config(second.path(), 1), Uuid::now_v7(), 3).unwrap();
        assert_eq!(a.final_counts, b.final_counts);
        assert_eq!(
            fs::read_to_string(a.directory.join("structured_3.csv")).unwrap(),
            fs::read_to_string(b.directory.join("structured_3.csv")).unwrap()
        );
    }

    #[tokio::test]
    async fn run_all_returns_outcomes_in_order() {
        let root = tempfile::tempdir().unwrap();
        let config = small_config(root.path(), 3);
        let outcomes = run_all(config, Uuid::now_v7()).await.unwrap();

        let order: Vec<u32> = outcomes.iter().map(|o| o.replicate).collect();
        assert_eq!(order, vec![0, 1, 2]);
        for outcome in &outcomes {
            let expected = format!("replicate_{}", outcome.replicate);
            assert!(outcome.directory.ends_with(expected));
        }
        assert_ne!(outcomes[0].seed, outcomes[1].seed);
    }
}
