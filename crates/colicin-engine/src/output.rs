//! Per-replicate output files.
//!
//! Every replicate writes into its own `replicate_<n>/` directory:
//!
//! - `<prefix>_<n>.csv` -- `Update,Strain,Count`, one row per strain per
//!   generation, strains in tag order with zero counts included.
//! - `Map_<g>.csv` -- the strain tag of every site after generation `g`,
//!   one grid row per line (only when maps are enabled, never for the
//!   seeded world). Numbering starts at `Map_1.csv`, where the earlier
//!   Python runs wrote `Map_0.csv` for that same state.
//! - `summary.json` -- run metadata and final counts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use colicin_core::config::SimulationConfig;
use colicin_core::runner::{CallbackError, GenerationCallback, Observation};
use colicin_world::{StrainCounts, World};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::EngineError;

/// Header row of the counts table.
pub const COUNTS_HEADER: &str = "Update,Strain,Count";

/// File name of the per-replicate summary.
pub const SUMMARY_FILE: &str = "summary.json";

/// Directory holding replicate `replicate` under `root`.
pub fn replicate_directory(root: &Path, replicate: u32) -> PathBuf {
    root.join(format!("replicate_{replicate}"))
}

/// Streams counts and maps to disk as a replicate advances.
pub struct ReplicateWriter {
    directory: PathBuf,
    counts_path: PathBuf,
    counts: BufWriter<File>,
    write_maps: bool,
}

impl ReplicateWriter {
    /// Create the replicate directory and its counts file, header included.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the directory or file cannot be
    /// created.
    pub fn create(
        root: &Path,
        prefix: &str,
        replicate: u32,
        write_maps: bool,
    ) -> Result<Self, EngineError> {
        let directory = replicate_directory(root, replicate);
        fs::create_dir_all(&directory).map_err(|e| EngineError::io(&directory, e))?;

        let counts_path = directory.join(format!("{prefix}_{replicate}.csv"));
        let file = File::create(&counts_path).map_err(|e| EngineError::io(&counts_path, e))?;
        let mut counts = BufWriter::new(file);
        writeln!(counts, "{COUNTS_HEADER}").map_err(|e| EngineError::io(&counts_path, e))?;

        Ok(Self {
            directory,
            counts_path,
            counts,
            write_maps,
        })
    }

    /// Flush the counts file and return the replicate directory.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if buffered rows cannot be written.
    pub fn finish(mut self) -> Result<PathBuf, EngineError> {
        self.counts
            .flush()
            .map_err(|e| EngineError::io(&self.counts_path, e))?;
        Ok(self.directory)
    }
}

impl GenerationCallback for ReplicateWriter {
    fn on_generation(&mut self, observation: &Observation<'_>) -> Result<(), CallbackError> {
        write_count_rows(&mut self.counts, observation.generation, observation.counts)?;
        if self.write_maps && observation.generation >= 1 {
            let path = self
                .directory
                .join(format!("Map_{}.csv", observation.generation));
            write_map(&path, observation.world)?;
            debug!(path = %path.display(), "Map written");
        }
        Ok(())
    }
}

/// Append one generation's rows to the counts table.
fn write_count_rows(
    out: &mut impl Write,
    generation: u64,
    counts: &StrainCounts,
) -> io::Result<()> {
    for (strain, count) in counts.iter() {
        writeln!(out, "{generation},{strain},{count}")?;
    }
    Ok(())
}

/// Write the strain tag of every site, one grid row per line.
fn write_map(path: &Path, world: &World) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in world.rows() {
        let line: Vec<&str> = row.iter().map(|strain| strain.tag()).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    out.flush()
}

/// Metadata written next to a replicate's tables.
#[derive(Debug, Serialize)]
pub struct ReplicateSummary<'a> {
    /// Identifier shared by all replicates of one engine run.
    pub experiment_id: Uuid,
    /// Replicate index.
    pub replicate: u32,
    /// Seed of this replicate's random stream.
    pub seed: u64,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub finished_at: DateTime<Utc>,
    /// Generations advanced.
    pub generations: u64,
    /// Counts after the last generation.
    pub final_counts: &'a StrainCounts,
    /// The configuration the replicate ran with.
    pub config: &'a SimulationConfig,
}

/// Write `summary` as pretty JSON into `directory`.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if the file cannot be written or
/// [`EngineError::Json`] if serialization fails.
pub fn write_summary(
    directory: &Path,
    summary: &ReplicateSummary<'_>,
) -> Result<PathBuf, EngineError> {
    let path = directory.join(SUMMARY_FILE);
    let file = File::create(&path).map_err(|e| EngineError::io(&path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, summary)?;
    out.flush().map_err(|e| EngineError::io(&path, e))?;
    Ok(path)
}
