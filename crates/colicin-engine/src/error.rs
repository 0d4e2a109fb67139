//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode of loading configuration, running replicates, and writing output.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: colicin_core::config::ConfigError,
    },

    /// A replicate failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: colicin_core::runner::RunnerError,
    },

    /// Creating or writing an output file failed.
    #[error("output error at {path}: {source}")]
    Io {
        /// File or directory being written.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing the run summary failed.
    #[error("summary serialization failed: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A replicate task panicked or was cancelled.
    #[error("replicate task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// The replicate scheduler shut down before all replicates started.
    #[error("replicate scheduler closed: {source}")]
    Scheduler {
        /// The underlying semaphore error.
        #[from]
        source: tokio::sync::AcquireError,
    },
}

impl EngineError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
