//! Fatal pipeline errors.
//!
//! Individual item failures are never errors; they end up in the
//! [`PipelineReport`](super::PipelineReport). Only problems with the run's own
//! setup or control flow surface here.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractError;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration was rejected before the run started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A link extractor could not be built from the configured selector.
    #[error("extractor setup failed: {0}")]
    Extractor(#[from] ExtractError),

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    CreateOutputDir {
        /// Directory that was being created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A stage semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}
