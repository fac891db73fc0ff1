//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

use super::filename::FilenameError;
use crate::fetch::FetchError;

/// Why a single download ended in [`DownloadOutcome::Failed`](super::DownloadOutcome::Failed).
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No local filename could be derived from the media URL.
    #[error(transparent)]
    Filename(#[from] FilenameError),

    /// The request could not be opened or the body broke off.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// File system error while creating, writing or flushing the target file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Another URL claimed the same local file and did not complete it.
    #[error("{url} maps to the same file as {winner}, which was not downloaded")]
    Collision {
        /// The URL that was never fetched.
        url: String,
        /// The URL that owned the file name.
        winner: String,
    },

    /// The task running the download panicked or was aborted.
    #[error("download task for {url} ended abnormally: {message}")]
    Task {
        /// The media URL the task was downloading.
        url: String,
        /// Join error description.
        message: String,
    },
}

impl DownloadError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// std::io::Error has no From impl on purpose: the path is required context.
