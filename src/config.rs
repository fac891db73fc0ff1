//! Run configuration and defaults.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::download::{CHUNK_SIZE, DOWNLOAD_CONCURRENCY};
use crate::extract::DIRECTORY_LISTING_SCOPE;
use crate::fetch::{CONNECT_TIMEOUT_SECS, PAGE_TIMEOUT_SECS};
use crate::resolver::RESOLVE_CONCURRENCY;

/// Listing scraped when no URL is given on the command line.
pub const DEFAULT_LISTING_URL: &str = "https://archive.org/download/The_Gray_Bearded_Green_Beret_Archive/The%20Gray%20Bearded%20Green%20Beret/";

/// Output directory, relative to the home directory, used when none is given.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "Downloads/archive_org_videos";

const MIN_CONCURRENCY: usize = 1;
const MAX_CONCURRENCY: usize = 100;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A stage concurrency limit is outside the allowed range.
    #[error(
        "invalid {stage} concurrency {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// Which stage the value was meant for.
        stage: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// The write chunk size is zero.
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// Tunables for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RipperConfig {
    /// Concurrent item-page resolutions.
    pub resolve_concurrency: usize,
    /// Concurrent media downloads; kept lower than resolution on purpose.
    pub download_concurrency: usize,
    /// Timeout for listing and item pages.
    pub page_timeout: Duration,
    /// Connect timeout for every request.
    pub connect_timeout: Duration,
    /// Bytes written per slice between cancellation checks.
    pub chunk_size: usize,
    /// CSS selector of the container holding a listing's entries.
    pub listing_scope: String,
}

impl Default for RipperConfig {
    fn default() -> Self {
        Self {
            resolve_concurrency: RESOLVE_CONCURRENCY,
            download_concurrency: DOWNLOAD_CONCURRENCY,
            page_timeout: Duration::from_secs(PAGE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            chunk_size: CHUNK_SIZE,
            listing_scope: DIRECTORY_LISTING_SCOPE.to_string(),
        }
    }
}

impl RipperConfig {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_concurrency("resolve", self.resolve_concurrency)?;
        check_concurrency("download", self.download_concurrency)?;
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(())
    }
}

fn check_concurrency(stage: &'static str, value: usize) -> Result<(), ConfigError> {
    if (MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidConcurrency { stage, value })
    }
}

/// Default output directory: `~/Downloads/archive_org_videos`.
///
/// Falls back to a relative `archive_org_videos` when no home directory is known.
#[must_use]
pub fn default_output_dir() -> PathBuf {
    output_dir_under(home_dir())
}

fn output_dir_under(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) => home.join(DEFAULT_OUTPUT_SUBDIR),
        None => PathBuf::from("archive_org_videos"),
    }
}

fn home_dir() -> Option<PathBuf> {
    env_var_non_empty_os("HOME")
        .or_else(|| env_var_non_empty_os("USERPROFILE"))
        .map(PathBuf::from)
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    std::env::var_os(name).filter(|value| !value.is_empty())
}
