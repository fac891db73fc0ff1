//! Archive Ripper Core Library
//!
//! This library mirrors the media files linked from a directory-style web
//! listing (such as an archive.org download page) into a local directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - HTTP page and media stream retrieval behind the [`Fetcher`] trait
//! - [`extract`] - Anchor extraction from HTML, optionally scoped to a container
//! - [`resolver`] - Item page to media URL resolution
//! - [`download`] - Streaming downloads with skip-if-exists and cleanup
//! - [`pipeline`] - The discover, resolve, download orchestrator
//! - [`cancel`] - Cooperative cancellation and the Ctrl+C listener
//! - [`progress`] - Per-file byte progress reporting
//! - [`config`] - Run tunables and defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cancel;
pub mod config;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod progress;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use cancel::{CancellationFlag, INTERRUPT_ACK, install_interrupt_handler};
pub use config::{ConfigError, DEFAULT_LISTING_URL, RipperConfig, default_output_dir};
pub use download::{DownloadError, DownloadOutcome, Downloader, local_filename};
pub use extract::{ExtractError, Extraction, LinkExtractor};
pub use fetch::{FetchError, Fetcher, HttpFetcher, MediaResponse};
pub use pipeline::{DownloadRecord, Pipeline, PipelineError, PipelineReport, PipelineState};
pub use progress::{BarProgress, NoProgress, ProgressReporter, ProgressSink};
pub use resolver::{MEDIA_EXTENSIONS, VideoResolver, is_media_url};
