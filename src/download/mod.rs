//! Media file downloads.
//!
//! [`Downloader`] streams one media URL into the output directory and
//! reports the result as a [`DownloadOutcome`]. It never raises: failures are
//! outcomes, and every non-successful outcome leaves no partial file behind.
//!
//! # Features
//!
//! - Skip-if-exists (the on-disk directory is the only persisted state)
//! - Streaming writes in 8 KiB slices with a cancellation check per slice
//! - Cumulative byte counts pushed to a [`ProgressReporter`](crate::progress::ProgressReporter)
//! - Partial-file removal on cancellation and on every mid-stream error
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use ripper_core::cancel::CancellationFlag;
//! use ripper_core::download::Downloader;
//! use ripper_core::fetch::HttpFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(Arc::new(HttpFetcher::new()?), CancellationFlag::new());
//! let outcome = downloader
//!     .download("https://archive.org/download/item/ep1.mp4", Path::new("./videos"))
//!     .await;
//! println!("{}", outcome.label());
//! # Ok(())
//! # }
//! ```

mod constants;
mod downloader;
mod error;
mod filename;
mod outcome;

pub use constants::{CHUNK_SIZE, DOWNLOAD_CONCURRENCY};
pub use downloader::Downloader;
pub use error::DownloadError;
pub use filename::{FilenameError, local_filename, local_path};
pub use outcome::DownloadOutcome;
