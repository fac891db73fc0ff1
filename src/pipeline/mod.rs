//! Three-stage listing pipeline: discover, resolve, download.
//!
//! A run fetches one listing page, collects the item-page links inside its
//! directory container, resolves every item page to a media URL with bounded
//! concurrency, then downloads the media files with a lower concurrency
//! limit. Each stage runs to completion before the next starts, so the full
//! set of media URLs is known before any download begins.
//!
//! Item failures never abort a run. They are logged and reported in the
//! returned [`PipelineReport`]. Cancellation is cooperative: every stage
//! checks the shared [`CancellationFlag`] before starting new work, and the
//! run ends in [`PipelineState::Cancelled`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use ripper_core::{CancellationFlag, HttpFetcher, Pipeline, RipperConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new()?);
//! let pipeline = Pipeline::new(fetcher, CancellationFlag::new(), RipperConfig::default())?;
//! let report = pipeline
//!     .run("https://archive.org/download/item/", Path::new("./videos"))
//!     .await?;
//! println!("{} downloaded, {} skipped", report.completed(), report.skipped());
//! # Ok(())
//! # }
//! ```

mod error;
mod report;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use error::PipelineError;
pub use report::{DownloadRecord, PipelineReport, PipelineState};

use crate::cancel::CancellationFlag;
use crate::config::RipperConfig;
use crate::download::{DownloadError, DownloadOutcome, Downloader, local_filename};
use crate::extract::{Extraction, LinkExtractor};
use crate::fetch::Fetcher;
use crate::progress::{NoProgress, ProgressReporter};
use crate::resolver::VideoResolver;

/// Runs listings through discovery, resolution and download.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationFlag,
    config: RipperConfig,
    listing: LinkExtractor,
    resolver: Arc<VideoResolver>,
    progress: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline sharing `fetcher` and `cancel` across all stages.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if `config` fails validation and
    /// [`PipelineError::Extractor`] if its listing selector is malformed.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cancel: CancellationFlag,
        config: RipperConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let listing = LinkExtractor::scoped(&config.listing_scope)?;
        let resolver = Arc::new(VideoResolver::new(Arc::clone(&fetcher), cancel.clone())?);
        Ok(Self {
            fetcher,
            cancel,
            config,
            listing,
            resolver,
            progress: Arc::new(NoProgress),
        })
    }

    /// Routes per-file byte counts to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Runs all three stages for `listing_url`, writing into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CreateOutputDir`] if the output directory
    /// cannot be created and [`PipelineError::SemaphoreClosed`] if a stage
    /// semaphore closes. Failures of individual pages or files are reported
    /// in the [`PipelineReport`] instead.
    #[instrument(skip(self, output_dir), fields(output_dir = %output_dir.display()))]
    pub async fn run(
        &self,
        listing_url: &str,
        output_dir: &Path,
    ) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport::new(PipelineState::Init);

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| PipelineError::CreateOutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;

        if self.checkpoint(&mut report) {
            return Ok(report);
        }
        report.enter(PipelineState::Discovering);
        let pages = self.discover(listing_url).await;
        report.pages_discovered = pages.len();

        if self.checkpoint(&mut report) {
            return Ok(report);
        }
        report.enter(PipelineState::Resolving);
        let media = self.resolve_all(pages).await?;
        report.media_resolved = media.len();

        if self.checkpoint(&mut report) {
            return Ok(report);
        }
        if media.is_empty() {
            info!("No video links found");
            report.enter(PipelineState::Done);
            return Ok(report);
        }

        report.enter(PipelineState::Downloading);
        let (unique, collisions) = dedupe_by_filename(media);
        let downloads = self.download_all(unique, output_dir).await?;
        let settled = settle_collisions(&downloads, collisions);
        report.downloads.extend(downloads);
        report.downloads.extend(settled);

        let end = if self.cancel.is_cancelled() {
            PipelineState::Cancelled
        } else {
            PipelineState::Done
        };
        report.enter(end);
        info!(
            completed = report.completed(),
            skipped = report.skipped(),
            cancelled = report.cancelled(),
            failed = report.failed(),
            "All downloads finished"
        );
        Ok(report)
    }

    /// Fetches the listing and returns the absolute links inside its container.
    async fn discover(&self, listing_url: &str) -> Vec<String> {
        info!(url = %listing_url, "Fetching links");

        let Ok(base) = Url::parse(listing_url) else {
            warn!(url = %listing_url, "Error fetching links: invalid listing URL");
            return Vec::new();
        };

        let document = match self.fetcher.fetch_page(listing_url).await {
            Ok(document) => document,
            Err(e) => {
                warn!(url = %listing_url, error = %e, "Error fetching links");
                return Vec::new();
            }
        };

        match self.listing.extract(&document, &base) {
            Extraction::Links(links) => {
                info!(count = links.len(), "Found links in the download directory listing");
                links.into_iter().map(String::from).collect()
            }
            Extraction::ScopeMissing => {
                warn!(
                    scope = %self.config.listing_scope,
                    "Could not find the download directory listing"
                );
                Vec::new()
            }
        }
    }

    /// Resolves every page concurrently, preserving discovery order.
    async fn resolve_all(&self, pages: Vec<String>) -> Result<Vec<String>, PipelineError> {
        info!(pages = pages.len(), "Extracting video links from each page");

        let semaphore = Arc::new(Semaphore::new(self.config.resolve_concurrency));
        let mut handles = Vec::with_capacity(pages.len());

        for page in pages {
            if self.cancel.is_cancelled() {
                debug!("cancelled, not resolving remaining pages");
                break;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::SemaphoreClosed)?;
            let resolver = Arc::clone(&self.resolver);
            let task_page = page.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                resolver.resolve(&task_page).await
            });
            handles.push((page, handle));
        }

        let mut media = Vec::new();
        for (page, handle) in handles {
            match handle.await {
                Ok(Some(url)) => media.push(url),
                Ok(None) => {}
                Err(e) => warn!(page = %page, error = %e, "resolve task panicked"),
            }
        }

        info!(count = media.len(), "Found video links");
        Ok(media)
    }

    /// Downloads every media URL concurrently, one record per URL in input order.
    async fn download_all(
        &self,
        media: Vec<String>,
        output_dir: &Path,
    ) -> Result<Vec<DownloadRecord>, PipelineError> {
        info!(files = media.len(), "Starting downloads");

        let downloader = Arc::new(
            Downloader::new(Arc::clone(&self.fetcher), self.cancel.clone())
                .with_progress(Arc::clone(&self.progress))
                .with_chunk_size(self.config.chunk_size),
        );
        let semaphore = Arc::new(Semaphore::new(self.config.download_concurrency));
        let mut pending = Vec::with_capacity(media.len());

        for url in media {
            if self.cancel.is_cancelled() {
                pending.push((url, None));
                continue;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::SemaphoreClosed)?;
            let downloader = Arc::clone(&downloader);
            let output_dir = output_dir.to_path_buf();
            let task_url = url.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                downloader.download(&task_url, &output_dir).await
            });
            pending.push((url, Some(handle)));
        }

        debug!(task_count = pending.len(), "waiting for downloads to complete");

        let mut records = Vec::with_capacity(pending.len());
        for (url, handle) in pending {
            let outcome = match handle {
                None => DownloadOutcome::Cancelled,
                Some(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(url = %url, error = %e, "download task panicked");
                        DownloadOutcome::Failed(DownloadError::Task {
                            url: url.clone(),
                            message: e.to_string(),
                        })
                    }
                },
            };
            records.push(DownloadRecord { url, outcome });
        }
        Ok(records)
    }

    /// Moves to `Cancelled` if cancellation was requested; returns true if so.
    fn checkpoint(&self, report: &mut PipelineReport) -> bool {
        if self.cancel.is_cancelled() {
            report.enter(PipelineState::Cancelled);
            true
        } else {
            false
        }
    }
}

/// A media URL whose local file name was already claimed by `winner`.
#[derive(Debug, PartialEq, Eq)]
struct Collision {
    url: String,
    winner: String,
}

/// Splits `media` into URLs to download and URLs whose file name is taken.
///
/// The first URL mapping to a local filename wins. URLs without a usable
/// filename pass through so the downloader reports them as failures.
fn dedupe_by_filename(media: Vec<String>) -> (Vec<String>, Vec<Collision>) {
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut unique = Vec::with_capacity(media.len());
    let mut collisions = Vec::new();

    for url in media {
        let Ok(name) = local_filename(&url) else {
            unique.push(url);
            continue;
        };
        if let Some(winner) = owners.get(&name) {
            warn!(
                url = %url,
                winner = %winner,
                file = %name,
                "another link already maps to this file"
            );
            collisions.push(Collision {
                url,
                winner: winner.clone(),
            });
        } else {
            owners.insert(name, url.clone());
            unique.push(url);
        }
    }
    (unique, collisions)
}

/// Derives each collision's outcome from its winner's.
///
/// A collision is `Skipped` only when the winner left the file on disk;
/// otherwise it shares the winner's cancellation or fails.
fn settle_collisions(
    downloads: &[DownloadRecord],
    collisions: Vec<Collision>,
) -> Vec<DownloadRecord> {
    collisions
        .into_iter()
        .map(|Collision { url, winner }| {
            let winner_outcome = downloads
                .iter()
                .find(|record| record.url == winner)
                .map(|record| &record.outcome);
            let outcome = match winner_outcome {
                Some(DownloadOutcome::Completed(path) | DownloadOutcome::Skipped(path)) => {
                    DownloadOutcome::Skipped(path.clone())
                }
                Some(DownloadOutcome::Cancelled) => DownloadOutcome::Cancelled,
                Some(DownloadOutcome::Failed(_)) | None => {
                    DownloadOutcome::Failed(DownloadError::Collision {
                        url: url.clone(),
                        winner,
                    })
                }
            };
            DownloadRecord { url, outcome }
        })
        .collect()
}
