//! Pipeline behavior under instrumented fetchers.
//!
//! These tests drive the pipeline through an in-memory [`Fetcher`] so they can
//! count calls, measure how many requests run at once, break streams halfway
//! and trigger cancellation at precise points.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use ripper_core::{
    CancellationFlag, DownloadError, DownloadOutcome, FetchError, Fetcher, MediaResponse,
    Pipeline, PipelineState, RipperConfig,
};
use tempfile::TempDir;

const LISTING: &str = "https://archive.test/download/show/";

/// Tracks current and peak concurrent requests.
#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// How a media URL's body behaves.
#[derive(Clone)]
enum Body {
    Chunks(Vec<&'static str>),
    /// Yields the chunks, then breaks off with a stream error.
    BreaksAfter(Vec<&'static str>),
    /// Yields the first chunk, raises cancellation, then yields the rest.
    CancelsAfterFirst(Vec<&'static str>),
}

/// In-memory archive with one listing, `n` item pages and one file per item.
struct FakeArchive {
    pages: HashMap<String, String>,
    bodies: HashMap<String, Body>,
    cancel: CancellationFlag,
    cancel_on_page: Option<String>,
    page_delay: Duration,
    stream_delay: Duration,
    page_calls: AtomicUsize,
    stream_calls: AtomicUsize,
    pages_in_flight: Arc<InFlight>,
    streams_in_flight: Arc<InFlight>,
}

impl FakeArchive {
    fn new(items: usize, cancel: CancellationFlag) -> Self {
        let mut pages = HashMap::new();
        let mut bodies = HashMap::new();
        let mut listing = String::from(r#"<div class="download-directory-listing">"#);
        for i in 0..items {
            listing.push_str(&format!(r#"<a href="item{i}/">item{i}</a>"#));
            pages.insert(
                format!("{LISTING}item{i}/"),
                format!(r#"<a href="video{i}.mp4">video</a>"#),
            );
            bodies.insert(
                format!("{LISTING}item{i}/video{i}.mp4"),
                Body::Chunks(vec!["abc", "defg"]),
            );
        }
        listing.push_str("</div>");
        pages.insert(LISTING.to_string(), listing);

        Self {
            pages,
            bodies,
            cancel,
            cancel_on_page: None,
            page_delay: Duration::ZERO,
            stream_delay: Duration::ZERO,
            page_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
            pages_in_flight: Arc::new(InFlight::default()),
            streams_in_flight: Arc::new(InFlight::default()),
        }
    }

    fn media_url(i: usize) -> String {
        format!("{LISTING}item{i}/video{i}.mp4")
    }

    fn with_body(mut self, i: usize, body: Body) -> Self {
        self.bodies.insert(Self::media_url(i), body);
        self
    }

    fn with_item_page(mut self, i: usize, html: &str) -> Self {
        self.pages.insert(format!("{LISTING}item{i}/"), html.to_string());
        self
    }

    fn with_delays(mut self, page: Duration, stream: Duration) -> Self {
        self.page_delay = page;
        self.stream_delay = stream;
        self
    }

    fn cancelling_on_page(mut self, url: String) -> Self {
        self.cancel_on_page = Some(url);
        self
    }

    fn item_page_calls(&self) -> usize {
        // The listing fetch is not an item page.
        self.page_calls.load(Ordering::SeqCst).saturating_sub(1)
    }

    fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeArchive {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.pages_in_flight.enter();
        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }
        if self.cancel_on_page.as_deref() == Some(url) {
            self.cancel.cancel();
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::http_status(url, 404))
    }

    async fn open_stream(&self, url: &str) -> Result<MediaResponse, FetchError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let guard = self.streams_in_flight.enter();
        let body = self
            .bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::http_status(url, 404))?;

        let delay = self.stream_delay;
        let owned_url = url.to_string();
        let cancel = self.cancel.clone();
        let (chunks, tail_error, cancel_after_first) = match body {
            Body::Chunks(chunks) => (chunks, false, false),
            Body::BreaksAfter(chunks) => (chunks, true, false),
            Body::CancelsAfterFirst(chunks) => (chunks, false, true),
        };
        let content_length = chunks.iter().map(|c| c.len() as u64).sum();

        let mut items: Vec<Result<Bytes, FetchError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
        if tail_error {
            items.push(Err(FetchError::stream(&owned_url, "connection reset")));
        }

        let body = stream::iter(items.into_iter().enumerate())
            .then(move |(index, item)| {
                let cancel = cancel.clone();
                async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    if cancel_after_first && index == 1 {
                        cancel.cancel();
                    }
                    item
                }
            })
            // The guard lives as long as the stream does.
            .map(move |item| {
                let _held = &guard;
                item
            })
            .boxed();

        Ok(MediaResponse {
            content_length: Some(content_length),
            body,
        })
    }
}

async fn run(
    archive: Arc<FakeArchive>,
    cancel: CancellationFlag,
    dir: &Path,
) -> ripper_core::PipelineReport {
    run_with_config(archive, cancel, dir, RipperConfig::default()).await
}

async fn run_with_config(
    archive: Arc<FakeArchive>,
    cancel: CancellationFlag,
    dir: &Path,
    config: RipperConfig,
) -> ripper_core::PipelineReport {
    Pipeline::new(archive, cancel, config)
        .expect("config is valid")
        .run(LISTING, dir)
        .await
        .expect("run should not fail")
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("output dir").count()
}

#[tokio::test]
async fn test_existing_file_is_skipped_without_network() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(FakeArchive::new(1, cancel.clone()));
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("video0.mp4"), b"already here").unwrap();

    let report = run(Arc::clone(&archive), cancel, temp_dir.path()).await;

    assert_eq!(report.skipped(), 1);
    assert_eq!(archive.stream_calls(), 0);
    assert_eq!(
        std::fs::read(temp_dir.path().join("video0.mp4")).unwrap(),
        b"already here"
    );
}

#[tokio::test]
async fn test_resolution_never_exceeds_ten_concurrent_pages() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(
        FakeArchive::new(30, cancel.clone())
            .with_delays(Duration::from_millis(20), Duration::ZERO),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(Arc::clone(&archive), cancel, temp_dir.path()).await;

    assert_eq!(report.media_resolved, 30);
    assert_eq!(archive.item_page_calls(), 30);
    let peak = archive.pages_in_flight.peak();
    assert!(peak <= 10, "peak page concurrency {peak} exceeds 10");
    assert!(peak > 1, "resolution should run concurrently, peak was {peak}");
}

#[tokio::test]
async fn test_downloads_never_exceed_five_concurrent_streams() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(
        FakeArchive::new(15, cancel.clone())
            .with_delays(Duration::ZERO, Duration::from_millis(10)),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(Arc::clone(&archive), cancel, temp_dir.path()).await;

    assert_eq!(report.completed(), 15);
    assert_eq!(file_count(temp_dir.path()), 15);
    let peak = archive.streams_in_flight.peak();
    assert!(peak <= 5, "peak download concurrency {peak} exceeds 5");
    assert!(peak > 1, "downloads should run concurrently, peak was {peak}");
}

#[tokio::test]
async fn test_one_broken_stream_does_not_affect_the_others() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(
        FakeArchive::new(5, cancel.clone())
            .with_body(2, Body::BreaksAfter(vec!["partial"])),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(archive, cancel, temp_dir.path()).await;

    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(report.completed(), 4);
    assert_eq!(report.failed(), 1);
    assert!(!temp_dir.path().join("video2.mp4").exists());
    for i in [0, 1, 3, 4] {
        let content = std::fs::read(temp_dir.path().join(format!("video{i}.mp4"))).unwrap();
        assert_eq!(content, b"abcdefg");
    }
}

#[tokio::test]
async fn test_cancel_during_resolution_downloads_nothing() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(
        FakeArchive::new(3, cancel.clone()).cancelling_on_page(format!("{LISTING}item0/")),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(Arc::clone(&archive), cancel, temp_dir.path()).await;

    assert_eq!(report.state, PipelineState::Cancelled);
    assert!(report.downloads.is_empty());
    assert_eq!(archive.stream_calls(), 0);
    assert_eq!(file_count(temp_dir.path()), 0);
}

#[tokio::test]
async fn test_cancel_before_run_touches_nothing() {
    let cancel = CancellationFlag::new();
    cancel.cancel();
    let archive = Arc::new(FakeArchive::new(3, cancel.clone()));
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(Arc::clone(&archive), cancel, temp_dir.path()).await;

    assert_eq!(report.state, PipelineState::Cancelled);
    assert_eq!(archive.page_calls.load(Ordering::SeqCst), 0);
    assert_eq!(archive.stream_calls(), 0);
}

#[tokio::test]
async fn test_cancel_mid_download_removes_partial_files() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(
        FakeArchive::new(1, cancel.clone())
            .with_body(0, Body::CancelsAfterFirst(vec!["first", "second", "third"])),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(archive, cancel, temp_dir.path()).await;

    assert_eq!(report.state, PipelineState::Cancelled);
    assert_eq!(report.cancelled(), 1);
    assert!(matches!(
        report.downloads[0].outcome,
        DownloadOutcome::Cancelled
    ));
    assert_eq!(file_count(temp_dir.path()), 0);
}

#[tokio::test]
async fn test_cancel_mid_download_keeps_finished_files() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(
        FakeArchive::new(2, cancel.clone())
            .with_body(1, Body::CancelsAfterFirst(vec!["first", "second", "third"])),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = RipperConfig {
        download_concurrency: 1,
        ..RipperConfig::default()
    };

    let report = run_with_config(archive, cancel, temp_dir.path(), config).await;

    assert_eq!(report.state, PipelineState::Cancelled);
    assert_eq!(report.completed(), 1);
    assert_eq!(report.cancelled(), 1);
    assert_eq!(
        std::fs::read(temp_dir.path().join("video0.mp4")).unwrap(),
        b"abcdefg"
    );
    assert!(!temp_dir.path().join("video1.mp4").exists());
}

#[tokio::test]
async fn test_name_collision_with_failed_winner_is_not_skipped() {
    let cancel = CancellationFlag::new();
    // item1 links a different URL that maps to the same local name as item0's.
    let archive = Arc::new(
        FakeArchive::new(2, cancel.clone())
            .with_item_page(1, r#"<a href="video0.mp4">same name</a>"#)
            .with_body(0, Body::BreaksAfter(vec!["partial"])),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(Arc::clone(&archive), cancel, temp_dir.path()).await;

    assert_eq!(report.media_resolved, 2);
    assert_eq!(report.skipped(), 0);
    assert_eq!(report.failed(), 2);
    let loser = report
        .downloads
        .iter()
        .find(|record| record.url == format!("{LISTING}item1/video0.mp4"))
        .expect("collision record");
    assert!(matches!(
        loser.outcome,
        DownloadOutcome::Failed(DownloadError::Collision { .. })
    ));
    // Only the winner ever opened a stream.
    assert_eq!(archive.stream_calls(), 1);
    assert_eq!(file_count(temp_dir.path()), 0);
}

#[tokio::test]
async fn test_name_collision_with_completed_winner_is_skipped() {
    let cancel = CancellationFlag::new();
    let archive = Arc::new(
        FakeArchive::new(2, cancel.clone())
            .with_item_page(1, r#"<a href="video0.mp4">same name</a>"#),
    );
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(Arc::clone(&archive), cancel, temp_dir.path()).await;

    assert_eq!(report.completed(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(archive.stream_calls(), 1);
    let winner_path = temp_dir.path().join("video0.mp4");
    assert!(report
        .downloads
        .iter()
        .filter(|record| record.outcome.is_skipped())
        .all(|record| record.outcome.path() == Some(winner_path.as_path())));
    assert!(winner_path.exists());
}
