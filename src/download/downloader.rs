//! Streaming media downloads with skip-if-exists and partial-file cleanup.

use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::constants::CHUNK_SIZE;
use super::filename::local_path;
use super::{DownloadError, DownloadOutcome};
use crate::cancel::CancellationFlag;
use crate::fetch::{ByteStream, Fetcher, MediaResponse};
use crate::progress::{NoProgress, ProgressReporter, ProgressSink};

/// How a body transfer ended when no error occurred.
enum StreamEnd {
    Finished(u64),
    Cancelled(u64),
}

/// Downloads single media files into an output directory.
///
/// A `Downloader` is cheap to share behind an `Arc`; every call is
/// independent and leaves either a complete file or no file at all.
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationFlag,
    progress: Arc<dyn ProgressReporter>,
    chunk_size: usize,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("cancel", &self.cancel)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Creates a downloader with no progress output and 8 KiB write chunks.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, cancel: CancellationFlag) -> Self {
        Self {
            fetcher,
            cancel,
            progress: Arc::new(NoProgress),
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Routes byte-count updates to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Overrides the write chunk size (clamped to at least one byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Downloads `media_url` into `output_dir`.
    ///
    /// - An existing file with the derived name short-circuits to
    ///   [`DownloadOutcome::Skipped`] without touching the network.
    /// - Cancellation is checked before the request and before every chunk.
    /// - Cancellation and errors after the file was created remove it again.
    #[instrument(skip(self, media_url, output_dir), fields(url = %media_url))]
    pub async fn download(&self, media_url: &str, output_dir: &Path) -> DownloadOutcome {
        let path = match local_path(media_url, output_dir) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Error downloading");
                return DownloadOutcome::Failed(e.into());
            }
        };
        let name = display_name(&path);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(file = %name, "already exists, skipping download");
            return DownloadOutcome::Skipped(path);
        }

        if self.cancel.is_cancelled() {
            debug!(file = %name, "cancelled before request");
            return DownloadOutcome::Cancelled;
        }

        let response = match self.fetcher.open_stream(media_url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(file = %name, error = %e, "Error downloading");
                return DownloadOutcome::Failed(e.into());
            }
        };

        // create_new closes the gap between the existence check and the write.
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                info!(file = %name, "appeared during request, skipping download");
                return DownloadOutcome::Skipped(path);
            }
            Err(e) => {
                let error = DownloadError::io(path.clone(), e);
                warn!(file = %name, error = %error, "Error downloading");
                return DownloadOutcome::Failed(error);
            }
        };

        self.write_body(file, response, media_url, &path, &name).await
    }

    /// Streams the response into an already created file and settles the outcome.
    ///
    /// The file at `path` is removed again unless the transfer finished.
    async fn write_body<W>(
        &self,
        file: W,
        response: MediaResponse,
        media_url: &str,
        path: &Path,
        name: &str,
    ) -> DownloadOutcome
    where
        W: AsyncWrite + Unpin,
    {
        let mut sink = self.progress.start(name, response.content_length);
        let result = self
            .stream_to_file(file, response.body, media_url, path, sink.as_mut())
            .await;
        sink.finish();

        match result {
            Ok(StreamEnd::Finished(bytes)) => {
                info!(path = %path.display(), bytes, "download complete");
                DownloadOutcome::Completed(path.to_path_buf())
            }
            Ok(StreamEnd::Cancelled(bytes)) => {
                remove_partial(path).await;
                info!(file = %name, bytes, "download cancelled, partial file removed");
                DownloadOutcome::Cancelled
            }
            Err(e) => {
                remove_partial(path).await;
                warn!(file = %name, error = %e, "Error downloading");
                DownloadOutcome::Failed(e)
            }
        }
    }

    /// Streams `body` into `file` in fixed-size slices.
    ///
    /// The writer is flushed and dropped before returning on every path so the
    /// caller can delete the file safely.
    async fn stream_to_file<W>(
        &self,
        file: W,
        mut body: ByteStream,
        url: &str,
        file_path: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Result<StreamEnd, DownloadError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(file);
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = body.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = writer.shutdown().await;
                    debug!(%url, bytes_written, "body stream failed");
                    return Err(e.into());
                }
            };

            for slice in chunk.chunks(self.chunk_size) {
                if self.cancel.is_cancelled() {
                    let _ = writer.shutdown().await;
                    return Ok(StreamEnd::Cancelled(bytes_written));
                }

                if let Err(e) = writer.write_all(slice).await {
                    let _ = writer.shutdown().await;
                    return Err(DownloadError::io(file_path.to_path_buf(), e));
                }

                bytes_written += slice.len() as u64;
                sink.advance(bytes_written);
            }
        }

        writer
            .shutdown()
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        Ok(StreamEnd::Finished(bytes_written))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove partial file"),
    }
}
