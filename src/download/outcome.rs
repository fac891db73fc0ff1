//! Per-file result of a download attempt.

use std::path::{Path, PathBuf};

use super::DownloadError;

/// Terminal result of one [`Downloader::download`](super::Downloader::download) call.
///
/// No outcome is retried automatically.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The file was written in full.
    Completed(PathBuf),
    /// A file with the derived name already existed; nothing was transferred.
    Skipped(PathBuf),
    /// Cancellation was observed; any partial file has been removed.
    Cancelled,
    /// The transfer failed; any partial file has been removed.
    Failed(DownloadError),
}

impl DownloadOutcome {
    /// Returns the local path for `Completed` and `Skipped` outcomes.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Completed(path) | Self::Skipped(path) => Some(path),
            Self::Cancelled | Self::Failed(_) => None,
        }
    }

    /// Short lowercase label for logs and summaries.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Skipped(_) => "skipped",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;

    #[test]
    fn test_outcome_path_only_for_files_on_disk() {
        let done = DownloadOutcome::Completed(PathBuf::from("out/a.mp4"));
        let skipped = DownloadOutcome::Skipped(PathBuf::from("out/b.mp4"));
        let failed =
            DownloadOutcome::Failed(FetchError::http_status("https://h/c.mp4", 500).into());

        assert_eq!(done.path(), Some(Path::new("out/a.mp4")));
        assert_eq!(skipped.path(), Some(Path::new("out/b.mp4")));
        assert_eq!(DownloadOutcome::Cancelled.path(), None);
        assert_eq!(failed.path(), None);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DownloadOutcome::Cancelled.label(), "cancelled");
        assert!(DownloadOutcome::Completed(PathBuf::new()).is_completed());
        assert!(DownloadOutcome::Skipped(PathBuf::new()).is_skipped());
    }
}
