//! Pipeline states and the end-of-run report.

use std::fmt;

use crate::download::DownloadOutcome;

/// Position of a run in the pipeline state machine.
///
/// `Done` and `Cancelled` are terminal; `Cancelled` is reachable from every
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Discovering,
    Resolving,
    Downloading,
    Done,
    Cancelled,
}

impl PipelineState {
    /// Returns true for `Done` and `Cancelled`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Discovering => "discovering",
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Outcome of one media URL.
#[derive(Debug)]
pub struct DownloadRecord {
    /// The media URL that was attempted.
    pub url: String,
    /// What happened to it.
    pub outcome: DownloadOutcome,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Terminal state reached.
    pub state: PipelineState,
    /// Item-page links found on the listing.
    pub pages_discovered: usize,
    /// Media URLs resolved from those pages.
    pub media_resolved: usize,
    /// One record per media URL that reached the download stage.
    pub downloads: Vec<DownloadRecord>,
}

impl PipelineReport {
    pub(crate) fn new(state: PipelineState) -> Self {
        Self {
            state,
            pages_discovered: 0,
            media_resolved: 0,
            downloads: Vec::new(),
        }
    }

    pub(crate) fn enter(&mut self, next: PipelineState) {
        tracing::debug!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
    }

    /// Returns true if the run ended because cancellation was requested.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.state == PipelineState::Cancelled
    }

    /// Number of files written in full during this run.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(DownloadOutcome::is_completed)
    }

    /// Number of media URLs skipped because the file already existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(DownloadOutcome::is_skipped)
    }

    /// Number of downloads stopped by cancellation.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Cancelled))
    }

    /// Number of failed downloads.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.downloads
            .iter()
            .filter(|record| predicate(&record.outcome))
            .count()
    }
}
