//! Byte-count progress observers for downloads.
//!
//! The downloader only knows about the [`ProgressReporter`] trait; terminal
//! rendering lives in [`BarProgress`], and [`NoProgress`] drops every update.

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Factory for per-file progress sinks.
pub trait ProgressReporter: Send + Sync {
    /// Called once a transfer starts. `total_bytes` is the `Content-Length`, if known.
    fn start(&self, name: &str, total_bytes: Option<u64>) -> Box<dyn ProgressSink>;
}

/// Receives updates for one transfer.
pub trait ProgressSink: Send {
    /// Reports the cumulative number of bytes written so far.
    fn advance(&mut self, bytes_written: u64);

    /// Called exactly once when the transfer ends, successfully or not.
    fn finish(&mut self);
}

/// Reporter that discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn start(&self, _name: &str, _total_bytes: Option<u64>) -> Box<dyn ProgressSink> {
        Box::new(NoProgress)
    }
}

impl ProgressSink for NoProgress {
    fn advance(&mut self, _bytes_written: u64) {}

    fn finish(&mut self) {}
}

const BAR_TEMPLATE: &str =
    "{msg:30!} {wide_bar} {binary_bytes}/{binary_total_bytes} [{elapsed_precise}<{eta_precise}]";
const SPINNER_TEMPLATE: &str = "{spinner} {msg:30!} {binary_bytes} [{elapsed_precise}]";

/// One indicatif bar per active download, stacked in a [`MultiProgress`].
#[derive(Debug, Clone)]
pub struct BarProgress {
    multi: MultiProgress,
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl BarProgress {
    /// Creates a reporter drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// Handle for printing lines above the bars without tearing them.
    #[must_use]
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, name: &str, total_bytes: Option<u64>) -> Box<dyn ProgressSink> {
        let bar = match total_bytes {
            Some(total) if total > 0 => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                bar
            }
            _ => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template(SPINNER_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        let bar = self.multi.add(bar);
        bar.set_message(name.to_string());
        Box::new(BarSink { bar })
    }
}

struct BarSink {
    bar: ProgressBar,
}

impl ProgressSink for BarSink {
    fn advance(&mut self, bytes_written: u64) {
        self.bar.set_position(bytes_written);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}
