//! Cooperative cancellation shared by every pipeline stage.
//!
//! A [`CancellationFlag`] is created once per run and handed to each component
//! at construction time. Stages poll it at their checkpoints (before a network
//! call, before a disk write) instead of being aborted from the outside, so an
//! interrupted run never leaves a truncated file behind.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

/// Message printed when the first interrupt is received.
pub const INTERRUPT_ACK: &str = "Stopping the script gracefully...";

/// Write-once cancellation flag shared across tasks.
///
/// Cloning is cheap and every clone observes the same state. Once set, the
/// flag is never reset for the lifetime of the run.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Creates a flag in the "not cancelled" state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    ///
    /// Returns `true` only for the call that actually flipped it.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Spawns a listener that raises `flag` on the first Ctrl+C.
///
/// The listener never terminates the process; stages unwind on their own at
/// the next checkpoint. Must be called from within a Tokio runtime.
pub fn install_interrupt_handler(flag: CancellationFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                if flag.cancel() {
                    eprintln!("\n{INTERRUPT_ACK}");
                    debug!("cancellation flag raised by interrupt");
                }
            }
            Err(e) => warn!(error = %e, "failed to listen for interrupt signal"),
        }
    })
}
