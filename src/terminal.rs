//! Terminal capability checks and tracing setup.

use std::io::{self, Write};

use indicatif::MultiProgress;
use tracing_subscriber::fmt::MakeWriter;

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_disable_color(no_color_env: bool, dumb_terminal: bool) -> bool {
    no_color_env || dumb_terminal
}

pub(crate) fn should_draw_progress(stderr_is_terminal: bool, dumb_terminal: bool) -> bool {
    stderr_is_terminal && !dumb_terminal
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_level`.
///
/// With `bars` set, every event is printed above the progress bars.
pub(crate) fn init_tracing(default_level: &str, no_color: bool, bars: Option<MultiProgress>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(StderrAboveBars { bars })
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

/// Stderr writer that hides the progress bars while an event is printed.
#[derive(Debug, Clone, Default)]
pub(crate) struct StderrAboveBars {
    bars: Option<MultiProgress>,
}

impl<'a> MakeWriter<'a> for StderrAboveBars {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            bars: self.bars.clone(),
            buf: Vec::new(),
        }
    }
}

/// Collects one formatted event and emits it in a single write on drop.
pub(crate) struct EventWriter {
    bars: Option<MultiProgress>,
    buf: Vec<u8>,
}

impl Write for EventWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        let _ = emit(self.bars.as_ref(), &self.buf, &mut io::stderr().lock());
    }
}

fn emit(bars: Option<&MultiProgress>, event: &[u8], out: &mut dyn Write) -> io::Result<()> {
    if event.is_empty() {
        return Ok(());
    }
    match bars {
        Some(bars) => bars.suspend(|| out.write_all(event)),
        None => out.write_all(event),
    }
}
