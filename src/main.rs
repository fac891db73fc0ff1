//! CLI entry point for the archive ripper.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ripper_core::{
    BarProgress, CancellationFlag, HttpFetcher, NoProgress, Pipeline, PipelineReport,
    ProgressReporter, RipperConfig, default_output_dir, install_interrupt_handler,
};
use tracing::{debug, error};

mod cli;
mod output;
mod terminal;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let dumb_terminal = terminal::is_dumb_terminal();
    let no_color =
        terminal::should_disable_color(terminal::no_color_env_requested(), dumb_terminal);
    let bars = terminal::should_draw_progress(io::stderr().is_terminal(), dumb_terminal)
        .then(BarProgress::new);
    terminal::init_tracing("info", no_color, bars.as_ref().map(|b| b.multi().clone()));
    debug!(?args, "CLI arguments parsed");

    let output_dir = args.output_dir.clone().unwrap_or_else(default_output_dir);
    output::print_start(&args.url, &output_dir);

    let cancel = CancellationFlag::new();
    let listener = install_interrupt_handler(cancel.clone());

    let progress: Arc<dyn ProgressReporter> = match bars {
        Some(bars) => Arc::new(bars),
        None => Arc::new(NoProgress),
    };

    let result = run(&args.url, &output_dir, cancel, progress).await;
    listener.abort();

    match &result {
        Ok(report) => output::print_finish(Some(report)),
        Err(e) => {
            error!(error = %e, "run aborted");
            output::print_finish(None);
        }
    }
    result.map(|_| ())
}

async fn run(
    url: &str,
    output_dir: &Path,
    cancel: CancellationFlag,
    progress: Arc<dyn ProgressReporter>,
) -> Result<PipelineReport> {
    let config = RipperConfig::default();
    let fetcher = HttpFetcher::with_timeouts(config.connect_timeout, config.page_timeout)
        .context("failed to build HTTP client")?;
    let pipeline = Pipeline::new(Arc::new(fetcher), cancel, config)?.with_progress(progress);
    let report = pipeline.run(url, output_dir).await?;
    Ok(report)
}
