//! Start and finish banners printed to stdout.

use std::path::Path;

use ripper_core::PipelineReport;

/// First line of every run.
pub const START_BANNER: &str = "Script started";

/// Last line of every run, printed even after fatal errors.
pub const FINISH_BANNER: &str = "Script finished";

/// How to stop a run early.
pub const INTERRUPT_HINT: &str = "Press Ctrl+C to stop the script gracefully";

/// Lines shown before the pipeline starts.
pub fn start_lines(url: &str, output_dir: &Path) -> Vec<String> {
    vec![
        START_BANNER.to_string(),
        format!("Source: {url}"),
        format!("Saving to: {}", output_dir.display()),
        INTERRUPT_HINT.to_string(),
    ]
}

/// One-line outcome of a run.
pub fn summary_line(report: &PipelineReport) -> String {
    let status = if report.was_cancelled() {
        "Stopped"
    } else {
        "Done"
    };
    format!(
        "{status}: {} pages, {} video links, {} downloaded, {} skipped, {} cancelled, {} failed",
        report.pages_discovered,
        report.media_resolved,
        report.completed(),
        report.skipped(),
        report.cancelled(),
        report.failed(),
    )
}

pub fn print_start(url: &str, output_dir: &Path) {
    for line in start_lines(url, output_dir) {
        println!("{line}");
    }
}

/// Prints the summary (when the run produced a report) and the finish banner.
pub fn print_finish(report: Option<&PipelineReport>) {
    if let Some(report) = report {
        println!("{}", summary_line(report));
    }
    println!("{FINISH_BANNER}");
}
