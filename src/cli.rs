//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use ripper_core::DEFAULT_LISTING_URL;

/// Mirror the video files linked from a directory-style listing.
///
/// Archive Ripper fetches a listing page, follows every entry of its download
/// directory to the item page, and downloads the first .mp4/.mkv file found
/// there. Files already present in the output directory are skipped.
#[derive(Parser, Debug)]
#[command(name = "archive-ripper")]
#[command(author, version, about)]
pub struct Args {
    /// Listing page to scrape
    #[arg(short, long, default_value = DEFAULT_LISTING_URL)]
    pub url: String,

    /// Directory to save files into [default: ~/Downloads/archive_org_videos]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
