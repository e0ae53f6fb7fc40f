//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use manifest_fetch::{ConfigOverrides, PacingMode};

/// Download every file listed in a CSV manifest.
///
/// Each row's `DOWNLOAD` URL is fetched and saved as
/// `<ITEM_NAME>(<ENTRY_ID>).<ext>` in the output directory.
#[derive(Parser, Debug)]
#[command(name = "manifest-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the CSV manifest
    pub manifest: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory to write downloaded files to [default: .]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Extension appended to every output file [default: mp4]
    #[arg(short = 'e', long)]
    pub extension: Option<String>,

    /// Pacing between downloads [default: fixed]
    #[arg(long, value_enum)]
    pub pacing: Option<PacingMode>,

    /// Delay between downloads in milliseconds for fixed pacing (max 600000) [default: 5000]
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u64).range(0..=600_000))]
    pub delay_ms: Option<u64>,

    /// Requests per second for token-bucket pacing [default: 1]
    #[arg(long = "rate")]
    pub rate_per_sec: Option<f64>,

    /// Requests allowed back to back for token-bucket pacing [default: 1]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub burst: Option<u32>,

    /// Fail if the manifest has no ENTRY_ID column
    #[arg(long)]
    pub require_entry_id: bool,

    /// Save response bodies even for non-2xx statuses
    #[arg(long)]
    pub accept_any_status: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Values given on the command line, for merging over the config file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            output_dir: self.output_dir.clone(),
            extension: self.extension.clone(),
            pacing: self.pacing,
            delay_ms: self.delay_ms,
            rate_per_sec: self.rate_per_sec,
            burst: self.burst,
            require_entry_id: self.require_entry_id,
            accept_any_status: self.accept_any_status,
        }
    }
}
