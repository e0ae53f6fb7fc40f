//! CLI entry point for the manifest-fetch tool.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod app;
mod cli;

use cli::Args;

/// Process-level outcome, mapped to the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every row was downloaded or skipped.
    Success,
    /// At least one row failed, whatever else downloaded.
    RowsFailed,
    /// The manifest or configuration could not be used.
    Fatal,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::RowsFailed => 1,
            Self::Fatal => 3,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    match app::runtime::run_manifest_fetch(args).await {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(err) => {
            error!("manifest-fetch failed: {err:#}");
            ExitCode::from(ProcessExit::Fatal.code())
        }
    }
}
