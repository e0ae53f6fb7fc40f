//! HTTP download pipeline for manifest rows.
//!
//! This module turns manifest rows into files on disk, one row at a time.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large media files)
//! - Filenames composed from manifest fields and sanitized for every common filesystem
//! - Configurable pacing between requests (fixed delay or token bucket)
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Per-row outcomes; one bad row never stops the batch
//!
//! # Example
//!
//! ```no_run
//! use manifest_fetch::download::{BatchRunner, HttpClient, Pacer, PacingPolicy};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pacer = Arc::new(Pacer::new(PacingPolicy::default()));
//! let runner = BatchRunner::new(HttpClient::new()?, pacer, "./downloads");
//! let summary = runner.run(Path::new("videos.csv")).await?;
//! println!("Failed rows: {}", summary.failed());
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
pub mod constants;
mod error;
mod filename;
pub mod pacing;

pub use batch::{BatchRunner, BatchSummary, RowOutcome, RowReport, RowSkip};
pub use client::{FetchedFile, HttpClient, StatusPolicy};
pub use error::DownloadError;
pub use filename::{
    DEFAULT_EXTENSION, FilenameError, FilenameTemplate, OutputFilename, sanitize,
};
pub use pacing::{DEFAULT_DELAY, Pacer, PacingPolicy};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
