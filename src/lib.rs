//! Manifest Fetch Core Library
//!
//! This library turns a CSV manifest (rows with a download URL, a display
//! name and an optional entry id) into files on disk, one sequential HTTP GET
//! per row, with safe filenames and pacing between requests.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`manifest`] - CSV reading and header column resolution
//! - [`download`] - Filename derivation, HTTP fetch, pacing and the batch runner
//! - [`config`] - Layered TOML/CLI configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod manifest;

// Re-export commonly used types
pub use config::{ConfigError, ConfigOverrides, FileConfig, PacingMode, Settings, load_config};
pub use download::{
    BatchRunner, BatchSummary, DownloadError, FilenameTemplate, HttpClient, OutputFilename,
    Pacer, PacingPolicy, RowOutcome, RowReport, RowSkip, StatusPolicy, sanitize,
};
pub use manifest::{ColumnBindings, ColumnRequirements, Manifest, ManifestError};
