//! Batch runner: walks manifest rows and downloads each one in turn.
//!
//! This module provides the [`BatchRunner`] which drives the row-to-file
//! pipeline sequentially: compose a filename, sanitize it, wait for the
//! [`Pacer`], fetch, record the outcome, repeat.
//!
//! # Overview
//!
//! Each row ends in exactly one [`RowOutcome`], independent of its siblings:
//!
//! - `Skipped` when the row is too short or yields no usable filename
//! - `Downloaded` when the body was saved
//! - `Failed` when fetching or writing failed; the batch keeps going
//!
//! Manifest problems (unreadable file, bad quoting, missing columns) are
//! returned as [`ManifestError`] before any request is made.
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
//! let runner = BatchRunner::new(HttpClient::new()?, pacer, ".");
//! let summary = runner.run(Path::new("videos.csv")).await?;
//! println!("Downloaded: {}, Skipped: {}, Failed: {}", summary.downloaded(), summary.skipped(), summary.failed());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::client::{FetchedFile, HttpClient, parse_download_url};
use super::error::DownloadError;
use super::filename::{FilenameError, FilenameTemplate, OutputFilename};
use super::pacing::Pacer;
use crate::manifest::{ColumnBindings, ColumnRequirements, Manifest, ManifestError};

/// Why a row was not attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSkip {
    /// The row has fewer fields than the highest bound column needs.
    ShortRow {
        /// Fields present in the row.
        fields: usize,
        /// Fields needed to cover every bound column.
        required: usize,
    },
    /// Nothing usable was left of the composed filename.
    EmptyFilename(FilenameError),
}

impl fmt::Display for RowSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortRow { fields, required } => {
                write!(f, "row has {fields} field(s), {required} needed")
            }
            Self::EmptyFilename(err) => write!(f, "{err}"),
        }
    }
}

/// Final state of one manifest row.
#[derive(Debug)]
pub enum RowOutcome {
    /// The row was not eligible for download.
    Skipped(RowSkip),
    /// The body was written to disk.
    Downloaded(FetchedFile),
    /// Fetching or writing failed.
    Failed(DownloadError),
}

/// Outcome of one row plus the context needed to diagnose it.
#[derive(Debug)]
pub struct RowReport {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    /// URL from the row, when the row was long enough to have one.
    pub url: Option<String>,
    /// Sanitized filename, when one could be composed.
    pub filename: Option<OutputFilename>,
    /// What happened.
    pub outcome: RowOutcome,
}

impl RowReport {
    fn log(&self) {
        let url = self.url.as_deref().unwrap_or("-");
        let file = self.filename.as_ref().map_or("-", OutputFilename::as_str);
        match &self.outcome {
            RowOutcome::Downloaded(fetched) => {
                debug!(row = self.row, file, bytes = fetched.bytes_written, "row downloaded");
            }
            RowOutcome::Skipped(reason) => {
                warn!(row = self.row, url, reason = %reason, "skipping row");
            }
            RowOutcome::Failed(error) => {
                warn!(
                    row = self.row,
                    url,
                    file,
                    kind = error.kind(),
                    error = %error,
                    "error downloading file"
                );
            }
        }
    }
}

/// Per-row reports for a whole batch, in manifest order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    reports: Vec<RowReport>,
}

impl BatchSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row report.
    pub fn record(&mut self, report: RowReport) {
        self.reports.push(report);
    }

    /// All row reports in manifest order.
    #[must_use]
    pub fn reports(&self) -> &[RowReport] {
        &self.reports
    }

    /// Returns the number of rows saved to disk.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, RowOutcome::Downloaded(_)))
    }

    /// Returns the number of rows skipped as ineligible.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, RowOutcome::Skipped(_)))
    }

    /// Returns the number of rows whose download failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, RowOutcome::Failed(_)))
    }

    /// Returns the number of rows processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Paths written during the batch, in manifest order.
    #[must_use]
    pub fn written_paths(&self) -> Vec<&Path> {
        self.reports
            .iter()
            .filter_map(|report| match &report.outcome {
                RowOutcome::Downloaded(fetched) => Some(fetched.path.as_path()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&RowOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Sequential manifest downloader.
///
/// Rows are processed strictly one after another. The [`Pacer`] is consulted
/// before every network request and told when each one finishes, so the first
/// request starts immediately and no delay follows the last one. Skipped rows
/// and rows with an unusable URL never wait.
#[derive(Debug)]
pub struct BatchRunner {
    client: HttpClient,
    pacer: Arc<Pacer>,
    template: FilenameTemplate,
    requirements: ColumnRequirements,
    output_dir: PathBuf,
}

impl BatchRunner {
    /// Creates a runner writing into `output_dir` with the default template
    /// (`.mp4`) and column requirements (entry id optional).
    #[must_use]
    pub fn new(client: HttpClient, pacer: Arc<Pacer>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            pacer,
            template: FilenameTemplate::default(),
            requirements: ColumnRequirements::default(),
            output_dir: output_dir.into(),
        }
    }

    /// Returns this runner with a different filename template.
    #[must_use]
    pub fn with_template(mut self, template: FilenameTemplate) -> Self {
        self.template = template;
        self
    }

    /// Returns this runner with different column requirements.
    #[must_use]
    pub fn with_requirements(mut self, requirements: ColumnRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Directory output files are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Loads the manifest at `manifest_path` and downloads every eligible row.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the manifest cannot be loaded or lacks a
    /// required column. Per-row failures are reported in the summary instead.
    #[instrument(skip(self), fields(manifest = %manifest_path.display()))]
    pub async fn run(&self, manifest_path: &Path) -> Result<BatchSummary, ManifestError> {
        let manifest = Manifest::from_path(manifest_path)?;
        self.run_manifest(&manifest).await
    }

    /// Downloads every eligible row of an already parsed manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingColumn`] before any request when the
    /// header lacks a required column.
    pub async fn run_manifest(&self, manifest: &Manifest) -> Result<BatchSummary, ManifestError> {
        let bindings = manifest.bind(self.requirements)?;
        info!(
            rows = manifest.len(),
            entry_id = bindings.entry_id().is_some(),
            output_dir = %self.output_dir.display(),
            "processing manifest"
        );

        let mut summary = BatchSummary::new();
        for (index, row) in manifest.rows().iter().enumerate() {
            let report = self.process_row(index + 1, row, &bindings).await;
            report.log();
            summary.record(report);
        }

        info!(
            downloaded = summary.downloaded(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            total = summary.total(),
            "batch complete"
        );
        Ok(summary)
    }

    async fn process_row(
        &self,
        row_number: usize,
        row: &[String],
        bindings: &ColumnBindings,
    ) -> RowReport {
        let Some(item) = bindings.item_for(row) else {
            return RowReport {
                row: row_number,
                url: None,
                filename: None,
                outcome: RowOutcome::Skipped(RowSkip::ShortRow {
                    fields: row.len(),
                    required: bindings.max_index() + 1,
                }),
            };
        };

        let filename = match self.template.compose(&item) {
            Ok(filename) => filename,
            Err(err) => {
                return RowReport {
                    row: row_number,
                    url: Some(item.url.to_string()),
                    filename: None,
                    outcome: RowOutcome::Skipped(RowSkip::EmptyFilename(err)),
                };
            }
        };

        if let Err(error) = parse_download_url(item.url) {
            return RowReport {
                row: row_number,
                url: Some(item.url.to_string()),
                filename: Some(filename),
                outcome: RowOutcome::Failed(error),
            };
        }

        self.pacer.acquire().await;
        let result = self.client.fetch(item.url, &filename, &self.output_dir).await;
        self.pacer.complete().await;

        let outcome = match result {
            Ok(fetched) => RowOutcome::Downloaded(fetched),
            Err(error) => RowOutcome::Failed(error),
        };

        RowReport {
            row: row_number,
            url: Some(item.url.to_string()),
            filename: Some(filename),
            outcome,
        }
    }
}
