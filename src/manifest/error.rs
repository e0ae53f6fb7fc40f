//! Error types for manifest loading and column resolution.
//!
//! Every variant here is fatal for a batch: the runner reports it and stops
//! before any download is attempted.

use std::path::PathBuf;

use thiserror::Error;

use super::columns::ColumnRole;

/// Errors that can occur while reading a manifest or binding its columns.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read (missing, unreadable, not UTF-8).
    #[error("cannot read manifest {path}: {source}")]
    Read {
        /// Path of the manifest file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest path does not name a `.csv` file.
    #[error("unsupported manifest {path}\n  Suggestion: pass a .csv file")]
    UnsupportedExtension {
        /// The rejected path.
        path: PathBuf,
    },

    /// The tabular encoding is malformed (unbalanced or stray quotes).
    #[error("malformed CSV on line {line}: {reason}")]
    Format {
        /// 1-based line where the problem was detected.
        line: usize,
        /// What went wrong.
        reason: &'static str,
    },

    /// The manifest holds no rows at all, not even a header.
    #[error("manifest is empty: no header row found")]
    Empty,

    /// A required column role could not be found in the header.
    #[error(
        "no '{}' column found in the manifest header\n  Header: {header}",
        role.header_names()[0]
    )]
    MissingColumn {
        /// The first unresolved required role, in resolution order.
        role: ColumnRole,
        /// The header row, joined for display.
        header: String,
    },
}

impl ManifestError {
    /// Creates a read error for the given path.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a format error at the given 1-based line.
    #[must_use]
    pub fn format(line: usize, reason: &'static str) -> Self {
        Self::Format { line, reason }
    }

    /// Creates a missing-column error for `role`, capturing the header for context.
    #[must_use]
    pub fn missing_column(role: ColumnRole, header: &[String]) -> Self {
        Self::MissingColumn {
            role,
            header: header.join(","),
        }
    }
}
