//! Error types for the download module.
//!
//! Each variant is a per-row failure: the batch runner records it against the
//! row and moves on to the next one.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching one manifest row to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The manifest URL does not parse as an absolute URL.
    #[error("invalid URL: '{url}'")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Transport-level failure (DNS, connection refused, TLS, broken body stream).
    #[error("error fetching {url}: {source}")]
    Fetch {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request timed out before the body finished.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The output file could not be created.
    #[error("failed to create file {path}: {source}")]
    FileCreate {
        /// Path of the file that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the body to the output file failed part way.
    #[error("failed to save file {path}: {source}")]
    Write {
        /// Path of the partially written file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a transport error, promoting timeouts to [`DownloadError::Timeout`].
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Fetch {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a file-create error.
    pub fn file_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly category for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Fetch { .. } => "fetch",
            Self::Timeout { .. } => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::FileCreate { .. } => "file_create",
            Self::Write { .. } => "write",
            Self::ClientBuild { .. } => "client_build",
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the url
// or path the source error lacks, so callers go through the constructors.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_invalid_url_display() {
        let msg = DownloadError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_download_error_http_status_display() {
        let msg = DownloadError::http_status("https://example.com/a.mp4", 404).to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/a.mp4"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_file_create_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let msg = DownloadError::file_create("/tmp/Clip(1).mp4", io_error).to_string();
        assert!(msg.contains("create"), "Expected 'create' in: {msg}");
        assert!(msg.contains("/tmp/Clip(1).mp4"), "Expected path in: {msg}");
    }

    #[test]
    fn test_download_error_write_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full");
        let msg = DownloadError::write("/tmp/Clip.mp4", io_error).to_string();
        assert!(msg.contains("save"), "Expected 'save' in: {msg}");
        assert!(msg.contains("disk full"), "Expected source in: {msg}");
    }

    #[test]
    fn test_download_error_kind_labels() {
        assert_eq!(DownloadError::invalid_url("x").kind(), "invalid_url");
        assert_eq!(DownloadError::http_status("x", 500).kind(), "http_status");
    }
}
