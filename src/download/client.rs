//! HTTP client wrapper for fetching one manifest row to disk.
//!
//! This module provides the `HttpClient` struct which issues a single GET per
//! row and streams the body straight into the final output path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::OutputFilename;

/// How non-2xx responses are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any non-success status fails the row before a file is created.
    #[default]
    RequireSuccess,
    /// Save whatever the server sends, including error pages.
    AcceptAny,
}

/// HTTP client for downloading manifest rows.
///
/// Created once per batch and reused for every row, taking advantage of
/// connection pooling. Requests carry no custom headers and are never retried.
///
/// # Example
///
/// ```no_run
/// use manifest_fetch::download::{HttpClient, OutputFilename};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let name = OutputFilename::new("Intro(1).mp4")?;
/// let fetched = client.fetch("https://example.com/intro.mp4", &name, Path::new(".")).await?;
/// println!("Saved {} bytes to {}", fetched.bytes_written, fetched.path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    status_policy: StatusPolicy,
}

/// Result of a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Path the body was written to.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes_written: u64,
    /// HTTP status of the response.
    pub status: u16,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes between body reads
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be initialised.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self {
            client,
            status_policy: StatusPolicy::default(),
        })
    }

    /// Returns this client with a different status policy.
    #[must_use]
    pub fn with_status_policy(mut self, status_policy: StatusPolicy) -> Self {
        self.status_policy = status_policy;
        self
    }

    /// Returns the configured status policy.
    #[must_use]
    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    /// Fetches `url` and writes the body to `output_dir/filename`.
    ///
    /// An existing file with the same name is truncated. If the body stream or
    /// a disk write fails part way, the partial file is removed.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if `url` is not an absolute http(s) URL
    /// - [`DownloadError::Fetch`] / [`DownloadError::Timeout`] on transport failure
    /// - [`DownloadError::HttpStatus`] for non-2xx responses under
    ///   [`StatusPolicy::RequireSuccess`]
    /// - [`DownloadError::FileCreate`] if the output file cannot be created
    /// - [`DownloadError::Write`] if writing the body fails
    #[must_use = "fetch result reports whether the row was saved"]
    #[instrument(skip(self, filename, output_dir), fields(url = %url, file = %filename))]
    pub async fn fetch(
        &self,
        url: &str,
        filename: &OutputFilename,
        output_dir: &Path,
    ) -> Result<FetchedFile, DownloadError> {
        debug!("starting fetch");

        let parsed_url = parse_download_url(url)?;

        let response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(|e| DownloadError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            match self.status_policy {
                StatusPolicy::RequireSuccess => {
                    return Err(DownloadError::http_status(url, status.as_u16()));
                }
                StatusPolicy::AcceptAny => {
                    warn!(
                        status = status.as_u16(),
                        "saving non-success response body as requested"
                    );
                }
            }
        }

        let file_path = output_dir.join(filename);
        let mut file = File::create(&file_path)
            .await
            .map_err(|e| DownloadError::file_create(file_path.clone(), e))?;

        let stream_result = stream_to_file(&mut file, response, url, &file_path).await;
        if stream_result.is_err() {
            debug!(path = %file_path.display(), "removing partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(&file_path).await;
        }
        let bytes_written = stream_result?;

        info!(
            file = %filename,
            bytes = bytes_written,
            "downloaded successfully"
        );

        Ok(FetchedFile {
            path: file_path,
            bytes_written,
            status: status.as_u16(),
        })
    }
}

/// Validates a manifest URL before any network activity.
pub(crate) fn parse_download_url(url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(DownloadError::invalid_url(url));
    }
    Ok(parsed)
}

/// Streams response body to file, returning bytes written.
///
/// Kept separate so the caller can clean up on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::fetch(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::write(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::write(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
