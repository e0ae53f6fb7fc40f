//! Manifest loading: CSV records plus header column bindings.
//!
//! A manifest is a comma-separated file whose first row names the columns.
//! Only three roles matter to the downloader (see [`ColumnRole`]); every
//! other column is carried along untouched and ignored.
//!
//! # Example
//!
//! ```
//! use manifest_fetch::manifest::{ColumnRequirements, Manifest};
//!
//! let manifest = Manifest::parse("ITEM_NAME,DOWNLOAD\nIntro,https://example.com/a.mp4\n")?;
//! let bindings = manifest.bind(ColumnRequirements::default())?;
//! let item = bindings.item_for(&manifest.rows()[0]).expect("row is complete");
//! assert_eq!(item.url, "https://example.com/a.mp4");
//! # Ok::<(), manifest_fetch::manifest::ManifestError>(())
//! ```

mod columns;
mod error;
mod reader;

pub use columns::{ColumnBindings, ColumnRequirements, ColumnRole, DownloadItem};
pub use error::ManifestError;

use std::path::Path;

use tracing::{debug, instrument};

/// File extension a manifest path must carry.
pub const MANIFEST_EXTENSION: &str = "csv";

/// Parsed manifest: a header row plus data rows in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Manifest {
    /// Parses manifest text held in memory.
    ///
    /// A leading UTF-8 byte-order mark is ignored.
    ///
    /// # Errors
    ///
    /// - [`ManifestError::Format`] when the CSV quoting is malformed
    /// - [`ManifestError::Empty`] when there is no header row
    #[instrument(skip(source), fields(source_len = source.len()))]
    pub fn parse(source: &str) -> Result<Self, ManifestError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let mut records = reader::read_records(source)?.into_iter();
        let header = records.next().ok_or(ManifestError::Empty)?;
        let rows: Vec<_> = records.collect();
        debug!(columns = header.len(), rows = rows.len(), "parsed manifest");
        Ok(Self { header, rows })
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// - [`ManifestError::UnsupportedExtension`] when `path` is not a `.csv` file
    /// - [`ManifestError::Read`] when the file cannot be read as UTF-8 text
    /// - any error from [`Manifest::parse`]
    #[instrument(fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        if !has_manifest_extension(path) {
            return Err(ManifestError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }
        let source =
            std::fs::read_to_string(path).map_err(|e| ManifestError::read(path, e))?;
        Self::parse(&source)
    }

    /// Header row naming each column.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, excluding the header.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the manifest has a header but no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolves column bindings from this manifest's header.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingColumn`] for the first absent required role.
    pub fn bind(&self, requirements: ColumnRequirements) -> Result<ColumnBindings, ManifestError> {
        ColumnBindings::resolve(&self.header, requirements)
    }
}

/// Parses manifest text. Shorthand for [`Manifest::parse`].
///
/// # Errors
///
/// See [`Manifest::parse`].
pub fn parse(source: &str) -> Result<Manifest, ManifestError> {
    Manifest::parse(source)
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MANIFEST_EXTENSION))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_splits_header_and_rows() {
        let manifest = Manifest::parse("ITEM_NAME,DOWNLOAD\na,http://h/1\nb,http://h/2\n").unwrap();
        assert_eq!(manifest.header(), ["ITEM_NAME", "DOWNLOAD"]);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.rows()[1], ["b", "http://h/2"]);
    }

    #[test]
    fn test_parse_header_only_is_empty_manifest() {
        let manifest = Manifest::parse("ITEM_NAME,DOWNLOAD\n").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_parse_no_rows_is_error() {
        assert!(matches!(Manifest::parse(""), Err(ManifestError::Empty)));
        assert!(matches!(Manifest::parse("\n\n"), Err(ManifestError::Empty)));
    }

    #[test]
    fn test_parse_strips_byte_order_mark() {
        let manifest = Manifest::parse("\u{feff}DOWNLOAD,ITEM_NAME\nhttp://h/1,a\n").unwrap();
        assert_eq!(manifest.header()[0], "DOWNLOAD");
        let bindings = manifest.bind(ColumnRequirements::default()).unwrap();
        assert_eq!(bindings.download_url(), 0);
    }

    #[test]
    fn test_parse_keeps_file_order_and_duplicates() {
        let manifest =
            Manifest::parse("ITEM_NAME,DOWNLOAD\nz,http://h/1\na,http://h/1\nz,http://h/1\n")
                .unwrap();
        let names: Vec<_> = manifest.rows().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, ["z", "a", "z"]);
    }

    #[test]
    fn test_from_path_rejects_non_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("list.txt");
        std::fs::write(&path, "ITEM_NAME,DOWNLOAD\n").unwrap();
        assert!(matches!(
            Manifest::from_path(&path),
            Err(ManifestError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_from_path_accepts_uppercase_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("LIST.CSV");
        std::fs::write(&path, "ITEM_NAME,DOWNLOAD\na,http://h/1\n").unwrap();
        assert_eq!(Manifest::from_path(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_from_path_missing_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.csv");
        assert!(matches!(
            Manifest::from_path(&path),
            Err(ManifestError::Read { .. })
        ));
    }

    #[test]
    fn test_free_parse_matches_manifest_parse() {
        let text = "ITEM_NAME,DOWNLOAD\na,http://h/1\n";
        assert_eq!(parse(text).unwrap(), Manifest::parse(text).unwrap());
    }
}
