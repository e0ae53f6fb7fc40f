//! Output filename derivation and sanitization.
//!
//! Filenames are composed from manifest fields as `name(id).ext` (or
//! `name.ext` when the manifest has no entry-id column) and then stripped of
//! every character that is illegal on common filesystems.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::manifest::DownloadItem;

/// Extension appended to every output file unless configured otherwise.
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Characters removed by [`sanitize`]: the Windows-reserved set, `$ & %`, and
/// ASCII control characters.
#[allow(clippy::expect_used)]
static DISALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    // Static pattern, safe to panic
    Regex::new(r#"[<>:"/\\|?*$&%\x00-\x1F\x7F]"#).expect("sanitizer regex is valid")
});

/// Removes every disallowed character from `raw`.
///
/// Pure and total: any input, including an empty string, yields a string that
/// may itself be empty. Applying it twice gives the same result as once.
///
/// ```
/// use manifest_fetch::download::sanitize;
///
/// assert_eq!(sanitize("My:Clip(42).mp4"), "MyClip(42).mp4");
/// assert_eq!(sanitize("<>:\"/\\|?*"), "");
/// ```
#[must_use]
pub fn sanitize(raw: &str) -> String {
    DISALLOWED_CHARS.replace_all(raw, "").into_owned()
}

/// Errors from building an [`OutputFilename`] or [`FilenameTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    /// Nothing usable is left once disallowed characters are stripped.
    #[error("filename derived from '{raw}' is empty after sanitization")]
    Empty {
        /// The unsanitized input.
        raw: String,
    },

    /// The result would be a `.` or `..` path segment.
    #[error("'{raw}' is not a usable filename")]
    Reserved {
        /// The unsanitized input.
        raw: String,
    },
}

/// A sanitized, non-empty filename for a single path segment.
///
/// The only constructor sanitizes its input, so holding one guarantees the
/// name is safe to join onto an output directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputFilename(String);

impl OutputFilename {
    /// Sanitizes `raw` and validates the result.
    ///
    /// # Errors
    ///
    /// - [`FilenameError::Empty`] when nothing remains after sanitization
    /// - [`FilenameError::Reserved`] for `.` or `..`
    pub fn new(raw: &str) -> Result<Self, FilenameError> {
        let clean = sanitize(raw);
        if clean.trim().is_empty() {
            return Err(FilenameError::Empty {
                raw: raw.to_string(),
            });
        }
        if clean == "." || clean == ".." {
            return Err(FilenameError::Reserved {
                raw: raw.to_string(),
            });
        }
        Ok(Self(clean))
    }

    /// The filename as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for OutputFilename {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Fixed per-deployment naming template: `name(id).ext` or `name.ext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    extension: String,
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl FilenameTemplate {
    /// Creates a template with the given extension (leading dot optional).
    ///
    /// # Errors
    ///
    /// Returns [`FilenameError::Empty`] when the extension has no usable characters.
    pub fn new(extension: &str) -> Result<Self, FilenameError> {
        let trimmed = extension.trim();
        let clean = sanitize(trimmed.strip_prefix('.').unwrap_or(trimmed));
        if clean.is_empty() || clean.chars().all(|c| c == '.') {
            return Err(FilenameError::Empty {
                raw: extension.to_string(),
            });
        }
        Ok(Self { extension: clean })
    }

    /// Extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Builds the unsanitized filename for `item`.
    #[must_use]
    pub fn compose_raw(&self, item: &DownloadItem<'_>) -> String {
        match item.entry_id {
            Some(id) => format!("{}({id}).{}", item.raw_name, self.extension),
            None => format!("{}.{}", item.raw_name, self.extension),
        }
    }

    /// Builds and sanitizes the output filename for `item`.
    ///
    /// # Errors
    ///
    /// Returns [`FilenameError::Empty`] when neither the name nor the id has
    /// any character left after sanitization.
    pub fn compose(&self, item: &DownloadItem<'_>) -> Result<OutputFilename, FilenameError> {
        let raw = self.compose_raw(item);
        let name_left = !sanitize(item.raw_name).trim().is_empty();
        let id_left = item
            .entry_id
            .is_some_and(|id| !sanitize(id).trim().is_empty());
        if !name_left && !id_left {
            return Err(FilenameError::Empty { raw });
        }
        OutputFilename::new(&raw)
    }
}
