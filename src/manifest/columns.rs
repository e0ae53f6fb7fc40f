//! Header column resolution and per-row item extraction.

use std::fmt;

use super::error::ManifestError;

/// Logical role a manifest column can fulfil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// URL of the resource to fetch.
    DownloadUrl,
    /// Human-readable name used as the filename stem.
    DisplayName,
    /// Entry identifier appended to the filename as `(id)`.
    EntryId,
}

impl ColumnRole {
    /// Roles in the order they are resolved. Missing-column errors always name
    /// the first unresolved required role in this order.
    pub const RESOLUTION_ORDER: [Self; 3] = [Self::DownloadUrl, Self::DisplayName, Self::EntryId];

    /// Header spellings accepted for this role, compared case-insensitively.
    #[must_use]
    pub fn header_names(self) -> &'static [&'static str] {
        match self {
            Self::DownloadUrl => &["DOWNLOAD"],
            Self::DisplayName => &["ITEM_NAME"],
            Self::EntryId => &["ENTRY_ID"],
        }
    }

    /// Stable kebab-case label used in logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DownloadUrl => "download-url",
            Self::DisplayName => "display-name",
            Self::EntryId => "entry-id",
        }
    }

    fn matches(self, header_cell: &str) -> bool {
        let cell = header_cell.trim();
        self.header_names()
            .iter()
            .any(|name| cell.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which optional roles must be present for a manifest to be accepted.
///
/// The download URL and display name are always required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnRequirements {
    /// Reject manifests without an entry-id column.
    pub require_entry_id: bool,
}

impl ColumnRequirements {
    /// Returns whether `role` must resolve for the manifest to be usable.
    #[must_use]
    pub fn is_required(self, role: ColumnRole) -> bool {
        match role {
            ColumnRole::DownloadUrl | ColumnRole::DisplayName => true,
            ColumnRole::EntryId => self.require_entry_id,
        }
    }
}

/// Physical column index for each role, resolved once from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBindings {
    download_url: usize,
    display_name: usize,
    entry_id: Option<usize>,
}

impl ColumnBindings {
    /// Resolves role bindings from a header row.
    ///
    /// The first matching header cell wins when a role appears more than once.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingColumn`] naming the first required role,
    /// in [`ColumnRole::RESOLUTION_ORDER`], that has no matching header cell.
    pub fn resolve(
        header: &[String],
        requirements: ColumnRequirements,
    ) -> Result<Self, ManifestError> {
        // Field order below must follow RESOLUTION_ORDER.
        let download_url = require_column(header, ColumnRole::DownloadUrl)?;
        let display_name = require_column(header, ColumnRole::DisplayName)?;
        let entry_id = find_column(header, ColumnRole::EntryId);
        if entry_id.is_none() && requirements.is_required(ColumnRole::EntryId) {
            return Err(ManifestError::missing_column(ColumnRole::EntryId, header));
        }

        Ok(Self {
            download_url,
            display_name,
            entry_id,
        })
    }

    /// Column index of the download URL.
    #[must_use]
    pub fn download_url(&self) -> usize {
        self.download_url
    }

    /// Column index of the display name.
    #[must_use]
    pub fn display_name(&self) -> usize {
        self.display_name
    }

    /// Column index of the entry id, when the header has one.
    #[must_use]
    pub fn entry_id(&self) -> Option<usize> {
        self.entry_id
    }

    /// Highest bound column index; a row needs more fields than this.
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.download_url
            .max(self.display_name)
            .max(self.entry_id.unwrap_or(0))
    }

    /// Returns whether `row` has a field for every bound column.
    #[must_use]
    pub fn is_eligible(&self, row: &[String]) -> bool {
        row.len() > self.max_index()
    }

    /// Extracts the download item for `row`, or `None` when the row is too short.
    ///
    /// Field values are trimmed of surrounding whitespace.
    #[must_use]
    pub fn item_for<'r>(&self, row: &'r [String]) -> Option<DownloadItem<'r>> {
        if !self.is_eligible(row) {
            return None;
        }
        Some(DownloadItem {
            url: row[self.download_url].trim(),
            raw_name: row[self.display_name].trim(),
            entry_id: self.entry_id.map(|index| row[index].trim()),
        })
    }
}

/// One row's worth of download inputs.
///
/// Borrows from the manifest row and is dropped as soon as that row is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadItem<'r> {
    /// URL to fetch.
    pub url: &'r str,
    /// Unsanitized display name.
    pub raw_name: &'r str,
    /// Entry id, present only when an entry-id column is bound.
    pub entry_id: Option<&'r str>,
}

fn find_column(header: &[String], role: ColumnRole) -> Option<usize> {
    header.iter().position(|cell| role.matches(cell))
}

fn require_column(header: &[String], role: ColumnRole) -> Result<usize, ManifestError> {
    find_column(header, role).ok_or_else(|| ManifestError::missing_column(role, header))
}
