use crate::version::{clean_version_string, VersionTuple};

pub const UNKNOWN_PUBLISHER: &str = "Unknown";

/// Raw fields as an external executable-metadata reader produced them. The
/// reader never fails the operation; anything it could not determine is
/// simply absent here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExecutableMetadata {
    pub product_name: Option<String>,
    pub file_version: Option<String>,
    pub publisher: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: VersionTuple,
    /// String form of the version as it will be displayed and persisted.
    /// Keeps the cleaned raw text when numeric parsing failed.
    pub version_display: String,
    /// Set when the version was absent or did not parse numerically.
    pub degraded: bool,
    pub product_name: String,
    pub publisher: String,
    pub icon: Option<String>,
}

/// Adapts raw reader output into a canonical record, degrading gracefully:
/// a missing version becomes the all-zero tuple with `degraded` set, a
/// missing product name falls back to the archive's base file name, a
/// missing publisher becomes "Unknown".
pub fn normalize_metadata(raw: &RawExecutableMetadata, archive_stem: &str) -> VersionInfo {
    let (version, version_display, degraded) = match raw.file_version.as_deref() {
        Some(text) => {
            let cleaned = clean_version_string(text);
            match VersionTuple::parse(&cleaned) {
                Some(tuple) => (tuple, cleaned, false),
                None if cleaned.is_empty() => {
                    (VersionTuple::ZERO, VersionTuple::ZERO.to_string(), true)
                }
                None => (VersionTuple::ZERO, cleaned, true),
            }
        }
        None => (VersionTuple::ZERO, VersionTuple::ZERO.to_string(), true),
    };

    let product_name = raw
        .product_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(archive_stem)
        .to_string();
    let publisher = raw
        .publisher
        .as_deref()
        .map(str::trim)
        .filter(|publisher| !publisher.is_empty())
        .unwrap_or(UNKNOWN_PUBLISHER)
        .to_string();

    VersionInfo {
        version,
        version_display,
        degraded,
        product_name,
        publisher,
        icon: raw.icon.clone(),
    }
}
