mod archive;
mod manifest;
mod metadata;
mod version;

pub use archive::{resolve_layout, ArchiveLayout, LayoutError, ResolutionConfidence};
pub use manifest::{InstallManifest, MANIFEST_FILE_NAME, MANIFEST_SCHEMA_VERSION};
pub use metadata::{normalize_metadata, RawExecutableMetadata, VersionInfo, UNKNOWN_PUBLISHER};
pub use version::{
    classify_install, clean_version_string, compare_versions, InstallClass, InstallClassification,
    VersionComparison, VersionTuple,
};

#[cfg(test)]
mod tests;
