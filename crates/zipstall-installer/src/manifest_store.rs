use std::fs;
use std::io;
use std::path::PathBuf;

use zipstall_core::InstallManifest;

use crate::fs_utils::remove_file_if_exists;
use crate::{DestinationLayout, EngineError};

/// `Ok(None)` when no manifest exists (fresh destination); corrupt content
/// is surfaced as `ManifestCorrupt` with no automatic repair.
pub fn load_manifest(layout: &DestinationLayout) -> Result<Option<InstallManifest>, EngineError> {
    let path = layout.manifest_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let manifest = InstallManifest::from_json_str(&raw).map_err(|err| {
        EngineError::ManifestCorrupt {
            path: path.clone(),
            detail: format!("{err:#}"),
        }
    })?;
    Ok(Some(manifest))
}

/// Write-to-temporary-then-rename so a crash mid-write cannot leave a
/// truncated manifest behind.
pub fn save_manifest(
    layout: &DestinationLayout,
    manifest: &InstallManifest,
) -> Result<PathBuf, EngineError> {
    let rendered = manifest
        .to_json_string()
        .map_err(|err| EngineError::Environment(format!("{err:#}")))?;
    let tmp_path = layout.manifest_tmp_path();
    let path = layout.manifest_path();
    fs::write(&tmp_path, rendered)?;
    fs::rename(&tmp_path, &path)?;
    Ok(path)
}

pub fn remove_manifest(layout: &DestinationLayout) -> Result<(), EngineError> {
    remove_file_if_exists(&layout.manifest_path())?;
    Ok(())
}
