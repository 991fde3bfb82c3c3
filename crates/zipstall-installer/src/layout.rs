use std::path::{Path, PathBuf};

use zipstall_core::MANIFEST_FILE_NAME;

use crate::EngineError;

pub fn uninstaller_file_name() -> &'static str {
    if cfg!(windows) {
        "uninstall.exe"
    } else {
        "uninstall"
    }
}

/// Path helpers for one installation destination. The manifest and the
/// staged uninstaller both live inside the destination itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationLayout {
    destination: PathBuf,
}

impl DestinationLayout {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.destination.join(MANIFEST_FILE_NAME)
    }

    pub fn manifest_tmp_path(&self) -> PathBuf {
        self.destination
            .join(format!("{MANIFEST_FILE_NAME}.tmp"))
    }

    pub fn uninstaller_path(&self) -> PathBuf {
        self.destination.join(uninstaller_file_name())
    }

    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.destination.join(relative)
    }
}

/// Platform-conventional parent directory for new installations.
pub fn default_install_root() -> Result<PathBuf, EngineError> {
    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA").map_err(|_| {
            EngineError::Environment(
                "LOCALAPPDATA is not set; cannot resolve the default install root".to_string(),
            )
        })?;
        return Ok(PathBuf::from(app_data).join("Programs"));
    }

    let home = std::env::var("HOME").map_err(|_| {
        EngineError::Environment("HOME is not set; cannot resolve the default install root".to_string())
    })?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("zipstall")
        .join("apps"))
}
