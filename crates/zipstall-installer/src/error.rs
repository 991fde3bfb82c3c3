use std::io;
use std::path::PathBuf;

use thiserror::Error;
use zipstall_core::LayoutError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("archive structure is invalid: {0}")]
    Structure(String),
    #[error("extraction failed at '{failed_entry}': {detail}")]
    Extraction {
        failed_entry: String,
        detail: String,
        /// Relative paths that had been extracted before the failure. They
        /// were rolled back; the list is diagnostic.
        partial_files: Vec<String>,
    },
    #[error("operation cancelled; {rolled_back} extracted file(s) rolled back")]
    Cancelled { rolled_back: usize },
    #[error("another operation is already running against {0}")]
    DestinationBusy(PathBuf),
    #[error("no install manifest found under {0}")]
    NotInstalled(PathBuf),
    #[error("install manifest at {path} is corrupt: {detail}")]
    ManifestCorrupt { path: PathBuf, detail: String },
    #[error("executable metadata unavailable: {0}")]
    MetadataUnavailable(String),
    #[error("{0}")]
    Environment(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Non-fatal conditions surfaced after the filesystem state is already
/// committed (or already safe). Reported once, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineWarning {
    Shortcut { kind: &'static str, detail: String },
    Registry { detail: String },
    Metadata { detail: String },
    UninstallerStaging { detail: String },
    FileRemoval { path: String, detail: String },
    SelfDeleteScheduling { detail: String },
}

impl EngineWarning {
    pub fn describe(&self) -> String {
        match self {
            Self::Shortcut { kind, detail } => {
                format!("could not manage {kind} shortcut: {detail}")
            }
            Self::Registry { detail } => {
                format!("could not update system registration: {detail}")
            }
            Self::Metadata { detail } => {
                format!("executable metadata unavailable: {detail}")
            }
            Self::UninstallerStaging { detail } => {
                format!("could not stage the uninstaller: {detail}")
            }
            Self::FileRemoval { path, detail } => {
                format!("could not remove '{path}': {detail}")
            }
            Self::SelfDeleteScheduling { detail } => {
                format!("could not schedule self-delete: {detail}")
            }
        }
    }
}
