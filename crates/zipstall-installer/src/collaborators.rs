use std::path::{Path, PathBuf};

use anyhow::Result;
use zipstall_core::RawExecutableMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKind {
    Desktop,
    StartMenu,
}

impl ShortcutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::StartMenu => "start-menu",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutDescriptor {
    pub kind: ShortcutKind,
    pub app_name: String,
    pub target: PathBuf,
    pub working_dir: PathBuf,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDescriptor {
    pub app_name: String,
    pub display_name: String,
    pub display_version: String,
    pub publisher: String,
    pub install_location: PathBuf,
    pub uninstall_command: Option<String>,
    pub icon: Option<String>,
    pub estimated_size_kib: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfDeleteRequest {
    /// The running uninstaller binary, deletable only after process exit.
    pub executable: PathBuf,
    /// Removed afterwards if it ended up empty.
    pub install_location: PathBuf,
}

/// Shortcut creation/removal. One idempotent apply and one idempotent
/// remove; the engine never retries and reports a failure exactly once.
pub trait ShortcutManager {
    fn apply(&self, descriptor: &ShortcutDescriptor) -> Result<()>;
    fn remove(&self, descriptor: &ShortcutDescriptor) -> Result<()>;
}

/// Installed-programs registration (the OS "add/remove programs" surface).
pub trait SystemRegistrar {
    fn apply(&self, descriptor: &RegistrationDescriptor) -> Result<()>;
    fn remove(&self, app_name: &str) -> Result<()>;
}

/// Deferred removal of the running uninstaller. The engine only learns
/// "scheduled" or "not scheduled"; the mechanism and its timing live
/// entirely behind this trait.
pub trait SelfDeleteScheduler {
    fn schedule(&self, request: &SelfDeleteRequest) -> Result<()>;
}

/// Opaque reader for executable version/publisher/icon fields. Missing
/// fields are represented as absent, never as errors; only an unreadable
/// file is an error.
pub trait MetadataReader {
    fn read(&self, executable: &Path) -> Result<RawExecutableMetadata>;
}

pub struct NullShortcutManager;

impl ShortcutManager for NullShortcutManager {
    fn apply(&self, _descriptor: &ShortcutDescriptor) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _descriptor: &ShortcutDescriptor) -> Result<()> {
        Ok(())
    }
}

pub struct NullRegistrar;

impl SystemRegistrar for NullRegistrar {
    fn apply(&self, _descriptor: &RegistrationDescriptor) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _app_name: &str) -> Result<()> {
        Ok(())
    }
}

pub struct NullSelfDeleteScheduler;

impl SelfDeleteScheduler for NullSelfDeleteScheduler {
    fn schedule(&self, _request: &SelfDeleteRequest) -> Result<()> {
        Ok(())
    }
}

/// Reader that reports every field as absent. Keeps installs working when
/// no platform reader is available; the normalizer degrades the record.
pub struct NoMetadataReader;

impl MetadataReader for NoMetadataReader {
    fn read(&self, _executable: &Path) -> Result<RawExecutableMetadata> {
        Ok(RawExecutableMetadata::default())
    }
}

/// The full collaborator set a transaction needs.
pub struct Collaborators {
    pub shortcuts: Box<dyn ShortcutManager + Send + Sync>,
    pub registrar: Box<dyn SystemRegistrar + Send + Sync>,
    pub self_delete: Box<dyn SelfDeleteScheduler + Send + Sync>,
}

impl Collaborators {
    pub fn null() -> Self {
        Self {
            shortcuts: Box::new(NullShortcutManager),
            registrar: Box::new(NullRegistrar),
            self_delete: Box::new(NullSelfDeleteScheduler),
        }
    }
}
