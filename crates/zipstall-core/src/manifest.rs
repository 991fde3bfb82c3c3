use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MANIFEST_FILE_NAME: &str = "install_manifest.json";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Durable record of exactly which files an installation created. One per
/// installed application, owned by the installation at `install_location`,
/// destroyed when uninstall completes. Unknown fields are preserved verbatim
/// across a load/rewrite cycle so future schema additions stay loadable in
/// both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstallManifest {
    #[serde(default = "default_schema_version")]
    pub schema: u32,
    pub app_name: String,
    pub install_location: PathBuf,
    /// Relative to `install_location`.
    pub executable_path: String,
    pub version: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub installed_at_unix: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_archive_sha256: Option<String>,
    /// Relative path of the staged uninstaller, when one was staged. Created
    /// by the transaction itself and therefore never treated as drift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstaller_path: Option<String>,
    /// Relative paths recorded immediately after extraction completed.
    #[serde(default)]
    pub file_list: BTreeSet<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_schema_version() -> u32 {
    MANIFEST_SCHEMA_VERSION
}

impl InstallManifest {
    pub fn from_json_str(input: &str) -> anyhow::Result<Self> {
        let manifest: Self =
            serde_json::from_str(input).context("failed to parse install manifest")?;
        if manifest.app_name.trim().is_empty() {
            return Err(anyhow!("install manifest has an empty app name"));
        }
        if manifest.executable_path.trim().is_empty() {
            return Err(anyhow!(
                "install manifest '{}' has an empty executable path",
                manifest.app_name
            ));
        }
        for entry in &manifest.file_list {
            validate_relative_entry(entry).with_context(|| {
                format!(
                    "invalid file list entry in install manifest '{}'",
                    manifest.app_name
                )
            })?;
        }
        Ok(manifest)
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        let mut rendered = serde_json::to_string_pretty(self)
            .context("failed to serialize install manifest")?;
        rendered.push('\n');
        Ok(rendered)
    }

    /// Whether the transaction that wrote this manifest accounts for the
    /// given relative path, including the manifest file and uninstaller it
    /// created itself.
    pub fn tracks(&self, relative: &str) -> bool {
        if relative == MANIFEST_FILE_NAME {
            return true;
        }
        if self.uninstaller_path.as_deref() == Some(relative) {
            return true;
        }
        self.file_list.contains(relative)
    }
}

fn validate_relative_entry(entry: &str) -> anyhow::Result<()> {
    if entry.is_empty() {
        return Err(anyhow!("empty path"));
    }
    let path = Path::new(entry);
    if path.is_absolute() {
        return Err(anyhow!("absolute path: {entry}"));
    }
    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(anyhow!("path escapes the install location: {entry}"));
    }
    Ok(())
}
