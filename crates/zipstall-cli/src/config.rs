use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Defaults applied when the command line does not say otherwise. Unknown
/// keys are ignored so older binaries keep loading newer config files.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliConfig {
    pub install_root: Option<PathBuf>,
    pub desktop_shortcut: bool,
    pub start_menu_shortcut: bool,
    pub register_app: bool,
    pub stage_uninstaller: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            install_root: None,
            desktop_shortcut: false,
            start_menu_shortcut: true,
            register_app: true,
            stage_uninstaller: true,
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    if cfg!(windows) {
        let app_data =
            std::env::var("APPDATA").context("APPDATA is not set; cannot resolve config path")?;
        return Ok(PathBuf::from(app_data).join("zipstall").join("config.toml"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve config path")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("zipstall")
        .join("config.toml"))
}

/// An absent file simply yields the defaults; only unreadable or invalid
/// content is an error.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(CliConfig::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file: {}", path.display()));
        }
    };
    parse_config(&raw).with_context(|| format!("failed to parse config file: {}", path.display()))
}

pub fn parse_config(raw: &str) -> Result<CliConfig> {
    toml::from_str(raw).context("invalid config")
}
