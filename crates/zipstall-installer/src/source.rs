use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};

use crate::EngineError;

/// Seam between the transaction and the archive format: list the entries
/// once, then stream them out one at a time. Corrupt archives must fail at
/// open time, before any extraction.
pub trait ArchiveSource {
    fn entry_names(&mut self) -> Result<Vec<String>, EngineError>;
    /// Extracts one entry to `dest`, creating parent directories. Returns
    /// the number of bytes written.
    fn extract_entry(&mut self, name: &str, dest: &Path) -> Result<u64, EngineError>;
}

#[derive(Debug)]
pub struct ZipArchiveSource {
    archive: zip::ZipArchive<File>,
    index_by_name: HashMap<String, usize>,
}

impl ZipArchiveSource {
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        let archive = zip::ZipArchive::new(file)
            .map_err(|err| EngineError::Structure(err.to_string()))?;
        Ok(Self {
            archive,
            index_by_name: HashMap::new(),
        })
    }

    fn index_of(&mut self, name: &str) -> Result<usize, EngineError> {
        if self.index_by_name.is_empty() {
            for index in 0..self.archive.len() {
                let raw = {
                    let entry = self
                        .archive
                        .by_index(index)
                        .map_err(|err| EngineError::Structure(err.to_string()))?;
                    entry.name().to_string()
                };
                self.index_by_name.insert(raw.replace('\\', "/"), index);
                self.index_by_name.insert(raw, index);
            }
        }
        self.index_by_name
            .get(name)
            .or_else(|| self.index_by_name.get(&name.replace('\\', "/")))
            .copied()
            .ok_or_else(|| EngineError::Structure(format!("archive has no entry named '{name}'")))
    }
}

impl ArchiveSource for ZipArchiveSource {
    fn entry_names(&mut self) -> Result<Vec<String>, EngineError> {
        let mut names = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let name = {
                let entry = self
                    .archive
                    .by_index(index)
                    .map_err(|err| EngineError::Structure(err.to_string()))?;
                entry.name().to_string()
            };
            names.push(name);
        }
        Ok(names)
    }

    fn extract_entry(&mut self, name: &str, dest: &Path) -> Result<u64, EngineError> {
        let index = self.index_of(name)?;
        let mut entry = self
            .archive
            .by_index(index)
            .map_err(|err| EngineError::Structure(err.to_string()))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(dest)?;
        let written = io::copy(&mut entry, &mut out)?;
        Ok(written)
    }
}

/// Relative path of `raw_name` beneath `root`, slash-normalized. `None` for
/// directory entries, the bare root itself, and entries outside the root.
pub fn relative_under_root(root: &str, raw_name: &str) -> Option<String> {
    let normalized = raw_name.replace('\\', "/");
    if normalized.is_empty() || normalized.ends_with('/') {
        return None;
    }
    if root.is_empty() {
        return Some(normalized);
    }
    let relative = normalized.strip_prefix(&format!("{root}/"))?;
    (!relative.is_empty()).then(|| relative.to_string())
}

/// Rejects entry paths that would write outside the destination.
pub fn ensure_safe_relative(relative: &str) -> Result<(), EngineError> {
    let path = Path::new(relative);
    if path.is_absolute() {
        return Err(EngineError::Structure(format!(
            "entry path is absolute: {relative}"
        )));
    }
    if path.components().any(|component| {
        matches!(component, Component::ParentDir | Component::Prefix(_))
    }) {
        return Err(EngineError::Structure(format!(
            "entry path escapes the destination: {relative}"
        )));
    }
    Ok(())
}
