use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::EngineError;

pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

pub fn current_unix_timestamp() -> Result<u64, EngineError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|_| EngineError::Environment("system time is before unix epoch".to_string()))
}

/// Total size in bytes of every file under `root`, recursively.
pub fn directory_size(root: &Path) -> io::Result<u64> {
    let mut total = 0;
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() {
                total += entry.metadata()?.len();
            }
        }
    }
    Ok(total)
}

pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Every directory under `root` (not `root` itself), deepest first.
pub fn directories_deepest_first(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let path = entry.path();
                dirs.push(path.clone());
                stack.push(path);
            }
        }
    }
    dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
    Ok(dirs)
}

/// Removes directories under `root` that are empty, deepest first, skipping
/// any listed in `keep`. Pruning a branch stops naturally at the first
/// non-empty parent because `fs::remove_dir` refuses non-empty directories.
pub fn prune_empty_directories(root: &Path, keep: &[PathBuf]) -> io::Result<usize> {
    let mut pruned = 0;
    for dir in directories_deepest_first(root)? {
        if keep.contains(&dir) {
            continue;
        }
        match fs::remove_dir(&dir) {
            Ok(()) => pruned += 1,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(_) => {}
        }
    }
    Ok(pruned)
}

/// Relative paths of every file under `root`, forward-slash separated and
/// sorted, plus the relative paths of directories that contain nothing.
pub fn snapshot_tree(root: &Path) -> io::Result<(Vec<String>, Vec<String>)> {
    let mut files = Vec::new();
    let mut empty_dirs = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut saw_entry = false;
        for entry in fs::read_dir(&dir)? {
            saw_entry = true;
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else if let Some(relative) = relative_slash_path(root, &path) {
                files.push(relative);
            }
        }
        if !saw_entry && dir != root {
            if let Some(relative) = relative_slash_path(root, &dir) {
                empty_dirs.push(relative);
            }
        }
    }
    files.sort();
    empty_dirs.sort();
    Ok((files, empty_dirs))
}

pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut rendered = String::new();
    for component in relative.components() {
        if !rendered.is_empty() {
            rendered.push('/');
        }
        rendered.push_str(&component.as_os_str().to_string_lossy());
    }
    (!rendered.is_empty()).then_some(rendered)
}
