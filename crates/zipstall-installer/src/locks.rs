use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::EngineError;

/// Hands out exclusive leases keyed on the normalized destination path. A
/// second acquisition for the same destination is rejected, not queued;
/// distinct destinations proceed independently. The guard releases its key
/// on drop, which covers both completion and rollback.
#[derive(Debug, Clone, Default)]
pub struct DestinationLocks {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl DestinationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, destination: &Path) -> Result<DestinationLockGuard, EngineError> {
        let key = normalize_destination_key(destination);
        let mut held = lock_held(&self.held);
        if !held.insert(key.clone()) {
            return Err(EngineError::DestinationBusy(key));
        }
        Ok(DestinationLockGuard {
            held: Arc::clone(&self.held),
            key,
        })
    }
}

#[derive(Debug)]
pub struct DestinationLockGuard {
    held: Arc<Mutex<HashSet<PathBuf>>>,
    key: PathBuf,
}

impl Drop for DestinationLockGuard {
    fn drop(&mut self) {
        lock_held(&self.held).remove(&self.key);
    }
}

fn lock_held(held: &Mutex<HashSet<PathBuf>>) -> MutexGuard<'_, HashSet<PathBuf>> {
    // The set of held keys stays consistent even if a holder panicked.
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Canonicalizes when the path already exists, otherwise normalizes
/// lexically, so "install then uninstall" and "uninstall a missing dir"
/// agree on the key.
fn normalize_destination_key(destination: &Path) -> PathBuf {
    if let Ok(canonical) = destination.canonicalize() {
        return canonical;
    }

    let absolute = if destination.is_absolute() {
        destination.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(destination))
            .unwrap_or_else(|_| destination.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
