use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use zipstall_core::InstallManifest;

use crate::collaborators::{Collaborators, SelfDeleteRequest, ShortcutDescriptor, ShortcutKind};
use crate::fs_utils::{prune_empty_directories, snapshot_tree};
use crate::locks::DestinationLocks;
use crate::manifest_store::{load_manifest, remove_manifest};
use crate::progress::{OperationKind, ProgressEvent, ProgressSink};
use crate::{DestinationLayout, EngineError, EngineWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    File,
    EmptyDirectory,
}

/// A path present under the install location that the manifest does not
/// account for. Computed fresh at plan time, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    pub path: String,
    pub kind: DriftKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UninstallPlan {
    pub manifest: InstallManifest,
    pub destination: PathBuf,
    /// Sorted; the default decision for every entry is KEEP.
    pub drift: Vec<DriftEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallCompletion {
    /// All file work is done and the install location is gone (unless kept
    /// drift remains).
    Completed,
    /// File removal succeeded; a detached action will remove the uninstaller
    /// binary and then the directory. Scheduling is not execution; callers
    /// must not block waiting for it.
    SelfDeleteScheduled,
}

#[derive(Debug)]
pub struct UninstallOutcome {
    pub completion: UninstallCompletion,
    pub deleted_files: usize,
    /// Files in the plan that were already gone; treated as satisfied.
    pub skipped_missing: usize,
    pub kept_drift: Vec<String>,
    pub warnings: Vec<EngineWarning>,
}

/// Loads the manifest and compares it against the live tree. Missing
/// manifest means there is nothing to uninstall; a corrupt one is surfaced
/// untouched for manual inspection.
pub fn plan_uninstall(destination: &Path) -> Result<UninstallPlan, EngineError> {
    let layout = DestinationLayout::new(destination);
    let manifest =
        load_manifest(&layout)?.ok_or_else(|| EngineError::NotInstalled(destination.to_path_buf()))?;

    let (files, empty_dirs) = match snapshot_tree(destination) {
        Ok(snapshot) => snapshot,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(EngineError::NotInstalled(destination.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };

    let mut drift: Vec<DriftEntry> = files
        .into_iter()
        .filter(|path| !manifest.tracks(path))
        .map(|path| DriftEntry {
            path,
            kind: DriftKind::File,
        })
        .collect();
    drift.extend(empty_dirs.into_iter().map(|path| DriftEntry {
        path,
        kind: DriftKind::EmptyDirectory,
    }));
    drift.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(UninstallPlan {
        manifest,
        destination: destination.to_path_buf(),
        drift,
    })
}

pub fn run_uninstall(
    plan: &UninstallPlan,
    approved_drift: &BTreeSet<String>,
    locks: &DestinationLocks,
    collaborators: &Collaborators,
    sink: &dyn ProgressSink,
) -> Result<UninstallOutcome, EngineError> {
    let _guard = locks.acquire(&plan.destination)?;
    let layout = DestinationLayout::new(&plan.destination);
    sink.emit(ProgressEvent::Started {
        operation: OperationKind::Uninstall,
        destination: plan.destination.clone(),
    });

    let mut files_to_delete: BTreeSet<String> = plan.manifest.file_list.clone();
    files_to_delete.extend(
        plan.drift
            .iter()
            .filter(|entry| entry.kind == DriftKind::File)
            .filter(|entry| approved_drift.contains(&entry.path))
            .map(|entry| entry.path.clone()),
    );

    let mut warnings = Vec::new();
    let mut deleted_files = 0;
    let mut skipped_missing = 0;
    let total = files_to_delete.len();
    for (index, relative) in files_to_delete.iter().enumerate() {
        sink.emit(ProgressEvent::DeletingFile {
            index: index + 1,
            total,
            path: relative.clone(),
        });
        match fs::remove_file(layout.file_path(relative)) {
            Ok(()) => deleted_files += 1,
            Err(err) if err.kind() == io::ErrorKind::NotFound => skipped_missing += 1,
            Err(err) => {
                let warning = EngineWarning::FileRemoval {
                    path: relative.clone(),
                    detail: err.to_string(),
                };
                sink.emit(ProgressEvent::Warning {
                    detail: warning.describe(),
                });
                warnings.push(warning);
            }
        }
    }

    remove_manifest(&layout)?;

    let kept_drift: Vec<String> = plan
        .drift
        .iter()
        .filter(|entry| !approved_drift.contains(&entry.path))
        .map(|entry| entry.path.clone())
        .collect();

    sink.emit(ProgressEvent::PruningDirectories);
    let kept_directories: Vec<PathBuf> = plan
        .drift
        .iter()
        .filter(|entry| entry.kind == DriftKind::EmptyDirectory)
        .filter(|entry| !approved_drift.contains(&entry.path))
        .map(|entry| layout.file_path(&entry.path))
        .collect();
    let _ = prune_empty_directories(&plan.destination, &kept_directories);

    remove_integrations(&layout, plan, collaborators, sink, &mut warnings);

    let uninstaller = plan
        .manifest
        .uninstaller_path
        .as_ref()
        .map(|name| layout.file_path(name))
        .filter(|path| path.exists());
    let completion = match uninstaller {
        Some(executable) => {
            sink.emit(ProgressEvent::SchedulingSelfDelete);
            let request = SelfDeleteRequest {
                executable,
                install_location: plan.destination.clone(),
            };
            match collaborators.self_delete.schedule(&request) {
                Ok(()) => UninstallCompletion::SelfDeleteScheduled,
                Err(err) => {
                    let warning = EngineWarning::SelfDeleteScheduling {
                        detail: format!("{err:#}"),
                    };
                    sink.emit(ProgressEvent::Warning {
                        detail: warning.describe(),
                    });
                    warnings.push(warning);
                    UninstallCompletion::Completed
                }
            }
        }
        None => {
            // Vanishes only when nothing (kept drift included) remains.
            let _ = fs::remove_dir(&plan.destination);
            UninstallCompletion::Completed
        }
    };

    sink.emit(ProgressEvent::Finished);
    Ok(UninstallOutcome {
        completion,
        deleted_files,
        skipped_missing,
        kept_drift,
        warnings,
    })
}

fn remove_integrations(
    layout: &DestinationLayout,
    plan: &UninstallPlan,
    collaborators: &Collaborators,
    sink: &dyn ProgressSink,
    warnings: &mut Vec<EngineWarning>,
) {
    sink.emit(ProgressEvent::RemovingIntegrations);
    let executable = layout.file_path(&plan.manifest.executable_path);
    for kind in [ShortcutKind::Desktop, ShortcutKind::StartMenu] {
        let descriptor = ShortcutDescriptor {
            kind,
            app_name: plan.manifest.app_name.clone(),
            target: executable.clone(),
            working_dir: layout.destination().to_path_buf(),
            icon: plan.manifest.icon.clone(),
        };
        if let Err(err) = collaborators.shortcuts.remove(&descriptor) {
            let warning = EngineWarning::Shortcut {
                kind: kind.as_str(),
                detail: format!("{err:#}"),
            };
            sink.emit(ProgressEvent::Warning {
                detail: warning.describe(),
            });
            warnings.push(warning);
        }
    }
    if let Err(err) = collaborators.registrar.remove(&plan.manifest.app_name) {
        let warning = EngineWarning::Registry {
            detail: format!("{err:#}"),
        };
        sink.emit(ProgressEvent::Warning {
            detail: warning.describe(),
        });
        warnings.push(warning);
    }
}
