use std::fs;
use std::path::{Path, PathBuf};

use zipstall_core::{
    classify_install, ArchiveLayout, InstallClassification, InstallManifest, VersionInfo,
    MANIFEST_SCHEMA_VERSION,
};

use crate::collaborators::{
    Collaborators, RegistrationDescriptor, ShortcutDescriptor, ShortcutKind,
};
use crate::fs_utils::{
    current_unix_timestamp, directory_size, prune_empty_directories, remove_file_if_exists,
};
use crate::locks::DestinationLocks;
use crate::manifest_store::{load_manifest, save_manifest};
use crate::progress::{CancelToken, OperationKind, ProgressEvent, ProgressSink};
use crate::source::{ensure_safe_relative, relative_under_root, ArchiveSource};
use crate::{DestinationLayout, EngineError, EngineWarning};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub desktop_shortcut: bool,
    pub start_menu_shortcut: bool,
    pub register_app: bool,
}

pub struct InstallRequest {
    pub source: Box<dyn ArchiveSource + Send>,
    pub layout: ArchiveLayout,
    pub destination: PathBuf,
    pub app_name: String,
    pub version_info: VersionInfo,
    pub options: InstallOptions,
    pub source_archive_sha256: Option<String>,
    /// When set, this binary is copied into the destination as the
    /// uninstaller and recorded in the manifest outside the file list.
    pub stage_uninstaller_from: Option<PathBuf>,
}

#[derive(Debug)]
pub struct InstallOutcome {
    pub classification: InstallClassification,
    pub manifest: InstallManifest,
    pub warnings: Vec<EngineWarning>,
    /// Files from the prior version that the new extraction no longer
    /// contains; deleted on the upgrade path.
    pub removed_obsolete: Vec<String>,
}

/// Advisory preview of how an install against `destination` would be
/// classified. Corrupt manifests fail here the same way they fail the
/// transaction itself.
pub fn classify_destination(
    destination: &Path,
    incoming_version: &str,
) -> Result<InstallClassification, EngineError> {
    let layout = DestinationLayout::new(destination);
    let previous = load_manifest(&layout)?;
    Ok(classify_install(
        incoming_version,
        previous.as_ref().map(|manifest| manifest.version.as_str()),
    ))
}

pub fn run_install(
    mut request: InstallRequest,
    locks: &DestinationLocks,
    collaborators: &Collaborators,
    sink: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<InstallOutcome, EngineError> {
    let _guard = locks.acquire(&request.destination)?;
    let layout = DestinationLayout::new(&request.destination);
    sink.emit(ProgressEvent::Started {
        operation: OperationKind::Install,
        destination: request.destination.clone(),
    });

    // Everything up to the first extraction is planning: an error here must
    // leave no trace on disk.
    let previous = load_manifest(&layout)?;
    let classification = classify_install(
        &request.version_info.version_display,
        previous.as_ref().map(|manifest| manifest.version.as_str()),
    );

    let entry_names = request.source.entry_names()?;
    let mut planned: Vec<(String, String)> = Vec::new();
    for name in entry_names {
        let Some(relative) = relative_under_root(&request.layout.root, &name) else {
            continue;
        };
        ensure_safe_relative(&relative)?;
        planned.push((name, relative));
    }
    if !planned
        .iter()
        .any(|(_, relative)| relative == &request.layout.chosen)
    {
        return Err(EngineError::Structure(format!(
            "chosen executable '{}' has no file entry in the archive",
            request.layout.chosen
        )));
    }

    fs::create_dir_all(layout.destination())?;

    let total = planned.len();
    let mut installed: Vec<String> = Vec::with_capacity(total);
    for (index, (entry, relative)) in planned.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(
                destination = %layout.destination().display(),
                extracted = installed.len(),
                "install cancelled, rolling back"
            );
            rollback_extraction(&layout, &installed);
            return Err(EngineError::Cancelled {
                rolled_back: installed.len(),
            });
        }

        sink.emit(ProgressEvent::Extracting {
            index: index + 1,
            total,
            path: relative.clone(),
        });
        match request
            .source
            .extract_entry(entry, &layout.file_path(relative))
        {
            Ok(_) => installed.push(relative.clone()),
            Err(err) => {
                tracing::warn!(
                    destination = %layout.destination().display(),
                    entry = %relative,
                    "extraction failed, rolling back"
                );
                rollback_extraction(&layout, &installed);
                return Err(EngineError::Extraction {
                    failed_entry: relative.clone(),
                    detail: err.to_string(),
                    partial_files: installed,
                });
            }
        }
    }

    let mut warnings = Vec::new();

    // Upgrade path: files the previous version owned but the new extraction
    // did not produce are deleted now that the new payload is fully in
    // place. Failures no longer justify rollback.
    let mut removed_obsolete = Vec::new();
    if let Some(previous) = &previous {
        let new_files: std::collections::BTreeSet<&str> =
            installed.iter().map(String::as_str).collect();
        let mut obsolete: Vec<String> = previous
            .file_list
            .iter()
            .filter(|path| !new_files.contains(path.as_str()))
            .cloned()
            .collect();
        if request.stage_uninstaller_from.is_none() {
            if let Some(old_uninstaller) = &previous.uninstaller_path {
                obsolete.push(old_uninstaller.clone());
            }
        }
        for path in obsolete {
            sink.emit(ProgressEvent::RemovingObsolete { path: path.clone() });
            match remove_file_if_exists(&layout.file_path(&path)) {
                Ok(()) => removed_obsolete.push(path),
                Err(err) => {
                    let warning = EngineWarning::FileRemoval {
                        path,
                        detail: err.to_string(),
                    };
                    sink.emit(ProgressEvent::Warning {
                        detail: warning.describe(),
                    });
                    warnings.push(warning);
                }
            }
        }
        let _ = prune_empty_directories(layout.destination(), &[]);
    }

    let uninstaller_path = match &request.stage_uninstaller_from {
        Some(source_binary) => {
            match fs::copy(source_binary, layout.uninstaller_path()) {
                Ok(_) => layout
                    .uninstaller_path()
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                Err(err) => {
                    let warning = EngineWarning::UninstallerStaging {
                        detail: err.to_string(),
                    };
                    sink.emit(ProgressEvent::Warning {
                        detail: warning.describe(),
                    });
                    warnings.push(warning);
                    None
                }
            }
        }
        None => None,
    };

    let installed_size = directory_size(layout.destination()).ok();
    let manifest = InstallManifest {
        schema: MANIFEST_SCHEMA_VERSION,
        app_name: request.app_name.clone(),
        install_location: request.destination.clone(),
        executable_path: request.layout.chosen.clone(),
        version: request.version_info.version_display.clone(),
        product_name: request.version_info.product_name.clone(),
        publisher: request.version_info.publisher.clone(),
        icon: request.version_info.icon.clone(),
        installed_at_unix: current_unix_timestamp()?,
        installed_size,
        source_archive_sha256: request.source_archive_sha256.clone(),
        uninstaller_path,
        file_list: installed.iter().cloned().collect(),
        extra: previous.map(|manifest| manifest.extra).unwrap_or_default(),
    };

    // The manifest is the commit point: once it is durably on disk, every
    // later failure is a warning, never a rollback.
    sink.emit(ProgressEvent::WritingManifest);
    save_manifest(&layout, &manifest)?;

    apply_integrations(&layout, &manifest, &request, collaborators, sink, &mut warnings);

    sink.emit(ProgressEvent::Finished);
    Ok(InstallOutcome {
        classification,
        manifest,
        warnings,
        removed_obsolete,
    })
}

fn apply_integrations(
    layout: &DestinationLayout,
    manifest: &InstallManifest,
    request: &InstallRequest,
    collaborators: &Collaborators,
    sink: &dyn ProgressSink,
    warnings: &mut Vec<EngineWarning>,
) {
    let executable = layout.file_path(&manifest.executable_path);
    let icon = manifest
        .icon
        .clone()
        .or_else(|| Some(format!("{},0", executable.display())));

    let requested_shortcuts: Vec<ShortcutKind> = [
        request.options.desktop_shortcut.then_some(ShortcutKind::Desktop),
        request
            .options
            .start_menu_shortcut
            .then_some(ShortcutKind::StartMenu),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !requested_shortcuts.is_empty() {
        sink.emit(ProgressEvent::ApplyingShortcuts);
    }
    for kind in requested_shortcuts {
        let descriptor = ShortcutDescriptor {
            kind,
            app_name: manifest.app_name.clone(),
            target: executable.clone(),
            working_dir: layout.destination().to_path_buf(),
            icon: icon.clone(),
        };
        if let Err(err) = collaborators.shortcuts.apply(&descriptor) {
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

    if request.options.register_app {
        sink.emit(ProgressEvent::ApplyingRegistration);
        let display_name = if request.version_info.version.is_zero() {
            manifest.product_name.clone()
        } else {
            format!("{} {}", manifest.product_name, manifest.version)
        };
        let descriptor = RegistrationDescriptor {
            app_name: manifest.app_name.clone(),
            display_name,
            display_version: manifest.version.clone(),
            publisher: manifest.publisher.clone(),
            install_location: layout.destination().to_path_buf(),
            uninstall_command: manifest
                .uninstaller_path
                .as_ref()
                .map(|name| format!("\"{}\"", layout.file_path(name).display())),
            icon,
            estimated_size_kib: manifest.installed_size.map(|bytes| bytes / 1024),
        };
        if let Err(err) = collaborators.registrar.apply(&descriptor) {
            let warning = EngineWarning::Registry {
                detail: format!("{err:#}"),
            };
            sink.emit(ProgressEvent::Warning {
                detail: warning.describe(),
            });
            warnings.push(warning);
        }
    }
}

/// Deletes exactly the files this transaction recorded, prunes directories
/// that emptied out, and removes the destination itself if nothing is left.
fn rollback_extraction(layout: &DestinationLayout, installed: &[String]) {
    for relative in installed {
        if let Err(err) = remove_file_if_exists(&layout.file_path(relative)) {
            tracing::warn!(
                path = %layout.file_path(relative).display(),
                error = %err,
                "rollback could not remove file"
            );
        }
    }
    let _ = prune_empty_directories(layout.destination(), &[]);
    let _ = fs::remove_dir(layout.destination());
}
