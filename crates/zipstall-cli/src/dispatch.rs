use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use zipstall_core::{
    clean_version_string, normalize_metadata, resolve_layout, ArchiveLayout, InstallClass,
    RawExecutableMetadata, ResolutionConfidence, VersionInfo, VersionTuple,
};
use zipstall_installer::{
    classify_destination, default_install_root, plan_uninstall, sha256_file, spawn_install,
    spawn_uninstall, ArchiveSource, CancelToken, Collaborators, DestinationLocks, DriftKind,
    EngineError, InstallOptions, InstallRequest, MetadataReader, SystemMetadataReader,
    UninstallCompletion, ZipArchiveSource,
};

use crate::config::{load_config, CliConfig};
use crate::render::{detect_output_style, print_status, print_warning, EventRenderer, OutputStyle};

#[derive(Parser, Debug)]
#[command(name = "zipstall")]
#[command(about = "Portable application installer for ZIP archives", long_about = None)]
pub struct Cli {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an archive's structure and probe the executable's metadata
    Inspect { archive: PathBuf },
    /// Extract an archive into a tracked, reversible installation
    Install {
        archive: PathBuf,
        /// Install directory; defaults to the configured root plus app name
        #[arg(long)]
        destination: Option<PathBuf>,
        /// Application name override
        #[arg(long)]
        name: Option<String>,
        /// Executable override, relative to the archive root
        #[arg(long)]
        executable: Option<String>,
        /// Version override when the executable's metadata is wrong or absent
        #[arg(long)]
        app_version: Option<String>,
        #[arg(long)]
        desktop_shortcut: Option<bool>,
        #[arg(long)]
        start_menu_shortcut: Option<bool>,
        #[arg(long)]
        register: Option<bool>,
        /// Proceed when the destination holds a newer version
        #[arg(long)]
        allow_downgrade: bool,
        /// Accept an uncertain executable choice without confirmation
        #[arg(long, short = 'y')]
        yes: bool,
        #[arg(long)]
        plain: bool,
    },
    /// Remove a tracked installation, keeping files added after install
    Uninstall {
        directory: PathBuf,
        /// Also remove files and directories the install never recorded
        #[arg(long)]
        purge_extras: bool,
        #[arg(long)]
        plain: bool,
    },
    /// Generate a shell completion script on stdout
    Completions { shell: Shell },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { archive } => inspect_flow(&archive),
        Commands::Install {
            archive,
            destination,
            name,
            executable,
            app_version,
            desktop_shortcut,
            start_menu_shortcut,
            register,
            allow_downgrade,
            yes,
            plain,
        } => install_flow(InstallFlowArgs {
            config,
            archive,
            destination,
            name,
            executable,
            app_version,
            desktop_shortcut,
            start_menu_shortcut,
            register,
            allow_downgrade,
            yes,
            plain,
        }),
        Commands::Uninstall {
            directory,
            purge_extras,
            plain,
        } => uninstall_flow(&directory, purge_extras, plain),
        Commands::Completions { shell } => {
            crate::completion::write_completions_script(shell, &mut std::io::stdout())
        }
    }
}

pub struct InstallFlowArgs {
    pub config: CliConfig,
    pub archive: PathBuf,
    pub destination: Option<PathBuf>,
    pub name: Option<String>,
    pub executable: Option<String>,
    pub app_version: Option<String>,
    pub desktop_shortcut: Option<bool>,
    pub start_menu_shortcut: Option<bool>,
    pub register: Option<bool>,
    pub allow_downgrade: bool,
    pub yes: bool,
    pub plain: bool,
}

fn archive_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string())
}

fn inspect_flow(archive: &Path) -> Result<()> {
    let mut source = ZipArchiveSource::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;
    let names = source.entry_names()?;
    let stem = archive_stem(archive);
    let layout = resolve_layout(&names, &stem)?;

    let root_display = if layout.root.is_empty() {
        "<archive root>".to_string()
    } else {
        format!("{}/", layout.root)
    };
    println!("root: {root_display}");
    println!("executable: {}", layout.chosen);
    if layout.candidates.len() > 1 {
        for candidate in &layout.candidates {
            println!("candidate: {candidate}");
        }
    }
    if layout.confidence == ResolutionConfidence::Uncertain {
        println!("confidence: uncertain (first candidate picked arbitrarily)");
    }

    let info = probe_version_info(&mut source, &layout, &stem, OutputStyle::Plain);
    println!("product: {}", info.product_name);
    println!("version: {}{}", info.version_display, if info.degraded { " (degraded)" } else { "" });
    println!("publisher: {}", info.publisher);
    if let Ok(digest) = sha256_file(archive) {
        println!("sha256: {digest}");
    }
    Ok(())
}

fn probe_version_info(
    source: &mut ZipArchiveSource,
    layout: &ArchiveLayout,
    stem: &str,
    style: OutputStyle,
) -> VersionInfo {
    match probe_raw_metadata(source, layout) {
        Ok(raw) => normalize_metadata(&raw, stem),
        Err(err) => {
            // Non-fatal by contract: the record degrades instead.
            print_warning(style, &err.to_string());
            normalize_metadata(&RawExecutableMetadata::default(), stem)
        }
    }
}

fn probe_raw_metadata(
    source: &mut ZipArchiveSource,
    layout: &ArchiveLayout,
) -> Result<RawExecutableMetadata, EngineError> {
    let temp = tempfile::tempdir()?;
    let probe_path = temp.path().join("probe.exe");
    source.extract_entry(&layout.chosen_entry_name(), &probe_path)?;
    SystemMetadataReader
        .read(&probe_path)
        .map_err(|err| EngineError::MetadataUnavailable(format!("{err:#}")))
}

fn install_flow(args: InstallFlowArgs) -> Result<()> {
    let style = detect_output_style(args.plain);
    let mut source = ZipArchiveSource::open(&args.archive)
        .with_context(|| format!("failed to open archive: {}", args.archive.display()))?;
    let names = source.entry_names()?;
    let stem = archive_stem(&args.archive);
    let mut layout = resolve_layout(&names, &stem)?;

    if let Some(executable) = args.executable {
        if !layout.candidates.contains(&executable) {
            print_warning(
                style,
                &format!("'{executable}' is not among the detected candidates"),
            );
        }
        layout.chosen = executable;
        layout.confidence = ResolutionConfidence::Certain;
    } else if layout.confidence == ResolutionConfidence::Uncertain && !args.yes {
        bail!(
            "multiple executable candidates ({}); picked '{}' arbitrarily; pass --executable to choose or --yes to accept",
            layout.candidates.join(", "),
            layout.chosen
        );
    }

    let mut version_info = probe_version_info(&mut source, &layout, &stem, style);
    if let Some(version) = args.app_version {
        let cleaned = clean_version_string(&version);
        match VersionTuple::parse(&cleaned) {
            Some(tuple) => {
                version_info.version = tuple;
                version_info.version_display = cleaned;
                version_info.degraded = false;
            }
            None => {
                version_info.version = VersionTuple::ZERO;
                version_info.version_display = cleaned;
                version_info.degraded = true;
            }
        }
    }

    let app_name = args
        .name
        .unwrap_or_else(|| version_info.product_name.clone());
    let destination = match args.destination {
        Some(destination) => destination,
        None => {
            let root = match &args.config.install_root {
                Some(root) => root.clone(),
                None => default_install_root()?,
            };
            root.join(&app_name)
        }
    };

    let preview = classify_destination(&destination, &version_info.version_display)?;
    if preview.degraded && preview.class != InstallClass::Fresh {
        print_warning(
            style,
            "version comparison degraded to lexicographic ordering",
        );
    }
    if preview.class == InstallClass::Downgrade && !args.allow_downgrade {
        bail!(
            "the destination holds a newer version; pass --allow-downgrade to replace it"
        );
    }

    let source_archive_sha256 = match sha256_file(&args.archive) {
        Ok(digest) => Some(digest),
        Err(err) => {
            print_warning(style, &format!("could not hash the archive: {err}"));
            None
        }
    };
    let options = InstallOptions {
        desktop_shortcut: args.desktop_shortcut.unwrap_or(args.config.desktop_shortcut),
        start_menu_shortcut: args
            .start_menu_shortcut
            .unwrap_or(args.config.start_menu_shortcut),
        register_app: args.register.unwrap_or(args.config.register_app),
    };
    let stage_uninstaller_from = if args.config.stage_uninstaller {
        std::env::current_exe().ok()
    } else {
        None
    };

    let request = InstallRequest {
        source: Box::new(source),
        layout,
        destination: destination.clone(),
        app_name: app_name.clone(),
        version_info,
        options,
        source_archive_sha256,
        stage_uninstaller_from,
    };
    let handle = spawn_install(
        request,
        DestinationLocks::new(),
        Arc::new(Collaborators::native()),
        CancelToken::new(),
    );
    let mut renderer = EventRenderer::new(style);
    for event in handle.events.iter() {
        renderer.handle(&event);
    }
    let outcome = handle.join()?;

    print_status(
        style,
        "installed",
        &format!(
            "{} ({}) -> {} [{}]",
            app_name,
            outcome.manifest.version,
            destination.display(),
            outcome.classification.class.as_str()
        ),
    );
    print_status(
        style,
        "tracked",
        &format!("{} file(s) recorded in the manifest", outcome.manifest.file_list.len()),
    );
    if !outcome.removed_obsolete.is_empty() {
        print_status(
            style,
            "cleaned",
            &format!(
                "{} file(s) from the previous version removed",
                outcome.removed_obsolete.len()
            ),
        );
    }
    for warning in &outcome.warnings {
        print_warning(style, &warning.describe());
    }
    Ok(())
}

fn uninstall_flow(directory: &Path, purge_extras: bool, plain: bool) -> Result<()> {
    let style = detect_output_style(plain);
    let plan = plan_uninstall(directory)?;

    if !plan.drift.is_empty() {
        print_status(
            style,
            "drift",
            &format!(
                "{} item(s) under {} were not created by the install",
                plan.drift.len(),
                directory.display()
            ),
        );
        for entry in &plan.drift {
            let kind = match entry.kind {
                DriftKind::File => "file",
                DriftKind::EmptyDirectory => "empty directory",
            };
            println!("  {} ({kind})", entry.path);
        }
        if !purge_extras {
            print_status(
                style,
                "keeping",
                "extra items stay in place; pass --purge-extras to remove them",
            );
        }
    }

    let approved: BTreeSet<String> = if purge_extras {
        plan.drift.iter().map(|entry| entry.path.clone()).collect()
    } else {
        BTreeSet::new()
    };

    let handle = spawn_uninstall(
        plan,
        approved,
        DestinationLocks::new(),
        Arc::new(Collaborators::native()),
    );
    let mut renderer = EventRenderer::new(style);
    for event in handle.events.iter() {
        renderer.handle(&event);
    }
    let outcome = handle.join()?;

    print_status(
        style,
        "removed",
        &format!(
            "{} file(s) deleted, {} already gone",
            outcome.deleted_files, outcome.skipped_missing
        ),
    );
    if !outcome.kept_drift.is_empty() {
        print_status(
            style,
            "kept",
            &format!("{} extra item(s) left in place", outcome.kept_drift.len()),
        );
    }
    match outcome.completion {
        UninstallCompletion::Completed => {
            print_status(style, "done", "uninstall complete");
        }
        UninstallCompletion::SelfDeleteScheduled => {
            // Scheduled is not executed; the deferred action finishes on its
            // own after this process exits.
            print_status(
                style,
                "done",
                "uninstall complete; the uninstaller removes itself after exit",
            );
        }
    }
    for warning in &outcome.warnings {
        print_warning(style, &warning.describe());
    }
    Ok(())
}
