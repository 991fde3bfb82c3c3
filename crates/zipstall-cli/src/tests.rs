use clap::Parser;

use crate::config::{parse_config, CliConfig};
use crate::dispatch::{Cli, Commands};
use crate::render::{render_status_line, OutputStyle};

#[test]
fn parse_install_command_with_overrides() {
    let cli = Cli::try_parse_from([
        "zipstall",
        "install",
        "frhed.zip",
        "--destination",
        "/opt/apps/Frhed",
        "--name",
        "Frhed",
        "--executable",
        "frhed.exe",
        "--app-version",
        "1.7.1",
        "--desktop-shortcut",
        "true",
        "--allow-downgrade",
        "--yes",
        "--plain",
    ])
    .expect("must parse");

    match cli.command {
        Commands::Install {
            archive,
            destination,
            name,
            executable,
            app_version,
            desktop_shortcut,
            start_menu_shortcut,
            allow_downgrade,
            yes,
            plain,
            ..
        } => {
            assert_eq!(archive.to_string_lossy(), "frhed.zip");
            assert_eq!(
                destination.expect("destination set").to_string_lossy(),
                "/opt/apps/Frhed"
            );
            assert_eq!(name.as_deref(), Some("Frhed"));
            assert_eq!(executable.as_deref(), Some("frhed.exe"));
            assert_eq!(app_version.as_deref(), Some("1.7.1"));
            assert_eq!(desktop_shortcut, Some(true));
            assert_eq!(start_menu_shortcut, None);
            assert!(allow_downgrade);
            assert!(yes);
            assert!(plain);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_uninstall_command() {
    let cli = Cli::try_parse_from(["zipstall", "uninstall", "/opt/apps/Frhed", "--purge-extras"])
        .expect("must parse");
    match cli.command {
        Commands::Uninstall {
            directory,
            purge_extras,
            plain,
        } => {
            assert_eq!(directory.to_string_lossy(), "/opt/apps/Frhed");
            assert!(purge_extras);
            assert!(!plain);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_rejects_missing_archive() {
    assert!(Cli::try_parse_from(["zipstall", "install"]).is_err());
}

#[test]
fn config_defaults_apply_when_fields_are_missing() {
    let config = parse_config("desktop_shortcut = true\n").expect("must parse");
    assert!(config.desktop_shortcut);
    assert!(config.start_menu_shortcut);
    assert!(config.register_app);
    assert!(config.stage_uninstaller);
    assert!(config.install_root.is_none());
}

#[test]
fn config_ignores_unknown_keys() {
    let config = parse_config("future_option = \"x\"\nregister_app = false\n")
        .expect("unknown keys must not fail parsing");
    assert!(!config.register_app);
}

#[test]
fn config_empty_input_is_the_default() {
    let config = parse_config("").expect("must parse");
    assert_eq!(config, CliConfig::default());
}

#[test]
fn config_parses_install_root() {
    let config =
        parse_config("install_root = \"/opt/apps\"\nstage_uninstaller = false\n").expect("must parse");
    assert_eq!(
        config.install_root.expect("root set").to_string_lossy(),
        "/opt/apps"
    );
    assert!(!config.stage_uninstaller);
}

#[test]
fn plain_status_lines_are_unstyled() {
    let line = render_status_line(OutputStyle::Plain, "install", "/opt/apps/Frhed");
    assert_eq!(line, "install: /opt/apps/Frhed");
}

#[test]
fn rich_status_lines_carry_ansi_styling() {
    let line = render_status_line(OutputStyle::Rich, "install", "/opt/apps/Frhed");
    assert!(line.contains("install"));
    assert!(line.contains("\u{1b}["));
}
