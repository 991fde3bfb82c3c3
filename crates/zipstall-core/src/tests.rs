use std::cmp::Ordering;

use super::*;

fn names(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|entry| entry.to_string()).collect()
}

#[test]
fn version_tuple_parses_partial_segments_as_zero() {
    assert_eq!(VersionTuple::parse("1"), Some(VersionTuple([1, 0, 0, 0])));
    assert_eq!(VersionTuple::parse("1.2"), Some(VersionTuple([1, 2, 0, 0])));
    assert_eq!(
        VersionTuple::parse("1.2.3.4"),
        Some(VersionTuple([1, 2, 3, 4]))
    );
}

#[test]
fn version_tuple_ignores_segments_past_the_fourth() {
    assert_eq!(
        VersionTuple::parse("1.2.3.4.99"),
        Some(VersionTuple([1, 2, 3, 4]))
    );
}

#[test]
fn version_tuple_rejects_non_numeric_segments() {
    assert_eq!(VersionTuple::parse("1.2b.0"), None);
    assert_eq!(VersionTuple::parse("-1.0"), None);
    assert_eq!(VersionTuple::parse(""), None);
}

#[test]
fn version_tuple_accepts_comma_and_space_noise() {
    assert_eq!(
        VersionTuple::parse(" 1, 2, 3, 4 "),
        Some(VersionTuple([1, 2, 3, 4]))
    );
}

#[test]
fn compare_versions_is_numeric_per_segment() {
    assert_eq!(
        compare_versions("1.2.0", "1.10.0"),
        VersionComparison {
            ordering: Ordering::Less,
            degraded: false,
        }
    );
    assert_eq!(
        compare_versions("1.10.0", "2.0.0"),
        VersionComparison {
            ordering: Ordering::Less,
            degraded: false,
        }
    );
    assert_eq!(compare_versions("1.2", "1.2.0.0").ordering, Ordering::Equal);
}

#[test]
fn compare_versions_ordering_is_consistent() {
    let versions = ["0.9", "1.2.0", "1.10.0", "2.0.0", "2.0.0.1"];
    for (i, a) in versions.iter().enumerate() {
        assert_eq!(compare_versions(a, a).ordering, Ordering::Equal);
        for b in &versions[i + 1..] {
            assert_eq!(compare_versions(a, b).ordering, Ordering::Less);
            assert_eq!(compare_versions(b, a).ordering, Ordering::Greater);
        }
    }
}

#[test]
fn compare_versions_degrades_to_lexicographic_and_reports_it() {
    let comparison = compare_versions("1.2b", "1.10");
    assert!(comparison.degraded);
    // "1.2b" > "1.10" lexicographically even though 2 < 10 numerically.
    assert_eq!(comparison.ordering, Ordering::Greater);

    let comparison = compare_versions("abc", "abc");
    assert!(comparison.degraded);
    assert_eq!(comparison.ordering, Ordering::Equal);
}

#[test]
fn classify_install_without_prior_manifest_is_fresh() {
    let classification = classify_install("1.0.0.0", None);
    assert_eq!(classification.class, InstallClass::Fresh);
    assert!(!classification.degraded);
}

#[test]
fn classify_install_covers_upgrade_reinstall_downgrade() {
    assert_eq!(
        classify_install("1.10.0", Some("1.2.0")).class,
        InstallClass::Upgrade
    );
    assert_eq!(
        classify_install("1.2.0", Some("1.2.0.0")).class,
        InstallClass::Reinstall
    );
    assert_eq!(
        classify_install("1.2.0", Some("1.10.0")).class,
        InstallClass::Downgrade
    );
}

#[test]
fn classify_install_reports_degradation() {
    let classification = classify_install("snapshot-2", Some("snapshot-1"));
    assert!(classification.degraded);
    assert_eq!(classification.class, InstallClass::Upgrade);
}

#[test]
fn resolve_layout_prefers_depth_zero_executables() {
    let layout = resolve_layout(
        &names(&["app.exe", "readme.txt", "data/strings.dat"]),
        "app",
    )
    .expect("must resolve");
    assert_eq!(layout.root, "");
    assert_eq!(layout.candidates, vec!["app.exe"]);
    assert_eq!(layout.chosen, "app.exe");
    assert_eq!(layout.confidence, ResolutionConfidence::Certain);
    assert_eq!(layout.chosen_entry_name(), "app.exe");
}

#[test]
fn resolve_layout_descends_into_a_single_top_level_directory() {
    let layout = resolve_layout(
        &names(&["App/", "App/app.exe", "App/lib/core.dll", "App/readme.txt"]),
        "app",
    )
    .expect("must resolve");
    assert_eq!(layout.root, "App");
    assert_eq!(layout.candidates, vec!["app.exe"]);
    assert_eq!(layout.chosen_entry_name(), "App/app.exe");
}

#[test]
fn resolve_layout_normalizes_backslash_separators() {
    let layout = resolve_layout(&names(&["App\\app.exe", "App\\data\\a.bin"]), "other")
        .expect("must resolve");
    assert_eq!(layout.root, "App");
    assert_eq!(layout.chosen, "app.exe");
}

#[test]
fn resolve_layout_rejects_split_top_level_directories() {
    let err = resolve_layout(&names(&["App/app.exe", "Docs/readme.txt"]), "app")
        .expect_err("must be ambiguous");
    assert_eq!(err, LayoutError::AmbiguousStructure);
}

#[test]
fn resolve_layout_treats_loose_root_files_as_ambiguity() {
    // A depth-0 non-executable alongside a real top-level directory means
    // the entries do not share a single top-level segment.
    let err = resolve_layout(&names(&["readme.txt", "App/app.exe"]), "app")
        .expect_err("must be ambiguous");
    assert_eq!(err, LayoutError::AmbiguousStructure);
}

#[test]
fn resolve_layout_fails_when_no_executable_exists() {
    let err = resolve_layout(&names(&["App/readme.txt", "App/data/strings.dat"]), "app")
        .expect_err("must fail");
    assert_eq!(err, LayoutError::NoExecutableFound);

    let err = resolve_layout(&[], "app").expect_err("must fail on empty archives");
    assert_eq!(err, LayoutError::NoExecutableFound);
}

#[test]
fn resolve_layout_ignores_executables_below_depth_one() {
    let err = resolve_layout(&names(&["App/tools/helper.exe", "App/readme.txt"]), "app")
        .expect_err("must fail");
    assert_eq!(err, LayoutError::NoExecutableFound);
}

#[test]
fn resolve_layout_breaks_ties_by_archive_stem() {
    let layout = resolve_layout(
        &names(&["tool.exe", "aardvark.exe", "helper.exe"]),
        "Tool",
    )
    .expect("must resolve");
    assert_eq!(layout.chosen, "tool.exe");
    assert_eq!(layout.confidence, ResolutionConfidence::Certain);
}

#[test]
fn resolve_layout_flags_arbitrary_pick_as_uncertain() {
    let layout = resolve_layout(&names(&["zulu.exe", "alpha.exe"]), "package")
        .expect("must resolve");
    assert_eq!(layout.chosen, "alpha.exe");
    assert_eq!(layout.confidence, ResolutionConfidence::Uncertain);
    assert_eq!(layout.candidates, vec!["alpha.exe", "zulu.exe"]);
}

#[test]
fn normalize_metadata_passes_complete_fields_through() {
    let raw = RawExecutableMetadata {
        product_name: Some("Frhed".to_string()),
        file_version: Some("1, 7, 1, 0".to_string()),
        publisher: Some("Frhed Project".to_string()),
        icon: Some("frhed.exe,0".to_string()),
    };
    let info = normalize_metadata(&raw, "frhed-1.7.1");
    assert_eq!(info.version, VersionTuple([1, 7, 1, 0]));
    assert_eq!(info.version_display, "1.7.1.0");
    assert!(!info.degraded);
    assert_eq!(info.product_name, "Frhed");
    assert_eq!(info.publisher, "Frhed Project");
    assert_eq!(info.icon.as_deref(), Some("frhed.exe,0"));
}

#[test]
fn normalize_metadata_degrades_on_missing_version() {
    let info = normalize_metadata(&RawExecutableMetadata::default(), "tool");
    assert_eq!(info.version, VersionTuple::ZERO);
    assert_eq!(info.version_display, "0.0.0.0");
    assert!(info.degraded);
    assert_eq!(info.product_name, "tool");
    assert_eq!(info.publisher, UNKNOWN_PUBLISHER);
    assert!(info.icon.is_none());
}

#[test]
fn normalize_metadata_keeps_unparseable_version_text() {
    let raw = RawExecutableMetadata {
        file_version: Some("2024-nightly".to_string()),
        ..Default::default()
    };
    let info = normalize_metadata(&raw, "tool");
    assert!(info.degraded);
    assert_eq!(info.version, VersionTuple::ZERO);
    assert_eq!(info.version_display, "2024-nightly");
}

#[test]
fn normalize_metadata_treats_blank_fields_as_absent() {
    let raw = RawExecutableMetadata {
        product_name: Some("   ".to_string()),
        file_version: Some("".to_string()),
        publisher: Some("".to_string()),
        icon: None,
    };
    let info = normalize_metadata(&raw, "archive-stem");
    assert_eq!(info.product_name, "archive-stem");
    assert_eq!(info.publisher, UNKNOWN_PUBLISHER);
    assert!(info.degraded);
}

fn sample_manifest_json() -> &'static str {
    r#"{
  "schema": 1,
  "app_name": "Frhed",
  "install_location": "/opt/apps/Frhed",
  "executable_path": "frhed.exe",
  "version": "1.7.1.0",
  "product_name": "Frhed",
  "publisher": "Frhed Project",
  "installed_at_unix": 1754650000,
  "file_list": ["frhed.exe", "lang/en.po", "readme.txt"]
}"#
}

#[test]
fn manifest_round_trips_through_json() {
    let manifest = InstallManifest::from_json_str(sample_manifest_json()).expect("must parse");
    assert_eq!(manifest.schema, MANIFEST_SCHEMA_VERSION);
    assert_eq!(manifest.app_name, "Frhed");
    assert_eq!(manifest.file_list.len(), 3);
    assert!(manifest.file_list.contains("lang/en.po"));

    let rendered = manifest.to_json_string().expect("must serialize");
    let reparsed = InstallManifest::from_json_str(&rendered).expect("must reparse");
    assert_eq!(reparsed, manifest);
}

#[test]
fn manifest_tolerates_missing_additive_fields() {
    let raw = r#"{
  "app_name": "Old",
  "install_location": "/opt/apps/Old",
  "executable_path": "old.exe",
  "version": "0.1",
  "installed_at_unix": 1000000000
}"#;
    let manifest = InstallManifest::from_json_str(raw).expect("older records must load");
    assert_eq!(manifest.schema, MANIFEST_SCHEMA_VERSION);
    assert!(manifest.file_list.is_empty());
    assert!(manifest.uninstaller_path.is_none());
    assert!(manifest.installed_size.is_none());
}

#[test]
fn manifest_preserves_unknown_fields_on_rewrite() {
    let raw = r#"{
  "app_name": "Frhed",
  "install_location": "/opt/apps/Frhed",
  "executable_path": "frhed.exe",
  "version": "1.7.1.0",
  "installed_at_unix": 1754650000,
  "file_list": ["frhed.exe"],
  "future_field": {"nested": true},
  "pinned": "yes"
}"#;
    let manifest = InstallManifest::from_json_str(raw).expect("must parse");
    assert_eq!(manifest.extra.len(), 2);

    let rendered = manifest.to_json_string().expect("must serialize");
    assert!(rendered.contains("future_field"));
    assert!(rendered.contains("\"pinned\": \"yes\""));
}

#[test]
fn manifest_rejects_escaping_file_list_entries() {
    let raw = r#"{
  "app_name": "Evil",
  "install_location": "/opt/apps/Evil",
  "executable_path": "evil.exe",
  "version": "1.0",
  "installed_at_unix": 1000000000,
  "file_list": ["../outside.txt"]
}"#;
    assert!(InstallManifest::from_json_str(raw).is_err());
}

#[test]
fn manifest_rejects_empty_identity_fields() {
    let raw = r#"{
  "app_name": " ",
  "install_location": "/opt/apps/X",
  "executable_path": "x.exe",
  "version": "1.0",
  "installed_at_unix": 1000000000
}"#;
    assert!(InstallManifest::from_json_str(raw).is_err());
}

#[test]
fn manifest_tracks_its_own_artifacts() {
    let mut manifest = InstallManifest::from_json_str(sample_manifest_json()).expect("must parse");
    manifest.uninstaller_path = Some("uninstall.exe".to_string());
    assert!(manifest.tracks("frhed.exe"));
    assert!(manifest.tracks(MANIFEST_FILE_NAME));
    assert!(manifest.tracks("uninstall.exe"));
    assert!(!manifest.tracks("notes.txt"));
}
