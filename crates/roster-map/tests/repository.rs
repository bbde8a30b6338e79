use std::fs;

use roster_map::{MappingError, MappingRepository, MatcherProvider, import_file};
use roster_model::MappingTable;
use tempfile::TempDir;

fn temp_repo() -> (TempDir, MappingRepository) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let repo = MappingRepository::new(dir.path().join("mappings")).expect("create repo");
    (dir, repo)
}

fn han_table() -> MappingTable {
    MappingTable::from_pairs("han", [("B1", "NP"), ("B19", "TR"), ("OT", "")])
}

#[test]
fn save_and_load_latest() {
    let (_dir, repo) = temp_repo();
    let meta = repo
        .save(&han_table(), true, Some("planner"))
        .expect("save mapping");

    assert_eq!(meta.station, "HAN");
    assert_eq!(meta.entry_count, 3);
    assert_eq!(meta.created_by.as_deref(), Some("planner"));
    assert!(repo.base_dir().join("HAN").join("latest.json").is_file());
    assert!(
        repo.base_dir()
            .join("HAN")
            .join(format!("{}.json", meta.version))
            .is_file()
    );

    let loaded = repo
        .load("han", None)
        .expect("load mapping")
        .expect("mapping should exist");
    assert_eq!(loaded.station_code(), "HAN");
    assert_eq!(loaded.version(), Some(meta.version.as_str()));
    assert_eq!(loaded.get("b19"), Some("TR"));
    assert_eq!(loaded.get("OT"), Some(""));
}

#[test]
fn save_without_replace_merges_over_latest() {
    let (_dir, repo) = temp_repo();
    repo.save(&han_table(), true, None).expect("first save");
    let update = MappingTable::from_pairs("HAN", [("B1", "Rest"), ("B2", "SB")]);
    let meta = repo.save(&update, false, None).expect("merge save");

    assert_eq!(meta.entry_count, 4);
    let loaded = repo
        .load("HAN", None)
        .expect("load")
        .expect("mapping should exist");
    assert_eq!(loaded.get("B1"), Some("Rest"));
    assert_eq!(loaded.get("B19"), Some("TR"));
    assert_eq!(loaded.get("B2"), Some("SB"));

    let replaced = repo.save(&update, true, None).expect("replace save");
    assert_eq!(replaced.entry_count, 2);
}

#[test]
fn versions_are_unique_and_newest_first() {
    let (_dir, repo) = temp_repo();
    let first = repo.save(&han_table(), true, None).expect("first");
    let second = repo.save(&han_table(), true, None).expect("second");
    assert_ne!(first.version, second.version);

    let versions = repo.list_versions("HAN").expect("list versions");
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].version, second.version);
    assert_eq!(versions[1].version, first.version);

    let old = repo
        .load("HAN", Some(&first.version))
        .expect("load version")
        .expect("version should exist");
    assert_eq!(old.version(), Some(first.version.as_str()));
}

#[test]
fn missing_version_is_an_error_missing_station_is_none() {
    let (_dir, repo) = temp_repo();
    assert!(repo.load("SGN", None).expect("load").is_none());

    repo.save(&han_table(), true, None).expect("save");
    let error = repo
        .load("HAN", Some("19990101_000000"))
        .expect_err("version should be missing");
    assert!(matches!(error, MappingError::VersionNotFound { .. }));
}

#[test]
fn effective_table_falls_back_to_global() {
    let (_dir, repo) = temp_repo();
    repo.save(
        &MappingTable::from_pairs("GLOBAL", [("OFF", "Nghỉ")]),
        true,
        None,
    )
    .expect("save global");
    assert!(repo.base_dir().join("global").join("latest.json").is_file());

    let table = repo.load_effective("DAD").expect("effective");
    assert_eq!(table.station_code(), "DAD");
    assert_eq!(table.get("OFF"), Some("Nghỉ"));

    let matcher = repo.matcher_for("DAD").expect("matcher");
    assert_eq!(matcher.resolve("off"), Some("Nghỉ"));

    repo.delete("global", None).expect("delete global");
    let empty = repo.load_effective("DAD").expect("effective");
    assert!(empty.is_empty());
}

#[test]
fn list_stations_and_delete() {
    let (_dir, repo) = temp_repo();
    repo.save(&han_table(), true, None).expect("save han");
    repo.save(&MappingTable::from_pairs("SGN", [("B2", "SB")]), true, None)
        .expect("save sgn");

    let stations = repo.list_stations().expect("list stations");
    let names: Vec<&str> = stations.iter().map(|s| s.station.as_str()).collect();
    assert_eq!(names, vec!["HAN", "SGN"]);
    assert_eq!(stations[0].entry_count, 3);

    assert!(repo.exists("sgn"));
    assert!(repo.delete("SGN", None).expect("delete"));
    assert!(!repo.exists("SGN"));
    assert!(!repo.delete("SGN", None).expect("delete again"));
}

#[test]
fn legacy_flat_document_loads() {
    let (_dir, repo) = temp_repo();
    let station_dir = repo.base_dir().join("CXR");
    fs::create_dir_all(&station_dir).expect("create station dir");
    fs::write(
        station_dir.join("latest.json"),
        r#"{"B1": "NP", "OT": null}"#,
    )
    .expect("write legacy");

    let table = repo
        .load("CXR", None)
        .expect("load legacy")
        .expect("mapping should exist");
    assert_eq!(table.get("B1"), Some("NP"));
    assert_eq!(table.get("OT"), Some(""));
    assert_eq!(table.version(), None);
}

#[test]
fn malformed_document_is_configuration_error() {
    let (_dir, repo) = temp_repo();
    let station_dir = repo.base_dir().join("HAN");
    fs::create_dir_all(&station_dir).expect("create station dir");
    fs::write(station_dir.join("latest.json"), r#"{"B1": ["NP"]}"#).expect("write");

    let error = repo.load("HAN", None).expect_err("should fail");
    assert!(error.is_configuration_error());
}

#[test]
fn invalid_station_codes_are_rejected() {
    let (_dir, repo) = temp_repo();
    for station in ["", "../etc", "HAN SGN", "HAN/1"] {
        let error = repo.load(station, None).expect_err("invalid station");
        assert!(matches!(error, MappingError::InvalidStation(_)), "{station}");
    }
}

#[test]
fn import_then_save() {
    let (dir, repo) = temp_repo();
    let csv_path = dir.path().join("han.csv");
    fs::write(&csv_path, "ma,thay_the\nB1,NP\nB19,TR\nOT,\n").expect("write csv");

    let table = import_file(&csv_path, "HAN").expect("import csv");
    assert_eq!(table.entry_count(), 3);
    repo.save(&table, true, Some("import")).expect("save");

    let loaded = repo.load_effective("HAN").expect("load");
    assert_eq!(loaded.get("OT"), Some(""));
}

#[test]
fn empty_import_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let csv_path = dir.path().join("empty.csv");
    fs::write(&csv_path, "code,replacement\n").expect("write csv");

    let error = import_file(&csv_path, "HAN").expect_err("empty import");
    assert!(matches!(error, MappingError::EmptyImport { .. }));

    let json_path = dir.path().join("han.json");
    fs::write(&json_path, r#"{"mappings": "B1=NP"}"#).expect("write json");
    let error = import_file(&json_path, "HAN").expect_err("mappings must be an object");
    assert!(error.is_configuration_error());
}

#[test]
fn json_import_accepts_mappings_without_meta() {
    let dir = tempfile::tempdir().expect("temp dir");
    let json_path = dir.path().join("han.json");
    fs::write(&json_path, r#"{"mappings": {"B1": "NP", "B2": "SB"}}"#).expect("write json");

    let table = import_file(&json_path, "han").expect("import json");
    assert_eq!(table.station_code(), "han");
    assert_eq!(table.entry_count(), 2);
}

#[test]
fn flat_json_import_skips_annotation_keys() {
    let dir = tempfile::tempdir().expect("temp dir");
    let json_path = dir.path().join("han.json");
    fs::write(
        &json_path,
        r#"{"_comment": "HAN roster codes", "_source": {"sheet": "T10"}, "B1": "NP"}"#,
    )
    .expect("write json");

    let table = import_file(&json_path, "han").expect("import json");
    assert_eq!(table.entry_count(), 1);
    assert_eq!(table.get("B1"), Some("NP"));
    assert!(!table.contains("_comment"));
}
