#![cfg(all(feature = "cli", feature = "sqlite"))]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn logbook(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("logbook").expect("logbook binary");
    cmd.current_dir(dir);
    cmd
}

fn count_files(dir: &Path, ext: &str) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|x| x == ext))
        .count()
}

#[test]
fn plan_uses_built_in_defaults() {
    let dir = tempdir().unwrap();
    logbook(dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(str_contains("lunch: 24"))
        .stdout(str_contains("dinner: 24"))
        .stdout(str_contains("2025-01-29"));
}

#[test]
fn generate_without_custom_data_needs_confirmation() {
    let dir = tempdir().unwrap();
    logbook(dir.path()).arg("generate").assert().failure();
    assert!(!dir.path().join("output").exists());
}

#[test]
fn generate_with_yes_writes_every_shift() {
    let dir = tempdir().unwrap();
    logbook(dir.path())
        .args(["generate", "--yes", "--seed", "7"])
        .assert()
        .success()
        .stdout(str_contains("48 of 48 succeeded"))
        .stdout(str_contains("custom_fields=0"));
    assert_eq!(count_files(&dir.path().join("output"), "md"), 48);
}

#[test]
fn template_import_generate_flow() {
    let dir = tempdir().unwrap();
    logbook(dir.path())
        .args(["template", "--output", "sheet.csv"])
        .assert()
        .success()
        .stdout(str_contains("48 shifts"));

    let sheet = fs::read_to_string(dir.path().join("sheet.csv")).unwrap();
    let filled = sheet.replacen(
        "1,06/01/2025,lunch,10:30,16:00,,,",
        "1,06/01/2025,lunch,10:30,16:00,,,Plated the specials",
        1,
    );
    fs::write(dir.path().join("sheet.csv"), filled).unwrap();

    logbook(dir.path())
        .args(["import", "--csv", "sheet.csv"])
        .assert()
        .success()
        .stdout(str_contains("Imported 1 shifts"));
    assert!(dir.path().join("shifts_data_custom.json").exists());

    logbook(dir.path())
        .args(["generate", "--seed", "1", "--output", "docs"])
        .assert()
        .success()
        .stdout(str_contains("custom_fields=1"));
    let first = fs::read_to_string(dir.path().join("docs/shift_01_2025-01-06_lunch.md")).unwrap();
    assert!(first.contains("Plated the specials"));
}

#[test]
fn archived_run_renders_identically() {
    let dir = tempdir().unwrap();
    logbook(dir.path())
        .args(["generate", "--yes", "--seed", "3", "--archive", "run.db"])
        .assert()
        .success();
    logbook(dir.path())
        .args(["render", "--archive", "run.db", "--output", "again"])
        .assert()
        .success()
        .stdout(str_contains("48 of 48 succeeded"));

    let name = "shift_10_2025-01-10_dinner.md";
    let original = fs::read_to_string(dir.path().join("output").join(name)).unwrap();
    let rerendered = fs::read_to_string(dir.path().join("again").join(name)).unwrap();
    assert_eq!(original, rerendered);
}

#[test]
fn invalid_config_exits_with_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.json"), "{ not json").unwrap();
    logbook(dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(str_contains("configuration error"));
}
