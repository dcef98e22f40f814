#![cfg(feature = "sqlite")]

use logbook_tool::{
    ContentPools, LogbookConfig, LogbookRun, LogbookStore, NarrativeField, OverrideSet,
    ShiftOverride, SqliteLogbookStore, assemble_run,
};
use tempfile::NamedTempFile;

fn sample_run(total: u32) -> LogbookRun {
    let config = LogbookConfig {
        total_shifts: total,
        seed: Some(21),
        ..LogbookConfig::default()
    };
    let overrides = OverrideSet::from_records(vec![
        ShiftOverride::new(2).with_field(NarrativeField::Debrief, "Learned to expedite"),
    ])
    .unwrap();
    let records = assemble_run(&config, &ContentPools::builtin(), &overrides).unwrap();
    LogbookRun::new(config, records)
}

#[test]
fn sqlite_store_round_trip_run() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteLogbookStore::new(file.path()).unwrap();
    let run = sample_run(6);

    store.save_run(&run).expect("save run");
    let loaded = store.load_run().expect("load run").expect("run exists");

    assert_eq!(loaded, run);
    assert!(loaded.records[1].field(NarrativeField::Debrief).unwrap().provenance().is_override());
}

#[test]
fn empty_store_has_no_run() {
    let store = SqliteLogbookStore::in_memory().unwrap();
    assert!(store.load_run().unwrap().is_none());
}

#[test]
fn saving_replaces_previous_run() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteLogbookStore::new(file.path()).unwrap();
    store.save_run(&sample_run(8)).unwrap();
    store.save_run(&sample_run(4)).unwrap();

    let reopened = SqliteLogbookStore::new(file.path()).unwrap();
    let loaded = reopened.load_run().unwrap().unwrap();
    assert_eq!(loaded.config.total_shifts, 4);
    assert_eq!(loaded.records.len(), 4);
}

#[test]
fn invalid_records_are_not_saved() {
    let store = SqliteLogbookStore::in_memory().unwrap();
    let mut run = sample_run(3);
    run.records[2].slot.index = 1;
    assert!(store.save_run(&run).is_err());
    assert!(store.load_run().unwrap().is_none());
}
