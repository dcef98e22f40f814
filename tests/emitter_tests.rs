use logbook_tool::emitter::output_extension;
use logbook_tool::{
    ContentPools, DocumentEmitter, DocumentHeader, GenerationSummary, LogbookConfig, LogbookError,
    NarrativeField, OverrideSet, ShiftOverride, ShiftRecord, assemble_run, verify_output,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn records(total: u32, overrides: &OverrideSet) -> (LogbookConfig, Vec<ShiftRecord>) {
    let config = LogbookConfig {
        total_shifts: total,
        seed: Some(3),
        establishment: "Harbour Bistro".into(),
        ..LogbookConfig::default()
    };
    let records = assemble_run(&config, &ContentPools::builtin(), overrides).unwrap();
    (config, records)
}

fn header(config: &LogbookConfig) -> DocumentHeader {
    DocumentHeader::from_config(config)
}

#[test]
fn builtin_template_renders_record() {
    let overrides = OverrideSet::from_records(vec![
        ShiftOverride::new(1).with_field(NarrativeField::SpecialRequests, "Custom text"),
    ])
    .unwrap();
    let (config, records) = records(2, &overrides);
    let emitter = DocumentEmitter::builtin(header(&config)).unwrap();
    let page = emitter.render(&records[0]).unwrap();

    assert!(page.contains("# Shift 1 | Lunch"));
    assert!(page.contains("Harbour Bistro"));
    assert!(page.contains("06/01/2025 (Monday)"));
    assert!(page.contains("10:30 to 16:00 (5.5 h)"));
    assert!(page.contains("## Special requests"));
    assert!(page.contains("Custom text"));
    assert!(page.contains("| Time | Task | Equipment | Communication |"));
}

#[test]
fn file_names_carry_index_date_and_kind() {
    let (config, records) = records(2, &OverrideSet::new());
    let emitter = DocumentEmitter::builtin(header(&config)).unwrap();
    assert_eq!(emitter.file_name(&records[0]), "shift_01_2025-01-06_lunch.md");
    assert_eq!(emitter.file_name(&records[1]), "shift_02_2025-01-06_dinner.md");
}

#[test]
fn emit_all_writes_one_document_per_record() {
    let (config, records) = records(48, &OverrideSet::new());
    let emitter = DocumentEmitter::builtin(header(&config)).unwrap();
    let dir = tempdir().unwrap();
    let out = dir.path().join("nested").join("output");

    let report = emitter.emit_all(&records, &out).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.written.len(), 48);
    assert!(report.written[0].ends_with("shift_01_2025-01-06_lunch.md"));
    assert!(report.written[47].ends_with("shift_48_2025-01-29_dinner.md"));

    let check = verify_output(&report, 48);
    assert_eq!(check.found, 48);
    assert!(check.is_complete());
}

#[test]
fn failing_record_is_skipped_and_named() {
    let (config, records) = records(4, &OverrideSet::new());
    let template = "{% if shift_number == 2 %}{{ not_defined }}{% endif %}{{ establishment }}\n";
    let emitter = DocumentEmitter::new(template, "txt", header(&config)).unwrap();
    let dir = tempdir().unwrap();

    let report = emitter.emit_all(&records, dir.path()).unwrap();
    assert_eq!(report.written.len(), 3);
    assert_eq!(report.failed_shifts(), vec![2]);
    assert!(matches!(report.failures[0], LogbookError::RecordEmission { shift: 2, .. }));

    let summary = GenerationSummary::from_records(&records).with_emission(&report);
    assert_eq!(summary.succeeded_line(), "3 of 4 succeeded");
    assert!(summary.to_cli_summary().contains("skipped=2"));
    let check = verify_output(&report, 4);
    assert_eq!(check.found, 3);
    assert!(!check.is_complete());
}

#[test]
fn reused_output_dir_does_not_hide_failures() {
    let (config, records) = records(4, &OverrideSet::new());
    let dir = tempdir().unwrap();

    let builtin = DocumentEmitter::builtin(header(&config)).unwrap();
    let first = builtin.emit_all(&records, dir.path()).unwrap();
    assert!(verify_output(&first, 4).is_complete());

    let broken = DocumentEmitter::new("{{ not_defined }}\n", "md", header(&config)).unwrap();
    let second = broken.emit_all(&records, dir.path()).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.failed_shifts(), vec![1, 2, 3, 4]);

    let check = verify_output(&second, 4);
    assert_eq!(check.found, 0);
    assert!(!check.is_complete());
}

#[test]
fn template_syntax_error_fails_up_front() {
    let config = LogbookConfig::default();
    let err = DocumentEmitter::new("{% for row in %}", "md", header(&config)).err().unwrap();
    assert!(matches!(err, LogbookError::Template(_)));
}

#[test]
fn template_path_sets_source_and_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("page.html.j2");
    fs::write(&path, "<h1>{{ kind_title }} {{ text.debrief }}</h1>").unwrap();
    let (mut config, records) = records(1, &OverrideSet::new());
    config.template_path = Some(path);

    let emitter = DocumentEmitter::from_config(&config).unwrap();
    assert_eq!(emitter.extension(), "html");
    let page = emitter.render(&records[0]).unwrap();
    let debrief = records[0].field(NarrativeField::Debrief).unwrap().value();
    assert_eq!(page, format!("<h1>Lunch {debrief}</h1>"));
}

#[test]
fn missing_template_file_is_a_configuration_error() {
    let config = LogbookConfig {
        template_path: Some("/definitely/not/here.md.j2".into()),
        ..LogbookConfig::default()
    };
    assert!(matches!(
        DocumentEmitter::from_config(&config),
        Err(LogbookError::Configuration(_))
    ));
}

#[test]
fn output_extension_strips_template_suffix() {
    assert_eq!(output_extension(Path::new("logbook.md.j2")), "md");
    assert_eq!(output_extension(Path::new("logbook.html.jinja")), "html");
    assert_eq!(output_extension(Path::new("logbook.txt")), "txt");
    assert_eq!(output_extension(Path::new("logbook.j2")), "md");
}

#[test]
fn rendering_is_pure() {
    let (config, records) = records(3, &OverrideSet::new());
    let emitter = DocumentEmitter::builtin(header(&config)).unwrap();
    assert_eq!(emitter.render(&records[2]).unwrap(), emitter.render(&records[2]).unwrap());
}
