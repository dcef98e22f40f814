use crate::config::LogbookConfig;
use crate::error::{LogbookError, LogbookResult};
use crate::record::ShiftRecord;
use minijinja::{Environment, UndefinedBehavior};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const BUILTIN_TEMPLATE: &str = include_str!("../templates/logbook.md.j2");
const BUILTIN_EXTENSION: &str = "md";
const TEMPLATE_SUFFIXES: [&str; 3] = ["j2", "jinja", "jinja2"];

/// Logbook identity printed on every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentHeader {
    pub student_name: String,
    pub supervisor: String,
    pub course: String,
}

impl DocumentHeader {
    pub fn from_config(config: &LogbookConfig) -> Self {
        Self {
            student_name: config.student_name.clone(),
            supervisor: config.supervisor.clone(),
            course: config.course.clone(),
        }
    }
}

#[derive(Serialize)]
struct FieldView<'a> {
    key: &'static str,
    title: &'static str,
    value: &'a str,
    custom: bool,
}

#[derive(Serialize)]
struct RowView<'a> {
    time: &'a str,
    task: &'a str,
    equipment: &'a str,
    communication: &'a str,
}

#[derive(Serialize)]
struct DocumentView<'a> {
    #[serde(flatten)]
    header: &'a DocumentHeader,
    shift_number: u32,
    date: String,
    iso_date: String,
    weekday: String,
    kind: &'a str,
    kind_title: String,
    establishment: &'a str,
    menu_style: &'a str,
    start_time: &'a str,
    end_time: &'a str,
    hours: String,
    fields: Vec<FieldView<'a>>,
    text: BTreeMap<&'static str, &'a str>,
    workflow: Vec<RowView<'a>>,
}

/// Renders records into one document each. Holds no per-run state.
pub struct DocumentEmitter {
    env: Environment<'static>,
    source: String,
    extension: String,
    header: DocumentHeader,
}

/// Outcome of a batch emission, in shift order.
#[derive(Debug, Default)]
pub struct EmissionReport {
    pub written: Vec<PathBuf>,
    /// `RecordEmission` errors for every record that was skipped.
    pub failures: Vec<LogbookError>,
}

impl EmissionReport {
    pub fn failed_shifts(&self) -> Vec<u32> {
        self.failures
            .iter()
            .filter_map(|failure| match failure {
                LogbookError::RecordEmission { shift, .. } => Some(*shift),
                _ => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Documents of this run found on disk versus documents expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCheck {
    pub found: usize,
    pub expected: usize,
}

impl OutputCheck {
    pub fn is_complete(&self) -> bool {
        self.found == self.expected
    }
}

impl DocumentEmitter {
    /// Checks the template source up front so a syntax error fails the run, not every record.
    pub fn new(
        source: impl Into<String>,
        extension: impl Into<String>,
        header: DocumentHeader,
    ) -> LogbookResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        let source = source.into();
        check_syntax(&source)?;
        Ok(Self {
            env,
            source,
            extension: extension.into(),
            header,
        })
    }

    pub fn builtin(header: DocumentHeader) -> LogbookResult<Self> {
        Self::new(BUILTIN_TEMPLATE, BUILTIN_EXTENSION, header)
    }

    /// Uses `config.template_path` when set, the built-in Markdown template otherwise.
    pub fn from_config(config: &LogbookConfig) -> LogbookResult<Self> {
        let header = DocumentHeader::from_config(config);
        match &config.template_path {
            Some(path) => {
                let source = fs::read_to_string(path).map_err(|err| {
                    LogbookError::config(format!(
                        "cannot read template {}: {err}",
                        path.display()
                    ))
                })?;
                Self::new(source, output_extension(path), header)
            }
            None => Self::builtin(header),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_name(&self, record: &ShiftRecord) -> String {
        format!(
            "shift_{:02}_{}_{}.{}",
            record.shift_number(),
            record.slot.date.format("%Y-%m-%d"),
            record.slot.kind,
            self.extension
        )
    }

    pub fn render(&self, record: &ShiftRecord) -> LogbookResult<String> {
        let view = self.view(record);
        Ok(self.env.render_str(&self.source, &view)?)
    }

    /// Writes one document per record into `out_dir`, in parallel.
    /// A failing record is reported and skipped; the rest are still written.
    pub fn emit_all(&self, records: &[ShiftRecord], out_dir: &Path) -> LogbookResult<EmissionReport> {
        fs::create_dir_all(out_dir)?;

        let outcomes: Vec<LogbookResult<PathBuf>> = records
            .par_iter()
            .map(|record| {
                self.emit_one(record, out_dir)
                    .map_err(|err| LogbookError::RecordEmission {
                        shift: record.shift_number(),
                        message: err.to_string(),
                    })
            })
            .collect();

        let mut report = EmissionReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(path) => report.written.push(path),
                Err(err) => {
                    warn!(error = %err, "skipping record");
                    report.failures.push(err);
                }
            }
        }
        info!(
            written = report.written.len(),
            failed = report.failures.len(),
            dir = %out_dir.display(),
            "emitted logbook documents"
        );
        Ok(report)
    }

    fn emit_one(&self, record: &ShiftRecord, out_dir: &Path) -> LogbookResult<PathBuf> {
        let body = self.render(record)?;
        let path = out_dir.join(self.file_name(record));
        fs::write(&path, body)?;
        Ok(path)
    }

    fn view<'a>(&'a self, record: &'a ShiftRecord) -> DocumentView<'a> {
        let fields: Vec<FieldView<'a>> = record
            .narrative
            .iter()
            .map(|resolved| FieldView {
                key: resolved.field.key(),
                title: resolved.field.title(),
                value: resolved.value(),
                custom: resolved.provenance().is_override(),
            })
            .collect();
        let text = fields.iter().map(|field| (field.key, field.value)).collect();
        DocumentView {
            header: &self.header,
            shift_number: record.shift_number(),
            date: record.slot.date.format("%d/%m/%Y").to_string(),
            iso_date: record.slot.date.format("%Y-%m-%d").to_string(),
            weekday: record.slot.date.format("%A").to_string(),
            kind: &record.slot.kind,
            kind_title: title_case(&record.slot.kind),
            establishment: &record.establishment,
            menu_style: &record.menu_style,
            start_time: &record.timing.start_time,
            end_time: &record.timing.end_time,
            hours: record.timing.hours.to_string(),
            fields,
            text,
            workflow: record
                .workflow
                .iter()
                .map(|row| RowView {
                    time: &row.time.value,
                    task: &row.task.value,
                    equipment: &row.equipment.value,
                    communication: &row.communication.value,
                })
                .collect(),
        }
    }
}

/// `logbook.md.j2` -> `md`; falls back to `md` when nothing usable remains.
pub fn output_extension(template_path: &Path) -> String {
    let mut path = template_path.to_path_buf();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if TEMPLATE_SUFFIXES.contains(&ext.to_ascii_lowercase().as_str()) {
            path.set_extension("");
        }
    }
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| BUILTIN_EXTENSION.to_string())
}

/// Counts the documents this run wrote that are still on disk. Files left in
/// the directory by earlier runs are not counted.
pub fn verify_output(report: &EmissionReport, expected: usize) -> OutputCheck {
    let found = report.written.iter().filter(|path| path.is_file()).count();
    let check = OutputCheck { found, expected };
    if !check.is_complete() {
        warn!(found, expected, "documents on disk do not match the run");
    }
    check
}

fn check_syntax(source: &str) -> LogbookResult<()> {
    let env = Environment::new();
    env.template_from_str(source)?;
    Ok(())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
