use crate::config::LogbookConfig;
use crate::error::{LogbookError, LogbookResult};
use crate::overrides::{NarrativeField, OverrideSet, ShiftOverride, WorkflowOverride, non_blank};
use crate::pool::ContentPools;
use crate::scheduler::ShiftSlot;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reads and validates the run configuration; a missing file yields the built-in default.
pub fn load_config<P: AsRef<Path>>(path: P) -> LogbookResult<LogbookConfig> {
    let path = path.as_ref();
    let config = match read_json::<LogbookConfig>(path)? {
        Some(config) => config,
        None => {
            warn!(path = %path.display(), "config file not found, using built-in defaults");
            LogbookConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Reads content pools; a missing file yields `ContentPools::builtin()`.
pub fn load_pools<P: AsRef<Path>>(path: P) -> LogbookResult<ContentPools> {
    let path = path.as_ref();
    match read_json::<ContentPools>(path)? {
        Some(pools) if pools.is_empty() => Err(LogbookError::config(format!(
            "{}: no content pools defined",
            path.display()
        ))),
        Some(pools) => {
            debug!(
                path = %path.display(),
                categories = pools.categories.len(),
                kinds = pools.by_kind.len(),
                workflows = pools.workflows.len(),
                "loaded content pools"
            );
            Ok(pools)
        }
        None => {
            warn!(path = %path.display(), "content pool file not found, using built-in pools");
            Ok(ContentPools::builtin())
        }
    }
}

/// `Ok(None)` when the file does not exist; the caller decides whether that is acceptable.
pub fn load_overrides_json<P: AsRef<Path>>(path: P) -> LogbookResult<Option<OverrideSet>> {
    let path = path.as_ref();
    let Some(records) = read_json::<Vec<ShiftOverride>>(path)? else {
        return Ok(None);
    };
    let set = OverrideSet::from_records(records)?;
    info!(path = %path.display(), shifts = set.len(), "loaded custom shift data");
    Ok(Some(set))
}

pub fn save_overrides_json<P: AsRef<Path>>(overrides: &OverrideSet, path: P) -> LogbookResult<()> {
    let records: Vec<&ShiftOverride> = overrides.records().collect();
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &records)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> LogbookResult<Option<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    serde_json::from_reader(BufReader::new(file))
        .map(Some)
        .map_err(|err| LogbookError::config(format!("{}: {err}", path.display())))
}

/// Column roles recognised in a tabular input sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    ShiftNumber,
    Establishment,
    MenuStyle,
    Narrative(NarrativeField),
    Workflow { row: usize, cell: WorkflowCell },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkflowCell {
    Time,
    Task,
    Equipment,
    Communication,
}

impl Column {
    fn from_header(header: &str) -> Self {
        let header = header.trim().to_ascii_lowercase();
        match header.as_str() {
            "shift_number" => return Column::ShiftNumber,
            "establishment" => return Column::Establishment,
            "menu_style" => return Column::MenuStyle,
            _ => {}
        }
        if let Some(field) = NarrativeField::from_key(&header) {
            return Column::Narrative(field);
        }
        parse_workflow_header(&header).unwrap_or(Column::Ignored)
    }
}

/// `workflow_task_3` -> row 2, task cell.
fn parse_workflow_header(header: &str) -> Option<Column> {
    let rest = header.strip_prefix("workflow_")?;
    let (name, number) = rest.rsplit_once('_')?;
    let number: usize = number.parse().ok().filter(|n| *n >= 1)?;
    let cell = match name {
        "time" | "timeline" => WorkflowCell::Time,
        "task" => WorkflowCell::Task,
        "equipment" => WorkflowCell::Equipment,
        "communication" => WorkflowCell::Communication,
        _ => return None,
    };
    Some(Column::Workflow {
        row: number - 1,
        cell,
    })
}

/// Whitespace-only cells are blank; anything else is kept exactly as written.
fn parse_string_option(input: &str) -> Option<String> {
    non_blank(Some(input)).map(str::to_string)
}

/// Imports a filled-in input sheet. Blank cells mean "no override"; rows with
/// nothing filled in are dropped.
pub fn load_overrides_csv<P: AsRef<Path>>(path: P) -> LogbookResult<OverrideSet> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(File::open(path)?);
    let columns: Vec<Column> = reader.headers()?.iter().map(Column::from_header).collect();
    if !columns.contains(&Column::ShiftNumber) {
        return Err(LogbookError::invalid(format!(
            "{}: missing shift_number column",
            path.display()
        )));
    }

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let mut record = ShiftOverride::default();
        let mut shift_number = None;
        for (column, value) in columns.iter().zip(row.iter()) {
            let value = parse_string_option(value);
            match column {
                Column::ShiftNumber => {
                    shift_number = value
                        .map(|v| parse_shift_number(&v, line + 2))
                        .transpose()?;
                }
                Column::Establishment => record.establishment = value,
                Column::MenuStyle => record.menu_style = value,
                Column::Narrative(field) => record.set_field(*field, value),
                Column::Workflow { row, cell } => {
                    if value.is_some() {
                        set_workflow_cell(&mut record.workflow, *row, *cell, value);
                    }
                }
                Column::Ignored => {}
            }
        }
        let Some(shift_number) = shift_number else {
            debug!(line = line + 2, "skipping row without shift_number");
            continue;
        };
        record.shift_number = shift_number;
        if record.is_empty() {
            debug!(shift = shift_number, "skipping row with no custom values");
            continue;
        }
        records.push(record);
    }

    let set = OverrideSet::from_records(records)?;
    info!(path = %path.display(), shifts = set.len(), "imported custom shift data from csv");
    Ok(set)
}

fn parse_shift_number(input: &str, line: usize) -> LogbookResult<u32> {
    // spreadsheets often export whole numbers as "3.0"
    let trimmed = input.trim().trim_end_matches(".0");
    trimmed.parse::<u32>().map_err(|e| {
        LogbookError::invalid(format!("line {line}: invalid shift_number '{input}': {e}"))
    })
}

fn set_workflow_cell(
    rows: &mut Vec<WorkflowOverride>,
    row: usize,
    cell: WorkflowCell,
    value: Option<String>,
) {
    if rows.len() <= row {
        rows.resize_with(row + 1, WorkflowOverride::default);
    }
    let target = &mut rows[row];
    match cell {
        WorkflowCell::Time => target.time = value,
        WorkflowCell::Task => target.task = value,
        WorkflowCell::Equipment => target.equipment = value,
        WorkflowCell::Communication => target.communication = value,
    }
}

/// Writes a sheet with one row per scheduled shift and empty columns to fill in.
pub fn write_input_template_csv<P: AsRef<Path>>(
    config: &LogbookConfig,
    slots: &[ShiftSlot],
    path: P,
) -> LogbookResult<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    let mut header = vec![
        "shift_number",
        "date",
        "shift_type",
        "start_time",
        "end_time",
        "establishment",
        "menu_style",
    ];
    header.extend(config.fields.iter().map(NarrativeField::key));
    writer.write_record(&header)?;

    let blanks = 2 + config.fields.len();
    for slot in slots {
        let timing = config.timing(&slot.kind)?;
        let mut row = vec![
            slot.index.to_string(),
            slot.date.format("%d/%m/%Y").to_string(),
            slot.kind.clone(),
            timing.start_time.clone(),
            timing.end_time.clone(),
        ];
        row.extend(std::iter::repeat_n(String::new(), blanks));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
