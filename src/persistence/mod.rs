use crate::config::LogbookConfig;
use crate::error::{LogbookError, LogbookResult};
use crate::record::ShiftRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An assembled run: enough to re-render every document without resampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookRun {
    pub config: LogbookConfig,
    pub records: Vec<ShiftRecord>,
}

impl LogbookRun {
    pub fn new(config: LogbookConfig, records: Vec<ShiftRecord>) -> Self {
        Self { config, records }
    }
}

pub trait LogbookStore {
    fn save_run(&self, run: &LogbookRun) -> LogbookResult<()>;
    fn load_run(&self) -> LogbookResult<Option<LogbookRun>>;
}

pub fn validate_records(records: &[ShiftRecord]) -> LogbookResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let shift = record.shift_number();
        if shift == 0 {
            return Err(LogbookError::invalid("record with shift number 0"));
        }
        if !seen.insert(shift) {
            return Err(LogbookError::invalid(format!("duplicate record for shift {shift}")));
        }
        if let Some(blank) = record
            .narrative
            .iter()
            .find(|resolved| resolved.value().trim().is_empty())
        {
            return Err(LogbookError::invalid(format!(
                "shift {shift} has an empty '{}' field",
                blank.field
            )));
        }
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod file;

pub use file::{
    load_config, load_overrides_csv, load_overrides_json, load_pools, save_overrides_json,
    write_input_template_csv,
};
