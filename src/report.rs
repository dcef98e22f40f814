use crate::emitter::EmissionReport;
use crate::record::ShiftRecord;
use crate::scheduler::date_to_i32;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts for one run, derived from provenance flags and emission outcome only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub total_shifts: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub override_fields: usize,
    pub pooled_fields: usize,
    pub override_cells: usize,
    pub pooled_cells: usize,
    pub shifts_with_overrides: usize,
    pub emitted: usize,
    /// Shift numbers whose document could not be written, ascending.
    pub failed: Vec<u32>,
}

impl GenerationSummary {
    pub fn from_records(records: &[ShiftRecord]) -> Self {
        let mut summary = Self {
            total_shifts: records.len(),
            ..Self::default()
        };
        for record in records {
            *summary.by_kind.entry(record.slot.kind.clone()).or_default() += 1;
            summary.override_fields += record.override_field_count();
            summary.pooled_fields += record.pooled_field_count();
            for cell in record.workflow_cells() {
                if cell.provenance.is_override() {
                    summary.override_cells += 1;
                } else {
                    summary.pooled_cells += 1;
                }
            }
            if record.has_override() {
                summary.shifts_with_overrides += 1;
            }
        }
        summary
    }

    pub fn with_emission(mut self, emission: &EmissionReport) -> Self {
        self.emitted = emission.written.len();
        self.failed = emission.failed_shifts();
        self
    }

    pub fn kind_count(&self, kind: &str) -> usize {
        self.by_kind.get(kind).copied().unwrap_or(0)
    }

    pub fn succeeded_line(&self) -> String {
        format!("{} of {} succeeded", self.emitted, self.total_shifts)
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("shifts={}", self.total_shifts));
        for (kind, count) in &self.by_kind {
            parts.push(format!("{kind}={count}"));
        }
        parts.push(format!("custom_fields={}", self.override_fields));
        parts.push(format!("auto_fields={}", self.pooled_fields));
        if self.override_cells > 0 {
            parts.push(format!("custom_cells={}", self.override_cells));
        }
        parts.push(format!("auto_cells={}", self.pooled_cells));
        if self.shifts_with_overrides > 0 {
            parts.push(format!("customised_shifts={}", self.shifts_with_overrides));
        }
        if !self.failed.is_empty() {
            let skipped = self
                .failed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("skipped={skipped}"));
        }
        parts.join(", ")
    }
}

/// One row per record: where its content came from.
pub fn provenance_dataframe(records: &[ShiftRecord]) -> PolarsResult<DataFrame> {
    let shift: Vec<i32> = records.iter().map(|r| r.shift_number() as i32).collect();
    let dates: Vec<i32> = records.iter().map(|r| date_to_i32(r.slot.date)).collect();
    let kinds: Vec<&str> = records.iter().map(|r| r.slot.kind.as_str()).collect();
    let custom: Vec<i32> = records
        .iter()
        .map(|r| r.override_field_count() as i32)
        .collect();
    let auto: Vec<i32> = records
        .iter()
        .map(|r| r.pooled_field_count() as i32)
        .collect();
    let custom_cells: Vec<i32> = records
        .iter()
        .map(|r| {
            r.workflow_cells()
                .filter(|cell| cell.provenance.is_override())
                .count() as i32
        })
        .collect();

    let date_col = Series::new(PlSmallStr::from_static("date"), dates).cast(&DataType::Date)?;
    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("shift"), shift).into_column(),
        date_col.into_column(),
        Series::new(PlSmallStr::from_static("kind"), kinds).into_column(),
        Series::new(PlSmallStr::from_static("custom_fields"), custom).into_column(),
        Series::new(PlSmallStr::from_static("auto_fields"), auto).into_column(),
        Series::new(PlSmallStr::from_static("custom_cells"), custom_cells).into_column(),
    ])
}
