use crate::error::{LogbookError, LogbookResult};
use crate::overrides::NarrativeField;
use crate::scheduler::{RotationRule, ShiftPattern};
use crate::selector::SelectionPolicy;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

const TIME_FORMAT: &str = "%H:%M";

/// Start/finish clock times for one shift kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftTiming {
    pub start_time: String,
    pub end_time: String,
    /// Paid hours; derived from the clock times when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
}

impl ShiftTiming {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
            hours: None,
        }
    }

    pub fn with_hours(mut self, hours: f64) -> Self {
        self.hours = Some(hours);
        self
    }

    pub fn hours(&self) -> LogbookResult<f64> {
        if let Some(hours) = self.hours {
            return Ok(hours);
        }
        let start = parse_time(&self.start_time)?;
        let end = parse_time(&self.end_time)?;
        let mut minutes = (end - start).num_minutes();
        if minutes < 0 {
            // finishes after midnight
            minutes += 24 * 60;
        }
        Ok(minutes as f64 / 60.0)
    }

    fn validate(&self, kind: &str) -> LogbookResult<()> {
        parse_time(&self.start_time)
            .and_then(|_| parse_time(&self.end_time))
            .map_err(|err| LogbookError::config(format!("shift kind '{kind}': {err}")))?;
        if let Some(hours) = self.hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(LogbookError::config(format!(
                    "shift kind '{kind}' has invalid hours {hours}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_time(input: &str) -> LogbookResult<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), TIME_FORMAT)
        .map_err(|e| LogbookError::config(format!("invalid time '{input}': {e}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub kinds: Vec<String>,
    pub slots_per_day: u32,
    pub rule: RotationRule,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            kinds: vec!["lunch".to_string(), "dinner".to_string()],
            slots_per_day: 2,
            rule: RotationRule::Alternate,
        }
    }
}

/// Categories feeding the workflow sub-table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Row count used when a kind has no canonical sequence.
    pub rows: usize,
    pub task_category: String,
    pub equipment_category: String,
    pub communication_category: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            rows: 8,
            task_category: "workflow_tasks".to_string(),
            equipment_category: "workflow_equipment".to_string(),
            communication_category: "workflow_communication".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookConfig {
    pub start_date: NaiveDate,
    pub total_shifts: u32,
    pub establishment: String,
    pub shifts: BTreeMap<String, ShiftTiming>,
    #[serde(default = "default_menu_style")]
    pub menu_style: String,
    #[serde(default = "default_student_name")]
    pub student_name: String,
    #[serde(default = "default_supervisor")]
    pub supervisor: String,
    #[serde(default = "default_course")]
    pub course: String,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub selection: SelectionPolicy,
    #[serde(default = "default_fields")]
    pub fields: Vec<NarrativeField>,
    #[serde(default = "default_field_categories")]
    pub field_categories: BTreeMap<NarrativeField, String>,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_menu_style() -> String {
    "à la carte".to_string()
}

fn default_student_name() -> String {
    "Student Name".to_string()
}

fn default_supervisor() -> String {
    "Supervisor Name".to_string()
}

fn default_course() -> String {
    "SIT40521 Certificate IV in Kitchen Management".to_string()
}

fn default_fields() -> Vec<NarrativeField> {
    NarrativeField::ALL.to_vec()
}

fn default_field_categories() -> BTreeMap<NarrativeField, String> {
    NarrativeField::ALL
        .iter()
        .map(|field| (*field, field.key().to_string()))
        .collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for LogbookConfig {
    fn default() -> Self {
        let shifts = BTreeMap::from([
            (
                "lunch".to_string(),
                ShiftTiming::new("10:30", "16:00").with_hours(5.5),
            ),
            (
                "dinner".to_string(),
                ShiftTiming::new("16:00", "22:30").with_hours(6.5),
            ),
        ]);
        Self {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap_or_default(),
            total_shifts: 48,
            establishment: "Restaurant Name".to_string(),
            shifts,
            menu_style: default_menu_style(),
            student_name: default_student_name(),
            supervisor: default_supervisor(),
            course: default_course(),
            rotation: RotationConfig::default(),
            selection: SelectionPolicy::default(),
            fields: default_fields(),
            field_categories: default_field_categories(),
            workflow: WorkflowConfig::default(),
            output_dir: default_output_dir(),
            template_path: None,
            seed: None,
        }
    }
}

impl LogbookConfig {
    pub fn pattern(&self) -> ShiftPattern {
        ShiftPattern {
            kinds: self.rotation.kinds.clone(),
            slots_per_day: self.rotation.slots_per_day,
            rotation: self.rotation.rule,
        }
    }

    pub fn timing(&self, kind: &str) -> LogbookResult<&ShiftTiming> {
        self.shifts
            .get(kind)
            .ok_or_else(|| LogbookError::config(format!("no timing configured for shift kind '{kind}'")))
    }

    pub fn category_for(&self, field: NarrativeField) -> Option<&str> {
        self.field_categories.get(&field).map(String::as_str)
    }

    /// Checks everything that would otherwise fail identically for every record.
    pub fn validate(&self) -> LogbookResult<()> {
        self.pattern().validate()?;
        for kind in &self.rotation.kinds {
            self.timing(kind)?.validate(kind)?;
        }
        self.selection.validate()?;
        if self.establishment.trim().is_empty() {
            return Err(LogbookError::config("establishment must not be empty"));
        }
        let mut seen = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if seen.contains(field) {
                return Err(LogbookError::config(format!(
                    "field '{}' listed more than once",
                    field.key()
                )));
            }
            seen.push(*field);
        }
        Ok(())
    }
}
