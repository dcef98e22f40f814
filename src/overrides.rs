use crate::error::{LogbookError, LogbookResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// The closed set of free-text logbook fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeField {
    #[serde(alias = "prepared_service")]
    PreparedForService,
    SpecialRequests,
    FoodDetails,
    #[serde(alias = "complaints_problems")]
    Complaints,
    #[serde(alias = "solutions_implemented")]
    Solutions,
    #[serde(alias = "debrief_learnings")]
    Debrief,
    #[serde(alias = "handover_completed")]
    Handover,
    CustomerFeedback,
}

impl NarrativeField {
    pub const ALL: [NarrativeField; 8] = [
        NarrativeField::PreparedForService,
        NarrativeField::SpecialRequests,
        NarrativeField::FoodDetails,
        NarrativeField::Complaints,
        NarrativeField::Solutions,
        NarrativeField::Debrief,
        NarrativeField::Handover,
        NarrativeField::CustomerFeedback,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            NarrativeField::PreparedForService => "prepared_for_service",
            NarrativeField::SpecialRequests => "special_requests",
            NarrativeField::FoodDetails => "food_details",
            NarrativeField::Complaints => "complaints",
            NarrativeField::Solutions => "solutions",
            NarrativeField::Debrief => "debrief",
            NarrativeField::Handover => "handover",
            NarrativeField::CustomerFeedback => "customer_feedback",
        }
    }

    /// Spellings accepted in tabular input besides `key()`.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            NarrativeField::PreparedForService => &["prepared_service"],
            NarrativeField::Complaints => &["complaints_problems"],
            NarrativeField::Solutions => &["solutions_implemented"],
            NarrativeField::Debrief => &["debrief_learnings"],
            NarrativeField::Handover => &["handover_completed"],
            _ => &[],
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key || field.aliases().contains(&key))
    }

    pub fn title(&self) -> &'static str {
        match self {
            NarrativeField::PreparedForService => "Prepared for service",
            NarrativeField::SpecialRequests => "Special requests",
            NarrativeField::FoodDetails => "Food details",
            NarrativeField::Complaints => "Customer issues/complaints",
            NarrativeField::Solutions => "Solutions implemented",
            NarrativeField::Debrief => "Debrief summary",
            NarrativeField::Handover => "Successful handover completed",
            NarrativeField::CustomerFeedback => "Customer feedback",
        }
    }
}

impl fmt::Display for NarrativeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Cells of the workflow table a human filled in; each may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOverride {
    #[serde(default, alias = "timeline", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication: Option<String>,
}

impl WorkflowOverride {
    pub fn is_empty(&self) -> bool {
        [&self.time, &self.task, &self.equipment, &self.communication]
            .into_iter()
            .all(|cell| non_blank(cell.as_deref()).is_none())
    }
}

/// Human-supplied values for one shift. Unknown keys in the input are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftOverride {
    pub shift_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub establishment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_style: Option<String>,
    #[serde(default, alias = "prepared_service", skip_serializing_if = "Option::is_none")]
    pub prepared_for_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_details: Option<String>,
    #[serde(default, alias = "complaints_problems", skip_serializing_if = "Option::is_none")]
    pub complaints: Option<String>,
    #[serde(default, alias = "solutions_implemented", skip_serializing_if = "Option::is_none")]
    pub solutions: Option<String>,
    #[serde(default, alias = "debrief_learnings", skip_serializing_if = "Option::is_none")]
    pub debrief: Option<String>,
    #[serde(default, alias = "handover_completed", skip_serializing_if = "Option::is_none")]
    pub handover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow: Vec<WorkflowOverride>,
}

impl ShiftOverride {
    pub fn new(shift_number: u32) -> Self {
        Self {
            shift_number,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: NarrativeField, value: impl Into<String>) -> Self {
        *self.slot_mut(field) = Some(value.into());
        self
    }

    /// The override text for `field`, or `None` when absent or blank.
    pub fn field(&self, field: NarrativeField) -> Option<&str> {
        let value = match field {
            NarrativeField::PreparedForService => &self.prepared_for_service,
            NarrativeField::SpecialRequests => &self.special_requests,
            NarrativeField::FoodDetails => &self.food_details,
            NarrativeField::Complaints => &self.complaints,
            NarrativeField::Solutions => &self.solutions,
            NarrativeField::Debrief => &self.debrief,
            NarrativeField::Handover => &self.handover,
            NarrativeField::CustomerFeedback => &self.customer_feedback,
        };
        non_blank(value.as_deref())
    }

    pub fn set_field(&mut self, field: NarrativeField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    fn slot_mut(&mut self, field: NarrativeField) -> &mut Option<String> {
        match field {
            NarrativeField::PreparedForService => &mut self.prepared_for_service,
            NarrativeField::SpecialRequests => &mut self.special_requests,
            NarrativeField::FoodDetails => &mut self.food_details,
            NarrativeField::Complaints => &mut self.complaints,
            NarrativeField::Solutions => &mut self.solutions,
            NarrativeField::Debrief => &mut self.debrief,
            NarrativeField::Handover => &mut self.handover,
            NarrativeField::CustomerFeedback => &mut self.customer_feedback,
        }
    }

    pub fn establishment(&self) -> Option<&str> {
        non_blank(self.establishment.as_deref())
    }

    pub fn menu_style(&self) -> Option<&str> {
        non_blank(self.menu_style.as_deref())
    }

    pub fn workflow_row(&self, row: usize) -> Option<&WorkflowOverride> {
        self.workflow.get(row)
    }

    /// Fills every value this override leaves blank from `base`.
    pub fn or_from(mut self, base: &ShiftOverride) -> Self {
        if self.establishment().is_none() {
            self.establishment = base.establishment.clone();
        }
        if self.menu_style().is_none() {
            self.menu_style = base.menu_style.clone();
        }
        for field in NarrativeField::ALL {
            if self.field(field).is_none() {
                self.set_field(field, base.field(field).map(str::to_string));
            }
        }
        let rows = self.workflow.len().max(base.workflow.len());
        self.workflow.resize_with(rows, WorkflowOverride::default);
        for (row, inherited) in self.workflow.iter_mut().zip(&base.workflow) {
            fill_blank(&mut row.time, &inherited.time);
            fill_blank(&mut row.task, &inherited.task);
            fill_blank(&mut row.equipment, &inherited.equipment);
            fill_blank(&mut row.communication, &inherited.communication);
        }
        self
    }

    /// True when no field, fixed or narrative, carries a usable value.
    pub fn is_empty(&self) -> bool {
        self.establishment().is_none()
            && self.menu_style().is_none()
            && NarrativeField::ALL.iter().all(|field| self.field(*field).is_none())
            && self.workflow.iter().all(WorkflowOverride::is_empty)
    }
}

fn fill_blank(cell: &mut Option<String>, inherited: &Option<String>) {
    if non_blank(cell.as_deref()).is_none() {
        cell.clone_from(inherited);
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Overrides keyed by shift index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    by_shift: BTreeMap<u32, ShiftOverride>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ShiftOverride>) -> LogbookResult<Self> {
        let mut by_shift = BTreeMap::new();
        for record in records {
            if record.shift_number == 0 {
                return Err(LogbookError::config("override shift_number must be 1 or greater"));
            }
            let shift = record.shift_number;
            if by_shift.insert(shift, record).is_some() {
                return Err(LogbookError::config(format!(
                    "duplicate override for shift {shift}"
                )));
            }
        }
        Ok(Self { by_shift })
    }

    /// Per-field layering: values in `self` win, blanks fall through to `base`.
    pub fn layered_over(self, base: &OverrideSet) -> Self {
        let mut by_shift = base.by_shift.clone();
        for (shift, record) in self.by_shift {
            let merged = match base.get(shift) {
                Some(inherited) => record.or_from(inherited),
                None => record,
            };
            by_shift.insert(shift, merged);
        }
        Self { by_shift }
    }

    pub fn get(&self, shift: u32) -> Option<&ShiftOverride> {
        self.by_shift.get(&shift)
    }

    pub fn len(&self) -> usize {
        self.by_shift.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_shift.is_empty()
    }

    pub fn shift_numbers(&self) -> Vec<u32> {
        self.by_shift.keys().copied().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &ShiftOverride> {
        self.by_shift.values()
    }

    /// Logs overrides that no scheduled slot will consume.
    pub fn warn_out_of_range(&self, total_shifts: u32) -> Vec<u32> {
        let unused: Vec<u32> = self
            .by_shift
            .keys()
            .copied()
            .filter(|shift| *shift > total_shifts)
            .collect();
        for shift in &unused {
            warn!(shift, total_shifts, "override ignored: shift is outside the schedule");
        }
        unused
    }
}
