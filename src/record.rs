use crate::overrides::NarrativeField;
use crate::scheduler::ShiftSlot;
use serde::{Deserialize, Serialize};

/// Which branch resolved a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    OverrideApplied,
    PoolSampled,
}

impl Provenance {
    pub fn is_override(&self) -> bool {
        matches!(self, Provenance::OverrideApplied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub value: String,
    pub provenance: Provenance,
}

impl ResolvedValue {
    pub fn overridden(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            provenance: Provenance::OverrideApplied,
        }
    }

    pub fn pooled(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            provenance: Provenance::PoolSampled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub field: NarrativeField,
    #[serde(flatten)]
    pub resolved: ResolvedValue,
}

impl ResolvedField {
    pub fn value(&self) -> &str {
        &self.resolved.value
    }

    pub fn provenance(&self) -> Provenance {
        self.resolved.provenance
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRow {
    pub time: ResolvedValue,
    pub task: ResolvedValue,
    pub equipment: ResolvedValue,
    pub communication: ResolvedValue,
}

impl WorkflowRow {
    pub fn cells(&self) -> [&ResolvedValue; 4] {
        [&self.time, &self.task, &self.equipment, &self.communication]
    }
}

/// Timing copied from the shift kind's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTiming {
    pub start_time: String,
    pub end_time: String,
    pub hours: f64,
}

/// Everything one logbook page needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub slot: ShiftSlot,
    pub establishment: String,
    pub menu_style: String,
    pub timing: RecordTiming,
    pub narrative: Vec<ResolvedField>,
    pub workflow: Vec<WorkflowRow>,
}

impl ShiftRecord {
    pub fn shift_number(&self) -> u32 {
        self.slot.index
    }

    pub fn field(&self, field: NarrativeField) -> Option<&ResolvedField> {
        self.narrative.iter().find(|resolved| resolved.field == field)
    }

    pub fn override_field_count(&self) -> usize {
        self.narrative
            .iter()
            .filter(|resolved| resolved.provenance().is_override())
            .count()
    }

    pub fn pooled_field_count(&self) -> usize {
        self.narrative.len() - self.override_field_count()
    }

    pub fn workflow_cells(&self) -> impl Iterator<Item = &ResolvedValue> {
        self.workflow.iter().flat_map(|row| row.cells())
    }

    pub fn has_override(&self) -> bool {
        self.override_field_count() > 0
            || self.workflow_cells().any(|cell| cell.provenance.is_override())
    }
}
