use crate::config::LogbookConfig;
use crate::error::{LogbookError, LogbookResult};
use crate::overrides::{NarrativeField, OverrideSet, ShiftOverride, non_blank};
use crate::pool::{ContentPools, WorkflowStep};
use crate::record::{RecordTiming, ResolvedField, ResolvedValue, ShiftRecord, WorkflowRow};
use crate::scheduler::ShiftSlot;
use crate::selector::{UsageHistory, VarietySelector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Drives one generation run. Owns the usage history, so records must be
/// assembled in shift order by a single assembler.
pub struct RecordAssembler<'a, R: Rng> {
    config: &'a LogbookConfig,
    pools: &'a ContentPools,
    selector: VarietySelector,
    history: UsageHistory,
    rng: R,
}

impl<'a> RecordAssembler<'a, StdRng> {
    /// Seeds from `config.seed` when set, otherwise from OS entropy.
    pub fn from_config(config: &'a LogbookConfig, pools: &'a ContentPools) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, pools, rng)
    }
}

impl<'a, R: Rng> RecordAssembler<'a, R> {
    pub fn new(config: &'a LogbookConfig, pools: &'a ContentPools, rng: R) -> Self {
        Self {
            config,
            pools,
            selector: VarietySelector::new(config.selection),
            history: UsageHistory::new(),
            rng,
        }
    }

    pub fn history(&self) -> &UsageHistory {
        &self.history
    }

    pub fn assemble(
        &mut self,
        slot: &ShiftSlot,
        overrides: &OverrideSet,
    ) -> LogbookResult<ShiftRecord> {
        let config = self.config;
        let shift_override = overrides.get(slot.index);

        let timing = config.timing(&slot.kind)?;
        let timing = RecordTiming {
            start_time: timing.start_time.clone(),
            end_time: timing.end_time.clone(),
            hours: timing.hours()?,
        };

        let mut narrative = Vec::with_capacity(config.fields.len());
        for field in &config.fields {
            let resolved = self.resolve_field(slot, *field, shift_override)?;
            narrative.push(ResolvedField {
                field: *field,
                resolved,
            });
        }

        let workflow = self.resolve_workflow(slot, shift_override)?;

        let record = ShiftRecord {
            slot: slot.clone(),
            establishment: shift_override
                .and_then(ShiftOverride::establishment)
                .unwrap_or(&config.establishment)
                .to_string(),
            menu_style: shift_override
                .and_then(ShiftOverride::menu_style)
                .unwrap_or(&config.menu_style)
                .to_string(),
            timing,
            narrative,
            workflow,
        };
        debug!(
            shift = slot.index,
            kind = %slot.kind,
            overridden = record.override_field_count(),
            pooled = record.pooled_field_count(),
            "assembled record"
        );
        Ok(record)
    }

    /// Assembles every slot in order; the first error aborts the run.
    pub fn assemble_all(
        &mut self,
        slots: &[ShiftSlot],
        overrides: &OverrideSet,
    ) -> LogbookResult<Vec<ShiftRecord>> {
        let records = slots
            .iter()
            .map(|slot| self.assemble(slot, overrides))
            .collect::<LogbookResult<Vec<_>>>()?;
        info!(
            records = records.len(),
            with_overrides = records.iter().filter(|r| r.has_override()).count(),
            "assembled shift records"
        );
        Ok(records)
    }

    fn resolve_field(
        &mut self,
        slot: &ShiftSlot,
        field: NarrativeField,
        shift_override: Option<&ShiftOverride>,
    ) -> LogbookResult<ResolvedValue> {
        if let Some(text) = shift_override.and_then(|o| o.field(field)) {
            return Ok(ResolvedValue::overridden(text));
        }
        let config = self.config;
        let category = config
            .category_for(field)
            .ok_or_else(|| LogbookError::MissingField {
                shift: slot.index,
                field: field.key().to_string(),
            })?;
        self.sample(category, &slot.kind).map(ResolvedValue::pooled)
    }

    fn resolve_workflow(
        &mut self,
        slot: &ShiftSlot,
        shift_override: Option<&ShiftOverride>,
    ) -> LogbookResult<Vec<WorkflowRow>> {
        let config = self.config;
        let pools = self.pools;
        let canonical = pools.workflow(&slot.kind);
        let base_rows = canonical.map_or(config.workflow.rows, <[WorkflowStep]>::len);
        let override_rows = shift_override.map_or(0, |o| o.workflow.len());
        let rows = base_rows.max(override_rows);

        let mut table = Vec::with_capacity(rows);
        for row in 0..rows {
            let cells = shift_override.and_then(|o| o.workflow_row(row));
            let step = canonical.and_then(|steps| steps.get(row));

            let time = match first_of(
                cells.and_then(|c| c.time.as_deref()),
                step.map(|s| s.time.as_str()),
            ) {
                Some(resolved) => resolved,
                None => pools
                    .timeline_slot(&slot.kind, row)
                    .map(ResolvedValue::pooled)
                    .ok_or_else(|| LogbookError::MissingField {
                        shift: slot.index,
                        field: format!("workflow[{}].time", row + 1),
                    })?,
            };
            let task = self.resolve_cell(
                slot,
                cells.and_then(|c| c.task.as_deref()),
                step.map(|s| s.task.as_str()),
                &config.workflow.task_category,
            )?;
            let equipment = self.resolve_cell(
                slot,
                cells.and_then(|c| c.equipment.as_deref()),
                step.map(|s| s.equipment.as_str()),
                &config.workflow.equipment_category,
            )?;
            let communication = self.resolve_cell(
                slot,
                cells.and_then(|c| c.communication.as_deref()),
                step.map(|s| s.communication.as_str()),
                &config.workflow.communication_category,
            )?;

            table.push(WorkflowRow {
                time,
                task,
                equipment,
                communication,
            });
        }
        Ok(table)
    }

    fn resolve_cell(
        &mut self,
        slot: &ShiftSlot,
        cell_override: Option<&str>,
        canonical: Option<&str>,
        category: &str,
    ) -> LogbookResult<ResolvedValue> {
        match first_of(cell_override, canonical) {
            Some(resolved) => Ok(resolved),
            None => self.sample(category, &slot.kind).map(ResolvedValue::pooled),
        }
    }

    fn sample(&mut self, category: &str, kind: &str) -> LogbookResult<String> {
        self.selector
            .select_from(self.pools, category, kind, &mut self.history, &mut self.rng)
    }
}

/// Override first, then the canonical per-kind value; blank counts as absent.
fn first_of(cell_override: Option<&str>, canonical: Option<&str>) -> Option<ResolvedValue> {
    if let Some(text) = non_blank(cell_override) {
        return Some(ResolvedValue::overridden(text));
    }
    non_blank(canonical).map(ResolvedValue::pooled)
}

/// Validates `config`, lays out its schedule and assembles every record.
pub fn assemble_run(
    config: &LogbookConfig,
    pools: &ContentPools,
    overrides: &OverrideSet,
) -> LogbookResult<Vec<ShiftRecord>> {
    config.validate()?;
    let slots = crate::scheduler::schedule(config.start_date, config.total_shifts, &config.pattern())?;
    overrides.warn_out_of_range(config.total_shifts);
    RecordAssembler::from_config(config, pools).assemble_all(&slots, overrides)
}
