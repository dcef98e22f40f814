pub mod assembler;
pub mod config;
pub mod emitter;
pub mod error;
pub mod logging;
pub mod overrides;
pub mod persistence;
pub mod pool;
pub mod record;
pub mod report;
pub mod scheduler;
pub mod selector;

pub use assembler::{RecordAssembler, assemble_run};
pub use config::{LogbookConfig, RotationConfig, ShiftTiming, WorkflowConfig};
pub use emitter::{DocumentEmitter, DocumentHeader, EmissionReport, OutputCheck, verify_output};
pub use error::{LogbookError, LogbookResult};
pub use overrides::{NarrativeField, OverrideSet, ShiftOverride, WorkflowOverride};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteLogbookStore;
pub use persistence::{
    LogbookRun, LogbookStore, load_config, load_overrides_csv, load_overrides_json, load_pools,
    save_overrides_json, validate_records, write_input_template_csv,
};
pub use pool::{ContentPools, WorkflowStep};
pub use record::{Provenance, ResolvedField, ResolvedValue, ShiftRecord, WorkflowRow};
pub use report::{GenerationSummary, provenance_dataframe};
pub use scheduler::{RotationRule, ShiftPattern, ShiftSlot, schedule, slots_to_dataframe};
pub use selector::{SelectionPolicy, UsageHistory, VarietySelector};
