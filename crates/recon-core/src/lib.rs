//! Declarative reconciliation tasks.
//!
//! A task file names one metadata table, the auxiliary mappings it is
//! enriched from and an ordered list of steps. [`run_task`] applies them and
//! writes the corrected table only when every step succeeded.

pub mod hash;
pub mod pipeline;
pub mod task;

pub use hash::{file_sha256, sha256_hex};
pub use pipeline::{
    InputDigest, RunOptions, StepReport, TaskOutcome, check_task, discover_tasks, run_task,
};
pub use task::{MappingSource, Step, TaskConfig, TaskFile, TaskSection, load_task, parse_task};
