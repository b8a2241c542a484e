use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use recon_ingest::{delimiter_byte, load_mapping, load_table, write_table};
use recon_model::{Mapping, RecodeMap, ReconError, Result, Table};
use recon_transform::{
    delete_column, enrich_column, insert_column, recode_column, recode_column_into, rename_column,
    rewrite_column, set_column,
};

use crate::hash::file_sha256;
use crate::task::{Step, TaskConfig};

/// Number of unused mapping keys quoted in a warning.
const UNUSED_KEY_PREVIEW: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run every step but write nothing.
    pub dry_run: bool,
    /// Write here instead of the task's configured output.
    pub output_override: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigest {
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub op: &'static str,
    pub column: String,
    pub changed: usize,
    pub skipped: usize,
    pub misses: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unused_keys: Vec<String>,
}

impl StepReport {
    fn new(step: &Step) -> Self {
        Self {
            op: step.op(),
            column: step.column().to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub name: String,
    pub input: PathBuf,
    /// `None` for dry runs.
    pub output: Option<PathBuf>,
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_out: usize,
    pub inputs: Vec<InputDigest>,
    pub steps: Vec<StepReport>,
}

impl TaskOutcome {
    pub fn rows_changed(&self) -> usize {
        self.steps.iter().map(|step| step.changed).sum()
    }
}

fn digest(path: &Path) -> Result<InputDigest> {
    Ok(InputDigest {
        path: path.to_path_buf(),
        sha256: file_sha256(path)?,
    })
}

/// Runs a task end to end.
///
/// The table and every mapping are loaded up front, steps are applied in
/// order to the in-memory table, and the output is written only after the
/// last step succeeded. Any error leaves the output path untouched.
pub fn run_task(config: &TaskConfig, options: &RunOptions) -> Result<TaskOutcome> {
    let span = info_span!("task", task = %config.name());
    let _guard = span.enter();

    let delimiter = delimiter_byte(config.task.delimiter)?;
    let mut inputs = vec![digest(&config.task.input)?];
    let mut table = load_table(&config.task.input, delimiter)?;
    let rows_in = table.height();
    info!(
        input = %config.task.input.display(),
        rows = rows_in,
        columns = table.width(),
        "loaded metadata table"
    );

    let mut mappings = BTreeMap::new();
    for (name, source) in &config.mappings {
        inputs.push(digest(&source.path)?);
        let mapping = load_mapping(&source.path, name, &source.layout)?;
        debug!(mapping = %name, keys = mapping.len(), "mapping ready");
        mappings.insert(name.as_str(), mapping);
    }

    let mut steps = Vec::with_capacity(config.steps.len());
    for (idx, step) in config.steps.iter().enumerate() {
        let report = apply_step(&mut table, step, &mappings)?;
        debug!(
            step = idx + 1,
            op = report.op,
            column = %report.column,
            changed = report.changed,
            "applied step"
        );
        steps.push(report);
    }

    let output = if options.dry_run {
        info!("dry run; output not written");
        None
    } else {
        let path = options
            .output_override
            .clone()
            .unwrap_or_else(|| config.task.output.clone());
        write_table(&table, &path, delimiter)?;
        info!(output = %path.display(), rows = table.height(), "wrote output");
        Some(path)
    };

    Ok(TaskOutcome {
        name: config.name().to_string(),
        input: config.task.input.clone(),
        output,
        rows_in,
        rows_out: table.height(),
        columns_out: table.width(),
        inputs,
        steps,
    })
}

fn apply_step(
    table: &mut Table,
    step: &Step,
    mappings: &BTreeMap<&str, Mapping>,
) -> Result<StepReport> {
    let mut report = StepReport::new(step);
    match step {
        Step::Enrich {
            key_column,
            mapping,
            target,
            on_miss,
            when,
        } => {
            let Some(mapping) = mappings.get(mapping.as_str()) else {
                return Err(ReconError::config(format!("undefined mapping '{mapping}'")));
            };
            let stats = enrich_column(table, key_column, mapping, target, on_miss, when)?;
            if !stats.unused_keys.is_empty() {
                let preview: Vec<&str> = stats
                    .unused_keys
                    .iter()
                    .take(UNUSED_KEY_PREVIEW)
                    .map(String::as_str)
                    .collect();
                warn!(
                    mapping = mapping.name(),
                    unused = stats.unused_keys.len(),
                    keys = ?preview,
                    "mapping keys not referenced by any row"
                );
            }
            report.changed = stats.changed;
            report.skipped = stats.skipped;
            report.misses = stats.misses;
            report.unused_keys = stats.unused_keys;
        }
        Step::Recode {
            column,
            map,
            on_unmapped,
            into,
        } => {
            let recode = RecodeMap::new(map.clone(), on_unmapped.clone());
            report.changed = match into {
                Some(into) => recode_column_into(table, column, &recode, into)?,
                None => recode_column(table, column, &recode)?,
            };
        }
        Step::Rewrite {
            column,
            rule,
            guard,
        } => {
            let stats = rewrite_column(table, column, rule, guard)?;
            report.changed = stats.changed;
            report.skipped = stats.skipped;
        }
        Step::Insert {
            column,
            position,
            source,
        } => {
            insert_column(table, column, *position, source)?;
            report.changed = table.height();
        }
        Step::Set { column, source } => {
            report.changed = set_column(table, column, source)?;
        }
        Step::Delete { column } => delete_column(table, column)?,
        Step::Rename { from, to } => rename_column(table, from, to)?,
    }
    Ok(report)
}

/// Checks a task without reading its inputs: the configuration must be
/// valid and every input file must exist.
pub fn check_task(config: &TaskConfig) -> Result<()> {
    config.validate()?;
    for path in config.input_paths() {
        let metadata = fs::metadata(path).map_err(|err| ReconError::io(path, err))?;
        if !metadata.is_file() {
            return Err(ReconError::config(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Lists the task files (`*.toml`) in `dir`, sorted by file name.
pub fn discover_tasks(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| ReconError::io(dir, err))?;
    let mut tasks = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ReconError::io(dir, err))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            tasks.push(path);
        }
    }
    tasks.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(tasks)
}
