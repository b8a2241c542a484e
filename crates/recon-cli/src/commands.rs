use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{error, info};

use recon_cli::report::TaskRun;
use recon_core::{RunOptions, check_task, discover_tasks, load_task, run_task};
use recon_model::ReconError;

use crate::cli::{BatchArgs, CheckArgs, RunArgs};

/// Result of checking one task file.
pub struct TaskCheck {
    pub task_file: PathBuf,
    pub name: Option<String>,
    pub inputs: usize,
    pub result: std::result::Result<(), ReconError>,
}

fn execute(task_file: &Path, options: &RunOptions) -> TaskRun {
    let config = match load_task(task_file) {
        Ok(config) => config,
        Err(err) => {
            error!(task_file = %task_file.display(), error = %err, "task file rejected");
            return TaskRun {
                task_file: task_file.to_path_buf(),
                name: None,
                result: Err(err),
            };
        }
    };
    let result = run_task(&config, options);
    match &result {
        Ok(outcome) => info!(
            task = %config.name(),
            rows = outcome.rows_out,
            changed = outcome.rows_changed(),
            "task complete"
        ),
        Err(err) => error!(task = %config.name(), error = %err, "task failed"),
    }
    TaskRun {
        task_file: task_file.to_path_buf(),
        name: Some(config.name().to_string()),
        result,
    }
}

pub fn run_single(args: &RunArgs) -> Vec<TaskRun> {
    let options = RunOptions {
        dry_run: args.dry_run,
        output_override: args.output.clone(),
    };
    vec![execute(&args.task, &options)]
}

/// Runs every task in the directory; a failed task does not stop the rest.
pub fn run_batch(args: &BatchArgs) -> Result<Vec<TaskRun>> {
    let tasks = discover_tasks(&args.dir)
        .with_context(|| format!("list task files: {}", args.dir.display()))?;
    if tasks.is_empty() {
        bail!("no task files (*.toml) in {}", args.dir.display());
    }
    info!(dir = %args.dir.display(), tasks = tasks.len(), "running batch");
    let options = RunOptions {
        dry_run: args.dry_run,
        output_override: None,
    };
    Ok(tasks.iter().map(|task| execute(task, &options)).collect())
}

pub fn run_checks(args: &CheckArgs) -> Vec<TaskCheck> {
    args.tasks
        .iter()
        .map(|task_file| match load_task(task_file) {
            Ok(config) => TaskCheck {
                task_file: task_file.clone(),
                name: Some(config.name().to_string()),
                inputs: config.input_paths().len(),
                result: check_task(&config),
            },
            Err(err) => TaskCheck {
                task_file: task_file.clone(),
                name: None,
                inputs: 0,
                result: Err(err),
            },
        })
        .collect()
}
