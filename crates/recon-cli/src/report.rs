//! JSON run reports written with `--report`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use recon_core::TaskOutcome;
use recon_model::ReconError;

/// Result of running one task file.
#[derive(Debug)]
pub struct TaskRun {
    pub task_file: PathBuf,
    /// Task name, once the file parsed.
    pub name: Option<String>,
    pub result: std::result::Result<TaskOutcome, ReconError>,
}

impl TaskRun {
    pub fn failed(&self) -> bool {
        self.result.is_err()
    }

    /// Task name, or the file stem when the file never parsed.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.task_file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.task_file.display().to_string())
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Ok,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct ReportedError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TaskEntry<'a> {
    pub task: String,
    pub task_file: &'a Path,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'a TaskOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportedError>,
}

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub generated_at: String,
    pub succeeded: usize,
    pub failed: usize,
    pub tasks: Vec<TaskEntry<'a>>,
}

impl<'a> RunReport<'a> {
    pub fn new(generated_at: DateTime<Utc>, runs: &'a [TaskRun]) -> Self {
        let tasks: Vec<TaskEntry<'a>> = runs
            .iter()
            .map(|run| match &run.result {
                Ok(outcome) => TaskEntry {
                    task: run.label(),
                    task_file: &run.task_file,
                    status: TaskStatus::Ok,
                    outcome: Some(outcome),
                    error: None,
                },
                Err(error) => TaskEntry {
                    task: run.label(),
                    task_file: &run.task_file,
                    status: TaskStatus::Failed,
                    outcome: None,
                    error: Some(ReportedError {
                        kind: error.kind(),
                        message: error.to_string(),
                    }),
                },
            })
            .collect();
        let failed = runs.iter().filter(|run| run.failed()).count();
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            succeeded: runs.len() - failed,
            failed,
            tasks,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize run report")
    }
}

pub fn write_report(path: &Path, report: &RunReport<'_>) -> Result<()> {
    let json = report.to_json()?;
    fs::write(path, json + "\n")
        .with_context(|| format!("write run report: {}", path.display()))
}
