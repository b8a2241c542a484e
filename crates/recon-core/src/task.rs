//! Task files: one TOML document per dataset naming its input table, its
//! auxiliary mappings and the ordered steps that reconcile them.
//!
//! ```toml
//! [task]
//! name = "HMP_2012"
//! input = "HMP_2012_metadata.txt"
//! output = "HMP_2012_metadata.txt"
//!
//! [[steps]]
//! op = "rewrite"
//! column = "subjectID"
//! rule = { kind = "prefix", value = "HMP_2012_" }
//! guard = "skip_applied"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use recon_ingest::delimiter_byte;
use recon_model::{
    ColumnSource, EnrichCondition, IdentifierRule, MappingLayout, MissPolicy, RecodeInto,
    ReconError, Result, RewriteGuard,
};
use recon_transform::{identifier::is_detectable, validate_rule};

fn default_delimiter() -> char {
    '\t'
}

fn fail_policy() -> MissPolicy {
    MissPolicy::Fail
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskFile {
    pub task: TaskSection,
    #[serde(default)]
    pub mappings: BTreeMap<String, MappingSource>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSection {
    pub name: String,
    pub input: PathBuf,
    /// May name the input itself; the table is fully read before writing.
    pub output: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingSource {
    pub path: PathBuf,
    pub layout: MappingLayout,
}

/// One reconciliation step, tagged by `op` in the task file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    Enrich {
        key_column: String,
        mapping: String,
        target: String,
        on_miss: MissPolicy,
        #[serde(default)]
        when: EnrichCondition,
    },
    Recode {
        column: String,
        map: BTreeMap<String, String>,
        #[serde(default = "fail_policy")]
        on_unmapped: MissPolicy,
        #[serde(default)]
        into: Option<RecodeInto>,
    },
    Rewrite {
        column: String,
        rule: IdentifierRule,
        guard: RewriteGuard,
    },
    Insert {
        column: String,
        #[serde(default)]
        position: Option<usize>,
        source: ColumnSource,
    },
    Set {
        column: String,
        source: ColumnSource,
    },
    Delete {
        column: String,
    },
    Rename {
        from: String,
        to: String,
    },
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Enrich { .. } => "enrich",
            Self::Recode { .. } => "recode",
            Self::Rewrite { .. } => "rewrite",
            Self::Insert { .. } => "insert",
            Self::Set { .. } => "set",
            Self::Delete { .. } => "delete",
            Self::Rename { .. } => "rename",
        }
    }

    /// The column the step writes to.
    pub fn column(&self) -> &str {
        match self {
            Self::Enrich { target, .. } => target,
            Self::Recode { column, into, .. } => {
                into.as_ref().map_or(column.as_str(), |into| into.column.as_str())
            }
            Self::Rewrite { column, .. }
            | Self::Insert { column, .. }
            | Self::Set { column, .. }
            | Self::Delete { column } => column,
            Self::Rename { to, .. } => to,
        }
    }
}

/// A parsed task with every path resolved against the task file's directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub source: PathBuf,
    pub task: TaskSection,
    pub mappings: BTreeMap<String, MappingSource>,
    pub steps: Vec<Step>,
}

impl TaskConfig {
    pub fn name(&self) -> &str {
        &self.task.name
    }

    /// Every file the task reads, table first.
    pub fn input_paths(&self) -> Vec<&Path> {
        std::iter::once(self.task.input.as_path())
            .chain(self.mappings.values().map(|source| source.path.as_path()))
            .collect()
    }

    /// Checks everything that can be checked without touching the inputs.
    pub fn validate(&self) -> Result<()> {
        if self.task.name.trim().is_empty() {
            return Err(ReconError::config("task name is empty"));
        }
        delimiter_byte(self.task.delimiter)?;
        for (name, source) in &self.mappings {
            if let Some(rule) = &source.layout.key_rule {
                validate_rule(rule)
                    .map_err(|err| ReconError::config(format!("mapping '{name}': {err}")))?;
            }
        }
        for (idx, step) in self.steps.iter().enumerate() {
            self.validate_step(step).map_err(|err| {
                ReconError::config(format!("step {} ({}): {err}", idx + 1, step.op()))
            })?;
        }
        Ok(())
    }

    fn validate_step(&self, step: &Step) -> std::result::Result<(), String> {
        match step {
            Step::Enrich { mapping, .. } if !self.mappings.contains_key(mapping) => {
                Err(format!("undefined mapping '{mapping}'"))
            }
            Step::Recode { map, .. } if map.is_empty() => Err("recode map is empty".to_string()),
            Step::Rewrite { rule, guard, .. } => {
                validate_rule(rule).map_err(|err| err.to_string())?;
                if *guard == RewriteGuard::SkipApplied && !is_detectable(rule) {
                    return Err(format!(
                        "a {} rule cannot be guarded with skip_applied",
                        rule.label()
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Parses task text; relative paths resolve against `base_dir`.
pub fn parse_task(text: &str, base_dir: &Path, source: &Path) -> Result<TaskConfig> {
    let file: TaskFile = toml::from_str(text).map_err(|err| {
        ReconError::config(format!(
            "failed to parse task file {}: {err}",
            source.display()
        ))
    })?;
    let mut task = file.task;
    task.input = resolve(base_dir, &task.input);
    task.output = resolve(base_dir, &task.output);
    let mappings = file
        .mappings
        .into_iter()
        .map(|(name, mut mapping)| {
            mapping.path = resolve(base_dir, &mapping.path);
            (name, mapping)
        })
        .collect();
    let config = TaskConfig {
        source: source.to_path_buf(),
        task,
        mappings,
        steps: file.steps,
    };
    config.validate()?;
    Ok(config)
}

/// Reads and validates a task file.
pub fn load_task(path: &Path) -> Result<TaskConfig> {
    let text = fs::read_to_string(path).map_err(|err| ReconError::io(path, err))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_task(&text, base_dir, path)
}
