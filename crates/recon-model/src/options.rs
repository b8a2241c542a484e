//! Policies and rules that every reconciliation call site states explicitly.
//!
//! These types double as the task-file vocabulary, so each derives
//! `Deserialize` with `snake_case` names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What to do when a value has no entry in a mapping or recode map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case", deny_unknown_fields)]
pub enum MissPolicy {
    /// Abort the task.
    Fail,
    /// Write a literal instead, e.g. `Na`.
    Default { value: String },
    /// Leave the existing value unchanged.
    Keep,
}

impl MissPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Default { .. } => "default",
            Self::Keep => "keep",
        }
    }
}

/// Resolution applied when several auxiliary rows share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    LastWins,
    FirstWins,
    /// Keep the value list with the most items; ties keep the earlier one.
    LongestWins,
    /// Concatenate value lists in file order.
    Append,
}

/// Which rows an enrichment writes to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichCondition {
    #[default]
    Always,
    /// Only rows whose current target value equals this literal.
    TargetEquals(String),
}

/// Protection against re-applying a non-idempotent identifier rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteGuard {
    /// Apply the rule to every cell, even when it was applied before.
    #[serde(rename = "none")]
    Unguarded,
    /// Leave cells the rule has visibly been applied to.
    SkipApplied,
    /// Always derive from this untouched source column.
    FromColumn(String),
}

/// Deterministic string rewrite for sample and subject identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum IdentifierRule {
    Prefix {
        value: String,
    },
    Suffix {
        value: String,
    },
    /// Replace every character of `from` with `to`.
    Substitute {
        from: String,
        to: String,
    },
    /// Split on `separator` and keep part `index`.
    SplitTake {
        separator: String,
        index: usize,
    },
    /// Drop the first `count` characters.
    SkipChars {
        count: usize,
    },
    Chain {
        rules: Vec<IdentifierRule>,
    },
}

impl IdentifierRule {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Prefix { .. } => "prefix",
            Self::Suffix { .. } => "suffix",
            Self::Substitute { .. } => "substitute",
            Self::SplitTake { .. } => "split_take",
            Self::SkipChars { .. } => "skip_chars",
            Self::Chain { .. } => "chain",
        }
    }
}

/// Where the values of an inserted or overwritten column come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case", deny_unknown_fields)]
pub enum ColumnSource {
    Constant {
        value: String,
    },
    Copy {
        column: String,
    },
    /// `matched` when the character at `index` of `column` is `expected`,
    /// `unmatched` otherwise (including cells that are too short).
    CharFlag {
        column: String,
        index: usize,
        expected: char,
        matched: String,
        unmatched: String,
    },
}

/// Finite value-to-value substitution for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecodeMap {
    pub entries: BTreeMap<String, String>,
    pub fallback: MissPolicy,
}

impl RecodeMap {
    pub fn new<I, K, V>(entries: I, fallback: MissPolicy) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            fallback,
        }
    }

    pub fn lookup(&self, value: &str) -> Option<&str> {
        self.entries.get(value).map(String::as_str)
    }
}

/// Destination of a recode that should not overwrite its source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecodeInto {
    pub column: String,
    /// 0-based insert position for a new column; appended when unset.
    #[serde(default)]
    pub position: Option<usize>,
}
