//! Field layout of auxiliary mapping files.
//!
//! Auxiliary files (run listings, disease tables) have no header and no
//! shared schema; which field holds the key and which hold the values is
//! configuration supplied per dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mapping::DEFAULT_VALUE_SEPARATOR;
use crate::options::{DuplicatePolicy, IdentifierRule};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDelimiter {
    /// Runs of whitespace; leading and trailing whitespace is ignored.
    #[default]
    Whitespace,
    Char(char),
}

/// Slice over the fields of a line.
///
/// Negative bounds count from the end, `end` is exclusive, and bounds past
/// either end clamp, so `{ start = 4, end = -2 }` selects "field 4 up to but
/// not including the second-to-last field".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRange {
    #[serde(default)]
    pub start: isize,
    #[serde(default)]
    pub end: Option<isize>,
}

impl FieldRange {
    pub fn new(start: isize, end: Option<isize>) -> Self {
        Self { start, end }
    }

    /// Resolves the range against `len` fields into `start..end` indices.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let resolve = |bound: isize| -> usize {
            if bound < 0 {
                len.saturating_sub(bound.unsigned_abs())
            } else {
                bound.unsigned_abs().min(len)
            }
        };
        let start = resolve(self.start);
        let end = self.end.map_or(len, resolve);
        (start, end.max(start))
    }

    pub fn slice<'a, T>(&self, fields: &'a [T]) -> &'a [T] {
        let (start, end) = self.bounds(fields.len());
        &fields[start..end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueFields {
    Single(usize),
    Range(FieldRange),
}

/// Everything needed to turn an auxiliary file into a [`crate::Mapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingLayout {
    #[serde(default)]
    pub delimiter: FieldDelimiter,
    /// 0-based index of the key field.
    pub key_field: usize,
    /// Rewrite applied to the raw key before it is stored.
    #[serde(default)]
    pub key_rule: Option<IdentifierRule>,
    /// Lines whose raw key starts with one of these prefixes are ignored.
    #[serde(default)]
    pub skip_key_prefixes: Vec<String>,
    pub values: ValueFields,
    pub duplicates: DuplicatePolicy,
    /// Substitution applied to every extracted value; unlisted values pass through.
    #[serde(default)]
    pub value_recode: BTreeMap<String, String>,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    DEFAULT_VALUE_SEPARATOR.to_string()
}

impl MappingLayout {
    pub fn new(key_field: usize, values: ValueFields, duplicates: DuplicatePolicy) -> Self {
        Self {
            delimiter: FieldDelimiter::default(),
            key_field,
            key_rule: None,
            skip_key_prefixes: Vec::new(),
            values,
            duplicates,
            value_recode: BTreeMap::new(),
            separator: default_separator(),
        }
    }

    /// Smallest field count a line needs for the key and any fixed value index.
    pub fn min_fields(&self) -> usize {
        match self.values {
            ValueFields::Single(idx) => self.key_field.max(idx) + 1,
            ValueFields::Range(_) => self.key_field + 1,
        }
    }
}
