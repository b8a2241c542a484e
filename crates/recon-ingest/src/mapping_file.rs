//! Auxiliary mapping files: headerless listings keyed on a sample identifier.

use std::fs;
use std::path::Path;

use tracing::debug;

use recon_model::{FieldDelimiter, Mapping, MappingLayout, ReconError, Result, ValueFields};
use recon_transform::{transform_identifier, validate_rule};

fn split_fields<'a>(line: &'a str, delimiter: &FieldDelimiter) -> Vec<&'a str> {
    match delimiter {
        FieldDelimiter::Whitespace => line.split_whitespace().collect(),
        FieldDelimiter::Char(ch) => line.split(*ch).collect(),
    }
}

fn at_line(err: ReconError, origin: &str, line: usize) -> ReconError {
    match err {
        ReconError::Validation { message } => {
            ReconError::validation(format!("{origin}, line {line}: {message}"))
        }
        other => other,
    }
}

/// Loads an auxiliary mapping file according to `layout`.
pub fn load_mapping(path: &Path, name: &str, layout: &MappingLayout) -> Result<Mapping> {
    let text = fs::read_to_string(path).map_err(|err| ReconError::io(path, err))?;
    parse_mapping(&text, name, layout, &path.display().to_string())
}

/// Parses mapping text. Blank lines are ignored; every other line must hold
/// at least the key field (and a single value field, when one is configured).
pub fn parse_mapping(
    text: &str,
    name: &str,
    layout: &MappingLayout,
    origin: &str,
) -> Result<Mapping> {
    if let Some(rule) = &layout.key_rule {
        validate_rule(rule)?;
    }
    let min_fields = layout.min_fields();
    let mut mapping = Mapping::new(name).with_separator(layout.separator.clone());
    let mut lines = 0usize;
    let mut skipped = 0usize;
    let mut replaced = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let fields = split_fields(raw, &layout.delimiter);
        if fields.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if fields.len() < min_fields {
            return Err(ReconError::format(
                origin,
                format!(
                    "line {line}: expected at least {min_fields} fields, found {}",
                    fields.len()
                ),
            ));
        }
        let raw_key = fields[layout.key_field];
        if raw_key.is_empty() {
            return Err(ReconError::format(
                origin,
                format!("line {line}: key field {} is empty", layout.key_field),
            ));
        }
        if layout
            .skip_key_prefixes
            .iter()
            .any(|prefix| raw_key.starts_with(prefix.as_str()))
        {
            skipped += 1;
            continue;
        }
        let key = match &layout.key_rule {
            Some(rule) => {
                transform_identifier(raw_key, rule).map_err(|err| at_line(err, origin, line))?
            }
            None => raw_key.to_string(),
        };

        let selected: &[&str] = match &layout.values {
            ValueFields::Single(idx) => std::slice::from_ref(&fields[*idx]),
            ValueFields::Range(range) => range.slice(&fields),
        };
        let values: Vec<String> = selected
            .iter()
            .map(|value| {
                layout
                    .value_recode
                    .get(*value)
                    .cloned()
                    .unwrap_or_else(|| (*value).to_string())
            })
            .collect();

        let existed = mapping.contains_key(&key);
        if mapping.insert(key, values, layout.duplicates) && existed {
            replaced += 1;
        }
        lines += 1;
    }

    debug!(
        mapping = name,
        origin,
        keys = mapping.len(),
        lines,
        skipped,
        replaced,
        "loaded mapping"
    );
    Ok(mapping)
}
