//! Categorical recoding (`N` → `Na`, `CRC` → `Carcinoma`, ...).

use recon_model::{MissPolicy, ReconError, RecodeInto, RecodeMap, Result, Table};
use tracing::debug;

/// Recodes `column` in place. Returns the number of cells that changed.
///
/// # Errors
///
/// A validation error names the first value without an entry when the map's
/// fallback is [`MissPolicy::Fail`]. The table is unchanged on error.
pub fn recode_column(table: &mut Table, column: &str, recode: &RecodeMap) -> Result<usize> {
    let idx = table.require_column(column)?;
    let current: Vec<&str> = table.rows().iter().map(|row| row[idx].as_str()).collect();
    let values = recode_values(column, &current, &current, recode)?;
    let changed = count_changed(&values, &current);
    table.replace_column(idx, values)?;
    debug!(column, changed, "recoded column");
    Ok(changed)
}

/// Recodes `column` into another column, leaving the source untouched.
///
/// A new destination is inserted at `into.position` (appended when unset).
/// For an existing destination, [`MissPolicy::Keep`] keeps the destination's
/// current value; for a new one it copies the source value.
pub fn recode_column_into(
    table: &mut Table,
    column: &str,
    recode: &RecodeMap,
    into: &RecodeInto,
) -> Result<usize> {
    let source_idx = table.require_column(column)?;
    let source: Vec<&str> = table
        .rows()
        .iter()
        .map(|row| row[source_idx].as_str())
        .collect();

    match table.column_index(&into.column) {
        Some(dest_idx) => {
            if into.position.is_some() {
                return Err(ReconError::format(
                    "table",
                    format!(
                        "recode target '{}' already exists; position only applies to new columns",
                        into.column
                    ),
                ));
            }
            let existing: Vec<&str> = table
                .rows()
                .iter()
                .map(|row| row[dest_idx].as_str())
                .collect();
            let values = recode_values(column, &source, &existing, recode)?;
            let changed = count_changed(&values, &existing);
            table.replace_column(dest_idx, values)?;
            debug!(column, target = %into.column, changed, "recoded into existing column");
            Ok(changed)
        }
        None => {
            let values = recode_values(column, &source, &source, recode)?;
            let changed = values.len();
            let position = into.position.unwrap_or(table.width());
            table.insert_column(position, into.column.clone(), values)?;
            debug!(column, target = %into.column, position, "recoded into new column");
            Ok(changed)
        }
    }
}

fn recode_values(
    column: &str,
    source: &[&str],
    kept: &[&str],
    recode: &RecodeMap,
) -> Result<Vec<String>> {
    let mut values = Vec::with_capacity(source.len());
    for (idx, (value, keep)) in source.iter().zip(kept).enumerate() {
        let recoded = match recode.lookup(value) {
            Some(mapped) => mapped.to_string(),
            None => match &recode.fallback {
                MissPolicy::Fail => {
                    return Err(ReconError::validation(format!(
                        "value '{value}' in column '{column}' (row {}) has no recode entry",
                        idx + 1
                    )));
                }
                MissPolicy::Default { value } => value.clone(),
                MissPolicy::Keep => (*keep).to_string(),
            },
        };
        values.push(recoded);
    }
    Ok(values)
}

fn count_changed(values: &[String], current: &[&str]) -> usize {
    values
        .iter()
        .zip(current)
        .filter(|(new, old)| new.as_str() != **old)
        .count()
}
