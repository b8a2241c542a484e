//! Keyed enrichment: the left-join step of a reconciliation task.

use std::collections::BTreeSet;

use recon_model::{EnrichCondition, Mapping, MissPolicy, ReconError, Result, Table};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
    pub hits: usize,
    pub misses: usize,
    /// Rows excluded by the enrichment condition.
    pub skipped: usize,
    pub changed: usize,
    /// Mapping keys no row referenced, sorted.
    pub unused_keys: Vec<String>,
}

/// Writes `mapping[row[key_column]]` into `target_column` for every row.
///
/// Misses are resolved by `on_miss`; there is no implicit default. A missing
/// `target_column` is appended as the last column. With
/// [`EnrichCondition::TargetEquals`] only rows whose current target value
/// equals the literal are looked up at all (for example filling `RUN_CODE`
/// only where it is still `Na`).
///
/// # Errors
///
/// A format error when `key_column` is absent, and a lookup error for the
/// first miss under [`MissPolicy::Fail`]. On error the table is unchanged.
pub fn enrich_column(
    table: &mut Table,
    key_column: &str,
    mapping: &Mapping,
    target_column: &str,
    on_miss: &MissPolicy,
    when: &EnrichCondition,
) -> Result<EnrichStats> {
    let key_idx = table.require_column(key_column)?;
    let target_idx = table.column_index(target_column);
    let current: Vec<String> = match target_idx {
        Some(idx) => table.rows().iter().map(|row| row[idx].clone()).collect(),
        None => vec![String::new(); table.height()],
    };

    let mut stats = EnrichStats::default();
    let mut used = BTreeSet::new();
    let mut values = Vec::with_capacity(table.height());
    for (idx, row) in table.rows().iter().enumerate() {
        let existing = &current[idx];
        if let EnrichCondition::TargetEquals(expected) = when
            && existing != expected
        {
            stats.skipped += 1;
            values.push(existing.clone());
            continue;
        }
        let key = row[key_idx].as_str();
        if let Some(value) = mapping.render(key) {
            stats.hits += 1;
            used.insert(key);
            values.push(value);
            continue;
        }
        stats.misses += 1;
        match on_miss {
            MissPolicy::Fail => {
                return Err(ReconError::Lookup {
                    mapping: mapping.name().to_string(),
                    key: key.to_string(),
                    column: key_column.to_string(),
                    row: idx + 1,
                });
            }
            MissPolicy::Default { value } => {
                warn!(
                    mapping = mapping.name(),
                    key,
                    row = idx + 1,
                    fallback = %value,
                    "key not in mapping, writing default"
                );
                values.push(value.clone());
            }
            MissPolicy::Keep => {
                warn!(
                    mapping = mapping.name(),
                    key,
                    row = idx + 1,
                    "key not in mapping, keeping existing value"
                );
                values.push(existing.clone());
            }
        }
    }

    stats.changed = values
        .iter()
        .zip(&current)
        .filter(|(new, old)| new != old)
        .count();
    stats.unused_keys = mapping
        .keys()
        .filter(|key| !used.contains(key))
        .map(str::to_string)
        .collect();

    match target_idx {
        Some(idx) => table.replace_column(idx, values)?,
        None => table.push_column(target_column, values)?,
    }

    debug!(
        mapping = mapping.name(),
        key_column,
        target_column,
        hits = stats.hits,
        misses = stats.misses,
        skipped = stats.skipped,
        unused_keys = stats.unused_keys.len(),
        "enriched column"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs() -> Mapping {
        let mut mapping = Mapping::new("runs");
        mapping.insert(
            "S1",
            vec!["R001".to_string(), "R002".to_string()],
            recon_model::DuplicatePolicy::LastWins,
        );
        mapping.insert(
            "S2",
            vec!["R003".to_string()],
            recon_model::DuplicatePolicy::LastWins,
        );
        mapping
    }

    #[test]
    fn fills_placeholder_runs() {
        let mut table = Table::from_rows(["id", "run"], [["S1", "Na"], ["S2", "Na"]]).unwrap();
        let stats = enrich_column(
            &mut table,
            "id",
            &runs(),
            "run",
            &MissPolicy::Fail,
            &EnrichCondition::TargetEquals("Na".to_string()),
        )
        .unwrap();
        assert_eq!(table.column_values("run").unwrap(), ["R001,R002", "R003"]);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.changed, 2);
        assert!(stats.unused_keys.is_empty());
    }

    #[test]
    fn condition_leaves_known_runs_alone() {
        let mut table =
            Table::from_rows(["id", "run"], [["S1", "SRR9"], ["S9", "SRR8"]]).unwrap();
        let stats = enrich_column(
            &mut table,
            "id",
            &runs(),
            "run",
            &MissPolicy::Fail,
            &EnrichCondition::TargetEquals("Na".to_string()),
        )
        .unwrap();
        assert_eq!(stats.skipped, 2);
        assert_eq!(table.column_values("run").unwrap(), ["SRR9", "SRR8"]);
        assert_eq!(stats.unused_keys, ["S1", "S2"]);
    }

    #[test]
    fn fail_policy_reports_key_and_leaves_table() {
        let mut table = Table::from_rows(["id", "run"], [["S1", ""], ["S7", ""]]).unwrap();
        let before = table.clone();
        let err = enrich_column(
            &mut table,
            "id",
            &runs(),
            "run",
            &MissPolicy::Fail,
            &EnrichCondition::Always,
        )
        .unwrap_err();
        match err {
            ReconError::Lookup { key, row, mapping, .. } => {
                assert_eq!(key, "S7");
                assert_eq!(row, 2);
                assert_eq!(mapping, "runs");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(table, before);
    }

    #[test]
    fn default_and_keep_policies() {
        let mut table = Table::from_rows(["id", "run"], [["S2", "old"], ["S7", "old"]]).unwrap();
        enrich_column(
            &mut table,
            "id",
            &runs(),
            "run",
            &MissPolicy::Keep,
            &EnrichCondition::Always,
        )
        .unwrap();
        assert_eq!(table.column_values("run").unwrap(), ["R003", "old"]);

        enrich_column(
            &mut table,
            "id",
            &runs(),
            "Disease",
            &MissPolicy::Default {
                value: "Na".to_string(),
            },
            &EnrichCondition::Always,
        )
        .unwrap();
        assert_eq!(table.columns(), ["id", "run", "Disease"]);
        assert_eq!(table.column_values("Disease").unwrap(), ["R003", "Na"]);
    }

    #[test]
    fn missing_key_column_is_format_error() {
        let mut table = Table::from_rows(["id"], [["S1"]]).unwrap();
        let err = enrich_column(
            &mut table,
            "sampleID",
            &runs(),
            "run",
            &MissPolicy::Keep,
            &EnrichCondition::Always,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::Format { .. }));
    }
}
