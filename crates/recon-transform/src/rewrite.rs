//! Column-level identifier rewrites.

use recon_model::{IdentifierRule, ReconError, Result, RewriteGuard, Table};
use tracing::debug;

use crate::identifier::{is_applied, is_detectable, transform_identifier, validate_identifier};

/// Counts reported by [`rewrite_column`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub changed: usize,
    /// Cells left alone because the rule was already applied.
    pub skipped: usize,
}

/// Rewrites every identifier in `column` with `rule`.
///
/// The `guard` decides how a second run over an already rewritten table
/// behaves:
///
/// * [`RewriteGuard::Unguarded`] re-applies the rule unconditionally.
/// * [`RewriteGuard::SkipApplied`] leaves cells that already carry the rule's
///   effect (for example a suffix that is already present).
/// * [`RewriteGuard::FromColumn`] derives every value from an untouched
///   source column, so the output is the same however often it runs.
///
/// Every cell is validated, including cells the guard leaves alone. The
/// table is only modified when every row rewrites successfully.
pub fn rewrite_column(
    table: &mut Table,
    column: &str,
    rule: &IdentifierRule,
    guard: &RewriteGuard,
) -> Result<RewriteStats> {
    let target_idx = table.require_column(column)?;
    let source_idx = match guard {
        RewriteGuard::FromColumn(source) => table.require_column(source)?,
        RewriteGuard::Unguarded | RewriteGuard::SkipApplied => target_idx,
    };
    let skip_applied = matches!(guard, RewriteGuard::SkipApplied);
    if skip_applied && !is_detectable(rule) {
        return Err(ReconError::validation(format!(
            "column '{column}': {} rule cannot be guarded with skip_applied; use from_column",
            rule.label()
        )));
    }

    let mut stats = RewriteStats::default();
    let mut values = Vec::with_capacity(table.height());
    for (idx, row) in table.rows().iter().enumerate() {
        let source = row[source_idx].as_str();
        validate_identifier(source).map_err(|err| at_row(err, column, idx))?;
        let rewritten = if skip_applied && is_applied(source, rule)? {
            stats.skipped += 1;
            source.to_string()
        } else {
            transform_identifier(source, rule).map_err(|err| at_row(err, column, idx))?
        };
        if rewritten != row[target_idx] {
            stats.changed += 1;
        }
        values.push(rewritten);
    }
    table.replace_column(target_idx, values)?;

    debug!(
        column,
        rule = rule.label(),
        changed = stats.changed,
        skipped = stats.skipped,
        "rewrote identifier column"
    );
    Ok(stats)
}

/// Adds the column and 1-based row to a validation error.
pub(crate) fn at_row(err: ReconError, column: &str, idx: usize) -> ReconError {
    match err {
        ReconError::Validation { message } => ReconError::validation(format!(
            "column '{column}', row {}: {message}",
            idx + 1
        )),
        other => other,
    }
}
