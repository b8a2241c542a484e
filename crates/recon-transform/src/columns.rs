//! Column insert, overwrite, delete and rename.

use recon_model::{ColumnSource, Result, Table};
use tracing::debug;

/// Materializes the values of `source` for every row of `table`.
pub fn resolve_source(table: &Table, source: &ColumnSource) -> Result<Vec<String>> {
    match source {
        ColumnSource::Constant { value } => Ok(vec![value.clone(); table.height()]),
        ColumnSource::Copy { column } => {
            let idx = table.require_column(column)?;
            Ok(table.rows().iter().map(|row| row[idx].clone()).collect())
        }
        ColumnSource::CharFlag {
            column,
            index,
            expected,
            matched,
            unmatched,
        } => {
            let idx = table.require_column(column)?;
            Ok(table
                .rows()
                .iter()
                .map(|row| {
                    if row[idx].chars().nth(*index) == Some(*expected) {
                        matched.clone()
                    } else {
                        unmatched.clone()
                    }
                })
                .collect())
        }
    }
}

/// Inserts a new column at `position`, or appends it when `position` is `None`.
pub fn insert_column(
    table: &mut Table,
    name: &str,
    position: Option<usize>,
    source: &ColumnSource,
) -> Result<()> {
    let values = resolve_source(table, source)?;
    let position = position.unwrap_or(table.width());
    table.insert_column(position, name, values)?;
    debug!(column = name, position, "inserted column");
    Ok(())
}

/// Overwrites `name` with `source`, appending it when absent.
///
/// Returns the number of cells whose value changed.
pub fn set_column(table: &mut Table, name: &str, source: &ColumnSource) -> Result<usize> {
    let values = resolve_source(table, source)?;
    let changed = match table.column_index(name) {
        Some(idx) => {
            let changed = table
                .rows()
                .iter()
                .zip(&values)
                .filter(|(row, value)| row[idx] != **value)
                .count();
            table.replace_column(idx, values)?;
            changed
        }
        None => {
            let changed = values.len();
            table.push_column(name, values)?;
            changed
        }
    };
    debug!(column = name, changed, "set column");
    Ok(changed)
}

pub fn delete_column(table: &mut Table, name: &str) -> Result<()> {
    table.remove_column(name)?;
    debug!(column = name, "deleted column");
    Ok(())
}

pub fn rename_column(table: &mut Table, from: &str, to: &str) -> Result<()> {
    table.rename_column(from, to)?;
    debug!(from, to, "renamed column");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asnicar() -> Table {
        Table::from_rows(
            ["sampleID", "country"],
            [["MV_FEI1_t1Q14", "ITA"], ["MV_FEM1_t1Q14", "ITA"], ["M", "ITA"]],
        )
        .unwrap()
    }

    #[test]
    fn char_flag_marks_mothers() {
        let mut table = asnicar();
        let source = ColumnSource::CharFlag {
            column: "sampleID".to_string(),
            index: 5,
            expected: 'M',
            matched: "yes".to_string(),
            unmatched: "no".to_string(),
        };
        insert_column(&mut table, "lactating", Some(1), &source).unwrap();
        assert_eq!(table.columns(), ["sampleID", "lactating", "country"]);
        assert_eq!(
            table.column_values("lactating").unwrap(),
            ["no", "yes", "no"]
        );
    }

    #[test]
    fn set_copies_and_overwrites() {
        let mut table = asnicar();
        let changed = set_column(
            &mut table,
            "RUN_CODE",
            &ColumnSource::Copy {
                column: "sampleID".to_string(),
            },
        )
        .unwrap();
        assert_eq!(changed, 3);
        assert_eq!(table.columns().last().map(String::as_str), Some("RUN_CODE"));

        let changed = set_column(
            &mut table,
            "country",
            &ColumnSource::Constant {
                value: "ITA".to_string(),
            },
        )
        .unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn delete_and_rename() {
        let mut table = asnicar();
        delete_column(&mut table, "country").unwrap();
        rename_column(&mut table, "sampleID", "StudySampleId").unwrap();
        assert_eq!(table.columns(), ["StudySampleId"]);
        assert!(delete_column(&mut table, "country").is_err());
    }
}
