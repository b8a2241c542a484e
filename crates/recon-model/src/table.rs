#![deny(unsafe_code)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};

const ORIGIN: &str = "table";

/// A metadata table: ordered, uniquely named columns and rows of string cells.
///
/// Every row holds exactly one cell per column. Mutating methods keep that
/// invariant, so code working on a `Table` never has to re-check row widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for name in &columns {
            if name.is_empty() {
                return Err(ReconError::format(ORIGIN, "empty column name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(ReconError::format(
                    ORIGIN,
                    format!("duplicate column '{name}'"),
                ));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Builds a table from string slices; convenient for fixtures.
    pub fn from_rows<C, R, S>(columns: C, rows: R) -> Result<Self>
    where
        C: IntoIterator<Item = S>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns.into_iter().map(Into::into).collect())?;
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect())?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ReconError::format(
                ORIGIN,
                format!(
                    "row {} has {} cells, expected {}",
                    self.rows.len() + 1,
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Like [`Table::column_index`], but a missing column is a format error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            ReconError::format(
                ORIGIN,
                format!(
                    "missing column '{name}' (available: {})",
                    self.columns.join(", ")
                ),
            )
        })
    }

    /// All values of a column in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Replaces every value of an existing column. `values` must match the row count.
    pub fn replace_column(&mut self, column: usize, values: Vec<String>) -> Result<()> {
        self.check_column_height(&values)?;
        if column >= self.columns.len() {
            return Err(ReconError::format(
                ORIGIN,
                format!("column index {column} out of range"),
            ));
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[column] = value;
        }
        Ok(())
    }

    pub fn insert_column(
        &mut self,
        position: usize,
        name: impl Into<String>,
        values: Vec<String>,
    ) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(ReconError::format(ORIGIN, "empty column name"));
        }
        if self.has_column(&name) {
            return Err(ReconError::format(
                ORIGIN,
                format!("column '{name}' already exists"),
            ));
        }
        if position > self.columns.len() {
            return Err(ReconError::format(
                ORIGIN,
                format!(
                    "cannot insert '{name}' at position {position}: table has {} columns",
                    self.columns.len()
                ),
            ));
        }
        self.check_column_height(&values)?;
        self.columns.insert(position, name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(position, value);
        }
        Ok(())
    }

    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        let position = self.columns.len();
        self.insert_column(position, name, values)
    }

    /// Removes a column and returns its values.
    pub fn remove_column(&mut self, name: &str) -> Result<Vec<String>> {
        let idx = self.require_column(name)?;
        self.columns.remove(idx);
        Ok(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.require_column(from)?;
        if from == to {
            return Ok(());
        }
        if to.is_empty() {
            return Err(ReconError::format(ORIGIN, "empty column name"));
        }
        if self.has_column(to) {
            return Err(ReconError::format(
                ORIGIN,
                format!("cannot rename '{from}' to '{to}': column already exists"),
            ));
        }
        self.columns[idx] = to.to_string();
        Ok(())
    }

    fn check_column_height(&self, values: &[String]) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(ReconError::format(
                ORIGIN,
                format!(
                    "column has {} values, table has {} rows",
                    values.len(),
                    self.rows.len()
                ),
            ));
        }
        Ok(())
    }
}
