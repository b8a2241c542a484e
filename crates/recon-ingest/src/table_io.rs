use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use tracing::debug;

use recon_model::{ReconError, Result, Table};

pub const TAB: u8 = b'\t';

/// Converts a configured delimiter character into the byte the csv reader expects.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && !matches!(delimiter, '\n' | '\r' | '"') {
        Ok(delimiter as u8)
    } else {
        Err(ReconError::config(format!(
            "unsupported table delimiter {delimiter:?}; use a single ASCII character"
        )))
    }
}

fn csv_error(origin: &str, err: csv::Error) -> ReconError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => ReconError::io(origin, source),
        _ => ReconError::format(origin, message),
    }
}

/// Loads a delimited table whose first line is the header.
///
/// Cells are kept verbatim: no trimming, no quote handling, no type
/// inference. A BOM in front of the first header name is dropped.
///
/// # Errors
///
/// Returns a format error for an empty file, empty or duplicate header
/// names, and rows whose field count differs from the header's.
pub fn load_table(path: &Path, delimiter: u8) -> Result<Table> {
    let file = File::open(path).map_err(|err| ReconError::io(path, err))?;
    let table = read_table(file, delimiter, &path.display().to_string())?;
    debug!(
        path = %path.display(),
        columns = table.width(),
        rows = table.height(),
        "loaded table"
    );
    Ok(table)
}

pub fn read_table<R: Read>(reader: R, delimiter: u8, origin: &str) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|err| csv_error(origin, err))?,
        None => return Err(ReconError::format(origin, "missing header row")),
    };
    let mut columns = Vec::with_capacity(header.len());
    for (idx, raw) in header.iter().enumerate() {
        let name = if idx == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        if name.trim().is_empty() {
            return Err(ReconError::format(
                origin,
                format!("header field {} is empty", idx + 1),
            ));
        }
        if columns.iter().any(|existing: &String| existing == name) {
            return Err(ReconError::format(
                origin,
                format!("duplicate header '{name}'"),
            ));
        }
        columns.push(name.to_string());
    }
    let width = columns.len();
    let mut table = Table::new(columns)?;

    for record in records {
        let record = record.map_err(|err| csv_error(origin, err))?;
        if record.len() != width {
            let line = record.position().map_or(0, csv::Position::line);
            return Err(ReconError::format(
                origin,
                format!(
                    "line {line}: expected {width} fields, found {}",
                    record.len()
                ),
            ));
        }
        table.push_row(record.iter().map(str::to_string).collect())?;
    }
    Ok(table)
}

/// Rejects tables that cannot be written without quoting.
fn check_writable(table: &Table, delimiter: u8, origin: &str) -> Result<()> {
    if table.width() == 0 {
        return Err(ReconError::format(origin, "table has no columns"));
    }
    let delimiter = char::from(delimiter);
    let unsafe_char = |value: &str| value.contains([delimiter, '\n', '\r']);
    for name in table.columns() {
        if unsafe_char(name) {
            return Err(ReconError::format(
                origin,
                format!("column name '{name}' contains the delimiter or a line break"),
            ));
        }
    }
    for (row_idx, row) in table.rows().iter().enumerate() {
        for (name, value) in table.columns().iter().zip(row) {
            if unsafe_char(value) {
                return Err(ReconError::format(
                    origin,
                    format!(
                        "row {}, column '{name}': value contains the delimiter or a line break",
                        row_idx + 1
                    ),
                ));
            }
        }
        // A lone empty cell would be written as a blank line, which readers skip.
        if table.width() == 1 && row[0].is_empty() {
            return Err(ReconError::format(
                origin,
                format!("row {}: empty value in a single-column table", row_idx + 1),
            ));
        }
    }
    Ok(())
}

pub fn write_table_to<W: Write>(table: &Table, writer: W, delimiter: u8) -> Result<()> {
    check_writable(table, delimiter, "output")?;
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    writer
        .write_record(table.columns())
        .map_err(|err| csv_error("output", err))?;
    for row in table.rows() {
        writer
            .write_record(row)
            .map_err(|err| csv_error("output", err))?;
    }
    writer
        .flush()
        .map_err(|err| ReconError::io("output", err))?;
    Ok(())
}

/// Renders a table as delimited text.
pub fn table_to_string(table: &Table, delimiter: u8) -> Result<String> {
    let mut buffer = Vec::new();
    write_table_to(table, &mut buffer, delimiter)?;
    String::from_utf8(buffer).map_err(|err| ReconError::format("output", err.to_string()))
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    path.with_file_name(format!(".{name}.partial"))
}

/// Writes `table` to `path`, replacing any existing file.
///
/// The table is written to a hidden sibling first and renamed into place, so
/// a failed write never leaves a truncated output behind.
pub fn write_table(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
    let origin = path.display().to_string();
    check_writable(table, delimiter, &origin)?;
    let staging = staging_path(path);
    let file = File::create(&staging).map_err(|err| ReconError::io(&staging, err))?;
    if let Err(err) = write_table_to(table, BufWriter::new(file), delimiter) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(ReconError::io(path, err));
    }
    debug!(
        path = %path.display(),
        columns = table.width(),
        rows = table.height(),
        "wrote table"
    );
    Ok(())
}
