//! Generic workbook to record parser.
//!
//! Opens any format calamine recognizes (xlsx, xlsm, xlsb, xls, ods) and
//! turns each sheet into records keyed by the sheet's first row.
//! No modification logic here.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read};
use std::iter;
use std::path::Path;

use crate::api::logs::log_warning;
use crate::error::{ReadError, ReadResult};
use crate::models::{CellValue, Record, Sheet, Workbook};

/// Largest float magnitude that still maps to an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Parse a workbook held in memory.
///
/// # Example
/// ```ignore
/// use sheetjson::read_workbook_bytes;
///
/// let bytes = std::fs::read("clientes.xlsx")?;
/// let workbook = read_workbook_bytes(&bytes)?;
///
/// for sheet in &workbook.sheets {
///     println!("{}: {} records", sheet.name, sheet.records.len());
/// }
/// ```
pub fn read_workbook_bytes(bytes: &[u8]) -> ReadResult<Workbook> {
    let mut source = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in source.sheet_names() {
        let range = source.worksheet_range(&name).map_err(|e| ReadError::Sheet {
            sheet: name.clone(),
            message: e.to_string(),
        })?;
        sheets.push(sheet_from_range(name, &range));
    }

    Ok(Workbook::new(sheets))
}

/// Parse a workbook from a reader.
///
/// The reader is consumed: it is read to the end and dropped before parsing,
/// whatever the outcome.
pub fn read_workbook<R: Read>(mut reader: R) -> ReadResult<Workbook> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    drop(reader);
    read_workbook_bytes(&bytes)
}

/// Parse a workbook file. The file is closed before this returns.
pub fn read_workbook_file<P: AsRef<Path>>(path: P) -> ReadResult<Workbook> {
    let file = File::open(path.as_ref())?;
    read_workbook(file)
}

/// Build a sheet from its used range: first row as field names, every
/// following non-blank row as one record.
///
/// Columns are counted from column A even when the used range starts further
/// right, so a sheet starting at B1 gets an `Unnamed: 0` field. Leading blank
/// rows are not counted: the first used row is the header row.
fn sheet_from_range(name: String, range: &Range<Data>) -> Sheet {
    let offset = range.start().map_or(0, |(_, col)| col as usize);
    let mut rows = range.rows();

    let header_row: Vec<Data> = match rows.next() {
        Some(row) => iter::repeat(Data::Empty)
            .take(offset)
            .chain(row.iter().cloned())
            .collect(),
        None => return Sheet::new(name),
    };
    let headers = header_names(&header_row);

    for (cell, header) in header_row.iter().zip(&headers) {
        if cell_value(cell).to_string().trim() != header.as_str() {
            log_warning(format!("Sheet '{}': header renamed to '{}'", name, header));
        }
    }

    let mut skipped = 0;
    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|cell| cell_value(cell).is_empty()) {
            skipped += 1;
            continue;
        }

        let record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = i
                    .checked_sub(offset)
                    .and_then(|col| row.get(col))
                    .map(cell_value)
                    .unwrap_or(CellValue::Empty);
                (header.clone(), value)
            })
            .collect::<Record>();
        records.push(record);
    }

    if skipped > 0 {
        log_warning(format!("Sheet '{}': skipped {} blank row(s)", name, skipped));
    }

    Sheet {
        name,
        headers,
        records,
    }
}

/// Field names from a header row, indexed from the row's first cell.
///
/// Text is trimmed. Blank headers become `Unnamed: <index>`; repeated names
/// get `.1`, `.2`...
pub fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();

    row.iter()
        .enumerate()
        .map(|(i, cell)| {
            let text = cell_value(cell).to_string();
            let base = match text.trim() {
                "" => format!("Unnamed: {}", i),
                trimmed => trimmed.to_string(),
            };

            let mut name = base.clone();
            let mut suffix = 0;
            while !seen.insert(name.clone()) {
                suffix += 1;
                name = format!("{}.{}", base, suffix);
            }
            name
        })
        .collect()
}

/// Convert a calamine cell to a record value.
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => number_value(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => dt
            .as_duration()
            .map(CellValue::Duration)
            .unwrap_or_else(|| CellValue::Float(dt.as_f64())),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Spreadsheets store every number as a double; whole numbers come back as integers.
fn number_value(f: f64) -> CellValue {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER {
        CellValue::Int(f as i64)
    } else {
        CellValue::Float(f)
    }
}
