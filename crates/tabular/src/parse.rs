use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::{Deserialize, Serialize};

use crate::{Cell, ParseError, Row};

/// One parsed sheet: the ordered column names plus the row objects.
/// Also the input shape for the chart projector, so a dataset read back
/// from storage round-trips through the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parse the first sheet of a workbook buffer (xls/xlsx/ods autodetected).
///
/// The first row is the header; each later row becomes a map keyed by the
/// header cells, with absent cells stored as empty text. Blank rows are
/// skipped. A sheet with no data rows is an error; there is nothing to
/// derive columns from.
pub fn parse_workbook(bytes: &[u8]) -> Result<Table, ParseError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|err| ParseError::Unreadable(err.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ParseError::EmptySheet)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|err| ParseError::Unreadable(err.to_string()))?;

    table_from_cells(range.rows())
}

/// Core row assembly, split from the workbook decode so it can be driven
/// directly with cell grids in tests.
pub(crate) fn table_from_cells<'a, I>(mut grid: I) -> Result<Table, ParseError>
where
    I: Iterator<Item = &'a [Data]>,
{
    let header = grid.next().ok_or(ParseError::EmptySheet)?;

    // First-encounter order, duplicates collapse onto their first slot,
    // unnamed header cells are skipped.
    let headers: Vec<String> = header.iter().map(header_name).collect();
    let mut columns: Vec<String> = Vec::new();
    for name in &headers {
        if !name.is_empty() && !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    if columns.is_empty() {
        return Err(ParseError::EmptySheet);
    }

    let mut rows: Vec<Row> = Vec::new();
    for cells in grid {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let mut row = Row::new();
        for (idx, name) in headers.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let cell = cells.get(idx).map(convert_cell).unwrap_or_else(Cell::empty);
            row.insert(name.clone(), cell);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ParseError::EmptySheet);
    }

    Ok(Table { columns, rows })
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::empty(),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::empty(),
    }
}
