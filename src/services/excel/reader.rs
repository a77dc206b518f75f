use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDateTime, Timelike};

use super::types::{RawCell, Sheet, Workbook};
use crate::error::AppError;

/// Decodes an xlsx/xls/xlsb/ods payload into the sheet grid model.
///
/// Coordinates in the result are absolute: cell A1 is `(0, 0)` even when the
/// used range of a sheet starts further down or right.
pub fn read_workbook(file_data: Bytes) -> Result<Workbook, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Opening workbook, size: {}KB", file_data.len() / 1024);

    let cursor = Cursor::new(file_data);
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open workbook: {}", e);
        AppError::MalformedWorkbook(format!("Failed to open workbook: {}", e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    tracing::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let mut decoded = Workbook::new();
    for sheet_name in &sheet_names {
        match workbook.worksheet_range(sheet_name) {
            Ok(range) => decoded.insert(sheet_name.clone(), sheet_from_range(&range)),
            Err(e) => {
                tracing::warn!("Failed to read worksheet {}: {}", sheet_name, e);
                continue;
            }
        }
    }

    tracing::info!("Decoded {} sheets in {:?}", decoded.len(), start.elapsed());
    Ok(decoded)
}

fn sheet_from_range(range: &Range<Data>) -> Sheet {
    let Some((row_offset, col_offset)) = range.start() else {
        return Sheet::default();
    };

    let mut rows: Vec<Vec<RawCell>> = vec![Vec::new(); row_offset as usize];
    for row in range.rows() {
        let mut cells = vec![RawCell::Empty; col_offset as usize];
        cells.extend(row.iter().map(raw_cell));
        rows.push(cells);
    }
    Sheet::new(rows)
}

fn raw_cell(value: &Data) -> RawCell {
    match value {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::String(s) if s.is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::DateTime(d) if d.is_duration() => RawCell::Number(d.as_f64()),
        Data::DateTime(d) => match d.as_datetime() {
            Some(dt) => RawCell::DateText(format_datetime(dt)),
            None => RawCell::Number(d.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::DateText(s.clone()),
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}
