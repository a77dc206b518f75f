use std::collections::HashMap;

use serde::Serialize;

/// One raw cell value as handed over by the workbook decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Number(f64),
    Text(String),
    DateText(String),
}

impl Default for RawCell {
    fn default() -> Self {
        RawCell::Empty
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(value.to_string())
        }
    }
}

/// A 0-based (row, column) coordinate into a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Row-major grid of one worksheet. Rows may be shorter than the notional grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    rows: Vec<Vec<RawCell>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    /// Sets a single cell, growing the grid as needed.
    #[cfg(test)]
    pub fn set(&mut self, cell: CellRef, value: impl Into<RawCell>) {
        if self.rows.len() <= cell.row {
            self.rows.resize_with(cell.row + 1, Vec::new);
        }
        let row = &mut self.rows[cell.row];
        if row.len() <= cell.col {
            row.resize(cell.col + 1, RawCell::Empty);
        }
        row[cell.col] = value.into();
    }

    #[cfg(test)]
    pub fn with(mut self, row: usize, col: usize, value: impl Into<RawCell>) -> Self {
        self.set(CellRef::new(row, col), value);
        self
    }
}

/// Decoded workbook, sheets keyed by their exact tab name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: HashMap<String, Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, sheet: Sheet) {
        self.sheets.insert(name.into(), sheet);
    }

    #[cfg(test)]
    pub fn with_sheet(mut self, name: impl Into<String>, sheet: Sheet) -> Self {
        self.insert(name, sheet);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    #[cfg(test)]
    pub fn sheet_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sheets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
