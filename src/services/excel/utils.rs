use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{RawCell, Sheet};

// Everything that cannot be part of a plain decimal literal: currency signs,
// thousands separators, percent signs, trailing labels.
static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.\-]").expect("Failed to compile NON_NUMERIC"));

// Longest leading decimal literal of the stripped text.
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)").expect("Failed to compile LEADING_NUMBER"));

/// Returns the raw value at `(row, col)`, or `None` when the row does not
/// exist, the row is shorter than `col`, or the cell is empty.
pub fn get_cell(sheet: &Sheet, row: usize, col: usize) -> Option<&RawCell> {
    match sheet.rows().get(row)?.get(col)? {
        RawCell::Empty => None,
        cell => Some(cell),
    }
}

/// Lenient numeric coercion.
///
/// Text is stripped down to digits, `.` and `-`, then the leading decimal
/// literal is read: `"₪12,345.67"` gives `12345.67`, `"500 - 600"` gives `500`,
/// `"abc"` or `"--5"` give `None`.
pub fn to_number(cell: Option<&RawCell>) -> Option<f64> {
    let value = match cell? {
        RawCell::Number(n) => *n,
        RawCell::Text(s) | RawCell::DateText(s) => {
            let stripped = NON_NUMERIC.replace_all(s, "");
            LEADING_NUMBER.find(&stripped)?.as_str().parse::<f64>().ok()?
        }
        RawCell::Empty => return None,
    };
    value.is_finite().then_some(value)
}

/// Rounds half away from zero: `2.5 -> 3`, `-2.5 -> -3`.
pub fn to_integer(cell: Option<&RawCell>) -> Option<f64> {
    to_number(cell).map(f64::round)
}

/// `round(x * 10^n) / 10^n`. Inherits binary floating-point representation
/// error, e.g. `round_to(1.005, 2)` gives `1.0`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

pub fn to_decimal(cell: Option<&RawCell>, decimals: u32) -> Option<f64> {
    to_number(cell).map(|n| round_to(n, decimals))
}

/// Text view of a cell. Blank text counts as absent.
pub fn to_text(cell: Option<&RawCell>) -> Option<String> {
    match cell? {
        RawCell::Text(s) | RawCell::DateText(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        RawCell::Number(n) => Some(format_number(*n)),
        RawCell::Empty => None,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
