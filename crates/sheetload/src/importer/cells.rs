//! Cell coercion shared by the record importers.
//!
//! Identifier cells must be present and fit `VARCHAR(50)`; every other
//! column maps an empty cell to `None`.

use chrono::{Days, NaiveDate};

use crate::error::ImportError;
use crate::reader::{CellValue, Row};

/// Width of the identifier columns in the warehouse.
pub const ID_MAX_LEN: usize = 50;

fn invalid(row: &Row<'_>, column: &str, reason: impl Into<String>) -> ImportError {
    ImportError::InvalidCell {
        row: row.number(),
        column: column.to_string(),
        reason: reason.into(),
    }
}

pub fn identifier(row: &Row<'_>, column: &str) -> Result<String, ImportError> {
    let value = row
        .get(column)
        .to_text()
        .ok_or_else(|| invalid(row, column, "identifier is empty"))?;
    if value.chars().count() > ID_MAX_LEN {
        return Err(invalid(
            row,
            column,
            format!("identifier longer than {} characters", ID_MAX_LEN),
        ));
    }
    Ok(value)
}

pub fn text(row: &Row<'_>, column: &str) -> Option<String> {
    row.get(column).to_text()
}

pub fn float(row: &Row<'_>, column: &str) -> Result<Option<f64>, ImportError> {
    match row.get(column) {
        CellValue::Number(n) => Ok(Some(*n)),
        CellValue::Text(s) if s.trim().is_empty() => Ok(None),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(row, column, format!("'{}' is not a number", s))),
        CellValue::Empty => Ok(None),
        CellValue::Bool(_) => Err(invalid(row, column, "expected a number, found a boolean")),
    }
}

pub fn integer(row: &Row<'_>, column: &str) -> Result<Option<i64>, ImportError> {
    let Some(n) = float(row, column)? else {
        return Ok(None);
    };
    if n.fract() != 0.0 || !n.is_finite() || n.abs() > i64::MAX as f64 {
        return Err(invalid(row, column, format!("{} is not an integer", n)));
    }
    Ok(Some(n as i64))
}

/// Accepts an Excel serial date or `YYYY-MM-DD` / `DD/MM/YYYY` text, with
/// any trailing time part ignored.
pub fn date(row: &Row<'_>, column: &str) -> Result<Option<NaiveDate>, ImportError> {
    match row.get(column) {
        CellValue::Empty => Ok(None),
        CellValue::Number(serial) => from_excel_serial(*serial)
            .map(Some)
            .ok_or_else(|| invalid(row, column, format!("{} is not a valid date", serial))),
        CellValue::Text(s) if s.trim().is_empty() => Ok(None),
        CellValue::Text(s) => parse_date_text(s)
            .map(Some)
            .ok_or_else(|| invalid(row, column, format!("'{}' is not a date", s))),
        CellValue::Bool(_) => Err(invalid(row, column, "expected a date, found a boolean")),
    }
}

/// Days since 1899-12-30, the epoch spreadsheet applications use for the
/// 1900 date system.
fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let date_part = s.trim().split(['T', ' ']).next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .ok()
}
