//! Tabular file reading.
//!
//! [`ResilientReader`] wraps a [`SheetParser`] with the retry policy needed
//! for files that may be held open by a spreadsheet application: a
//! lock-class failure falls back to parsing a private temporary copy, and
//! every failed attempt is retried after a fixed delay, up to a bounded
//! number of attempts.

pub mod xlsx;

use std::ffi::OsStr;
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::ReadError;

pub use xlsx::XlsxParser;

/// Default number of read attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between read attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Renders the cell as text. Integral numbers drop their fractional part
    /// so that an id typed as `42` in one file and `"42"` in another agree.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }

    /// Renders a header cell. Text is kept exactly as written so that column
    /// names match without normalization.
    pub fn to_header(&self) -> Option<String> {
        match self {
            CellValue::Text(s) if !s.is_empty() => Some(s.clone()),
            CellValue::Text(_) => None,
            other => other.to_text(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A parsed sheet: one header row naming the columns, then data rows.
///
/// Every data row has exactly `columns().len()` cells and remembers the
/// sheet row it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    numbers: Vec<usize>,
}

impl Table {
    /// Builds a table whose header is sheet row 1 and whose data rows follow
    /// it without gaps.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let numbered = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i + 2, row))
            .collect();
        Self::with_row_numbers(columns, numbered)
    }

    /// Builds a table from rows tagged with their 1-based sheet row number,
    /// padding or truncating rows to the header width and dropping rows
    /// with no content.
    pub fn with_row_numbers(columns: Vec<String>, rows: Vec<(usize, Vec<CellValue>)>) -> Self {
        let width = columns.len();
        let (numbers, rows) = rows
            .into_iter()
            .filter(|(_, row)| row.iter().any(|c| !c.is_empty()))
            .map(|(number, mut row)| {
                row.resize(width, CellValue::Empty);
                (number, row)
            })
            .unzip();
        Self {
            columns,
            rows,
            numbers,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows
            .iter()
            .zip(&self.numbers)
            .map(move |(cells, &number)| Row {
                table: self,
                number,
                cells,
            })
    }
}

/// A borrowed data row with by-name cell access.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    number: usize,
    cells: &'a [CellValue],
}

impl<'a> Row<'a> {
    /// 1-based row number in the source sheet.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn get(&self, column: &str) -> &'a CellValue {
        self.table
            .column_index(column)
            .and_then(|i| self.cells.get(i))
            .unwrap_or(&CellValue::Empty)
    }
}

/// Parses a file on disk into a [`Table`].
pub trait SheetParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Table, ReadError>;
}

/// Bounded retry policy for [`ResilientReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

pub struct ResilientReader<P = XlsxParser> {
    parser: P,
    policy: RetryPolicy,
}

impl ResilientReader<XlsxParser> {
    pub fn xlsx(policy: RetryPolicy) -> Self {
        Self::new(XlsxParser::new(), policy)
    }
}

impl<P: SheetParser> ResilientReader<P> {
    pub fn new(parser: P, policy: RetryPolicy) -> Self {
        Self { parser, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Reads `path`, retrying per the policy. Blocks the calling thread
    /// between attempts.
    pub fn read(&self, path: &Path) -> Result<Table, ReadError> {
        let mut attempt = 1;
        loop {
            let err = match self.try_read(path) {
                Ok(table) => return Ok(table),
                Err(e) => e,
            };

            if attempt >= self.policy.max_attempts {
                warn!(
                    "Giving up on {} after {} attempt(s): {}",
                    path.display(),
                    attempt,
                    err
                );
                return Err(err);
            }

            info!(
                "Attempt {}/{} to read {} failed, retrying in {:?}",
                attempt,
                self.policy.max_attempts,
                path.display(),
                self.policy.delay
            );
            thread::sleep(self.policy.delay);
            attempt += 1;
        }
    }

    fn try_read(&self, path: &Path) -> Result<Table, ReadError> {
        match self.parser.parse(path) {
            Ok(table) => Ok(table),
            Err(e) if e.is_lock() => {
                info!(
                    "File {} is locked, reading a temporary copy",
                    path.display()
                );
                match self.read_copy(path) {
                    Ok(table) => Ok(table),
                    Err(copy_err) => {
                        warn!("Temporary copy of {} failed: {}", path.display(), copy_err);
                        Err(e)
                    }
                }
            }
            Err(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    fn read_copy(&self, path: &Path) -> Result<Table, ReadError> {
        let copy_err = |source| ReadError::Copy {
            path: path.to_path_buf(),
            source,
        };

        let temp_dir = tempfile::tempdir().map_err(copy_err)?;
        let file_name = path.file_name().unwrap_or_else(|| OsStr::new("locked.xlsx"));
        let copy_path = temp_dir.path().join(file_name);

        std::fs::copy(path, &copy_path).map_err(copy_err)?;
        let result = self.parser.parse(&copy_path);

        if let Err(e) = temp_dir.close() {
            debug!("Failed to remove temporary copy of {}: {}", path.display(), e);
        }

        result
    }
}
