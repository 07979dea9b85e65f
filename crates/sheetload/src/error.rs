use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetloadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open workbook '{path}': {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Malformed XML in '{part}': {reason}")]
    Xml { part: String, reason: String },

    #[error("Workbook '{0}' has no worksheet")]
    MissingSheet(PathBuf),

    #[error("Failed to copy locked file '{path}' to a temporary location: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReadError {
    /// True when the file is held open or exclusively locked by another process.
    pub fn is_lock(&self) -> bool {
        match self {
            ReadError::Io { source, .. } => is_lock_io_error(source),
            ReadError::Zip {
                source: zip::result::ZipError::Io(source),
                ..
            } => is_lock_io_error(source),
            _ => false,
        }
    }
}

fn is_lock_io_error(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unreadable file: {0}")]
    Read(#[from] ReadError),

    #[error("Missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Invalid value in row {row}, column '{column}': {reason}")]
    InvalidCell {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("Warehouse write failed: {0}")]
    Write(#[from] sea_orm::DbErr),

    /// The blocking read panicked. The same file would panic again.
    #[error("Read task failed: {0}")]
    Task(String),
}

impl ImportError {
    /// Failures worth retrying on the next cycle without the file changing.
    pub fn is_retryable(&self) -> bool {
        match self {
            ImportError::Write(_) => true,
            ImportError::Read(e) => e.is_lock(),
            ImportError::MissingColumns { .. }
            | ImportError::InvalidCell { .. }
            | ImportError::Task(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Watch directory '{0}' does not exist")]
    MissingDirectory(PathBuf),

    #[error("Directory scan failed for '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

pub type Result<T> = std::result::Result<T, SheetloadError>;
