use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::state::watermark;

/// Prefix of the owner files spreadsheet applications create next to an
/// open workbook.
const LOCK_FILE_PREFIX: &str = "~$";

/// A workbook found in the watched directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Base filename, the key for ingestion state.
    pub filename: String,
    /// Modification time, already truncated to watermark precision.
    pub modified: DateTime<Utc>,
}

pub struct DirectoryScanner {
    input_directory: PathBuf,
}

impl DirectoryScanner {
    pub fn new<P: AsRef<Path>>(input_directory: P) -> Self {
        Self {
            input_directory: input_directory.as_ref().to_path_buf(),
        }
    }

    pub fn input_directory(&self) -> &Path {
        &self.input_directory
    }

    /// Lists `.xlsx` files directly inside the directory, sorted by name.
    pub fn scan(&self) -> Result<Vec<Candidate>, ScanError> {
        if !self.input_directory.is_dir() {
            return Err(ScanError::MissingDirectory(self.input_directory.clone()));
        }

        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.input_directory)
            .min_depth(1)
            .max_depth(1) // Top level only
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ScanError::Walk {
                        path: self.input_directory.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(filename) = entry.file_name().to_str() else {
                continue;
            };
            if !is_workbook_name(filename) {
                continue;
            }

            // The file may vanish between listing and stat.
            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(modified)) => modified,
                Ok(Err(e)) => {
                    warn!("No modification time for {}: {}", filename, e);
                    continue;
                }
                Err(e) => {
                    warn!("Cannot stat {}: {}", filename, e);
                    continue;
                }
            };

            debug!("Found workbook: {}", filename);
            candidates.push(Candidate {
                path: entry.path().to_path_buf(),
                filename: filename.to_string(),
                modified: watermark(modified),
            });
        }

        debug!(
            "Scanned {} workbooks in {}",
            candidates.len(),
            self.input_directory.display()
        );
        Ok(candidates)
    }
}

fn is_workbook_name(filename: &str) -> bool {
    !filename.starts_with(LOCK_FILE_PREFIX)
        && Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false)
}
