//! Test harness driving the poller against an isolated environment.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use sheetload::db::WarehouseOptions;
use sheetload::worker::{CycleReport, DirectoryScanner, PollIntervals, Poller};
use sheetload::{ResilientReader, RetryPolicy, SheetParser, XlsxParser};

use super::builders::{write_bare_sheet, WorkbookBuilder};

pub struct TestHarness<P = XlsxParser> {
    /// Keeps the watched directory alive.
    temp_dir: TempDir,
    pub watch_dir: PathBuf,
    pub poller: Poller<P>,
}

impl TestHarness<XlsxParser> {
    pub fn new() -> Self {
        Self::with_parser(XlsxParser::new())
    }
}

impl<P: SheetParser + 'static> TestHarness<P> {
    /// A harness whose reader wraps `parser` instead of the xlsx parser.
    pub fn with_parser(parser: P) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let watch_dir = temp_dir.path().join("data");
        std::fs::create_dir_all(&watch_dir).expect("Failed to create watch directory");

        let poller = Poller::new(
            WarehouseOptions::new("sqlite::memory:").with_max_connections(1),
            DirectoryScanner::new(&watch_dir),
            Arc::new(ResilientReader::new(
                parser,
                RetryPolicy::new(2, Duration::ZERO),
            )),
            PollIntervals {
                poll: Duration::from_millis(10),
                error_backoff: Duration::from_millis(10),
                reconnect_backoff: Duration::from_millis(10),
            },
        );

        Self {
            temp_dir,
            watch_dir,
            poller,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.watch_dir.join(name)
    }

    /// Writes `workbook` into the watched directory.
    pub fn write(&self, name: &str, workbook: &WorkbookBuilder) -> PathBuf {
        let path = self.path(name);
        workbook.write(&path);
        path
    }

    /// Writes a package whose only part is the given worksheet XML.
    pub fn write_bare_sheet(&self, name: &str, sheet_xml: &str) -> PathBuf {
        let path = self.path(name);
        write_bare_sheet(&path, sheet_xml);
        path
    }

    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, bytes).expect("Failed to write file");
        path
    }

    /// Moves a file's modification time `secs` seconds into the future.
    pub fn touch(&self, name: &str, secs: u64) {
        let path = self.path(name);
        let modified = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .expect("Failed to read mtime");
        let file = std::fs::File::options()
            .write(true)
            .open(&path)
            .expect("Failed to open file");
        file.set_modified(modified + Duration::from_secs(secs))
            .expect("Failed to set mtime");
    }

    pub fn modified(&self, name: &str) -> SystemTime {
        std::fs::metadata(self.path(name))
            .and_then(|m| m.modified())
            .expect("Failed to read mtime")
    }

    pub async fn cycle(&mut self) -> CycleReport {
        self.poller.run_cycle().await.expect("Polling cycle failed")
    }

    /// The warehouse handle. Only available after the first cycle.
    pub fn db(&self) -> DatabaseConnection {
        self.poller
            .connection()
            .cloned()
            .expect("No warehouse connection yet; run a cycle first")
    }
}
