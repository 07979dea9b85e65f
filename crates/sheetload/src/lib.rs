pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod importer;
pub mod reader;
pub mod sanitize;
pub mod schema;
pub mod state;
pub mod telemetry;
pub mod worker;

pub use config::{Config, LogFormat};
pub use dispatcher::{dispatch, route, DispatchOutcome};
pub use error::{ConfigError, ImportError, ReadError, Result, ScanError, SheetloadError};
pub use importer::{import_file, ImportOutcome, RecordKind};
pub use reader::{ResilientReader, RetryPolicy, SheetParser, Table, XlsxParser};
pub use state::{FileStatus, StateStore};
pub use worker::{CycleReport, DirectoryScanner, Poller};
