//! Filename-based routing to the record importers.

use std::path::Path;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::error::ImportError;
use crate::importer::{import_file, ImportOutcome, RecordKind};
use crate::reader::{ResilientReader, SheetParser};
use crate::sanitize::redact_path;
use crate::state::FileStatus;

/// Keyword routes, tried in order against the lower-cased basename.
/// The first route with a matching keyword wins.
const ROUTES: &[(&[&str], RecordKind)] = &[
    (&["client"], RecordKind::Client),
    (&["produit", "product"], RecordKind::Product),
    (&["vente", "sale"], RecordKind::Sale),
];

/// Picks the importer for a filename, or `None` when no keyword matches.
pub fn route(filename: &str) -> Option<RecordKind> {
    let name = filename.to_lowercase();
    ROUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
        .map(|(_, kind)| *kind)
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Imported { kind: RecordKind, rows: u64 },
    Failed { kind: RecordKind, error: ImportError },
    Unrecognized,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Imported { .. })
    }

    /// Status to persist for this attempt.
    pub fn status(&self) -> FileStatus {
        FileStatus::from_success(self.is_success())
    }

    /// True when the same file should be tried again without changing.
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchOutcome::Failed { error, .. } => error.is_retryable(),
            _ => false,
        }
    }
}

/// Routes `path` by name and runs the matching importer.
pub async fn dispatch<P>(
    db: &DatabaseConnection,
    reader: Arc<ResilientReader<P>>,
    path: &Path,
) -> DispatchOutcome
where
    P: SheetParser + 'static,
{
    let file = redact_path(path);
    let Some(kind) = route(&file) else {
        warn!(file = %file, "Unrecognized file type, skipping");
        return DispatchOutcome::Unrecognized;
    };

    match import_file(db, reader, kind, path).await {
        ImportOutcome::Imported { rows } => DispatchOutcome::Imported { kind, rows },
        ImportOutcome::Failed(error) => DispatchOutcome::Failed { kind, error },
    }
}
