//! Record importers.
//!
//! An import reads one spreadsheet, checks its required columns, converts
//! every row into an active model and appends the whole batch inside one
//! transaction. Failures come back as an [`ImportOutcome`] rather than an
//! error so the caller only has to decide what to record.

pub mod cells;
pub mod client;
pub mod product;
pub mod sale;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, TransactionTrait,
};
use tracing::{error, info};

use crate::db::entities::{
    client as client_entity, product as product_entity, sale as sale_entity,
};
use crate::error::ImportError;
use crate::reader::{ResilientReader, Row, SheetParser, Table};
use crate::sanitize::redact_path;
use crate::schema::missing_columns;

/// Rows per multi-row INSERT. Keeps the bind count under SQLite's limit.
const INSERT_CHUNK_SIZE: usize = 100;

/// The kinds of record a spreadsheet can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Client,
    Product,
    Sale,
}

impl RecordKind {
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            RecordKind::Client => client::REQUIRED_COLUMNS,
            RecordKind::Product => product::REQUIRED_COLUMNS,
            RecordKind::Sale => sale::REQUIRED_COLUMNS,
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            RecordKind::Client => "clients",
            RecordKind::Product => "produits",
            RecordKind::Sale => "ventes",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Client => "client",
            RecordKind::Product => "product",
            RecordKind::Sale => "sale",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values attached to every row of one import.
#[derive(Debug, Clone)]
pub struct ImportContext {
    /// Base filename, without directory.
    pub source_file: String,
    pub imported_at: DateTime<Utc>,
}

impl ImportContext {
    pub fn new(source_file: impl Into<String>, imported_at: DateTime<Utc>) -> Self {
        Self {
            source_file: source_file.into(),
            imported_at,
        }
    }
}

#[derive(Debug)]
pub enum ImportOutcome {
    Imported { rows: u64 },
    Failed(ImportError),
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Imported { .. })
    }
}

/// Converted rows, one variant per target table.
#[derive(Debug)]
pub enum ImportBatch {
    Clients(Vec<client_entity::ActiveModel>),
    Products(Vec<product_entity::ActiveModel>),
    Sales(Vec<sale_entity::ActiveModel>),
}

impl ImportBatch {
    /// Converts every row of `table`. The first bad cell fails the batch.
    pub fn from_table(
        kind: RecordKind,
        table: &Table,
        ctx: &ImportContext,
    ) -> Result<Self, ImportError> {
        Ok(match kind {
            RecordKind::Client => {
                ImportBatch::Clients(convert(table, ctx, client::to_active_model)?)
            }
            RecordKind::Product => {
                ImportBatch::Products(convert(table, ctx, product::to_active_model)?)
            }
            RecordKind::Sale => ImportBatch::Sales(convert(table, ctx, sale::to_active_model)?),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            ImportBatch::Clients(rows) => rows.len(),
            ImportBatch::Products(rows) => rows.len(),
            ImportBatch::Sales(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn append(self, txn: &DatabaseTransaction) -> Result<u64, DbErr> {
        match self {
            ImportBatch::Clients(rows) => insert_chunks(txn, rows).await,
            ImportBatch::Products(rows) => insert_chunks(txn, rows).await,
            ImportBatch::Sales(rows) => insert_chunks(txn, rows).await,
        }
    }
}

fn convert<A>(
    table: &Table,
    ctx: &ImportContext,
    to_model: fn(&Row<'_>, &ImportContext) -> Result<A, ImportError>,
) -> Result<Vec<A>, ImportError> {
    table.rows().map(|row| to_model(&row, ctx)).collect()
}

async fn insert_chunks<A>(txn: &DatabaseTransaction, rows: Vec<A>) -> Result<u64, DbErr>
where
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let mut inserted = 0;
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<A> = rows.by_ref().take(INSERT_CHUNK_SIZE).collect();
        let count = chunk.len() as u64;
        <A::Entity as EntityTrait>::insert_many(chunk)
            .exec_without_returning(txn)
            .await?;
        inserted += count;
    }
    Ok(inserted)
}

/// Appends `batch` in a single transaction. Nothing is written on failure.
pub async fn append_batch(db: &DatabaseConnection, batch: ImportBatch) -> Result<u64, DbErr> {
    if batch.is_empty() {
        return Ok(0);
    }
    let txn = db.begin().await?;
    let rows = batch.append(&txn).await?;
    txn.commit().await?;
    Ok(rows)
}

/// Reads, validates and appends one file. Never fails past this point:
/// every error is logged and returned inside the outcome.
pub async fn import_file<P>(
    db: &DatabaseConnection,
    reader: Arc<ResilientReader<P>>,
    kind: RecordKind,
    path: &Path,
) -> ImportOutcome
where
    P: SheetParser + 'static,
{
    let file = redact_path(path);
    match try_import(db, reader, kind, path, &file).await {
        Ok(rows) => {
            info!(file = %file, kind = %kind, rows, "Imported file");
            ImportOutcome::Imported { rows }
        }
        Err(ImportError::MissingColumns { missing }) => {
            error!(
                file = %file,
                kind = %kind,
                missing = %missing.join(", "),
                "File is missing required columns"
            );
            ImportOutcome::Failed(ImportError::MissingColumns { missing })
        }
        Err(e) => {
            error!(file = %file, kind = %kind, error = %e, "Import failed");
            ImportOutcome::Failed(e)
        }
    }
}

async fn try_import<P>(
    db: &DatabaseConnection,
    reader: Arc<ResilientReader<P>>,
    kind: RecordKind,
    path: &Path,
    file: &str,
) -> Result<u64, ImportError>
where
    P: SheetParser + 'static,
{
    let owned_path = path.to_path_buf();
    let table = tokio::task::spawn_blocking(move || reader.read(&owned_path))
        .await
        .map_err(|e| ImportError::Task(e.to_string()))??;

    let missing = missing_columns(&table, kind.required_columns());
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns { missing });
    }

    let ctx = ImportContext::new(file, Utc::now());
    let batch = ImportBatch::from_table(kind, &table, &ctx)?;
    Ok(append_batch(db, batch).await?)
}
