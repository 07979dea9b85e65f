//! File metadata repository: access to the `file_metadata` table.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ConnectionTrait, EntityTrait};

use super::entities::file_metadata::{ActiveModel, Column, FileStatus, Model};
use super::entities::FileMetadata;
use super::DatabaseError;
use chrono::{DateTime, Utc};

/// Finds the state row for a filename.
pub async fn find<C>(db: &C, filename: &str) -> Result<Option<Model>, DatabaseError>
where
    C: ConnectionTrait,
{
    Ok(FileMetadata::find_by_id(filename.to_string()).one(db).await?)
}

/// Inserts or replaces the watermark, processing time and status in a
/// single statement.
pub async fn upsert<C>(
    db: &C,
    filename: &str,
    last_modified: DateTime<Utc>,
    last_processed: DateTime<Utc>,
    status: FileStatus,
) -> Result<(), DatabaseError>
where
    C: ConnectionTrait,
{
    let row = ActiveModel {
        filename: Set(filename.to_string()),
        last_modified: Set(Some(last_modified)),
        last_processed: Set(last_processed),
        status: Set(status),
    };

    FileMetadata::insert(row)
        .on_conflict(
            OnConflict::column(Column::Filename)
                .update_columns([Column::LastModified, Column::LastProcessed, Column::Status])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Records an attempt without touching an existing watermark. A new row
/// gets a NULL watermark.
pub async fn upsert_keep_watermark<C>(
    db: &C,
    filename: &str,
    last_processed: DateTime<Utc>,
    status: FileStatus,
) -> Result<(), DatabaseError>
where
    C: ConnectionTrait,
{
    let row = ActiveModel {
        filename: Set(filename.to_string()),
        last_modified: Set(None),
        last_processed: Set(last_processed),
        status: Set(status),
    };

    FileMetadata::insert(row)
        .on_conflict(
            OnConflict::column(Column::Filename)
                .update_columns([Column::LastProcessed, Column::Status])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}
