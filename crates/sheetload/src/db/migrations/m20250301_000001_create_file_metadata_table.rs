//! Per-file ingestion state, keyed by base filename.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FileMetadata::Table)
                    .if_not_exists()
                    .col(string(FileMetadata::Filename).primary_key())
                    // NULL until a non-retryable outcome has been recorded.
                    .col(timestamp_with_time_zone_null(FileMetadata::LastModified))
                    .col(timestamp_with_time_zone(FileMetadata::LastProcessed).not_null())
                    .col(string_len(FileMetadata::Status, 16).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FileMetadata::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FileMetadata {
    Table,
    Filename,
    LastModified,
    LastProcessed,
    Status,
}
