//! Warehouse table for client records.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(pk_auto(Clients::Id))
                    .col(string_len(Clients::ClientId, 50).not_null())
                    .col(string_null(Clients::Nom))
                    .col(string_null(Clients::Prenom))
                    .col(string_null(Clients::Email))
                    .col(string_null(Clients::Telephone))
                    .col(text_null(Clients::Adresse))
                    .col(string(Clients::SourceFile).not_null())
                    .col(timestamp_with_time_zone(Clients::ImportedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clients_source_file")
                    .table(Clients::Table)
                    .col(Clients::SourceFile)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    ClientId,
    Nom,
    Prenom,
    Email,
    Telephone,
    Adresse,
    SourceFile,
    ImportedAt,
}
