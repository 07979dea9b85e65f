//! Warehouse table for sale records. Client and product ids are not
//! foreign keys; sales may arrive before the records they reference.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ventes::Table)
                    .if_not_exists()
                    .col(pk_auto(Ventes::Id))
                    .col(string_len(Ventes::SaleId, 50).not_null())
                    .col(string_len(Ventes::ClientId, 50).not_null())
                    .col(string_len(Ventes::ProductId, 50).not_null())
                    .col(big_integer_null(Ventes::Quantity))
                    .col(double_null(Ventes::TotalPrice))
                    .col(date_null(Ventes::SaleDate))
                    .col(string(Ventes::SourceFile).not_null())
                    .col(timestamp_with_time_zone(Ventes::ImportedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ventes_source_file")
                    .table(Ventes::Table)
                    .col(Ventes::SourceFile)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ventes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Ventes {
    Table,
    Id,
    SaleId,
    ClientId,
    ProductId,
    Quantity,
    TotalPrice,
    SaleDate,
    SourceFile,
    ImportedAt,
}
