//! Warehouse table for product records.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Produits::Table)
                    .if_not_exists()
                    .col(pk_auto(Produits::Id))
                    .col(string_len(Produits::ProduitId, 50).not_null())
                    .col(string_null(Produits::Nom))
                    .col(string_null(Produits::Categorie))
                    .col(double_null(Produits::PrixUnitaire))
                    .col(big_integer_null(Produits::StockDisponible))
                    .col(text_null(Produits::Description))
                    .col(string(Produits::SourceFile).not_null())
                    .col(timestamp_with_time_zone(Produits::ImportedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_produits_source_file")
                    .table(Produits::Table)
                    .col(Produits::SourceFile)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Produits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Produits {
    Table,
    Id,
    ProduitId,
    Nom,
    Categorie,
    PrixUnitaire,
    StockDisponible,
    Description,
    SourceFile,
    ImportedAt,
}
