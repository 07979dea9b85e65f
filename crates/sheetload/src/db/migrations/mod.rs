//! Warehouse table migrations, applied at startup.

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_file_metadata_table;
mod m20250301_000002_create_clients_table;
mod m20250301_000003_create_produits_table;
mod m20250301_000004_create_ventes_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_file_metadata_table::Migration),
            Box::new(m20250301_000002_create_clients_table::Migration),
            Box::new(m20250301_000003_create_produits_table::Migration),
            Box::new(m20250301_000004_create_ventes_table::Migration),
        ]
    }
}
