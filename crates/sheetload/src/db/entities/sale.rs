//! Sale records appended from `vente*` / `sale*` spreadsheets.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ventes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub sale_id: String,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub client_id: String,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub product_id: String,
    pub quantity: Option<i64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub total_price: Option<f64>,
    pub sale_date: Option<Date>,
    pub source_file: String,
    pub imported_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
