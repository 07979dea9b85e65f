//! `produits` rows.

use sea_orm::ActiveValue::Set;

use super::{cells, ImportContext};
use crate::db::entities::product;
use crate::error::ImportError;
use crate::reader::Row;

pub const REQUIRED_COLUMNS: &[&str] = &[
    "produit_id",
    "nom",
    "categorie",
    "prix_unitaire",
    "stock_disponible",
    "description",
];

pub fn to_active_model(
    row: &Row<'_>,
    ctx: &ImportContext,
) -> Result<product::ActiveModel, ImportError> {
    Ok(product::ActiveModel {
        produit_id: Set(cells::identifier(row, "produit_id")?),
        nom: Set(cells::text(row, "nom")),
        categorie: Set(cells::text(row, "categorie")),
        prix_unitaire: Set(cells::float(row, "prix_unitaire")?),
        stock_disponible: Set(cells::integer(row, "stock_disponible")?),
        description: Set(cells::text(row, "description")),
        source_file: Set(ctx.source_file.clone()),
        imported_at: Set(ctx.imported_at),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{CellValue, Table};
    use chrono::Utc;
    use sea_orm::ActiveValue;

    fn row_with_stock(stock: CellValue) -> Table {
        Table::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![vec![
                CellValue::Text("P-1".into()),
                CellValue::Text("Clavier".into()),
                CellValue::Text("Informatique".into()),
                CellValue::Number(49.9),
                stock,
                CellValue::Empty,
            ]],
        )
    }

    #[test]
    fn test_numeric_columns() {
        let table = row_with_stock(CellValue::Text("12".into()));
        let ctx = ImportContext::new("produits.xlsx", Utc::now());
        let model = to_active_model(&table.rows().next().unwrap(), &ctx).unwrap();

        assert_eq!(model.prix_unitaire, ActiveValue::Set(Some(49.9)));
        assert_eq!(model.stock_disponible, ActiveValue::Set(Some(12)));
        assert_eq!(model.description, ActiveValue::Set(None));
    }

    #[test]
    fn test_fractional_stock_rejected() {
        let table = row_with_stock(CellValue::Number(1.5));
        let ctx = ImportContext::new("produits.xlsx", Utc::now());
        let err = to_active_model(&table.rows().next().unwrap(), &ctx).unwrap_err();
        assert!(
            matches!(err, ImportError::InvalidCell { ref column, .. } if column == "stock_disponible")
        );
    }
}
