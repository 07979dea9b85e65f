//! `ventes` rows.

use sea_orm::ActiveValue::Set;

use super::{cells, ImportContext};
use crate::db::entities::sale;
use crate::error::ImportError;
use crate::reader::Row;

pub const REQUIRED_COLUMNS: &[&str] = &[
    "sale_id",
    "client_id",
    "product_id",
    "quantity",
    "total_price",
    "sale_date",
];

pub fn to_active_model(
    row: &Row<'_>,
    ctx: &ImportContext,
) -> Result<sale::ActiveModel, ImportError> {
    Ok(sale::ActiveModel {
        sale_id: Set(cells::identifier(row, "sale_id")?),
        client_id: Set(cells::identifier(row, "client_id")?),
        product_id: Set(cells::identifier(row, "product_id")?),
        quantity: Set(cells::integer(row, "quantity")?),
        total_price: Set(cells::float(row, "total_price")?),
        sale_date: Set(cells::date(row, "sale_date")?),
        source_file: Set(ctx.source_file.clone()),
        imported_at: Set(ctx.imported_at),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{CellValue, Table};
    use chrono::{NaiveDate, Utc};
    use sea_orm::ActiveValue;

    #[test]
    fn test_sale_row() {
        let table = Table::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![vec![
                CellValue::Text("S1".into()),
                CellValue::Text("C1".into()),
                CellValue::Text("P1".into()),
                CellValue::Number(2.0),
                CellValue::Number(19.98),
                CellValue::Text("2024-01-05".into()),
            ]],
        );
        let ctx = ImportContext::new("ventes_q1.xlsx", Utc::now());
        let model = to_active_model(&table.rows().next().unwrap(), &ctx).unwrap();

        assert_eq!(model.sale_id, ActiveValue::Set("S1".to_string()));
        assert_eq!(model.quantity, ActiveValue::Set(Some(2)));
        assert_eq!(model.total_price, ActiveValue::Set(Some(19.98)));
        assert_eq!(
            model.sale_date,
            ActiveValue::Set(NaiveDate::from_ymd_opt(2024, 1, 5))
        );
        assert_eq!(model.source_file, ActiveValue::Set("ventes_q1.xlsx".to_string()));
    }

    #[test]
    fn test_missing_product_id_rejected() {
        let table = Table::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![vec![
                CellValue::Text("S1".into()),
                CellValue::Text("C1".into()),
                CellValue::Empty,
                CellValue::Number(1.0),
                CellValue::Empty,
                CellValue::Empty,
            ]],
        );
        let ctx = ImportContext::new("ventes.xlsx", Utc::now());
        let err = to_active_model(&table.rows().next().unwrap(), &ctx).unwrap_err();
        assert!(
            matches!(err, ImportError::InvalidCell { ref column, .. } if column == "product_id")
        );
    }
}
