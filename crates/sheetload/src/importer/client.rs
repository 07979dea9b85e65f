//! `clients` rows.

use sea_orm::ActiveValue::Set;

use super::{cells, ImportContext};
use crate::db::entities::client;
use crate::error::ImportError;
use crate::reader::Row;

pub const REQUIRED_COLUMNS: &[&str] = &[
    "client_id",
    "nom",
    "prenom",
    "email",
    "telephone",
    "adresse",
];

pub fn to_active_model(
    row: &Row<'_>,
    ctx: &ImportContext,
) -> Result<client::ActiveModel, ImportError> {
    Ok(client::ActiveModel {
        client_id: Set(cells::identifier(row, "client_id")?),
        nom: Set(cells::text(row, "nom")),
        prenom: Set(cells::text(row, "prenom")),
        email: Set(cells::text(row, "email")),
        telephone: Set(cells::text(row, "telephone")),
        adresse: Set(cells::text(row, "adresse")),
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

    #[test]
    fn test_phone_number_cell_keeps_digits() {
        let table = Table::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![vec![
                CellValue::Number(1.0),
                CellValue::Text("Dupont".into()),
                CellValue::Text("Marie".into()),
                CellValue::Empty,
                CellValue::Number(612345678.0),
                CellValue::Text("1 rue de la Paix".into()),
            ]],
        );
        let ctx = ImportContext::new("clients.xlsx", Utc::now());
        let model = to_active_model(&table.rows().next().unwrap(), &ctx).unwrap();

        assert_eq!(model.client_id, ActiveValue::Set("1".to_string()));
        assert_eq!(model.email, ActiveValue::Set(None));
        assert_eq!(
            model.telephone,
            ActiveValue::Set(Some("612345678".to_string()))
        );
        assert_eq!(model.source_file, ActiveValue::Set("clients.xlsx".to_string()));
        assert!(model.id.is_not_set());
    }
}
