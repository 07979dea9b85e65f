//! Column-presence validation for parsed tables.

use crate::reader::Table;

/// Returns the required columns absent from `table`, in `required` order.
/// Matching is exact; cell contents are not inspected.
pub fn missing_columns(table: &Table, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect()
}
