//! Builds the `INSERT` statement for a record's present fields.

use projhis_core::ProjectField;

/// Target table.
pub const TABLE: &str = "projects_his";

/// Column list for reading a full row back.
pub const COLUMNS: &str = "id, name, client_name, project_type, area_sqm, location_city, \
    total_heating_load_kw, total_cooling_load_kw, system_type, selected_products, \
    total_cost_cny, annual_energy_consumption_kwh, solution_summary, file_attachments, \
    success_rating, created_at";

/// `INSERT INTO projects_his (<fields>) VALUES ($1, ..) RETURNING id`.
///
/// Column names come from [`ProjectField::column`] only; values are left to
/// positional binds in the same order as `fields`.
pub fn insert_statement(fields: &[ProjectField]) -> String {
    let columns = fields
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=fields.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {TABLE} ({columns}) VALUES ({placeholders}) RETURNING id")
}
