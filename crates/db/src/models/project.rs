//! Row model for reading a stored project back.

use serde::Serialize;
use sqlx::FromRow;
use projhis_core::types::{DbId, Timestamp};

/// A row from the `projects_his` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectRow {
    pub id: DbId,
    pub name: String,
    pub client_name: String,
    pub project_type: Option<String>,
    pub area_sqm: Option<f64>,
    pub location_city: Option<String>,
    pub total_heating_load_kw: Option<f64>,
    pub total_cooling_load_kw: Option<f64>,
    pub system_type: Option<String>,
    pub selected_products: Option<serde_json::Value>,
    pub total_cost_cny: Option<f64>,
    pub annual_energy_consumption_kwh: Option<f64>,
    pub solution_summary: Option<String>,
    pub file_attachments: Option<serde_json::Value>,
    pub success_rating: Option<i32>,
    pub created_at: Timestamp,
}
