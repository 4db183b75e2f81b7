//! The project record and its fixed schema descriptor.

use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::types::{JsonMap, Timestamp};

// ---------------------------------------------------------------------------
// Schema descriptor
// ---------------------------------------------------------------------------

/// How a field is entered and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text.
    Line,
    /// Multi-line free text.
    Text,
    /// Non-integral number.
    Decimal,
    /// Integer score in `1..=5`.
    Rating,
    /// JSON object entered as text, stored as `JSONB`.
    Json,
    /// Assigned by the system, never entered.
    Timestamp,
}

/// Every column of the `projects_his` table except the generated `id`.
///
/// Column identifiers come only from here, never from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectField {
    Name,
    ClientName,
    ProjectType,
    AreaSqm,
    LocationCity,
    TotalHeatingLoadKw,
    TotalCoolingLoadKw,
    SystemType,
    SelectedProducts,
    TotalCostCny,
    AnnualEnergyConsumptionKwh,
    SolutionSummary,
    FileAttachments,
    SuccessRating,
    CreatedAt,
}

impl ProjectField {
    /// All fields in column order.
    pub const ALL: [ProjectField; 15] = [
        Self::Name,
        Self::ClientName,
        Self::ProjectType,
        Self::AreaSqm,
        Self::LocationCity,
        Self::TotalHeatingLoadKw,
        Self::TotalCoolingLoadKw,
        Self::SystemType,
        Self::SelectedProducts,
        Self::TotalCostCny,
        Self::AnnualEnergyConsumptionKwh,
        Self::SolutionSummary,
        Self::FileAttachments,
        Self::SuccessRating,
        Self::CreatedAt,
    ];

    /// SQL column identifier, also used as the form input key.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ClientName => "client_name",
            Self::ProjectType => "project_type",
            Self::AreaSqm => "area_sqm",
            Self::LocationCity => "location_city",
            Self::TotalHeatingLoadKw => "total_heating_load_kw",
            Self::TotalCoolingLoadKw => "total_cooling_load_kw",
            Self::SystemType => "system_type",
            Self::SelectedProducts => "selected_products",
            Self::TotalCostCny => "total_cost_cny",
            Self::AnnualEnergyConsumptionKwh => "annual_energy_consumption_kwh",
            Self::SolutionSummary => "solution_summary",
            Self::FileAttachments => "file_attachments",
            Self::SuccessRating => "success_rating",
            Self::CreatedAt => "created_at",
        }
    }

    /// Human-readable label shown next to the input.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Project name *",
            Self::ClientName => "Client name *",
            Self::ProjectType => "Project type",
            Self::AreaSqm => "Area (m²)",
            Self::LocationCity => "City",
            Self::TotalHeatingLoadKw => "Total heating load (kW)",
            Self::TotalCoolingLoadKw => "Total cooling load (kW)",
            Self::SystemType => "System type",
            Self::SelectedProducts => "Selected products (JSON)",
            Self::TotalCostCny => "Total cost (CNY)",
            Self::AnnualEnergyConsumptionKwh => "Annual energy consumption (kWh)",
            Self::SolutionSummary => "Solution summary",
            Self::FileAttachments => "File attachments (JSON)",
            Self::SuccessRating => "Success rating (1-5)",
            Self::CreatedAt => "Created at",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Name
            | Self::ClientName
            | Self::ProjectType
            | Self::LocationCity
            | Self::SystemType => FieldKind::Line,
            Self::SolutionSummary => FieldKind::Text,
            Self::AreaSqm
            | Self::TotalHeatingLoadKw
            | Self::TotalCoolingLoadKw
            | Self::TotalCostCny
            | Self::AnnualEnergyConsumptionKwh => FieldKind::Decimal,
            Self::SelectedProducts | Self::FileAttachments => FieldKind::Json,
            Self::SuccessRating => FieldKind::Rating,
            Self::CreatedAt => FieldKind::Timestamp,
        }
    }

    pub const fn is_required(self) -> bool {
        matches!(self, Self::Name | Self::ClientName)
    }

    /// Whether the user supplies this field (everything except `created_at`).
    pub const fn is_user_editable(self) -> bool {
        !matches!(self, Self::CreatedAt)
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A borrowed, present field value ready to be bound as a query parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Decimal(f64),
    Integer(i32),
    Json(&'a JsonMap),
    Timestamp(Timestamp),
}

// ---------------------------------------------------------------------------
// ProjectRecord
// ---------------------------------------------------------------------------

/// A validated project record.
///
/// Only obtainable through [`ProjectRecord::from_form`], so every instance
/// has non-blank required fields, parsed structured maps, and an in-range
/// rating. Absent optional fields are `None`.
///
/// [`ProjectRecord::from_form`]: crate::record::ProjectRecord::from_form
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct ProjectRecord {
    #[validate(length(min = 1))]
    pub(crate) name: String,
    #[validate(length(min = 1))]
    pub(crate) client_name: String,
    pub(crate) project_type: Option<String>,
    #[validate(range(min = 0.0))]
    pub(crate) area_sqm: Option<f64>,
    pub(crate) location_city: Option<String>,
    pub(crate) total_heating_load_kw: Option<f64>,
    pub(crate) total_cooling_load_kw: Option<f64>,
    pub(crate) system_type: Option<String>,
    pub(crate) selected_products: Option<JsonMap>,
    pub(crate) total_cost_cny: Option<f64>,
    pub(crate) annual_energy_consumption_kwh: Option<f64>,
    pub(crate) solution_summary: Option<String>,
    pub(crate) file_attachments: Option<JsonMap>,
    #[validate(range(min = 1, max = 5))]
    pub(crate) success_rating: Option<i32>,
    pub(crate) created_at: Timestamp,
}

impl ProjectRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn selected_products(&self) -> Option<&JsonMap> {
        self.selected_products.as_ref()
    }

    pub fn file_attachments(&self) -> Option<&JsonMap> {
        self.file_attachments.as_ref()
    }

    pub fn success_rating(&self) -> Option<i32> {
        self.success_rating
    }

    /// The value of `field`, or `None` if it is absent.
    pub fn get(&self, field: ProjectField) -> Option<FieldValue<'_>> {
        match field {
            ProjectField::Name => Some(FieldValue::Text(&self.name)),
            ProjectField::ClientName => Some(FieldValue::Text(&self.client_name)),
            ProjectField::ProjectType => self.project_type.as_deref().map(FieldValue::Text),
            ProjectField::AreaSqm => self.area_sqm.map(FieldValue::Decimal),
            ProjectField::LocationCity => self.location_city.as_deref().map(FieldValue::Text),
            ProjectField::TotalHeatingLoadKw => self.total_heating_load_kw.map(FieldValue::Decimal),
            ProjectField::TotalCoolingLoadKw => self.total_cooling_load_kw.map(FieldValue::Decimal),
            ProjectField::SystemType => self.system_type.as_deref().map(FieldValue::Text),
            ProjectField::SelectedProducts => self.selected_products.as_ref().map(FieldValue::Json),
            ProjectField::TotalCostCny => self.total_cost_cny.map(FieldValue::Decimal),
            ProjectField::AnnualEnergyConsumptionKwh => {
                self.annual_energy_consumption_kwh.map(FieldValue::Decimal)
            }
            ProjectField::SolutionSummary => self.solution_summary.as_deref().map(FieldValue::Text),
            ProjectField::FileAttachments => self.file_attachments.as_ref().map(FieldValue::Json),
            ProjectField::SuccessRating => self.success_rating.map(FieldValue::Integer),
            ProjectField::CreatedAt => Some(FieldValue::Timestamp(self.created_at)),
        }
    }

    /// Present fields in column order. This is exactly the column set an
    /// insert of this record names.
    pub fn present_fields(&self) -> Vec<(ProjectField, FieldValue<'_>)> {
        ProjectField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
            .collect()
    }

    /// Record stored attachment file names under the `"files"` key of
    /// `file_attachments`, keeping any other keys the user entered.
    ///
    /// If the user already listed `"files"` as an array, the new names are
    /// appended to it, skipping names already listed. Any other value under
    /// that key is replaced. An empty `names` list leaves the record
    /// unchanged.
    pub fn with_attachment_names(mut self, names: &[String]) -> Self {
        if names.is_empty() {
            return self;
        }
        let map = self.file_attachments.get_or_insert_with(JsonMap::new);
        let mut files = match map.remove(ATTACHMENT_FILES_KEY) {
            Some(Value::Array(existing)) => existing,
            _ => Vec::new(),
        };
        for name in names {
            let value = Value::String(name.clone());
            if !files.contains(&value) {
                files.push(value);
            }
        }
        map.insert(ATTACHMENT_FILES_KEY.to_string(), Value::Array(files));
        self
    }
}

/// Key under which stored attachment file names are listed.
pub const ATTACHMENT_FILES_KEY: &str = "files";

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::*;

    fn minimal() -> ProjectRecord {
        let mut input = Map::new();
        input.insert("name".into(), json!("Tower A"));
        input.insert("client_name".into(), json!("Acme"));
        ProjectRecord::from_form(&input).unwrap()
    }

    #[test]
    fn columns_round_trip_through_from_column() {
        for field in ProjectField::ALL {
            assert_eq!(ProjectField::from_column(field.column()), Some(field));
        }
        assert_eq!(ProjectField::from_column("id"), None);
        assert_eq!(ProjectField::from_column("name; DROP TABLE"), None);
    }

    #[test]
    fn only_name_and_client_are_required() {
        let required: Vec<_> = ProjectField::ALL
            .into_iter()
            .filter(|f| f.is_required())
            .collect();
        assert_eq!(required, vec![ProjectField::Name, ProjectField::ClientName]);
    }

    #[test]
    fn minimal_record_presents_required_fields_and_timestamp() {
        let record = minimal();
        let fields: Vec<_> = record.present_fields().into_iter().map(|(f, _)| f).collect();
        assert_eq!(
            fields,
            vec![ProjectField::Name, ProjectField::ClientName, ProjectField::CreatedAt]
        );
    }

    #[test]
    fn attachment_names_merge_into_existing_map() {
        let mut input = Map::new();
        input.insert("name".into(), json!("Tower A"));
        input.insert("client_name".into(), json!("Acme"));
        input.insert("file_attachments".into(), json!(r#"{"note": "drawings"}"#));
        let record = ProjectRecord::from_form(&input)
            .unwrap()
            .with_attachment_names(&["plan.pdf".to_string(), "load.xlsx".to_string()]);

        let map = record.file_attachments().unwrap();
        assert_eq!(map["note"], json!("drawings"));
        assert_eq!(map["files"], json!(["plan.pdf", "load.xlsx"]));
    }

    #[test]
    fn attachment_names_extend_user_files_list() {
        let mut input = Map::new();
        input.insert("name".into(), json!("Tower A"));
        input.insert("client_name".into(), json!("Acme"));
        input.insert(
            "file_attachments".into(),
            json!(r#"{"files": ["survey.pdf", "plan.pdf"]}"#),
        );
        let record = ProjectRecord::from_form(&input)
            .unwrap()
            .with_attachment_names(&["plan.pdf".to_string(), "load.xlsx".to_string()]);

        let map = record.file_attachments().unwrap();
        assert_eq!(map["files"], json!(["survey.pdf", "plan.pdf", "load.xlsx"]));
    }

    #[test]
    fn attachment_names_replace_non_list_files_value() {
        let mut input = Map::new();
        input.insert("name".into(), json!("Tower A"));
        input.insert("client_name".into(), json!("Acme"));
        input.insert("file_attachments".into(), json!(r#"{"files": "see email"}"#));
        let record = ProjectRecord::from_form(&input)
            .unwrap()
            .with_attachment_names(&["plan.pdf".to_string()]);

        assert_eq!(record.file_attachments().unwrap()["files"], json!(["plan.pdf"]));
    }

    #[test]
    fn no_attachment_names_keeps_field_absent() {
        let record = minimal().with_attachment_names(&[]);
        assert!(record.file_attachments().is_none());
        assert!(record.get(ProjectField::FileAttachments).is_none());
    }
}
