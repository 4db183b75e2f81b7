//! Coercion of raw form input into a validated [`ProjectRecord`].
//!
//! Rules, per field kind:
//!
//! | Kind    | Absent when                              | Rejected when                         |
//! |---------|------------------------------------------|---------------------------------------|
//! | text    | missing, `null`, blank after trimming    | array / object / bool                 |
//! | decimal | missing, `null`, blank, or exactly `0`   | non-numeric text, non-finite, negative area |
//! | rating  | missing, `null`, blank                   | fractional, outside `1..=5`           |
//! | JSON    | missing, `null`, blank                   | unparseable text, JSON that is not an object |
//!
//! The zero rule for decimals means a measured value of `0` cannot be told
//! apart from "not entered". Ratings are exempt: `0` is out of range here,
//! and the form treats its unrated widget state as absent before calling in.

use chrono::{SubsecRound, Utc};
use serde_json::Value;
use validator::Validate;

use crate::error::{FieldViolation, ValidationError, ViolationKind};
use crate::record::{ProjectField, ProjectRecord};
use crate::types::{JsonMap, Timestamp};

/// Raw form input: field column name to raw value.
///
/// Text entries arrive as strings, spin boxes as numbers, structured fields
/// as JSON text. Keys that are not user-editable columns are ignored.
pub type FormInput = serde_json::Map<String, Value>;

impl ProjectRecord {
    /// Validate `input` and stamp `created_at` with the current time.
    pub fn from_form(input: &FormInput) -> Result<Self, ValidationError> {
        validate_form_at(input, Utc::now())
    }
}

/// Validate `input`, stamping `created_at` with `now`.
///
/// Collects every violation rather than stopping at the first. The timestamp
/// is truncated to microseconds, the precision of `TIMESTAMPTZ`.
pub fn validate_form_at(input: &FormInput, now: Timestamp) -> Result<ProjectRecord, ValidationError> {
    let mut c = Coercer::new(input);

    let record = ProjectRecord {
        name: c.text(ProjectField::Name).unwrap_or_default(),
        client_name: c.text(ProjectField::ClientName).unwrap_or_default(),
        project_type: c.text(ProjectField::ProjectType),
        area_sqm: c.decimal(ProjectField::AreaSqm),
        location_city: c.text(ProjectField::LocationCity),
        total_heating_load_kw: c.decimal(ProjectField::TotalHeatingLoadKw),
        total_cooling_load_kw: c.decimal(ProjectField::TotalCoolingLoadKw),
        system_type: c.text(ProjectField::SystemType),
        selected_products: c.json(ProjectField::SelectedProducts),
        total_cost_cny: c.decimal(ProjectField::TotalCostCny),
        annual_energy_consumption_kwh: c.decimal(ProjectField::AnnualEnergyConsumptionKwh),
        solution_summary: c.text(ProjectField::SolutionSummary),
        file_attachments: c.json(ProjectField::FileAttachments),
        success_rating: c.rating(ProjectField::SuccessRating),
        created_at: now.trunc_subsecs(6),
    };

    let mut violations = c.into_violations();

    if let Err(errors) = record.validate() {
        for (field, _) in errors.field_errors() {
            let Some(field) = ProjectField::from_column(field.as_ref()) else {
                continue;
            };
            // A field that already failed coercion is reported once.
            if !violations.iter().any(|v| v.field == field.column()) {
                violations.push(constraint_violation(&record, field));
            }
        }
    }

    violations.sort_by_key(|v| {
        ProjectField::ALL
            .iter()
            .position(|f| f.column() == v.field)
            .unwrap_or(usize::MAX)
    });

    match ValidationError::from_violations(violations) {
        Some(err) => Err(err),
        None => Ok(record),
    }
}

/// Describe a failed `#[validate]` constraint on `field`.
fn constraint_violation(record: &ProjectRecord, field: ProjectField) -> FieldViolation {
    let column = field.column();
    match field {
        ProjectField::Name | ProjectField::ClientName => {
            FieldViolation::new(column, ViolationKind::Required, format!("{column} is required"))
        }
        ProjectField::AreaSqm => FieldViolation::new(
            column,
            ViolationKind::OutOfRange,
            format!(
                "{column} must not be negative, got {}",
                record.area_sqm.unwrap_or_default()
            ),
        ),
        ProjectField::SuccessRating => FieldViolation::new(
            column,
            ViolationKind::OutOfRange,
            format!(
                "{column} must be between 1 and 5, got {}",
                record.success_rating.unwrap_or_default()
            ),
        ),
        _ => FieldViolation::new(column, ViolationKind::OutOfRange, format!("{column} is invalid")),
    }
}

// ---------------------------------------------------------------------------
// Coercer
// ---------------------------------------------------------------------------

/// Reads raw values out of the input map, recording type-level failures.
struct Coercer<'a> {
    input: &'a FormInput,
    violations: Vec<FieldViolation>,
}

impl<'a> Coercer<'a> {
    fn new(input: &'a FormInput) -> Self {
        Self {
            input,
            violations: Vec::new(),
        }
    }

    fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }

    fn raw(&self, field: ProjectField) -> Option<&'a Value> {
        match self.input.get(field.column()) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn reject(&mut self, field: ProjectField, kind: ViolationKind, message: String) {
        self.violations.push(FieldViolation::new(field.column(), kind, message));
    }

    fn text(&mut self, field: ProjectField) -> Option<String> {
        match self.raw(field)? {
            Value::String(s) => non_blank(s).map(str::to_string),
            Value::Number(n) => Some(n.to_string()),
            other => {
                self.reject(
                    field,
                    ViolationKind::WrongType,
                    format!("{} must be text, got {}", field.column(), type_name(other)),
                );
                None
            }
        }
    }

    fn decimal(&mut self, field: ProjectField) -> Option<f64> {
        let value = match self.raw(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let s = non_blank(s)?;
                match s.parse::<f64>() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        self.reject(
                            field,
                            ViolationKind::NotANumber,
                            format!("{} must be a number, got {s:?}", field.column()),
                        );
                        return None;
                    }
                }
            }
            other => {
                self.reject(
                    field,
                    ViolationKind::WrongType,
                    format!("{} must be a number, got {}", field.column(), type_name(other)),
                );
                return None;
            }
        };

        match value {
            Some(v) if !v.is_finite() => {
                self.reject(
                    field,
                    ViolationKind::NotANumber,
                    format!("{} must be a finite number", field.column()),
                );
                None
            }
            Some(v) if v == 0.0 => None,
            other => other,
        }
    }

    fn rating(&mut self, field: ProjectField) -> Option<i32> {
        let number = match self.raw(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => non_blank(s)?.parse::<f64>().ok(),
            other => {
                self.reject(
                    field,
                    ViolationKind::WrongType,
                    format!("{} must be an integer, got {}", field.column(), type_name(other)),
                );
                return None;
            }
        };

        let Some(number) = number.filter(|n| n.is_finite()) else {
            self.reject(
                field,
                ViolationKind::NotANumber,
                format!("{} must be an integer", field.column()),
            );
            return None;
        };

        if number.fract() != 0.0 {
            self.reject(
                field,
                ViolationKind::NotAnInteger,
                format!("{} must be a whole number, got {number}", field.column()),
            );
            return None;
        }

        if number < f64::from(i32::MIN) || number > f64::from(i32::MAX) {
            self.reject(
                field,
                ViolationKind::OutOfRange,
                format!("{} must be between 1 and 5, got {number}", field.column()),
            );
            return None;
        }

        // Range checked above; the 1..=5 bound is enforced by `Validate`.
        Some(number as i32)
    }

    fn json(&mut self, field: ProjectField) -> Option<JsonMap> {
        let parsed = match self.raw(field)? {
            Value::String(s) => {
                let s = non_blank(s)?;
                match serde_json::from_str::<Value>(s) {
                    Ok(v) => v,
                    Err(e) => {
                        self.reject(
                            field,
                            ViolationKind::InvalidJson,
                            format!("{} is not valid JSON: {e}", field.column()),
                        );
                        return None;
                    }
                }
            }
            other => other.clone(),
        };

        match parsed {
            Value::Object(map) => Some(map),
            other => {
                self.reject(
                    field,
                    ViolationKind::NotAnObject,
                    format!("{} must be a JSON object, got {}", field.column(), type_name(&other)),
                );
                None
            }
        }
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::record::FieldValue;

    fn input(pairs: &[(&str, Value)]) -> FormInput {
        let mut map = FormInput::new();
        map.insert("name".into(), json!("Riverside Offices"));
        map.insert("client_name".into(), json!("Huatai Property"));
        for (k, v) in pairs {
            map.insert((*k).to_string(), v.clone());
        }
        map
    }

    fn single_violation(result: Result<ProjectRecord, ValidationError>) -> FieldViolation {
        let err = result.expect_err("validation should fail");
        assert_eq!(err.violations().len(), 1, "unexpected violations: {err}");
        err.first().clone()
    }

    // -- required fields --

    #[test]
    fn required_fields_only_is_valid() {
        let record = ProjectRecord::from_form(&input(&[])).unwrap();
        assert_eq!(record.name(), "Riverside Offices");
        assert_eq!(record.client_name(), "Huatai Property");
        for field in ProjectField::ALL {
            if !field.is_required() && field.is_user_editable() {
                assert!(record.get(field).is_none(), "{field:?} should be absent");
            }
        }
    }

    #[test]
    fn missing_and_blank_required_fields_are_all_reported() {
        let mut raw = FormInput::new();
        raw.insert("name".into(), json!("   "));
        let err = ProjectRecord::from_form(&raw).unwrap_err();

        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["name", "client_name"]);
        assert!(err.violations().iter().all(|v| v.kind == ViolationKind::Required));
    }

    #[test]
    fn text_is_trimmed_and_blank_optional_text_is_absent() {
        let record = ProjectRecord::from_form(&input(&[
            ("project_type", json!("  office  ")),
            ("location_city", json!("")),
            ("system_type", json!("   ")),
        ]))
        .unwrap();
        assert_eq!(
            record.get(ProjectField::ProjectType),
            Some(FieldValue::Text("office"))
        );
        assert!(record.get(ProjectField::LocationCity).is_none());
        assert!(record.get(ProjectField::SystemType).is_none());
    }

    #[test]
    fn non_text_value_for_text_field_is_rejected() {
        let v = single_violation(ProjectRecord::from_form(&input(&[(
            "location_city",
            json!(["Shanghai"]),
        )])));
        assert_eq!(v.field, "location_city");
        assert_eq!(v.kind, ViolationKind::WrongType);
    }

    // -- decimals --

    #[test]
    fn zero_decimal_is_absent() {
        let record = ProjectRecord::from_form(&input(&[
            ("area_sqm", json!(0)),
            ("total_heating_load_kw", json!(0.0)),
            ("total_cost_cny", json!("0")),
        ]))
        .unwrap();
        assert!(record.get(ProjectField::AreaSqm).is_none());
        assert!(record.get(ProjectField::TotalHeatingLoadKw).is_none());
        assert!(record.get(ProjectField::TotalCostCny).is_none());
    }

    #[test]
    fn near_zero_decimal_is_kept() {
        let record = ProjectRecord::from_form(&input(&[("total_cooling_load_kw", json!(0.01))]))
            .unwrap();
        assert_eq!(
            record.get(ProjectField::TotalCoolingLoadKw),
            Some(FieldValue::Decimal(0.01))
        );
    }

    #[test]
    fn numeric_text_is_parsed() {
        let record = ProjectRecord::from_form(&input(&[
            ("area_sqm", json!(" 1250.5 ")),
            ("annual_energy_consumption_kwh", json!("98000")),
        ]))
        .unwrap();
        assert_eq!(record.get(ProjectField::AreaSqm), Some(FieldValue::Decimal(1250.5)));
        assert_eq!(
            record.get(ProjectField::AnnualEnergyConsumptionKwh),
            Some(FieldValue::Decimal(98000.0))
        );
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        let v = single_violation(ProjectRecord::from_form(&input(&[(
            "total_cost_cny",
            json!("a lot"),
        )])));
        assert_eq!(v.field, "total_cost_cny");
        assert_eq!(v.kind, ViolationKind::NotANumber);
    }

    #[test]
    fn non_finite_text_is_rejected() {
        let v = single_violation(ProjectRecord::from_form(&input(&[(
            "total_heating_load_kw",
            json!("inf"),
        )])));
        assert_eq!(v.kind, ViolationKind::NotANumber);
    }

    #[test]
    fn negative_area_is_rejected() {
        let v = single_violation(ProjectRecord::from_form(&input(&[("area_sqm", json!(-12.5))])));
        assert_eq!(v.field, "area_sqm");
        assert_eq!(v.kind, ViolationKind::OutOfRange);
    }

    // -- rating --

    #[test]
    fn ratings_one_through_five_are_accepted() {
        for rating in 1..=5 {
            let record =
                ProjectRecord::from_form(&input(&[("success_rating", json!(rating))])).unwrap();
            assert_eq!(record.success_rating(), Some(rating));
        }
    }

    #[test]
    fn ratings_outside_range_are_rejected() {
        for rating in [0, 6, -1] {
            let v = single_violation(ProjectRecord::from_form(&input(&[(
                "success_rating",
                json!(rating),
            )])));
            assert_eq!(v.field, "success_rating");
            assert_eq!(v.kind, ViolationKind::OutOfRange, "rating {rating}");
        }
    }

    #[test]
    fn fractional_rating_is_rejected() {
        let v = single_violation(ProjectRecord::from_form(&input(&[(
            "success_rating",
            json!(3.5),
        )])));
        assert_eq!(v.kind, ViolationKind::NotAnInteger);
    }

    #[test]
    fn rating_text_is_parsed() {
        let record =
            ProjectRecord::from_form(&input(&[("success_rating", json!(" 4 "))])).unwrap();
        assert_eq!(record.success_rating(), Some(4));
    }

    // -- structured maps --

    #[test]
    fn json_text_parses_to_map() {
        let record =
            ProjectRecord::from_form(&input(&[("selected_products", json!(r#"{"a": 1}"#))]))
                .unwrap();
        let map = record.selected_products().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], json!(1));
    }

    #[test]
    fn invalid_json_names_the_field() {
        let err = ProjectRecord::from_form(&input(&[("selected_products", json!("not json"))]))
            .unwrap_err();
        let v = err.first();
        assert_eq!(v.field, "selected_products");
        assert_eq!(v.kind, ViolationKind::InvalidJson);
        assert!(err.to_string().contains("selected_products"));
    }

    #[test]
    fn blank_json_is_absent() {
        for blank in ["", "   ", "\n\t"] {
            let record = ProjectRecord::from_form(&input(&[
                ("selected_products", json!(blank)),
                ("file_attachments", json!(blank)),
            ]))
            .unwrap();
            assert!(record.selected_products().is_none());
            assert!(record.file_attachments().is_none());
        }
    }

    #[test]
    fn json_array_is_not_a_map() {
        let v = single_violation(ProjectRecord::from_form(&input(&[(
            "file_attachments",
            json!("[1, 2]"),
        )])));
        assert_eq!(v.field, "file_attachments");
        assert_eq!(v.kind, ViolationKind::NotAnObject);
    }

    #[test]
    fn already_parsed_object_is_accepted() {
        let record = ProjectRecord::from_form(&input(&[(
            "file_attachments",
            json!({"files": ["a.pdf"]}),
        )]))
        .unwrap();
        assert_eq!(record.file_attachments().unwrap()["files"], json!(["a.pdf"]));
    }

    // -- whole-record behaviour --

    #[test]
    fn all_violations_are_collected_in_schema_order() {
        let mut raw = FormInput::new();
        raw.insert("success_rating".into(), json!(9));
        raw.insert("selected_products".into(), json!("{oops"));
        raw.insert("client_name".into(), json!("Acme"));
        let err = ProjectRecord::from_form(&raw).unwrap_err();

        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["name", "selected_products", "success_rating"]);
    }

    #[test]
    fn created_at_comes_from_the_clock_not_the_input() {
        let now = Utc::now();
        let record = validate_form_at(
            &input(&[("created_at", json!("1999-01-01T00:00:00Z"))]),
            now,
        )
        .unwrap();
        assert_eq!(record.created_at(), now.trunc_subsecs(6));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_matches!(
            ProjectRecord::from_form(&input(&[("id", json!(42)), ("colour", json!("red"))])),
            Ok(_)
        );
    }
}
