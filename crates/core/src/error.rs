//! Validation error types shared by the form controller and the gateway.

use serde::Serialize;

/// The kind of constraint a field violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required text field was missing or blank.
    Required,
    /// A structured field held text that is not valid JSON.
    InvalidJson,
    /// A structured field held valid JSON that is not an object.
    NotAnObject,
    /// A numeric field held something that does not parse as a number.
    NotANumber,
    /// An integer field held a fractional number.
    NotAnInteger,
    /// A numeric value fell outside its permitted range.
    OutOfRange,
    /// The raw value had a JSON type the field cannot accept at all.
    WrongType,
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    /// Column name of the offending field, e.g. `"selected_products"`.
    pub field: &'static str,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }
}

/// Raised when form input cannot be turned into a [`ProjectRecord`].
///
/// Carries every violation found, in schema order. It is never empty.
///
/// [`ProjectRecord`]: crate::record::ProjectRecord
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Validation failed: {}", join_messages(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Build an error from a non-empty violation list.
    ///
    /// Returns `None` when `violations` is empty so that callers cannot
    /// produce an error that describes nothing.
    pub fn from_violations(violations: Vec<FieldViolation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// The first violation in schema order.
    pub fn first(&self) -> &FieldViolation {
        // Non-empty by construction.
        &self.violations[0]
    }

    /// Whether any violation concerns `field`.
    pub fn concerns(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join_messages(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_violation_list_is_not_an_error() {
        assert!(ValidationError::from_violations(Vec::new()).is_none());
    }

    #[test]
    fn display_joins_all_messages() {
        let err = ValidationError::from_violations(vec![
            FieldViolation::new("name", ViolationKind::Required, "name is required"),
            FieldViolation::new(
                "success_rating",
                ViolationKind::OutOfRange,
                "success_rating must be between 1 and 5, got 9",
            ),
        ])
        .unwrap();

        assert_eq!(
            err.to_string(),
            "Validation failed: name is required; success_rating must be between 1 and 5, got 9"
        );
        assert_eq!(err.first().field, "name");
        assert!(err.concerns("success_rating"));
        assert!(!err.concerns("client_name"));
    }
}
