//! Project record schema and validation.
//!
//! Pure logic with no I/O: the schema descriptor ([`record::ProjectField`]),
//! the validated [`record::ProjectRecord`], and the coercion rules that turn
//! raw form input into one ([`validation`]).

pub mod error;
pub mod record;
pub mod types;
pub mod validation;

pub use error::{FieldViolation, ValidationError, ViolationKind};
pub use record::{FieldKind, FieldValue, ProjectField, ProjectRecord};
pub use validation::FormInput;
