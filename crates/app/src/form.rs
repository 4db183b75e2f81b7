//! Entry form state.
//!
//! [`EntryForm`] holds one widget per user-editable column plus the list of
//! selected attachment files. It knows nothing about validation; [`read`]
//! only applies the "empty or zero means not provided" normalization the
//! widgets imply.
//!
//! [`read`]: EntryForm::read

use std::path::{Path, PathBuf};

use serde_json::Value;

use projhis_core::{FieldKind, FormInput, ProjectField};

/// Highest value the rating spin box allows. `0` is its "not rated" state.
pub const MAX_RATING: u8 = 5;

/// The current value of one input widget.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Single-line entry.
    Line(String),
    /// Multi-line entry, also used for JSON fields.
    Text(String),
    /// Decimal spin box. `0.0` is its unset state.
    Spin(f64),
    /// Rating spin box in `0..=MAX_RATING`. `0` means "not rated".
    Rating(u8),
}

impl Widget {
    fn empty_for(kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Line => Some(Self::Line(String::new())),
            FieldKind::Text | FieldKind::Json => Some(Self::Text(String::new())),
            FieldKind::Decimal => Some(Self::Spin(0.0)),
            FieldKind::Rating => Some(Self::Rating(0)),
            FieldKind::Timestamp => None,
        }
    }
}

/// A setter was called on a widget of the wrong kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} does not accept {attempted} input")]
pub struct WidgetMismatch {
    pub field: &'static str,
    pub attempted: &'static str,
}

/// Widget values and selected attachments for one project entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryForm {
    widgets: Vec<(ProjectField, Widget)>,
    selected_files: Vec<PathBuf>,
}

impl Default for EntryForm {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryForm {
    /// An empty form with one widget per user-editable field.
    pub fn new() -> Self {
        let widgets = ProjectField::ALL
            .into_iter()
            .filter(|f| f.is_user_editable())
            .filter_map(|f| Widget::empty_for(f.kind()).map(|w| (f, w)))
            .collect();
        Self {
            widgets,
            selected_files: Vec::new(),
        }
    }

    /// Fields in display order.
    pub fn fields(&self) -> impl Iterator<Item = ProjectField> + '_ {
        self.widgets.iter().map(|(f, _)| *f)
    }

    pub fn widget(&self, field: ProjectField) -> Option<&Widget> {
        self.widgets.iter().find(|(f, _)| *f == field).map(|(_, w)| w)
    }

    fn widget_mut(&mut self, field: ProjectField) -> Option<&mut Widget> {
        self.widgets
            .iter_mut()
            .find(|(f, _)| *f == field)
            .map(|(_, w)| w)
    }

    /// Set the text of a line or multi-line widget.
    pub fn set_text(
        &mut self,
        field: ProjectField,
        value: impl Into<String>,
    ) -> Result<(), WidgetMismatch> {
        match self.widget_mut(field) {
            Some(Widget::Line(s) | Widget::Text(s)) => {
                *s = value.into();
                Ok(())
            }
            _ => Err(mismatch(field, "text")),
        }
    }

    /// Set a decimal spin box. Non-finite and negative values are not
    /// representable in the spin box and reset it to `0`.
    pub fn set_number(&mut self, field: ProjectField, value: f64) -> Result<(), WidgetMismatch> {
        match self.widget_mut(field) {
            Some(Widget::Spin(v)) => {
                *v = if value.is_finite() && value > 0.0 { value } else { 0.0 };
                Ok(())
            }
            _ => Err(mismatch(field, "numeric")),
        }
    }

    /// Set the rating spin box, clamped to `0..=MAX_RATING`.
    pub fn set_rating(&mut self, field: ProjectField, value: u8) -> Result<(), WidgetMismatch> {
        match self.widget_mut(field) {
            Some(Widget::Rating(r)) => {
                *r = value.min(MAX_RATING);
                Ok(())
            }
            _ => Err(mismatch(field, "rating")),
        }
    }

    /// Add an attachment. Returns `false` if the path was already selected.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.selected_files.contains(&path) {
            return false;
        }
        self.selected_files.push(path);
        true
    }

    /// Remove an attachment. Returns `false` if it was not selected.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        let before = self.selected_files.len();
        self.selected_files.retain(|p| p != path);
        self.selected_files.len() != before
    }

    pub fn selected_files(&self) -> &[PathBuf] {
        &self.selected_files
    }

    /// Raw input for validation.
    ///
    /// Text is trimmed. Optional fields whose text is empty, whose spin box
    /// is `0`, or whose rating is "not rated" are left out entirely. Required
    /// fields are always present, possibly as an empty string.
    pub fn read(&self) -> FormInput {
        let mut input = FormInput::new();
        for (field, widget) in &self.widgets {
            let value = match widget {
                Widget::Line(s) | Widget::Text(s) => {
                    let s = s.trim();
                    if s.is_empty() && !field.is_required() {
                        continue;
                    }
                    Value::String(s.to_string())
                }
                Widget::Spin(v) => {
                    if *v == 0.0 {
                        continue;
                    }
                    Value::from(*v)
                }
                Widget::Rating(r) => {
                    if *r == 0 {
                        continue;
                    }
                    Value::from(*r)
                }
            };
            input.insert(field.column().to_string(), value);
        }
        input
    }

    /// Reset every widget and drop the selected files.
    pub fn clear(&mut self) {
        for (field, widget) in &mut self.widgets {
            if let Some(empty) = Widget::empty_for(field.kind()) {
                *widget = empty;
            }
        }
        self.selected_files.clear();
    }
}

fn mismatch(field: ProjectField, attempted: &'static str) -> WidgetMismatch {
    WidgetMismatch {
        field: field.column(),
        attempted,
    }
}
