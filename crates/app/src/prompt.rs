//! Line-oriented terminal front end for [`EntryForm`].
//!
//! Each field is asked for on its own line with the current value in
//! brackets. A blank answer keeps the current value and `-` clears it, so a
//! form that failed validation can be corrected without retyping everything.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use projhis_core::ProjectField;

use crate::form::{EntryForm, Widget, MAX_RATING};

/// Answer that resets a field to empty.
const CLEAR: &str = "-";

/// Walk through every field of `form`, then the attachment list.
///
/// Returns `Ok(false)` if the input ended before the form was complete.
pub fn fill_form<R: BufRead, W: Write>(
    form: &mut EntryForm,
    input: &mut R,
    out: &mut W,
) -> io::Result<bool> {
    writeln!(out, "Blank keeps the current value, '{CLEAR}' clears it. * marks required fields.")?;

    let fields: Vec<ProjectField> = form.fields().collect();
    for field in fields {
        if !fill_field(form, field, input, out)? {
            return Ok(false);
        }
    }
    fill_attachments(form, input, out)
}

fn fill_field<R: BufRead, W: Write>(
    form: &mut EntryForm,
    field: ProjectField,
    input: &mut R,
    out: &mut W,
) -> io::Result<bool> {
    loop {
        let current = match form.widget(field) {
            Some(widget) => display(widget),
            None => return Ok(true),
        };
        write!(out, "{} [{current}]: ", field.label())?;
        out.flush()?;

        let Some(answer) = read_answer(input)? else {
            return Ok(false);
        };
        if answer.is_empty() {
            return Ok(true);
        }

        match apply(form, field, &answer) {
            Ok(()) => return Ok(true),
            Err(hint) => writeln!(out, "  {hint}")?,
        }
    }
}

/// Store `answer` in the widget for `field`, or explain why it was refused.
fn apply(form: &mut EntryForm, field: ProjectField, answer: &str) -> Result<(), String> {
    let clear = answer == CLEAR;
    let result = match form.widget(field).cloned() {
        Some(Widget::Line(_) | Widget::Text(_)) => {
            form.set_text(field, if clear { "" } else { answer })
        }
        Some(Widget::Spin(_)) => {
            let value = if clear {
                0.0
            } else {
                match answer.parse::<f64>() {
                    Ok(v) if v.is_finite() && v >= 0.0 => v,
                    _ => return Err("Enter a non-negative number.".to_string()),
                }
            };
            form.set_number(field, value)
        }
        Some(Widget::Rating(_)) => {
            let value = if clear {
                0
            } else {
                match answer.parse::<u8>() {
                    Ok(v) if v <= MAX_RATING => v,
                    _ => return Err(format!("Enter a whole number from 0 to {MAX_RATING}.")),
                }
            };
            form.set_rating(field, value)
        }
        None => return Ok(()),
    };
    result.map_err(|e| e.to_string())
}

fn fill_attachments<R: BufRead, W: Write>(
    form: &mut EntryForm,
    input: &mut R,
    out: &mut W,
) -> io::Result<bool> {
    let current: Vec<String> = form
        .selected_files()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    write!(out, "Attachment files, comma-separated [{}]: ", current.join(", "))?;
    out.flush()?;

    let Some(answer) = read_answer(input)? else {
        return Ok(false);
    };
    if answer.is_empty() {
        return Ok(true);
    }

    let selected: Vec<PathBuf> = form.selected_files().to_vec();
    for path in &selected {
        form.remove_file(path);
    }
    if answer != CLEAR {
        for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            form.add_file(part);
        }
    }
    Ok(true)
}

/// Ask a yes/no question. Anything but `y`/`yes` is a no, as is end of input.
pub fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, out: &mut W) -> io::Result<bool> {
    write!(out, "{question} [y/N]: ")?;
    out.flush()?;
    Ok(read_answer(input)?
        .map(|a| matches!(a.to_ascii_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false))
}

/// Next line without its terminator and surrounding whitespace. `None` at EOF.
fn read_answer<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn display(widget: &Widget) -> String {
    match widget {
        Widget::Line(s) | Widget::Text(s) => s.clone(),
        Widget::Spin(v) if *v == 0.0 => String::new(),
        Widget::Spin(v) => v.to_string(),
        Widget::Rating(0) => String::new(),
        Widget::Rating(r) => r.to_string(),
    }
}
