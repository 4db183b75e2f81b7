//! Form submission: read, validate, persist, report.

use std::path::PathBuf;

use futures::FutureExt;
use tokio::sync::broadcast;

use projhis_core::types::DbId;
use projhis_core::{ProjectRecord, ValidationError};
use projhis_db::{with_store, Connect, ProjectSink, StoreError};

use crate::attachments::AttachmentPlan;
use crate::config::AppConfig;
use crate::events::{EventBus, FormEvent};
use crate::form::EntryForm;

/// Result of one submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The record was stored and the form cleared.
    Saved { id: DbId },
    /// The input was rejected; the form is untouched.
    Invalid(ValidationError),
    /// The database could not be reached; the form is untouched.
    ConnectionFailed(StoreError),
    /// The insert, the attachment copy, or the commit failed and was rolled
    /// back; the form is untouched.
    PersistenceFailed(StoreError),
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// Text to show the user.
    ///
    /// Validation failures list each field problem. Database failures get a
    /// generic message; the cause is logged instead.
    pub fn message(&self) -> String {
        match self {
            Self::Saved { id } => format!("Project saved (id {id})."),
            Self::Invalid(err) => {
                let lines: Vec<String> = err
                    .violations()
                    .iter()
                    .map(|v| format!("  - {}", v.message))
                    .collect();
                format!("Validation failed:\n{}", lines.join("\n"))
            }
            Self::ConnectionFailed(_) => {
                "Could not connect to the database. Check the connection settings.".to_string()
            }
            Self::PersistenceFailed(_) => {
                "Saving failed. Check the database connection or field formats.".to_string()
            }
        }
    }
}

/// Orchestrates submissions of an [`EntryForm`].
///
/// Holds no per-submission state; each call to [`submit`](Self::submit)
/// opens and closes its own store.
pub struct FormController<C> {
    connector: C,
    save_dir: PathBuf,
    events: EventBus,
}

impl<C: Connect> FormController<C> {
    pub fn new(connector: C, config: &AppConfig) -> Self {
        Self {
            connector,
            save_dir: config.save_dir.clone(),
            events: EventBus::default(),
        }
    }

    /// Receive a [`FormEvent::Saved`] after every successful submission.
    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.events.subscribe()
    }

    /// Validate and store the form's contents.
    ///
    /// On success the form is cleared and a saved event is published. On any
    /// failure the form keeps its values for correction.
    pub async fn submit(&self, form: &mut EntryForm) -> SubmitOutcome {
        let record = match ProjectRecord::from_form(&form.read()) {
            Ok(record) => record,
            Err(err) => {
                tracing::info!(error = %err, "Form rejected");
                return SubmitOutcome::Invalid(err);
            }
        };

        let plan = AttachmentPlan::from_selection(form.selected_files());
        let record = record.with_attachment_names(&plan.names());
        let name = record.name().to_string();
        let save_dir = self.save_dir.clone();

        let result = with_store(&self.connector, move |store| {
            async move {
                let mut copied = None;
                let result = store
                    .insert_with(&record, |id| {
                        copied = Some(plan.copy_into(&save_dir, id)?);
                        Ok(())
                    })
                    .await;
                // The copy ran but the record did not commit.
                if let (Err(_), Some(copied)) = (&result, copied) {
                    copied.remove();
                }
                result
            }
            .boxed()
        })
        .await;

        match result {
            Ok(id) => {
                tracing::info!(id, name = %name, "Project saved");
                form.clear();
                self.events.publish(FormEvent::saved(id, name));
                SubmitOutcome::Saved { id }
            }
            Err(err @ StoreError::Connect(_)) => {
                tracing::error!(error = %err, "Database unreachable");
                SubmitOutcome::ConnectionFailed(err)
            }
            Err(err) => {
                tracing::error!(error = %err, "Saving project failed");
                SubmitOutcome::PersistenceFailed(err)
            }
        }
    }
}
