//! Project entry form: widget state, submission, and the saved-event bus.
//!
//! The [`controller::FormController`] is the only piece with behaviour beyond
//! orchestration: it reads an [`form::EntryForm`], validates it into a
//! record, inserts it through a scoped store, copies attachments, and reports
//! one [`controller::SubmitOutcome`].

pub mod attachments;
pub mod config;
pub mod controller;
pub mod events;
pub mod form;
pub mod prompt;
