//! # HTTP Handlers
//!
//! The feedback form page: `GET /` renders it empty, `POST /` runs a
//! submission through [`crate::intake::FeedbackIntake`] and renders the
//! outcome on the same page.

pub mod feedback;
pub mod page;

pub use feedback::{show_form, submit_feedback};
