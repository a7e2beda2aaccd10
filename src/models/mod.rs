//! # Data Models
//!
//! This module contains the data models persisted by the feedback intake service.

pub mod feedback;

pub use feedback::Entity as Feedback;
pub use feedback::{NewFeedback, Sentiment};
