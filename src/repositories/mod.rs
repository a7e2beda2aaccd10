//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for the feedbacks table.

pub mod feedback;

pub use feedback::{FeedbackRepository, FeedbackStore, StoredFeedback};
