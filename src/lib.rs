//! # Feedback Intake Library
//!
//! Collects customer feedback from a web form, analyzes it with Gemini and
//! stores the submission together with its analysis.

pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
