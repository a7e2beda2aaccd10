//! Feedback entity model
//!
//! This module contains the SeaORM entity model for the feedbacks table,
//! which stores each customer submission together with its analysis.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Feedback entity, one row per form submission
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "feedbacks")]
pub struct Model {
    /// Storage primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Correlation id generated per submission, independent of `id`
    pub feedback_id: Uuid,

    /// Customer name; blank input is stored as NULL
    pub customer_name: Option<String>,

    pub product_name: String,

    /// Feedback text exactly as submitted (trimmed)
    pub original_feedback: String,

    /// Short summary derived by the analysis service (may be empty)
    pub summary: String,

    /// Issue list joined with ", "
    pub issues: String,

    pub sentiment: Sentiment,

    pub created_at: DateTimeWithTimeZone,
}

/// Canonical sentiment labels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Sentiment {
    #[sea_orm(string_value = "Positive")]
    Positive,

    #[sea_orm(string_value = "Neutral")]
    #[default]
    Neutral,

    #[sea_orm(string_value = "Negative")]
    Negative,
}

impl Sentiment {
    /// Title-case label as stored and displayed.
    pub const fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// Parse a label in any letter case; `None` when it is not one of the
    /// three canonical values.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A submission ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub feedback_id: Uuid,
    pub customer_name: Option<String>,
    pub product_name: String,
    pub original_feedback: String,
    pub summary: String,
    pub issues: Vec<String>,
    pub sentiment: Sentiment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_parse_is_case_insensitive() {
        assert_eq!(Sentiment::parse("positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse("NEGATIVE"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse(" Neutral "), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse("mixed"), None);
        assert_eq!(Sentiment::parse(""), None);
    }

    #[test]
    fn test_sentiment_display_is_title_case() {
        assert_eq!(Sentiment::Positive.to_string(), "Positive");
        assert_eq!(Sentiment::default(), Sentiment::Neutral);
    }
}
