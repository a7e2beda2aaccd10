//! Normalization of the analysis JSON returned by the model.
//!
//! The model is asked for `{summary, issues, sentiment}` but is not trusted to
//! honor the schema exactly: fields may be missing, `issues` may arrive as one
//! comma-delimited string, and sentiment may use any letter case.

use serde::Deserialize;
use tracing::debug;

use super::FeedbackAnalysis;
use crate::models::Sentiment;

/// Analysis payload as received, before normalization.
#[derive(Debug, Default, Deserialize)]
pub struct RawAnalysis {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub issues: Option<RawIssues>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

/// `issues` in either of the shapes the model produces.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawIssues {
    List(Vec<String>),
    Delimited(String),
}

impl RawIssues {
    fn into_list(self) -> Vec<String> {
        match self {
            RawIssues::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
            RawIssues::Delimited(text) => split_issues(&text),
        }
    }
}

impl RawAnalysis {
    pub fn normalize(self) -> FeedbackAnalysis {
        FeedbackAnalysis {
            summary: self.summary.unwrap_or_default().trim().to_string(),
            issues: self.issues.map(RawIssues::into_list).unwrap_or_default(),
            sentiment: normalize_sentiment(self.sentiment.as_deref()),
        }
    }
}

/// Parse and normalize the model's JSON text.
pub fn parse_analysis(text: &str) -> Result<FeedbackAnalysis, serde_json::Error> {
    let raw: RawAnalysis = serde_json::from_str(strip_code_fence(text))?;
    Ok(raw.normalize())
}

/// Split a comma-delimited issue string, trimming pieces and dropping empties.
pub fn split_issues(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map a sentiment label onto the canonical set; missing or unknown labels
/// become [`Sentiment::Neutral`].
pub fn normalize_sentiment(raw: Option<&str>) -> Sentiment {
    match raw {
        None => Sentiment::Neutral,
        Some(label) => Sentiment::parse(label).unwrap_or_else(|| {
            debug!(label, "Unrecognized sentiment label, using Neutral");
            Sentiment::Neutral
        }),
    }
}

// Models occasionally wrap JSON in a markdown fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
