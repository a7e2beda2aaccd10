//! Feedback analysis
//!
//! Turns raw feedback text into a summary, an issue list and a sentiment via
//! an external generative-language service. Analysis never fails a request:
//! any problem yields [`AnalysisOutcome::Degraded`], which still collapses to
//! a usable [`FeedbackAnalysis`].

pub mod gemini;
pub mod normalize;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Sentiment;

pub use gemini::GeminiAnalyzer;

/// Summary used when no API key is configured.
pub const MISSING_KEY_SUMMARY: &str = "Gemini API key missing.";
/// Summary used when the analysis call fails.
pub const FAILURE_SUMMARY: &str = "AI analysis failed.";
/// Single issue recorded when the analysis call fails.
pub const FAILURE_ISSUE: &str = "Gemini API error";

/// Normalized analysis payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeedbackAnalysis {
    pub summary: String,
    pub issues: Vec<String>,
    pub sentiment: Sentiment,
}

/// Why an analysis was replaced by a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// No API key configured; no request was made.
    MissingApiKey,
    /// The service call or its response handling failed.
    ServiceFailure { kind: &'static str, detail: String },
}

impl DegradeReason {
    /// Short label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            DegradeReason::MissingApiKey => "missing_api_key",
            DegradeReason::ServiceFailure { kind, .. } => kind,
        }
    }

    /// Underlying error text for service failures.
    pub fn detail(&self) -> Option<&str> {
        match self {
            DegradeReason::MissingApiKey => None,
            DegradeReason::ServiceFailure { detail, .. } => Some(detail),
        }
    }
}

/// Result of analyzing one piece of feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Analyzed(FeedbackAnalysis),
    Degraded { reason: DegradeReason },
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }

    /// Collapse both variants into the payload stored and shown downstream.
    pub fn into_analysis(self) -> FeedbackAnalysis {
        match self {
            AnalysisOutcome::Analyzed(analysis) => analysis,
            AnalysisOutcome::Degraded {
                reason: DegradeReason::MissingApiKey,
            } => FeedbackAnalysis {
                summary: MISSING_KEY_SUMMARY.to_string(),
                issues: Vec::new(),
                sentiment: Sentiment::Neutral,
            },
            AnalysisOutcome::Degraded {
                reason: DegradeReason::ServiceFailure { .. },
            } => FeedbackAnalysis {
                summary: FAILURE_SUMMARY.to_string(),
                issues: vec![FAILURE_ISSUE.to_string()],
                sentiment: Sentiment::Neutral,
            },
        }
    }
}

/// Analyzes feedback text.
#[async_trait]
pub trait FeedbackAnalyzer: Send + Sync {
    /// `feedback_text` is non-empty; callers validate before analyzing.
    async fn analyze(&self, feedback_text: &str) -> AnalysisOutcome;
}
