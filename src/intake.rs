//! Feedback intake service
//!
//! Validates a submitted form, runs the analysis, persists the combined record
//! and reports which of the three outcomes happened. Rendering is left to the
//! HTTP layer.

use std::sync::Arc;

use metrics::counter;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::analysis::{AnalysisOutcome, FeedbackAnalysis, FeedbackAnalyzer};
use crate::models::NewFeedback;
use crate::repositories::{FeedbackStore, StoredFeedback};

pub const VALIDATION_MESSAGE: &str = "Product name and feedback are required.";
pub const SUCCESS_MESSAGE: &str = "Feedback submitted successfully!";
pub const STORAGE_FAILURE_MESSAGE: &str = "Database error. Check logs.";

/// Form fields as posted. Missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(default)]
pub struct FeedbackForm {
    /// Optional customer name
    pub customer_name: String,
    /// Product the feedback is about (required)
    pub product_name: String,
    /// Free-text feedback (required)
    pub feedback_text: String,
}

impl FeedbackForm {
    /// Trimmed copy of the form.
    pub fn trimmed(&self) -> Self {
        Self {
            customer_name: self.customer_name.trim().to_string(),
            product_name: self.product_name.trim().to_string(),
            feedback_text: self.feedback_text.trim().to_string(),
        }
    }
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A required field was empty; nothing was analyzed or stored.
    Rejected { message: &'static str },
    /// The record was written.
    Stored {
        stored: StoredFeedback,
        analysis: FeedbackAnalysis,
        degraded: bool,
    },
    /// Persisting the record failed. `detail` is only set in debug mode.
    StorageFailed {
        feedback_id: Uuid,
        detail: Option<String>,
    },
}

impl SubmissionOutcome {
    /// User-facing status line.
    pub fn message(&self) -> String {
        match self {
            SubmissionOutcome::Rejected { message } => (*message).to_string(),
            SubmissionOutcome::Stored { .. } => SUCCESS_MESSAGE.to_string(),
            SubmissionOutcome::StorageFailed {
                detail: Some(detail),
                ..
            } => format!("{STORAGE_FAILURE_MESSAGE} {detail}"),
            SubmissionOutcome::StorageFailed { detail: None, .. } => {
                STORAGE_FAILURE_MESSAGE.to_string()
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Rejected { .. } => "rejected",
            SubmissionOutcome::Stored { .. } => "stored",
            SubmissionOutcome::StorageFailed { .. } => "storage_failed",
        }
    }
}

/// Orchestrates validate, analyze, persist.
pub struct FeedbackIntake {
    analyzer: Arc<dyn FeedbackAnalyzer>,
    store: Arc<dyn FeedbackStore>,
    debug: bool,
}

impl FeedbackIntake {
    pub fn new(
        analyzer: Arc<dyn FeedbackAnalyzer>,
        store: Arc<dyn FeedbackStore>,
        debug: bool,
    ) -> Self {
        Self {
            analyzer,
            store,
            debug,
        }
    }

    /// Handle one form submission. Never fails; every problem is reported
    /// through the returned outcome.
    pub async fn submit(&self, form: &FeedbackForm) -> SubmissionOutcome {
        let form = form.trimmed();

        let outcome = if form.product_name.is_empty() || form.feedback_text.is_empty() {
            info!("Rejected feedback submission with missing required fields");
            SubmissionOutcome::Rejected {
                message: VALIDATION_MESSAGE,
            }
        } else {
            self.process(Uuid::new_v4(), form).await
        };

        counter!("feedback_submissions_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    #[instrument(skip_all, fields(feedback_id = %feedback_id, product_name = %form.product_name))]
    async fn process(&self, feedback_id: Uuid, form: FeedbackForm) -> SubmissionOutcome {
        let outcome = self.analyzer.analyze(&form.feedback_text).await;
        let degraded = outcome.is_degraded();
        if let AnalysisOutcome::Degraded { reason } = &outcome {
            counter!("feedback_analysis_degraded_total", "reason" => reason.label()).increment(1);
            warn!(
                reason = reason.label(),
                detail = reason.detail().unwrap_or_default(),
                "Storing feedback with fallback analysis"
            );
        }
        let analysis = outcome.into_analysis();

        let customer_name = Some(form.customer_name).filter(|name| !name.is_empty());
        let record = NewFeedback {
            feedback_id,
            customer_name,
            product_name: form.product_name,
            original_feedback: form.feedback_text,
            summary: analysis.summary.clone(),
            issues: analysis.issues.clone(),
            sentiment: analysis.sentiment,
        };

        match self.store.save(record).await {
            Ok(stored) => {
                info!(id = %stored.id, sentiment = %analysis.sentiment, degraded, "Feedback stored");
                SubmissionOutcome::Stored {
                    stored,
                    analysis,
                    degraded,
                }
            }
            Err(err) => SubmissionOutcome::StorageFailed {
                feedback_id,
                detail: self.debug.then(|| err.to_string()),
            },
        }
    }
}
