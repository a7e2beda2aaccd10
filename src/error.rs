//! # Error Handling
//!
//! Error types for the two external collaborators: the Gemini analysis API
//! and the feedback database. Neither is ever surfaced to the user as an HTTP
//! error; the intake flow turns them into fallback payloads or status messages.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the database gateway.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid database configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to connect to database: {0}")]
    Connection(#[source] sea_orm::DbErr),
    #[error("failed to ensure feedbacks schema: {0}")]
    Schema(#[source] sea_orm::DbErr),
    #[error("database error: {0}")]
    Database(#[source] sea_orm::DbErr),
}

impl RepositoryError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn database_error(error: sea_orm::DbErr) -> Self {
        Self::Database(error)
    }
}

/// Errors raised while calling or decoding the Gemini API.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("request to Gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Gemini response contained no candidate text")]
    EmptyResponse,
    #[error("Gemini response was not valid analysis JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Transport(err) if err.is_timeout() => "timeout",
            AnalysisError::Transport(err) if err.is_decode() => "decode",
            AnalysisError::Transport(_) => "transport",
            AnalysisError::Status { .. } => "status",
            AnalysisError::EmptyResponse => "empty_response",
            AnalysisError::Decode(_) => "decode",
        }
    }
}

/// Truncate an upstream body for inclusion in logs.
pub(crate) fn body_snippet(body: &str) -> String {
    if body.chars().count() > 200 {
        let truncated: String = body.chars().take(200).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_snippet_truncates_long_bodies() {
        let long = "x".repeat(250);
        let snippet = body_snippet(&long);
        assert_eq!(snippet.chars().count(), 203);
        assert!(snippet.ends_with("..."));

        assert_eq!(body_snippet("short"), "short");
    }

    #[test]
    fn test_analysis_error_kind() {
        let status = AnalysisError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert_eq!(status.kind(), "status");
        assert_eq!(AnalysisError::EmptyResponse.kind(), "empty_response");

        let decode = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert_eq!(AnalysisError::from(decode).kind(), "decode");
    }

    #[test]
    fn test_repository_error_messages() {
        let err = RepositoryError::invalid_configuration("database host is not set");
        assert_eq!(
            err.to_string(),
            "invalid database configuration: database host is not set"
        );

        let err = RepositoryError::Connection(sea_orm::DbErr::Custom("refused".to_string()));
        assert!(err.to_string().contains("refused"));
    }
}
