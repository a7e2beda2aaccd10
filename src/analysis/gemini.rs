//! Gemini analysis client
//!
//! Calls the Gemini `generateContent` endpoint with a fixed prompt and a
//! response schema constraining the output to `{summary, issues, sentiment}`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::normalize::parse_analysis;
use super::{AnalysisOutcome, DegradeReason, FeedbackAnalysis, FeedbackAnalyzer};
use crate::config::GeminiConfig;
use crate::error::{AnalysisError, body_snippet};

/// Low temperature keeps the structured output stable across calls.
const TEMPERATURE: f64 = 0.2;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini-backed [`FeedbackAnalyzer`].
pub struct GeminiAnalyzer {
    client: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiAnalyzer {
    /// Build an analyzer from configuration. A missing API key is allowed;
    /// every analysis then degrades without a network call.
    pub fn new(config: &GeminiConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key().map(str::to_string),
            model: config.model.trim_start_matches("models/").to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    async fn generate(
        &self,
        api_key: &str,
        feedback_text: &str,
    ) -> Result<FeedbackAnalysis, AnalysisError> {
        let prompt = build_prompt(feedback_text);
        let body = GenerateContentRequest::new(&prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status {
                status,
                body: body_snippet(&text),
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload.text().ok_or(AnalysisError::EmptyResponse)?;
        debug!(model = %self.model, chars = text.len(), "Received Gemini analysis");

        Ok(parse_analysis(&text)?)
    }
}

#[async_trait]
impl FeedbackAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, feedback_text: &str) -> AnalysisOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("GEMINI_API_KEY is not set; skipping feedback analysis");
            return AnalysisOutcome::Degraded {
                reason: DegradeReason::MissingApiKey,
            };
        };

        let started = Instant::now();
        let result = self.generate(api_key, feedback_text).await;
        histogram!("feedback_analysis_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(analysis) => AnalysisOutcome::Analyzed(analysis),
            Err(err) => {
                warn!(model = %self.model, kind = err.kind(), error = %err, "Gemini analysis failed, using fallback");
                AnalysisOutcome::Degraded {
                    reason: DegradeReason::ServiceFailure {
                        kind: err.kind(),
                        detail: err.to_string(),
                    },
                }
            }
        }
    }
}

/// Prompt sent to the model for one piece of feedback.
pub fn build_prompt(feedback_text: &str) -> String {
    format!(
        r#"Analyze the customer feedback below.

Return ONLY valid JSON with this schema:
{{
  "summary": "",
  "issues": [],
  "sentiment": ""
}}

Rules:
- summary: 2-3 short lines
- issues: short bullet points
- sentiment: Positive, Neutral, or Negative

Feedback:
{feedback_text}
"#
    )
}

/// JSON schema the response must follow.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "2-3 line summary"
            },
            "issues": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of issues"
            },
            "sentiment": {
                "type": "STRING",
                "format": "enum",
                "enum": ["Positive", "Neutral", "Negative"],
                "description": "Positive, Neutral, or Negative"
            }
        },
        "required": ["summary", "issues", "sentiment"]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f64,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
                temperature: TEMPERATURE,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        (!text.trim().is_empty()).then_some(text)
    }
}
