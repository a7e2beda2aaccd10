//! # Server Configuration
//!
//! This module contains the server setup for the feedback intake service.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::analysis::GeminiAnalyzer;
use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::handlers;
use crate::intake::FeedbackIntake;
use crate::repositories::FeedbackRepository;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<FeedbackIntake>,
}

impl AppState {
    /// Wire the Gemini analyzer and the database gateway from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        let analyzer = GeminiAnalyzer::new(&config.gemini)?;
        let store = FeedbackRepository::new(config.database.clone());
        let intake = FeedbackIntake::new(Arc::new(analyzer), Arc::new(store), config.debug);

        Ok(Self {
            intake: Arc::new(intake),
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::show_form).post(handlers::submit_feedback),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    if config.gemini.api_key().is_none() {
        info!("GEMINI_API_KEY is not set; submissions will be stored with a fallback analysis");
    }

    let app = create_app(AppState::from_config(&config)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, profile = %config.profile, "Feedback intake server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::feedback::show_form,
        crate::handlers::feedback::submit_feedback,
    ),
    components(
        schemas(
            crate::intake::FeedbackForm,
            crate::analysis::FeedbackAnalysis,
            crate::models::Sentiment,
        )
    ),
    tags(
        (name = "feedback", description = "Customer feedback intake")
    ),
    info(
        title = "Feedback Intake Service",
        description = "Collects customer feedback, analyzes it with Gemini and stores the result",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
