//! Feedback form handlers

use axum::{
    extract::{Form, State, rejection::FormRejection},
    response::Html,
};
use tracing::warn;

use super::page;
use crate::intake::FeedbackForm;
use crate::server::AppState;

/// Render the empty feedback form
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Feedback form page", content_type = "text/html", body = String)
    ),
    tag = "feedback"
)]
pub async fn show_form() -> Html<String> {
    Html(page::render_form())
}

/// Submit feedback
///
/// Validates the form, analyzes the feedback text, stores the result and
/// renders a status message. Every handled outcome, including validation and
/// storage failures, is rendered with status 200.
#[utoipa::path(
    post,
    path = "/",
    request_body(
        content = FeedbackForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Submitted feedback form"
    ),
    responses(
        (status = 200, description = "Form page with the submission status", content_type = "text/html", body = String)
    ),
    tag = "feedback"
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    form: Result<Form<FeedbackForm>, FormRejection>,
) -> Html<String> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Could not decode feedback form");
            FeedbackForm::default()
        }
    };

    let outcome = state.intake.submit(&form).await;
    Html(page::render_outcome(&form.trimmed(), &outcome))
}
