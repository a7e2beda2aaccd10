//! End-to-end tests for the feedback intake HTTP surface: a real server on a
//! random port, Gemini mocked with wiremock, SQLite files standing in for
//! Postgres.

use feedback_intake::config::{AppConfig, DatabaseConfig, GeminiConfig};
use feedback_intake::db;
use feedback_intake::models::{Feedback, Sentiment};
use feedback_intake::server::{AppState, create_app};
use reqwest::Client;
use sea_orm::EntityTrait;
use serde_json::json;
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn sqlite_database(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: Some(format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("feedback.db").display()
        )),
        ..Default::default()
    }
}

fn test_config(database: DatabaseConfig, gemini: &MockServer) -> AppConfig {
    AppConfig {
        database,
        gemini: GeminiConfig {
            api_key: Some("test-key".to_string()),
            model: "gemini-test".to_string(),
            api_base: gemini.uri(),
            timeout_ms: 2_000,
        },
        ..Default::default()
    }
}

/// Start the server on a random port and return its base URL
async fn start_test_server(config: AppConfig) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();

    let app = create_app(AppState::from_config(&config).unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn mount_analysis(server: &MockServer, analysis: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": analysis.to_string() }] }
            }]
        })))
        .mount(server)
        .await;
}

async fn stored_rows(database: &DatabaseConfig) -> Vec<feedback_intake::models::feedback::Model> {
    let conn = db::open_connection(database).await.unwrap();
    db::ensure_schema(&conn).await.unwrap();
    let rows = Feedback::find().all(&conn).await.unwrap();
    conn.close().await.unwrap();
    rows
}

#[tokio::test]
async fn test_submission_is_analyzed_and_stored() {
    let gemini = MockServer::start().await;
    mount_analysis(
        &gemini,
        json!({
            "summary": "Customer received the order late.",
            "issues": ["late shipping"],
            "sentiment": "negative"
        }),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let database = sqlite_database(&dir);
    let server_url = start_test_server(test_config(database.clone(), &gemini)).await;

    let response = Client::new()
        .post(format!("{}/", server_url))
        .form(&[
            ("customer_name", "Ada"),
            ("product_name", "Widget"),
            ("feedback_text", "Shipping was late"),
        ])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Feedback submitted successfully!"));
    assert!(body.contains("Customer received the order late."));

    let rows = stored_rows(&database).await;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.customer_name.as_deref(), Some("Ada"));
    assert_eq!(row.product_name, "Widget");
    assert_eq!(row.original_feedback, "Shipping was late");
    assert_eq!(row.issues, "late shipping");
    assert_eq!(row.sentiment, Sentiment::Negative);
    assert_ne!(row.id, row.feedback_id);
    assert!(body.contains(&row.feedback_id.to_string()));
}

#[tokio::test]
async fn test_validation_failure_skips_analysis_and_storage() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gemini)
        .await;

    let dir = TempDir::new().unwrap();
    let database = sqlite_database(&dir);
    let server_url = start_test_server(test_config(database.clone(), &gemini)).await;

    let response = Client::new()
        .post(format!("{}/", server_url))
        .form(&[("product_name", ""), ("feedback_text", "Too slow")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Product name and feedback are required."));
    assert!(stored_rows(&database).await.is_empty());
}

#[tokio::test]
async fn test_gemini_failure_still_stores_fallback() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&gemini)
        .await;

    let dir = TempDir::new().unwrap();
    let database = sqlite_database(&dir);
    let server_url = start_test_server(test_config(database.clone(), &gemini)).await;

    let response = Client::new()
        .post(format!("{}/", server_url))
        .form(&[("product_name", "Widget"), ("feedback_text", "Meh")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Feedback submitted successfully!")
    );

    let rows = stored_rows(&database).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].summary, "AI analysis failed.");
    assert_eq!(rows[0].issues, "Gemini API error");
    assert_eq!(rows[0].sentiment, Sentiment::Neutral);
}

#[tokio::test]
async fn test_unreachable_database_reports_failure_and_keeps_serving() {
    let gemini = MockServer::start().await;
    mount_analysis(
        &gemini,
        json!({ "summary": "Fine.", "issues": [], "sentiment": "Neutral" }),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let database = DatabaseConfig {
        url: Some(format!(
            "sqlite://{}?mode=ro",
            dir.path().join("missing").join("feedback.db").display()
        )),
        connect_timeout_ms: 500,
        ..Default::default()
    };
    let server_url = start_test_server(test_config(database, &gemini)).await;
    let client = Client::new();

    for _ in 0..2 {
        let response = client
            .post(format!("{}/", server_url))
            .form(&[("product_name", "Widget"), ("feedback_text", "Fine")])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.text().await.unwrap();
        assert!(body.contains("Database error. Check logs."));
    }

    let response = client.get(format!("{}/", server_url)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(!dir.path().join("missing").exists());
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let gemini = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let server_url = start_test_server(test_config(sqlite_database(&dir), &gemini)).await;

    let response = Client::new()
        .get(format!("{}/openapi.json", server_url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["info"]["title"], "Feedback Intake Service");
    assert!(body["paths"]["/"]["post"].is_object());
}
