//! # Feedback Repository
//!
//! Persists feedback submissions. Every save runs on its own connection:
//! open, optionally ensure the schema, insert one row, close.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ConnectionTrait, EntityTrait, Set};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db;
use crate::error::RepositoryError;
use crate::models::feedback::{ActiveModel as FeedbackActiveModel, Entity as Feedback, NewFeedback};

/// Separator used to flatten the issue list into the `issues` column.
pub const ISSUE_SEPARATOR: &str = ", ";

/// Identifiers of a stored feedback row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredFeedback {
    pub id: Uuid,
    pub feedback_id: Uuid,
}

/// Write side of feedback storage.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Persist one submission.
    async fn save(&self, record: NewFeedback) -> Result<StoredFeedback, RepositoryError>;
}

/// [`FeedbackStore`] backed by a SeaORM connection opened per call.
pub struct FeedbackRepository {
    config: DatabaseConfig,
}

impl FeedbackRepository {
    /// Create a new FeedbackRepository for the given database settings
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Insert `record` using an already-open connection.
    pub async fn insert<C: ConnectionTrait>(
        db: &C,
        record: NewFeedback,
    ) -> Result<StoredFeedback, RepositoryError> {
        let id = Uuid::new_v4();
        let feedback_id = record.feedback_id;

        let feedback = FeedbackActiveModel {
            id: Set(id),
            feedback_id: Set(feedback_id),
            customer_name: Set(record.customer_name),
            product_name: Set(record.product_name),
            original_feedback: Set(record.original_feedback),
            summary: Set(record.summary),
            issues: Set(record.issues.join(ISSUE_SEPARATOR)),
            sentiment: Set(record.sentiment),
            created_at: Set(Utc::now().into()),
        };

        Feedback::insert(feedback)
            .exec_without_returning(db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(StoredFeedback { id, feedback_id })
    }

    async fn write<C: ConnectionTrait>(
        &self,
        db: &C,
        record: NewFeedback,
    ) -> Result<StoredFeedback, RepositoryError> {
        if self.config.ensure_schema {
            db::ensure_schema(db).await?;
        }
        Self::insert(db, record).await
    }
}

#[async_trait]
impl FeedbackStore for FeedbackRepository {
    async fn save(&self, record: NewFeedback) -> Result<StoredFeedback, RepositoryError> {
        let feedback_id = record.feedback_id;

        let conn = db::open_connection(&self.config).await.inspect_err(|err| {
            error!(%feedback_id, error = %err, "Could not open feedback database connection");
        })?;

        let result = self.write(&conn, record).await;

        // Released on every path once acquired; a panic above drops `conn`.
        if let Err(err) = conn.close().await {
            warn!(%feedback_id, error = %err, "Failed to close feedback database connection");
        }

        match &result {
            Ok(stored) => debug!(%feedback_id, id = %stored.id, "Feedback row inserted"),
            Err(err) => error!(%feedback_id, error = %err, "Failed to persist feedback"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use crate::models::feedback::Column;
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};
    use tempfile::TempDir;

    fn sqlite_config(dir: &TempDir, ensure_schema: bool) -> DatabaseConfig {
        DatabaseConfig {
            url: Some(format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("feedback.db").display()
            )),
            ensure_schema,
            ..Default::default()
        }
    }

    fn sample_record() -> NewFeedback {
        NewFeedback {
            feedback_id: Uuid::new_v4(),
            customer_name: Some("Ada".to_string()),
            product_name: "Widget".to_string(),
            original_feedback: "Shipping was late".to_string(),
            summary: "Customer reports late shipping.".to_string(),
            issues: vec!["late shipping".to_string(), "no tracking".to_string()],
            sentiment: Sentiment::Negative,
        }
    }

    #[tokio::test]
    async fn test_save_creates_schema_and_inserts_row() {
        let dir = TempDir::new().unwrap();
        let config = sqlite_config(&dir, true);
        let repo = FeedbackRepository::new(config.clone());

        let record = sample_record();
        let stored = repo.save(record.clone()).await.unwrap();
        assert_eq!(stored.feedback_id, record.feedback_id);

        let conn = db::open_connection(&config).await.unwrap();
        let row = Feedback::find_by_id(stored.id)
            .one(&conn)
            .await
            .unwrap()
            .expect("row stored");

        assert_eq!(row.feedback_id, record.feedback_id);
        assert_eq!(row.customer_name.as_deref(), Some("Ada"));
        assert_eq!(row.product_name, "Widget");
        assert_eq!(row.original_feedback, "Shipping was late");
        assert_eq!(row.issues, "late shipping, no tracking");
        assert_eq!(row.sentiment, Sentiment::Negative);
        assert!(row.created_at.timestamp() > 0);
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_each_save_appends_a_row() {
        let dir = TempDir::new().unwrap();
        let config = sqlite_config(&dir, true);
        let repo = FeedbackRepository::new(config.clone());

        let first = repo.save(sample_record()).await.unwrap();
        let second = repo.save(sample_record()).await.unwrap();
        assert_ne!(first.id, second.id);

        let conn = db::open_connection(&config).await.unwrap();
        let count = Feedback::find()
            .filter(Column::ProductName.eq("Widget"))
            .count(&conn)
            .await
            .unwrap();
        assert_eq!(count, 2);
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_without_schema_fails_when_table_missing() {
        let dir = TempDir::new().unwrap();
        let repo = FeedbackRepository::new(sqlite_config(&dir, false));

        let result = repo.save(sample_record()).await;

        assert!(matches!(result, Err(RepositoryError::Database(_))));
    }

    #[tokio::test]
    async fn test_save_without_schema_uses_migrated_table() {
        use migration::{Migrator, MigratorTrait};

        let dir = TempDir::new().unwrap();
        let config = sqlite_config(&dir, false);
        let conn = db::open_connection(&config).await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        conn.close().await.unwrap();

        let repo = FeedbackRepository::new(config);
        assert!(repo.save(sample_record()).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_reports_connection_failure() {
        let repo = FeedbackRepository::new(DatabaseConfig {
            host: Some("127.0.0.1".to_string()),
            port: 1,
            sslmode: "disable".to_string(),
            connect_timeout_ms: 500,
            ..Default::default()
        });

        let result = repo.save(sample_record()).await;

        assert!(matches!(result, Err(RepositoryError::Connection(_))));
    }
}
