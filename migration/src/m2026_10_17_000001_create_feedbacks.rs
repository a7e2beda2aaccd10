//! Migration to create the feedbacks table.
//!
//! One row per form submission: the raw customer input plus the derived
//! summary, issues and sentiment.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

/// Enables `gen_random_uuid()` on Postgres versions that predate it in core.
pub const PGCRYPTO_EXTENSION: &str = r#"CREATE EXTENSION IF NOT EXISTS "pgcrypto""#;

/// Idempotent `CREATE TABLE IF NOT EXISTS feedbacks` for the given backend.
pub fn feedbacks_table(backend: DatabaseBackend) -> TableCreateStatement {
    let mut id = ColumnDef::new(Feedbacks::Id);
    id.uuid().not_null().primary_key();
    // SQLite has no uuid generator; rows always arrive with an id there.
    if backend == DatabaseBackend::Postgres {
        id.default(Expr::cust("gen_random_uuid()"));
    }

    Table::create()
        .table(Feedbacks::Table)
        .if_not_exists()
        .col(id)
        .col(ColumnDef::new(Feedbacks::FeedbackId).uuid().not_null())
        .col(ColumnDef::new(Feedbacks::CustomerName).text().null())
        .col(ColumnDef::new(Feedbacks::ProductName).text().not_null())
        .col(ColumnDef::new(Feedbacks::OriginalFeedback).text().not_null())
        .col(ColumnDef::new(Feedbacks::Summary).text().not_null())
        .col(ColumnDef::new(Feedbacks::Issues).text().not_null())
        .col(ColumnDef::new(Feedbacks::Sentiment).text().not_null())
        .col(
            ColumnDef::new(Feedbacks::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        if backend == DatabaseBackend::Postgres {
            manager
                .get_connection()
                .execute_unprepared(PGCRYPTO_EXTENSION)
                .await?;
        }

        manager.create_table(feedbacks_table(backend)).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedbacks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Feedbacks {
    Table,
    Id,
    FeedbackId,
    CustomerName,
    ProductName,
    OriginalFeedback,
    Summary,
    Issues,
    Sentiment,
    CreatedAt,
}
