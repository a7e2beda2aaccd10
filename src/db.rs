//! Database connection management for the feedback intake service.
//!
//! The service does not pool connections: each save opens a dedicated
//! connection, uses it for one logical operation, and closes it.

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::RepositoryError;

/// Opens a single-connection handle to the configured database.
///
/// # Examples
///
/// ```no_run
/// use feedback_intake::{config::DatabaseConfig, db::open_connection};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = DatabaseConfig {
///         url: Some("sqlite://feedback.db?mode=rwc".to_string()),
///         ..Default::default()
///     };
///     let conn = open_connection(&config).await?;
///     conn.close().await?;
///     Ok(())
/// }
/// ```
pub async fn open_connection(cfg: &DatabaseConfig) -> Result<DatabaseConnection, RepositoryError> {
    let url = cfg.connection_url()?;
    let timeout = Duration::from_millis(cfg.connect_timeout_ms);

    let mut opt = ConnectOptions::new(url);
    opt.max_connections(1)
        .min_connections(0)
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let conn = Database::connect(opt).await.map_err(|e| {
        log::error!("Failed to connect to feedback database: {}", e);
        RepositoryError::Connection(e)
    })?;

    Ok(conn)
}

/// Issues the idempotent schema statements for the feedbacks table.
///
/// On Postgres this first enables `pgcrypto` for the `gen_random_uuid()`
/// column default.
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), RepositoryError> {
    let backend = db.get_database_backend();

    if backend == DatabaseBackend::Postgres {
        db.execute_unprepared(migration::PGCRYPTO_EXTENSION)
            .await
            .map_err(RepositoryError::Schema)?;
    }

    db.execute(backend.build(&migration::feedbacks_table(backend)))
        .await
        .map_err(RepositoryError::Schema)?;

    Ok(())
}
