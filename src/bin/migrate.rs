//! Applies pending schema migrations to the configured feedback database.
//!
//! Used by deployments that run the service with `DB_ENSURE_SCHEMA=false`.

use anyhow::{Context, Result};
use feedback_intake::{
    config::ConfigLoader,
    db,
    migration::{Migrator, MigratorTrait},
    telemetry::init_tracing,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let loader = ConfigLoader::new();
    let config = loader.load().context("loading configuration")?;
    init_tracing(&config).context("initializing tracing")?;

    let conn = db::open_connection(&config.database)
        .await
        .context("connecting to feedback database")?;

    let pending = Migrator::get_pending_migrations(&conn)
        .await
        .context("listing pending migrations")?;
    info!(pending = pending.len(), "Applying feedback migrations");

    let result = Migrator::up(&conn, None)
        .await
        .context("applying migrations");

    conn.close().await.context("closing database connection")?;
    result?;

    info!("Feedback schema is up to date");
    Ok(())
}
