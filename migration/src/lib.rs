//! Database migrations for the feedback intake service.
//!
//! The `feedbacks` table definition is shared with the service's
//! ensure-schema path so both create the same table.

pub use sea_orm_migration::prelude::*;

mod m2026_10_17_000001_create_feedbacks;

pub use m2026_10_17_000001_create_feedbacks::{PGCRYPTO_EXTENSION, feedbacks_table};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m2026_10_17_000001_create_feedbacks::Migration)]
    }
}
