//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_register_sessions;
mod m20260301_000002_sales_feed;
mod m20260315_000003_session_review;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_register_sessions::Migration),
            Box::new(m20260301_000002_sales_feed::Migration),
            Box::new(m20260315_000003_session_review::Migration),
        ]
    }
}
