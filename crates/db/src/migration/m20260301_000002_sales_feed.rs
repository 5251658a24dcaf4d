//! Read models for the sales and expense feed.
//!
//! Owned by the billing and purchasing subsystems; created here so a fresh
//! database can serve closing summaries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FEED_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS operating_expenses CASCADE;
             DROP TABLE IF EXISTS settled_sales CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const FEED_SQL: &str = r"
-- Settled sales (paid invoices) per register
CREATE TABLE settled_sales (
    id UUID PRIMARY KEY,
    register_id VARCHAR(64) NOT NULL,
    payment_method VARCHAR(64),
    amount NUMERIC(19, 4) NOT NULL,
    settled_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX idx_settled_sales_window ON settled_sales(register_id, settled_at);

-- Expenses and supplier payments made outside the cash ledger
CREATE TABLE operating_expenses (
    id UUID PRIMARY KEY,
    register_id VARCHAR(64) NOT NULL,
    payment_method VARCHAR(64),
    amount NUMERIC(19, 4) NOT NULL,
    description TEXT,
    paid_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX idx_operating_expenses_window ON operating_expenses(register_id, paid_at);
";
