//! Register sessions and the cash ledger.
//!
//! The partial unique index is what enforces one open session per register.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(REGISTER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS cash_ledger_entries CASCADE;
             DROP TABLE IF EXISTS register_sessions CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const REGISTER_SQL: &str = r"
-- Register sessions (cuadres de caja)
CREATE TABLE register_sessions (
    id UUID PRIMARY KEY,
    register_id VARCHAR(64) NOT NULL,
    name VARCHAR(255) NOT NULL,
    responsible VARCHAR(255) NOT NULL,
    opened_at TIMESTAMPTZ NOT NULL,
    closed_at TIMESTAMPTZ,
    opening_float NUMERIC(19, 4) NOT NULL,
    opening_float_breakdown JSONB NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'open',
    notes TEXT,
    revision BIGINT NOT NULL DEFAULT 0,
    declared_amounts JSONB,
    closing_summary JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_register_sessions_status CHECK (status IN ('open', 'closed')),
    CONSTRAINT chk_register_sessions_float CHECK (opening_float >= 0),
    CONSTRAINT chk_register_sessions_closed CHECK (
        (status = 'open' AND closed_at IS NULL AND closing_summary IS NULL)
        OR (status = 'closed' AND closed_at IS NOT NULL AND closing_summary IS NOT NULL)
    )
);

-- At most one open session per register
CREATE UNIQUE INDEX uq_register_sessions_open
    ON register_sessions(register_id) WHERE status = 'open';

-- Latest session per register (opening hint, listing)
CREATE INDEX idx_register_sessions_register
    ON register_sessions(register_id, opened_at DESC);

-- Listing by date and operator
CREATE INDEX idx_register_sessions_opened ON register_sessions(opened_at DESC);
CREATE INDEX idx_register_sessions_responsible ON register_sessions(responsible, opened_at DESC);

-- Cash ledger: append-only incomes and expenses of a session
CREATE TABLE cash_ledger_entries (
    id UUID PRIMARY KEY,
    session_id UUID NOT NULL REFERENCES register_sessions(id) ON DELETE CASCADE,
    kind VARCHAR(16) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    payment_method VARCHAR(64) NOT NULL,
    description TEXT,
    recorded_by VARCHAR(255),
    recorded_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_cash_ledger_entries_kind CHECK (kind IN ('income', 'expense')),
    CONSTRAINT chk_cash_ledger_entries_amount CHECK (amount > 0),
    CONSTRAINT chk_cash_ledger_entries_method CHECK (payment_method = lower(btrim(payment_method)) AND payment_method <> '')
);

-- Entries of a session in insertion order
CREATE INDEX idx_cash_ledger_entries_session
    ON cash_ledger_entries(session_id, recorded_at, id);

-- Date range queries across sessions
CREATE INDEX idx_cash_ledger_entries_recorded ON cash_ledger_entries(recorded_at);
";
