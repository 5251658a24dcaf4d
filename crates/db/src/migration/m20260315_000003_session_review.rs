//! Supervisor review of closed sessions and the shift's cashiers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(REVIEW_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP INDEX IF EXISTS idx_register_sessions_review;
             ALTER TABLE register_sessions
                 DROP CONSTRAINT IF EXISTS chk_register_sessions_review,
                 DROP CONSTRAINT IF EXISTS chk_register_sessions_review_status,
                 DROP COLUMN IF EXISTS review_notes,
                 DROP COLUMN IF EXISTS reviewed_at,
                 DROP COLUMN IF EXISTS reviewed_by,
                 DROP COLUMN IF EXISTS review_status,
                 DROP COLUMN IF EXISTS cashiers;",
        )
        .await?;
        Ok(())
    }
}

const REVIEW_SQL: &str = r"
ALTER TABLE register_sessions
    ADD COLUMN cashiers JSONB NOT NULL DEFAULT '[]'::jsonb,
    ADD COLUMN review_status VARCHAR(16) NOT NULL DEFAULT 'pending',
    ADD COLUMN reviewed_by VARCHAR(255),
    ADD COLUMN reviewed_at TIMESTAMPTZ,
    ADD COLUMN review_notes TEXT,
    ADD CONSTRAINT chk_register_sessions_review_status
        CHECK (review_status IN ('pending', 'approved', 'rejected')),
    -- Only closed sessions carry a review decision
    ADD CONSTRAINT chk_register_sessions_review CHECK (
        (review_status = 'pending' AND reviewed_by IS NULL AND reviewed_at IS NULL)
        OR (status = 'closed' AND reviewed_by IS NOT NULL AND reviewed_at IS NOT NULL)
    );

-- Review queue
CREATE INDEX idx_register_sessions_review
    ON register_sessions(review_status, closed_at DESC);
";
