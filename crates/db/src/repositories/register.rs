//! Register repository for database operations.
//!
//! Implements the core `RegisterStore` port on PostgreSQL. Every ledger
//! mutation bumps `register_sessions.revision` inside the same database
//! transaction, guarded by `status = 'open'`, and the close is a single
//! conditional update on `(status, revision)`.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use cuadra_core::register::{
    CloseOutcome, EntryKind, LedgerEntry, PurgeReport, PurgeScope, RegisterError,
    RegisterSession, RegisterStore, ReviewStatus, SessionClosing, SessionFilter, SessionReview,
    SessionStatus,
};
use cuadra_shared::types::{LedgerEntryId, PageRequest, RegisterSessionId};

use super::storage_error;
use crate::entities::sea_orm_active_enums::{
    LedgerEntryKind, RegisterReviewStatus, RegisterSessionStatus,
};
use crate::entities::{cash_ledger_entries, register_sessions};

/// Register repository implementation.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    db: DatabaseConnection,
}

impl RegisterRepository {
    /// Creates a new register repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Bumps the revision of an open session on `conn`.
    ///
    /// Returns `NotFound` or `InvalidState` when no open session matched.
    async fn bump_revision<C: sea_orm::ConnectionTrait>(
        conn: &C,
        session_id: RegisterSessionId,
    ) -> Result<(), RegisterError> {
        let result = register_sessions::Entity::update_many()
            .col_expr(
                register_sessions::Column::Revision,
                Expr::col(register_sessions::Column::Revision).add(1),
            )
            .col_expr(register_sessions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(register_sessions::Column::Id.eq(session_id.into_inner()))
            .filter(register_sessions::Column::Status.eq(RegisterSessionStatus::Open))
            .exec(conn)
            .await
            .map_err(storage_error)?;

        if result.rows_affected == 0 {
            let exists = register_sessions::Entity::find_by_id(session_id.into_inner())
                .one(conn)
                .await
                .map_err(storage_error)?
                .is_some();
            return Err(if exists {
                RegisterError::session_closed(session_id)
            } else {
                RegisterError::session_not_found(session_id)
            });
        }
        Ok(())
    }
}

impl RegisterStore for RegisterRepository {
    async fn insert_session(
        &self,
        session: RegisterSession,
    ) -> Result<RegisterSession, RegisterError> {
        let now = Utc::now();
        let active_model = register_sessions::ActiveModel {
            id: Set(session.id.into_inner()),
            register_id: Set(session.register_id.clone()),
            name: Set(session.name.clone()),
            responsible: Set(session.responsible.clone()),
            opened_at: Set(session.opened_at.into()),
            closed_at: Set(None),
            opening_float: Set(session.opening_float),
            opening_float_breakdown: Set(encode(
                &session.opening_float_breakdown,
                "opening float breakdown",
            )?),
            cashiers: Set(encode(&session.cashiers, "cashiers")?),
            status: Set(RegisterSessionStatus::Open),
            notes: Set(session.notes.clone()),
            revision: Set(0),
            declared_amounts: Set(None),
            closing_summary: Set(None),
            review_status: Set(RegisterReviewStatus::Pending),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            review_notes: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                warn!(
                    register_id = %session.register_id,
                    "Rejected second open session for register"
                );
                RegisterError::register_busy(&session.register_id)
            } else {
                storage_error(e)
            }
        })?;

        to_session(model)
    }

    async fn find_session(
        &self,
        id: RegisterSessionId,
    ) -> Result<Option<RegisterSession>, RegisterError> {
        register_sessions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(to_session)
            .transpose()
    }

    async fn list_sessions(
        &self,
        filter: &SessionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<RegisterSession>, u64), RegisterError> {
        let mut query = register_sessions::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(register_sessions::Column::Status.eq(to_db_status(status)));
        }
        if let Some(review_status) = filter.review_status {
            query = query
                .filter(register_sessions::Column::ReviewStatus.eq(to_db_review(review_status)));
        }
        if let Some(register_id) = &filter.register_id {
            query = query.filter(register_sessions::Column::RegisterId.eq(register_id.as_str()));
        }
        if let Some(responsible) = &filter.responsible {
            query = query.filter(register_sessions::Column::Responsible.eq(responsible.as_str()));
        }
        if let Some(from) = filter.opened_from {
            query = query.filter(register_sessions::Column::OpenedAt.gte(from));
        }
        if let Some(to) = filter.opened_to {
            query = query.filter(register_sessions::Column::OpenedAt.lt(to));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(storage_error)?;

        let models = query
            .order_by_desc(register_sessions::Column::OpenedAt)
            .order_by_desc(register_sessions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        let sessions = models
            .into_iter()
            .map(to_session)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((sessions, total))
    }

    async fn latest_session(
        &self,
        register_id: &str,
    ) -> Result<Option<RegisterSession>, RegisterError> {
        register_sessions::Entity::find()
            .filter(register_sessions::Column::RegisterId.eq(register_id))
            .order_by_desc(register_sessions::Column::OpenedAt)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(to_session)
            .transpose()
    }

    async fn open_session_for(
        &self,
        register_id: &str,
    ) -> Result<Option<RegisterSession>, RegisterError> {
        register_sessions::Entity::find()
            .filter(register_sessions::Column::RegisterId.eq(register_id))
            .filter(register_sessions::Column::Status.eq(RegisterSessionStatus::Open))
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(to_session)
            .transpose()
    }

    async fn append_entry(&self, entry: LedgerEntry) -> Result<LedgerEntry, RegisterError> {
        let txn = self.db.begin().await.map_err(storage_error)?;

        Self::bump_revision(&txn, entry.session_id).await?;

        let active_model = cash_ledger_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            session_id: Set(entry.session_id.into_inner()),
            kind: Set(to_db_kind(entry.kind)),
            amount: Set(entry.amount),
            payment_method: Set(entry.payment_method.as_str().to_string()),
            description: Set(entry.description.clone()),
            recorded_by: Set(entry.recorded_by.clone()),
            recorded_at: Set(entry.recorded_at.into()),
        };
        let model = active_model.insert(&txn).await.map_err(storage_error)?;

        txn.commit().await.map_err(storage_error)?;
        to_entry(model)
    }

    async fn list_entries(
        &self,
        session_id: RegisterSessionId,
    ) -> Result<Vec<LedgerEntry>, RegisterError> {
        cash_ledger_entries::Entity::find()
            .filter(cash_ledger_entries::Column::SessionId.eq(session_id.into_inner()))
            .order_by_asc(cash_ledger_entries::Column::RecordedAt)
            .order_by_asc(cash_ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(to_entry)
            .collect()
    }

    async fn list_entries_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, RegisterError> {
        cash_ledger_entries::Entity::find()
            .filter(cash_ledger_entries::Column::RecordedAt.gte(start))
            .filter(cash_ledger_entries::Column::RecordedAt.lt(end))
            .order_by_asc(cash_ledger_entries::Column::RecordedAt)
            .order_by_asc(cash_ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(to_entry)
            .collect()
    }

    async fn delete_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, RegisterError> {
        let txn = self.db.begin().await.map_err(storage_error)?;

        let model = cash_ledger_entries::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| RegisterError::entry_not_found(id))?;
        let session_id = RegisterSessionId::from_uuid(model.session_id);

        Self::bump_revision(&txn, session_id)
            .await
            .map_err(|e| match e {
                RegisterError::InvalidState(_) => RegisterError::InvalidState(format!(
                    "ledger entry {id} belongs to closed register session {session_id}"
                )),
                other => other,
            })?;

        cash_ledger_entries::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_err(storage_error)?;

        txn.commit().await.map_err(storage_error)?;
        to_entry(model)
    }

    async fn close_session(&self, closing: SessionClosing) -> Result<CloseOutcome, RegisterError> {
        let session_id = closing.session_id;
        let update = register_sessions::ActiveModel {
            status: Set(RegisterSessionStatus::Closed),
            closed_at: Set(Some(closing.closed_at.into())),
            declared_amounts: Set(Some(encode(&closing.declared_amounts, "declared amounts")?)),
            closing_summary: Set(Some(encode(&closing.summary, "closing summary")?)),
            notes: closing.notes.map_or(NotSet, |n| Set(Some(n))),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let result = register_sessions::Entity::update_many()
            .set(update)
            .filter(register_sessions::Column::Id.eq(session_id.into_inner()))
            .filter(register_sessions::Column::Status.eq(RegisterSessionStatus::Open))
            .filter(register_sessions::Column::Revision.eq(closing.expected_revision))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;

        let current = self
            .find_session(session_id)
            .await?
            .ok_or_else(|| RegisterError::session_not_found(session_id))?;

        if result.rows_affected > 0 {
            return Ok(CloseOutcome::Closed(Box::new(current)));
        }
        if !current.is_open() {
            return Err(RegisterError::session_closed(session_id));
        }
        Ok(CloseOutcome::Stale {
            current_revision: current.revision,
        })
    }

    async fn review_session(&self, review: SessionReview) -> Result<RegisterSession, RegisterError> {
        let session_id = review.session_id;
        let update = register_sessions::ActiveModel {
            review_status: Set(to_db_review(review.status)),
            reviewed_by: Set(Some(review.reviewed_by)),
            reviewed_at: Set(Some(review.reviewed_at.into())),
            review_notes: Set(review.notes),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let result = register_sessions::Entity::update_many()
            .set(update)
            .filter(register_sessions::Column::Id.eq(session_id.into_inner()))
            .filter(register_sessions::Column::Status.eq(RegisterSessionStatus::Closed))
            .filter(register_sessions::Column::ReviewStatus.eq(RegisterReviewStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;

        let current = self
            .find_session(session_id)
            .await?
            .ok_or_else(|| RegisterError::session_not_found(session_id))?;

        if result.rows_affected > 0 {
            return Ok(current);
        }
        if current.is_open() {
            return Err(RegisterError::session_not_closed(session_id));
        }
        Err(RegisterError::already_reviewed(
            session_id,
            current.review_status,
        ))
    }

    async fn purge(&self, scope: PurgeScope) -> Result<PurgeReport, RegisterError> {
        let txn = self.db.begin().await.map_err(storage_error)?;

        let entries = cash_ledger_entries::Entity::delete_many()
            .exec(&txn)
            .await
            .map_err(storage_error)?;

        let sessions_deleted = match scope {
            PurgeScope::LedgerEntries => 0,
            PurgeScope::Sessions | PurgeScope::All => {
                register_sessions::Entity::delete_many()
                    .exec(&txn)
                    .await
                    .map_err(storage_error)?
                    .rows_affected
            }
        };

        txn.commit().await.map_err(storage_error)?;
        Ok(PurgeReport {
            sessions_deleted,
            entries_deleted: entries.rows_affected,
        })
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn encode<T: Serialize>(value: &T, what: &str) -> Result<serde_json::Value, RegisterError> {
    serde_json::to_value(value)
        .map_err(|e| RegisterError::storage(format!("failed to encode {what}: {e}")))
}

fn decode<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<T, RegisterError> {
    serde_json::from_value(value)
        .map_err(|e| RegisterError::storage(format!("stored {what} is malformed: {e}")))
}

fn to_db_status(status: SessionStatus) -> RegisterSessionStatus {
    match status {
        SessionStatus::Open => RegisterSessionStatus::Open,
        SessionStatus::Closed => RegisterSessionStatus::Closed,
    }
}

fn to_db_review(status: ReviewStatus) -> RegisterReviewStatus {
    match status {
        ReviewStatus::Pending => RegisterReviewStatus::Pending,
        ReviewStatus::Approved => RegisterReviewStatus::Approved,
        ReviewStatus::Rejected => RegisterReviewStatus::Rejected,
    }
}

fn to_db_kind(kind: EntryKind) -> LedgerEntryKind {
    match kind {
        EntryKind::Income => LedgerEntryKind::Income,
        EntryKind::Expense => LedgerEntryKind::Expense,
    }
}

fn to_session(model: register_sessions::Model) -> Result<RegisterSession, RegisterError> {
    Ok(RegisterSession {
        id: RegisterSessionId::from_uuid(model.id),
        register_id: model.register_id,
        name: model.name,
        responsible: model.responsible,
        opened_at: model.opened_at.with_timezone(&Utc),
        closed_at: model.closed_at.map(|t| t.with_timezone(&Utc)),
        opening_float: model.opening_float,
        opening_float_breakdown: decode(model.opening_float_breakdown, "opening float breakdown")?,
        cashiers: decode(model.cashiers, "cashiers")?,
        status: match model.status {
            RegisterSessionStatus::Open => SessionStatus::Open,
            RegisterSessionStatus::Closed => SessionStatus::Closed,
        },
        notes: model.notes,
        revision: model.revision,
        declared_amounts: model
            .declared_amounts
            .map(|v| decode(v, "declared amounts"))
            .transpose()?,
        closing_summary: model
            .closing_summary
            .map(|v| decode(v, "closing summary"))
            .transpose()?,
        review_status: match model.review_status {
            RegisterReviewStatus::Pending => ReviewStatus::Pending,
            RegisterReviewStatus::Approved => ReviewStatus::Approved,
            RegisterReviewStatus::Rejected => ReviewStatus::Rejected,
        },
        reviewed_by: model.reviewed_by,
        reviewed_at: model.reviewed_at.map(|t| t.with_timezone(&Utc)),
        review_notes: model.review_notes,
    })
}

fn to_entry(model: cash_ledger_entries::Model) -> Result<LedgerEntry, RegisterError> {
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(model.id),
        session_id: RegisterSessionId::from_uuid(model.session_id),
        kind: match model.kind {
            LedgerEntryKind::Income => EntryKind::Income,
            LedgerEntryKind::Expense => EntryKind::Expense,
        },
        amount: model.amount,
        payment_method: cuadra_core::register::PaymentMethod::parse(&model.payment_method)?,
        description: model.description,
        recorded_by: model.recorded_by,
        recorded_at: model.recorded_at.with_timezone(&Utc),
    })
}
