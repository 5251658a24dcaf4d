//! Register service: session lifecycle, cash ledger and closing.
//!
//! The service owns the rules; the store only guarantees atomicity of the
//! individual writes it is handed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cuadra_shared::RegisterConfig;
use cuadra_shared::types::{
    Currency, LedgerEntryId, PageRequest, PageResponse, RegisterSessionId,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::closing::{ClosingEngine, ClosingInput, ClosingSummary};
use super::error::RegisterError;
use super::payment::{
    Breakdown, PaymentMethod, breakdown_total, check_amount, normalize_breakdown,
};
use super::store::{RegisterStore, SalesFeed};
use super::types::{
    CloseOutcome, CloseSessionInput, HintSource, LedgerEntry, OpenSessionInput, OpeningHint,
    PurgeReport, PurgeScope, RecordEntryInput, RegisterSession, ReviewInput, ReviewStatus,
    SessionClosing, SessionFilter,
};
use super::validation::{
    MAX_REGISTER_ID_LEN, require_text, validate_declared, validate_entry, validate_open,
    validate_range, validate_review,
};

/// Reconciliation settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct RegisterSettings {
    /// Maximum acceptable absolute aggregate difference.
    pub tolerance: Decimal,
    /// Currency amounts are rounded to when comparing totals.
    pub currency: Currency,
    /// Float suggested for registers without history.
    pub default_opening_float: Breakdown,
    /// Close attempts before giving up on a busy session.
    pub max_close_attempts: u32,
}

impl RegisterSettings {
    /// Builds settings from the `register` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::Validation` if the tolerance is negative or out
    /// of range, or the default float is not a valid breakdown.
    pub fn from_config(config: &RegisterConfig) -> Result<Self, RegisterError> {
        if config.tolerance.is_sign_negative() && !config.tolerance.is_zero() {
            return Err(RegisterError::validation("tolerance must not be negative"));
        }
        check_amount("tolerance", config.tolerance)?;
        Ok(Self {
            tolerance: config.tolerance,
            currency: config.currency,
            default_opening_float: normalize_breakdown(
                &config.default_opening_float,
                "default opening float",
            )?,
            max_close_attempts: config.max_close_attempts.max(1),
        })
    }
}

impl Default for RegisterSettings {
    fn default() -> Self {
        let config = RegisterConfig::default();
        let default_opening_float = config
            .default_opening_float
            .iter()
            .filter_map(|(method, amount)| Some((PaymentMethod::parse(method).ok()?, *amount)))
            .collect();
        Self {
            tolerance: config.tolerance,
            currency: config.currency,
            default_opening_float,
            max_close_attempts: config.max_close_attempts.max(1),
        }
    }
}

/// Register service.
pub struct RegisterService<S: RegisterStore, F: SalesFeed> {
    store: Arc<S>,
    feed: Arc<F>,
    settings: RegisterSettings,
}

impl<S: RegisterStore, F: SalesFeed> Clone for RegisterService<S, F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            feed: Arc::clone(&self.feed),
            settings: self.settings.clone(),
        }
    }
}

impl<S: RegisterStore, F: SalesFeed> RegisterService<S, F> {
    /// Create a new register service.
    #[must_use]
    pub fn new(store: Arc<S>, feed: Arc<F>, settings: RegisterSettings) -> Self {
        Self {
            store,
            feed,
            settings,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &RegisterSettings {
        &self.settings
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Open a session on a register.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed request and `Conflict` if the
    /// register already has an open session.
    pub async fn open_session(
        &self,
        input: OpenSessionInput,
    ) -> Result<RegisterSession, RegisterError> {
        let session = validate_open(&input, self.settings.currency, Utc::now())?;
        let session = self.store.insert_session(session).await?;

        info!(
            session_id = %session.id,
            register_id = %session.register_id,
            opening_float = %session.opening_float,
            "Register session opened"
        );
        Ok(session)
    }

    /// Fetch a session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub async fn get_session(
        &self,
        id: RegisterSessionId,
    ) -> Result<RegisterSession, RegisterError> {
        self.store
            .find_session(id)
            .await?
            .ok_or_else(|| RegisterError::session_not_found(id))
    }

    /// List sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an inverted date range.
    pub async fn list_sessions(
        &self,
        filter: SessionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<RegisterSession>, RegisterError> {
        if let (Some(from), Some(to)) = (filter.opened_from, filter.opened_to) {
            validate_range(from, to)?;
        }
        let (sessions, total) = self.store.list_sessions(&filter, &page).await?;
        Ok(PageResponse::new(sessions, page.page, page.per_page, total))
    }

    /// Suggest the opening float for a register's next session.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank register ID.
    pub async fn opening_hint(&self, register_id: &str) -> Result<OpeningHint, RegisterError> {
        let register_id = require_text("register_id", register_id, MAX_REGISTER_ID_LEN)?;
        let open = self.store.open_session_for(&register_id).await?;
        let latest = self.store.latest_session(&register_id).await?;

        let (suggested_breakdown, source) = match latest {
            Some(previous) if !previous.opening_float_breakdown.is_empty() => {
                (previous.opening_float_breakdown, HintSource::PreviousSession)
            }
            _ => (
                self.settings.default_opening_float.clone(),
                HintSource::Default,
            ),
        };

        Ok(OpeningHint {
            suggested_float: breakdown_total(&suggested_breakdown)?,
            suggested_breakdown,
            source,
            open_session_id: open.map(|s| s.id),
            register_id,
        })
    }

    // ========================================================================
    // Ledger
    // ========================================================================

    /// Record an income or expense against an open session.
    ///
    /// # Errors
    ///
    /// Returns `Validation` before any store access for a non-positive amount
    /// or blank method, `NotFound` for an unknown session, and `InvalidState`
    /// for a closed one.
    pub async fn record_entry(
        &self,
        session_id: RegisterSessionId,
        input: RecordEntryInput,
    ) -> Result<LedgerEntry, RegisterError> {
        let entry = validate_entry(session_id, &input, Utc::now())?;
        let entry = self.store.append_entry(entry).await?;

        info!(
            session_id = %session_id,
            entry_id = %entry.id,
            kind = ?entry.kind,
            amount = %entry.amount,
            payment_method = %entry.payment_method,
            "Ledger entry recorded"
        );
        Ok(entry)
    }

    /// Entries of a session in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session.
    pub async fn list_entries(
        &self,
        session_id: RegisterSessionId,
    ) -> Result<Vec<LedgerEntry>, RegisterError> {
        self.get_session(session_id).await?;
        self.store.list_entries(session_id).await
    }

    /// Entries across sessions with `start <= recorded_at < end`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `start` is after `end`.
    pub async fn list_entries_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, RegisterError> {
        validate_range(start, end)?;
        self.store.list_entries_between(start, end).await
    }

    /// Delete an entry of an open session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown entry and `InvalidState` once its
    /// session is closed.
    pub async fn delete_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, RegisterError> {
        let removed = self.store.delete_entry(id).await?;
        warn!(
            session_id = %removed.session_id,
            entry_id = %id,
            amount = %removed.amount,
            "Ledger entry deleted"
        );
        Ok(removed)
    }

    // ========================================================================
    // Closing
    // ========================================================================

    /// Compute the closing summary.
    ///
    /// An open session gets a preview over `[opened_at, now)`; nothing is
    /// written. A closed session returns the report persisted at close, which
    /// already carries the amounts declared then, so the request must not
    /// declare any.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed declared amounts, `NotFound` for an
    /// unknown session, and `InvalidState` for amounts declared against a
    /// closed session.
    pub async fn compute_summary(
        &self,
        session_id: RegisterSessionId,
        input: &CloseSessionInput,
    ) -> Result<ClosingSummary, RegisterError> {
        let declared = validate_declared(input)?;
        let session = self.get_session(session_id).await?;

        if !session.is_open() {
            if !declared.is_empty() {
                return Err(RegisterError::InvalidState(format!(
                    "register session {session_id} is closed, its report already holds the declared amounts"
                )));
            }
            return session.closing_summary.ok_or_else(|| {
                RegisterError::storage(format!(
                    "closed register session {session_id} has no stored summary"
                ))
            });
        }

        self.summarize(&session, &declared, Utc::now()).await
    }

    /// Close a session, persisting the report and counted totals.
    ///
    /// The report is computed at the session's current revision and the close
    /// only succeeds if the revision is unchanged. If a ledger write lands in
    /// between, the report is recomputed, up to `max_close_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed declared amounts, `NotFound` for an
    /// unknown session, `InvalidState` if it is already closed, and a retryable
    /// `Storage` error when the session kept changing.
    pub async fn close_session(
        &self,
        session_id: RegisterSessionId,
        input: CloseSessionInput,
    ) -> Result<ClosingSummary, RegisterError> {
        let declared = validate_declared(&input)?;
        let notes = input.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());

        for attempt in 1..=self.settings.max_close_attempts {
            let session = self.get_session(session_id).await?;
            if !session.is_open() {
                return Err(RegisterError::session_closed(session_id));
            }

            let closed_at = Utc::now();
            let summary = self.summarize(&session, &declared, closed_at).await?;
            let closing = SessionClosing {
                session_id,
                expected_revision: session.revision,
                declared_amounts: declared.clone(),
                summary: summary.clone(),
                notes: notes.map(str::to_string),
                closed_at,
            };

            match self.store.close_session(closing).await? {
                CloseOutcome::Closed(_) => {
                    info!(
                        session_id = %session_id,
                        total_difference = %summary.total_difference,
                        within_tolerance = summary.within_tolerance,
                        "Register session closed"
                    );
                    return Ok(summary);
                }
                CloseOutcome::Stale { current_revision } => {
                    warn!(
                        session_id = %session_id,
                        attempt,
                        computed_at = session.revision,
                        current_revision,
                        "Ledger changed while closing, recomputing summary"
                    );
                }
            }
        }

        Err(RegisterError::transient(format!(
            "register session {session_id} kept changing while closing, please retry"
        )))
    }

    // ========================================================================
    // Review
    // ========================================================================

    /// Approve a closed session.
    ///
    /// Records the reviewer and timestamp; the persisted report and the
    /// ledger are untouched.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank reviewer, `NotFound` for an unknown
    /// session, and `InvalidState` if it is still open or already reviewed.
    pub async fn approve_session(
        &self,
        session_id: RegisterSessionId,
        input: ReviewInput,
    ) -> Result<RegisterSession, RegisterError> {
        self.review(session_id, ReviewStatus::Approved, &input).await
    }

    /// Reject a closed session.
    ///
    /// # Errors
    ///
    /// Same as [`Self::approve_session`].
    pub async fn reject_session(
        &self,
        session_id: RegisterSessionId,
        input: ReviewInput,
    ) -> Result<RegisterSession, RegisterError> {
        self.review(session_id, ReviewStatus::Rejected, &input).await
    }

    async fn review(
        &self,
        session_id: RegisterSessionId,
        status: ReviewStatus,
        input: &ReviewInput,
    ) -> Result<RegisterSession, RegisterError> {
        let review = validate_review(session_id, status, input, Utc::now())?;
        let session = self.store.review_session(review).await?;

        info!(
            session_id = %session_id,
            review_status = %session.review_status,
            reviewed_by = session.reviewed_by.as_deref().unwrap_or_default(),
            "Register session reviewed"
        );
        Ok(session)
    }

    /// Bulk-delete store rows.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store fails.
    pub async fn purge(&self, scope: PurgeScope) -> Result<PurgeReport, RegisterError> {
        let report = self.store.purge(scope).await?;
        warn!(
            ?scope,
            sessions = report.sessions_deleted,
            entries = report.entries_deleted,
            "Register data purged"
        );
        Ok(report)
    }

    /// Reads entries then feed totals for the session and runs the engine.
    ///
    /// The session must have been read before its entries, so a write that
    /// lands after the read shows up as a revision change at close.
    async fn summarize(
        &self,
        session: &RegisterSession,
        declared: &Breakdown,
        window_end: DateTime<Utc>,
    ) -> Result<ClosingSummary, RegisterError> {
        let entries = self.store.list_entries(session.id).await?;
        let feed = self
            .feed
            .totals(&session.register_id, session.opened_at, window_end)
            .await?;

        let input = ClosingInput {
            session,
            entries: &entries,
            feed: &feed,
            declared,
            window_end,
            tolerance: self.settings.tolerance,
        };
        ClosingEngine::summarize(&input, Utc::now())
    }
}
