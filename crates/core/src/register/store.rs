//! Ports implemented by persistence and feed adapters.
//!
//! The db crate implements these against PostgreSQL; `memory` implements them
//! for tests and local runs.

use chrono::{DateTime, Utc};
use cuadra_shared::types::{LedgerEntryId, PageRequest, RegisterSessionId};

use super::error::RegisterError;
use super::types::{
    CloseOutcome, FeedTotals, LedgerEntry, PurgeReport, PurgeScope, RegisterSession,
    SessionClosing, SessionFilter, SessionReview,
};

/// Durable storage for sessions and their ledger entries.
pub trait RegisterStore: Send + Sync {
    /// Persist a new open session.
    ///
    /// Fails with `Conflict` if the register already has an open session. The
    /// check and the insert must be atomic.
    fn insert_session(
        &self,
        session: RegisterSession,
    ) -> impl std::future::Future<Output = Result<RegisterSession, RegisterError>> + Send;

    /// Find a session by ID.
    fn find_session(
        &self,
        id: RegisterSessionId,
    ) -> impl std::future::Future<Output = Result<Option<RegisterSession>, RegisterError>> + Send;

    /// List sessions matching a filter, newest first, with the total match count.
    fn list_sessions(
        &self,
        filter: &SessionFilter,
        page: &PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<RegisterSession>, u64), RegisterError>> + Send;

    /// The most recently opened session on a register, in any status.
    fn latest_session(
        &self,
        register_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<RegisterSession>, RegisterError>> + Send;

    /// The open session on a register, if any.
    fn open_session_for(
        &self,
        register_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<RegisterSession>, RegisterError>> + Send;

    /// Append an entry and bump the session revision in one atomic step.
    ///
    /// Fails with `NotFound` for an unknown session and `InvalidState` for a
    /// closed one; nothing is written in either case.
    fn append_entry(
        &self,
        entry: LedgerEntry,
    ) -> impl std::future::Future<Output = Result<LedgerEntry, RegisterError>> + Send;

    /// Entries of a session in insertion order.
    fn list_entries(
        &self,
        session_id: RegisterSessionId,
    ) -> impl std::future::Future<Output = Result<Vec<LedgerEntry>, RegisterError>> + Send;

    /// Entries of any session with `start <= recorded_at < end`.
    fn list_entries_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<LedgerEntry>, RegisterError>> + Send;

    /// Delete an entry and bump its session revision in one atomic step.
    ///
    /// Fails with `NotFound` for an unknown entry and `InvalidState` once the
    /// owning session is closed.
    fn delete_entry(
        &self,
        id: LedgerEntryId,
    ) -> impl std::future::Future<Output = Result<LedgerEntry, RegisterError>> + Send;

    /// Close a session if it is still open at `closing.expected_revision`.
    ///
    /// Returns `Stale` when the session is open at a different revision.
    fn close_session(
        &self,
        closing: SessionClosing,
    ) -> impl std::future::Future<Output = Result<CloseOutcome, RegisterError>> + Send;

    /// Record a review on a closed session that is still pending review.
    ///
    /// Only the review fields change. Fails with `NotFound` for an unknown
    /// session and `InvalidState` if it is open or was already reviewed.
    fn review_session(
        &self,
        review: SessionReview,
    ) -> impl std::future::Future<Output = Result<RegisterSession, RegisterError>> + Send;

    /// Bulk-delete rows. Administrative; not part of normal operation.
    fn purge(
        &self,
        scope: PurgeScope,
    ) -> impl std::future::Future<Output = Result<PurgeReport, RegisterError>> + Send;
}

/// Read-only view of the sales and expense subsystems.
pub trait SalesFeed: Send + Sync {
    /// Totals per payment method for `[start, end)` on a register.
    fn totals(
        &self,
        register_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<FeedTotals, RegisterError>> + Send;
}
