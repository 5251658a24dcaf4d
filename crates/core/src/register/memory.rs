//! In-memory store and feed.
//!
//! Backs unit and HTTP tests and local runs without PostgreSQL. All state sits
//! behind one lock, which makes every store operation atomic.

use chrono::{DateTime, Utc};
use cuadra_shared::types::{LedgerEntryId, PageRequest, RegisterSessionId};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::error::RegisterError;
use super::payment::{PaymentMethod, accumulate};
use super::store::{RegisterStore, SalesFeed};
use super::types::{
    CloseOutcome, FeedTotals, LedgerEntry, PurgeReport, PurgeScope, RegisterSession,
    ReviewStatus, SessionClosing, SessionFilter, SessionReview, SessionStatus,
};

#[derive(Debug, Default)]
struct State {
    sessions: Vec<RegisterSession>,
    entries: Vec<LedgerEntry>,
}

impl State {
    fn session_mut(&mut self, id: RegisterSessionId) -> Option<&mut RegisterSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }
}

/// Register store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRegisterStore {
    state: RwLock<State>,
}

impl InMemoryRegisterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl RegisterStore for InMemoryRegisterStore {
    async fn insert_session(
        &self,
        session: RegisterSession,
    ) -> Result<RegisterSession, RegisterError> {
        let mut state = self.state.write().await;
        if state
            .sessions
            .iter()
            .any(|s| s.register_id == session.register_id && s.is_open())
        {
            return Err(RegisterError::register_busy(&session.register_id));
        }
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session(
        &self,
        id: RegisterSessionId,
    ) -> Result<Option<RegisterSession>, RegisterError> {
        let state = self.state.read().await;
        Ok(state.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sessions(
        &self,
        filter: &SessionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<RegisterSession>, u64), RegisterError> {
        let state = self.state.read().await;
        let mut matching: Vec<&RegisterSession> =
            state.sessions.iter().filter(|s| filter.matches(s)).collect();
        matching.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));

        let total = count(matching.len());
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let sessions = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((sessions, total))
    }

    async fn latest_session(
        &self,
        register_id: &str,
    ) -> Result<Option<RegisterSession>, RegisterError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .iter()
            .filter(|s| s.register_id == register_id)
            .max_by_key(|s| s.opened_at)
            .cloned())
    }

    async fn open_session_for(
        &self,
        register_id: &str,
    ) -> Result<Option<RegisterSession>, RegisterError> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .iter()
            .find(|s| s.register_id == register_id && s.is_open())
            .cloned())
    }

    async fn append_entry(&self, entry: LedgerEntry) -> Result<LedgerEntry, RegisterError> {
        let mut state = self.state.write().await;
        let session = state
            .session_mut(entry.session_id)
            .ok_or_else(|| RegisterError::session_not_found(entry.session_id))?;
        if !session.is_open() {
            return Err(RegisterError::session_closed(entry.session_id));
        }
        session.revision += 1;
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_entries(
        &self,
        session_id: RegisterSessionId,
    ) -> Result<Vec<LedgerEntry>, RegisterError> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_entries_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, RegisterError> {
        let state = self.state.read().await;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| e.recorded_at >= start && e.recorded_at < end)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.recorded_at);
        Ok(entries)
    }

    async fn delete_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, RegisterError> {
        let mut state = self.state.write().await;
        let position = state
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| RegisterError::entry_not_found(id))?;
        let session_id = state.entries[position].session_id;
        let session = state
            .session_mut(session_id)
            .ok_or_else(|| RegisterError::session_not_found(session_id))?;
        if !session.is_open() {
            return Err(RegisterError::InvalidState(format!(
                "ledger entry {id} belongs to closed register session {session_id}"
            )));
        }
        session.revision += 1;
        Ok(state.entries.remove(position))
    }

    async fn close_session(&self, closing: SessionClosing) -> Result<CloseOutcome, RegisterError> {
        let mut state = self.state.write().await;
        let session = state
            .session_mut(closing.session_id)
            .ok_or_else(|| RegisterError::session_not_found(closing.session_id))?;
        if !session.is_open() {
            return Err(RegisterError::session_closed(closing.session_id));
        }
        if session.revision != closing.expected_revision {
            return Ok(CloseOutcome::Stale {
                current_revision: session.revision,
            });
        }

        session.status = SessionStatus::Closed;
        session.closed_at = Some(closing.closed_at);
        session.declared_amounts = Some(closing.declared_amounts);
        session.closing_summary = Some(closing.summary);
        if let Some(notes) = closing.notes {
            session.notes = Some(notes);
        }
        Ok(CloseOutcome::Closed(Box::new(session.clone())))
    }

    async fn review_session(&self, review: SessionReview) -> Result<RegisterSession, RegisterError> {
        let mut state = self.state.write().await;
        let session = state
            .session_mut(review.session_id)
            .ok_or_else(|| RegisterError::session_not_found(review.session_id))?;
        if session.is_open() {
            return Err(RegisterError::session_not_closed(review.session_id));
        }
        if session.review_status != ReviewStatus::Pending {
            return Err(RegisterError::already_reviewed(
                review.session_id,
                session.review_status,
            ));
        }

        session.review_status = review.status;
        session.reviewed_by = Some(review.reviewed_by);
        session.reviewed_at = Some(review.reviewed_at);
        session.review_notes = review.notes;
        Ok(session.clone())
    }

    async fn purge(&self, scope: PurgeScope) -> Result<PurgeReport, RegisterError> {
        let mut state = self.state.write().await;
        let entries_deleted = count(state.entries.len());
        state.entries.clear();

        let sessions_deleted = match scope {
            PurgeScope::LedgerEntries => 0,
            PurgeScope::Sessions | PurgeScope::All => {
                let n = count(state.sessions.len());
                state.sessions.clear();
                n
            }
        };

        Ok(PurgeReport {
            sessions_deleted,
            entries_deleted,
        })
    }
}

/// One sale or expense row known to a [`StaticSalesFeed`].
#[derive(Debug, Clone)]
struct FeedRow {
    register_id: String,
    payment_method: Option<String>,
    amount: Decimal,
    at: DateTime<Utc>,
}

impl FeedRow {
    fn in_window(&self, register_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.register_id == register_id && self.at >= start && self.at < end
    }
}

/// Sales feed over a fixed set of rows.
#[derive(Debug, Clone, Default)]
pub struct StaticSalesFeed {
    sales: Vec<FeedRow>,
    expenses: Vec<FeedRow>,
}

impl StaticSalesFeed {
    /// Create a feed with no rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a settled sale.
    #[must_use]
    pub fn with_sale(
        mut self,
        register_id: &str,
        payment_method: Option<&str>,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Self {
        self.sales.push(FeedRow {
            register_id: register_id.to_string(),
            payment_method: payment_method.map(str::to_string),
            amount,
            at,
        });
        self
    }

    /// Add an expense paid outside the cash ledger.
    #[must_use]
    pub fn with_expense(
        mut self,
        register_id: &str,
        payment_method: Option<&str>,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Self {
        self.expenses.push(FeedRow {
            register_id: register_id.to_string(),
            payment_method: payment_method.map(str::to_string),
            amount,
            at,
        });
        self
    }
}

impl SalesFeed for StaticSalesFeed {
    async fn totals(
        &self,
        register_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<FeedTotals, RegisterError> {
        let mut totals = FeedTotals::default();
        for row in self.sales.iter().filter(|r| r.in_window(register_id, start, end)) {
            accumulate(
                &mut totals.sales,
                PaymentMethod::from_feed(row.payment_method.as_deref()),
                row.amount,
            )?;
        }
        for row in self
            .expenses
            .iter()
            .filter(|r| r.in_window(register_id, start, end))
        {
            accumulate(
                &mut totals.external_expenses,
                PaymentMethod::from_feed(row.payment_method.as_deref()),
                row.amount,
            )?;
        }
        Ok(totals)
    }
}
