//! Register domain types.
//!
//! Sessions, ledger entries, and the inputs and outcomes exchanged with the
//! store and feed ports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cuadra_shared::types::{LedgerEntryId, RegisterSessionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::closing::ClosingSummary;
use super::payment::{Breakdown, PaymentMethod};

/// Register session status.
///
/// Sessions only ever move from `Open` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting ledger entries.
    Open,
    /// Reconciled and immutable.
    Closed,
}

impl SessionStatus {
    /// Returns true if ledger entries may still be recorded.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns the lowercase name used in storage and query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Unknown session status: {s}")),
        }
    }
}

/// Supervisor review of a closed session.
///
/// Every session starts `Pending`; a closed session moves once to `Approved`
/// or `Rejected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Not reviewed yet.
    #[default]
    Pending,
    /// Accepted by a supervisor.
    Approved,
    /// Sent back by a supervisor.
    Rejected,
}

impl ReviewStatus {
    /// Returns the lowercase name used in storage and query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown review status: {s}")),
        }
    }
}

/// Direction of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money put into the register.
    Income,
    /// Money taken out of the register.
    Expense,
}

/// A cash register session ("cuadre de caja").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterSession {
    /// Session ID.
    pub id: RegisterSessionId,
    /// Physical register the session runs on.
    pub register_id: String,
    /// Display name.
    pub name: String,
    /// Operator responsible for the drawer.
    pub responsible: String,
    /// When the session was opened.
    pub opened_at: DateTime<Utc>,
    /// When the session was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Total opening float; always the sum of the breakdown.
    pub opening_float: Decimal,
    /// Opening float per payment method.
    pub opening_float_breakdown: Breakdown,
    /// Cashiers who worked the shift.
    pub cashiers: Vec<String>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Bumped by every ledger mutation; the close compare-and-set token.
    pub revision: i64,
    /// Counted totals submitted at close.
    pub declared_amounts: Option<Breakdown>,
    /// Report persisted at close.
    pub closing_summary: Option<ClosingSummary>,
    /// Supervisor review outcome.
    pub review_status: ReviewStatus,
    /// Supervisor who approved or rejected the session.
    pub reviewed_by: Option<String>,
    /// When the review was recorded.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewer's remarks.
    pub review_notes: Option<String>,
}

impl RegisterSession {
    /// Returns true if ledger entries may still be recorded.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// A single income or expense recorded against a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: LedgerEntryId,
    /// Owning session.
    pub session_id: RegisterSessionId,
    /// Income or expense.
    pub kind: EntryKind,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Normalized payment method.
    pub payment_method: PaymentMethod,
    /// Optional description ("concepto").
    pub description: Option<String>,
    /// Operator who recorded the movement.
    pub recorded_by: Option<String>,
    /// When the movement was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Input for opening a session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenSessionInput {
    /// Physical register.
    pub register_id: String,
    /// Display name.
    pub name: String,
    /// Responsible operator.
    pub responsible: String,
    /// Opening float per payment method, keys not yet normalized.
    pub opening_float_breakdown: BTreeMap<String, Decimal>,
    /// Total the operator believes the breakdown adds up to.
    #[serde(default)]
    pub declared_opening_float: Option<Decimal>,
    /// Cashiers working the shift.
    #[serde(default)]
    pub cashiers: Vec<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for recording a ledger entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEntryInput {
    /// Income or expense.
    pub kind: EntryKind,
    /// Amount; must be strictly positive.
    pub amount: Decimal,
    /// Payment method, not yet normalized.
    pub payment_method: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional operator.
    #[serde(default)]
    pub recorded_by: Option<String>,
}

/// Input for closing a session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloseSessionInput {
    /// Counted totals per payment method, keys not yet normalized.
    #[serde(default)]
    pub declared_amounts: BTreeMap<String, Decimal>,
    /// Closing notes; replaces the session notes when present.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for approving or rejecting a closed session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewInput {
    /// Supervisor recording the decision.
    pub reviewer: String,
    /// Optional remarks.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A review decision the store applies to a closed, pending session.
#[derive(Debug, Clone)]
pub struct SessionReview {
    /// Session being reviewed.
    pub session_id: RegisterSessionId,
    /// `Approved` or `Rejected`.
    pub status: ReviewStatus,
    /// Supervisor recording the decision.
    pub reviewed_by: String,
    /// Reviewer's remarks.
    pub notes: Option<String>,
    /// Decision instant.
    pub reviewed_at: DateTime<Utc>,
}

/// Filter for listing sessions. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFilter {
    /// Only sessions in this status.
    pub status: Option<SessionStatus>,
    /// Only sessions with this review outcome.
    pub review_status: Option<ReviewStatus>,
    /// Only sessions on this register.
    pub register_id: Option<String>,
    /// Only sessions with this responsible operator.
    pub responsible: Option<String>,
    /// Only sessions opened at or after this instant.
    pub opened_from: Option<DateTime<Utc>>,
    /// Only sessions opened before this instant.
    pub opened_to: Option<DateTime<Utc>>,
}

impl SessionFilter {
    /// Returns true if the session passes every set criterion.
    #[must_use]
    pub fn matches(&self, session: &RegisterSession) -> bool {
        self.status.is_none_or(|s| s == session.status)
            && self.review_status.is_none_or(|r| r == session.review_status)
            && self
                .register_id
                .as_deref()
                .is_none_or(|r| r == session.register_id)
            && self
                .responsible
                .as_deref()
                .is_none_or(|r| r == session.responsible)
            && self.opened_from.is_none_or(|t| session.opened_at >= t)
            && self.opened_to.is_none_or(|t| session.opened_at < t)
    }
}

/// Where an opening hint's breakdown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintSource {
    /// The register's most recent session.
    PreviousSession,
    /// The configured default float.
    Default,
}

/// Suggested opening float for a register's next session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningHint {
    /// Register the hint is for.
    pub register_id: String,
    /// Suggested float per payment method.
    pub suggested_breakdown: Breakdown,
    /// Sum of the suggested breakdown.
    pub suggested_float: Decimal,
    /// Where the suggestion came from.
    pub source: HintSource,
    /// The register's currently open session, if any.
    pub open_session_id: Option<RegisterSessionId>,
}

/// Totals reported by the external sales and expense feed for a window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedTotals {
    /// Settled sales per payment method.
    pub sales: Breakdown,
    /// Expenses paid outside the cash ledger, per payment method.
    pub external_expenses: Breakdown,
}

/// Everything the store needs to close a session in one step.
#[derive(Debug, Clone)]
pub struct SessionClosing {
    /// Session to close.
    pub session_id: RegisterSessionId,
    /// Revision the summary was computed at; the close fails as stale otherwise.
    pub expected_revision: i64,
    /// Counted totals.
    pub declared_amounts: Breakdown,
    /// Report to persist.
    pub summary: ClosingSummary,
    /// New notes, if any.
    pub notes: Option<String>,
    /// Closing instant.
    pub closed_at: DateTime<Utc>,
}

/// Result of a compare-and-set close.
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    /// The session is now closed.
    Closed(Box<RegisterSession>),
    /// The session is still open but its revision moved on.
    Stale {
        /// Revision currently stored.
        current_revision: i64,
    },
}

/// Which rows a bulk purge removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeScope {
    /// Every ledger entry; sessions stay.
    LedgerEntries,
    /// Every session together with its entries.
    Sessions,
    /// Everything the store holds.
    All,
}

impl std::str::FromStr for PurgeScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ledger_entries" | "entries" => Ok(Self::LedgerEntries),
            "sessions" => Ok(Self::Sessions),
            "all" => Ok(Self::All),
            _ => Err(format!("Unknown purge scope: {s}")),
        }
    }
}

/// Row counts removed by a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Sessions deleted.
    pub sessions_deleted: u64,
    /// Ledger entries deleted.
    pub entries_deleted: u64,
}
