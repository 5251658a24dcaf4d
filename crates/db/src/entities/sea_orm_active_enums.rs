//! Enumerations stored as constrained text columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `register_sessions.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RegisterSessionStatus {
    /// Accepting ledger entries.
    #[sea_orm(string_value = "open")]
    Open,
    /// Reconciled.
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// `register_sessions.review_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RegisterReviewStatus {
    /// Awaiting supervisor review.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// `cash_ledger_entries.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum LedgerEntryKind {
    /// Money in.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money out.
    #[sea_orm(string_value = "expense")]
    Expense,
}
