//! Cash register reconciliation.
//!
//! This module implements the register ("cuadre de caja") functionality:
//! - Session lifecycle (open, close) with an opening float per payment method
//! - The append-only cash ledger of incomes and expenses
//! - The closing summary engine reconciling expected and declared amounts
//! - Ports for persistence and for the external sales/expense feed
//! - An in-memory store and feed

pub mod closing;
pub mod error;
pub mod memory;
pub mod payment;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod closing_props;

pub use closing::{ClosingEngine, ClosingInput, ClosingSummary, MethodSummary};
pub use error::RegisterError;
pub use memory::{InMemoryRegisterStore, StaticSalesFeed};
pub use payment::{Breakdown, PaymentMethod};
pub use service::{RegisterService, RegisterSettings};
pub use store::{RegisterStore, SalesFeed};
pub use types::{
    CloseOutcome, CloseSessionInput, EntryKind, FeedTotals, HintSource, LedgerEntry,
    OpenSessionInput, OpeningHint, PurgeReport, PurgeScope, RecordEntryInput, RegisterSession,
    ReviewInput, ReviewStatus, SessionClosing, SessionFilter, SessionReview, SessionStatus,
};
