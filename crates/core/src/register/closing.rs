//! Closing summary engine.
//!
//! Pure computation: given a session, its ledger entries, the feed totals for
//! the session window and the counted totals, produce the reconciliation
//! report. Nothing here touches a store.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use cuadra_shared::types::RegisterSessionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::RegisterError;
use super::payment::{Breakdown, PaymentMethod, accumulate, checked_diff, checked_sum};
use super::types::{EntryKind, FeedTotals, LedgerEntry, RegisterSession};

/// Reconciliation of one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSummary {
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Opening float placed in this method.
    pub opening: Decimal,
    /// Sum of INCOME entries.
    pub incomes: Decimal,
    /// Sum of EXPENSE entries.
    pub expenses: Decimal,
    /// Settled sales reported by the feed.
    pub sales: Decimal,
    /// Expenses paid outside the ledger, reported by the feed.
    pub external_expenses: Decimal,
    /// What should be in the drawer. May be negative.
    pub expected: Decimal,
    /// What the operator counted.
    pub declared: Decimal,
    /// `declared - expected`.
    pub difference: Decimal,
}

/// Reconciliation report for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingSummary {
    /// Session the report is for.
    pub session_id: RegisterSessionId,
    /// Register the session ran on.
    pub register_id: String,
    /// Start of the window (session opening).
    pub window_start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub window_end: DateTime<Utc>,
    /// Session revision the report was computed at.
    pub revision: i64,
    /// Number of ledger entries included.
    pub entry_count: usize,
    /// Per-method lines in lexical order of method.
    pub methods: Vec<MethodSummary>,
    /// Sum of expected amounts.
    pub total_expected: Decimal,
    /// Sum of declared amounts.
    pub total_declared: Decimal,
    /// Sum of per-method differences.
    pub total_difference: Decimal,
    /// Tolerance the report was judged against.
    pub tolerance: Decimal,
    /// `|total_difference| <= tolerance`.
    pub within_tolerance: bool,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// SHA-256 over the report's monetary content, timestamps excluded.
    pub fingerprint: String,
}

impl ClosingSummary {
    /// Returns the line for a payment method, if present.
    #[must_use]
    pub fn method(&self, method: &str) -> Option<&MethodSummary> {
        let key = PaymentMethod::parse(method).ok()?;
        self.methods.iter().find(|m| m.payment_method == key)
    }
}

/// Inputs to a summary computation.
#[derive(Debug, Clone, Copy)]
pub struct ClosingInput<'a> {
    /// Session being reconciled.
    pub session: &'a RegisterSession,
    /// The session's ledger entries.
    pub entries: &'a [LedgerEntry],
    /// Feed totals for `[session.opened_at, window_end)`.
    pub feed: &'a FeedTotals,
    /// Counted totals.
    pub declared: &'a Breakdown,
    /// End of the window.
    pub window_end: DateTime<Utc>,
    /// Maximum acceptable absolute aggregate difference.
    pub tolerance: Decimal,
}

/// Closing summary engine.
pub struct ClosingEngine;

impl ClosingEngine {
    /// Computes the reconciliation report.
    ///
    /// Every method that appears in the opening float, the entries, the feed or
    /// the declared amounts gets a line, with missing sides counted as zero.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::Validation` if a per-method or aggregate total
    /// leaves the decimal range.
    pub fn summarize(
        input: &ClosingInput<'_>,
        generated_at: DateTime<Utc>,
    ) -> Result<ClosingSummary, RegisterError> {
        let mut incomes = Breakdown::new();
        let mut expenses = Breakdown::new();
        for entry in input.entries {
            let side = match entry.kind {
                EntryKind::Income => &mut incomes,
                EntryKind::Expense => &mut expenses,
            };
            accumulate(side, entry.payment_method.clone(), entry.amount)?;
        }

        let opening = &input.session.opening_float_breakdown;
        let methods: BTreeSet<&PaymentMethod> = opening
            .keys()
            .chain(incomes.keys())
            .chain(expenses.keys())
            .chain(input.feed.sales.keys())
            .chain(input.feed.external_expenses.keys())
            .chain(input.declared.keys())
            .collect();

        let amount = |map: &Breakdown, method: &PaymentMethod| {
            map.get(method).copied().unwrap_or(Decimal::ZERO)
        };

        let lines = methods
            .into_iter()
            .map(|method| -> Result<MethodSummary, RegisterError> {
                let opening = amount(opening, method);
                let incomes = amount(&incomes, method);
                let expenses = amount(&expenses, method);
                let sales = amount(&input.feed.sales, method);
                let external_expenses = amount(&input.feed.external_expenses, method);
                let expected = checked_sum(opening, incomes)
                    .and_then(|v| checked_diff(v, expenses))
                    .and_then(|v| checked_sum(v, sales))
                    .and_then(|v| checked_diff(v, external_expenses))?;
                let declared = amount(input.declared, method);
                Ok(MethodSummary {
                    payment_method: method.clone(),
                    opening,
                    incomes,
                    expenses,
                    sales,
                    external_expenses,
                    expected,
                    declared,
                    difference: checked_diff(declared, expected)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total = |pick: fn(&MethodSummary) -> Decimal| {
            lines
                .iter()
                .try_fold(Decimal::ZERO, |sum, line| checked_sum(sum, pick(line)))
        };
        let total_expected = total(|l| l.expected)?;
        let total_declared = total(|l| l.declared)?;
        let total_difference = total(|l| l.difference)?;
        let within_tolerance = total_difference.abs() <= input.tolerance;

        let mut summary = ClosingSummary {
            session_id: input.session.id,
            register_id: input.session.register_id.clone(),
            window_start: input.session.opened_at,
            window_end: input.window_end,
            revision: input.session.revision,
            entry_count: input.entries.len(),
            methods: lines,
            total_expected,
            total_declared,
            total_difference,
            tolerance: input.tolerance,
            within_tolerance,
            generated_at,
            fingerprint: String::new(),
        };
        summary.fingerprint = Self::fingerprint(&summary);
        Ok(summary)
    }

    /// Hashes the monetary content of a report.
    ///
    /// Decimals are normalized first so `500000` and `500000.00` hash alike.
    #[must_use]
    pub fn fingerprint(summary: &ClosingSummary) -> String {
        let mut canonical = format!(
            "{}|{}|{}|{}|",
            summary.session_id,
            summary.revision,
            summary.entry_count,
            summary.tolerance.normalize()
        );
        for line in &summary.methods {
            let _ = write!(
                canonical,
                "{}:{}:{}:{}:{}:{}:{}:{};",
                line.payment_method,
                line.opening.normalize(),
                line.incomes.normalize(),
                line.expenses.normalize(),
                line.sales.normalize(),
                line.external_expenses.normalize(),
                line.expected.normalize(),
                line.declared.normalize(),
            );
        }
        let _ = write!(
            canonical,
            "{}|{}|{}|{}",
            summary.total_expected.normalize(),
            summary.total_declared.normalize(),
            summary.total_difference.normalize(),
            summary.within_tolerance
        );

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
