//! Input validation for register operations.
//!
//! Everything here runs before the store is touched, so a rejected request
//! never leaves partial state behind.

use chrono::{DateTime, Utc};
use cuadra_shared::types::{Currency, LedgerEntryId, Money, RegisterSessionId};
use rust_decimal::Decimal;

use super::error::RegisterError;
use super::payment::{
    Breakdown, MAX_AMOUNT, PaymentMethod, breakdown_total, check_amount, normalize_breakdown,
};
use super::types::{
    CloseSessionInput, LedgerEntry, OpenSessionInput, RecordEntryInput, RegisterSession,
    ReviewInput, ReviewStatus, SessionReview, SessionStatus,
};

/// Longest register ID a session row holds.
pub const MAX_REGISTER_ID_LEN: usize = 64;

/// Longest name or operator a session or ledger row holds.
pub const MAX_TEXT_LEN: usize = 255;

fn check_len(field: &str, value: &str, max_len: usize) -> Result<(), RegisterError> {
    if value.chars().count() > max_len {
        return Err(RegisterError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

/// Trims a required text field, rejecting blank or overlong values.
///
/// `max_len` counts characters, matching the VARCHAR column the field lands in.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the value is blank or longer than
/// `max_len` characters.
pub fn require_text(field: &str, value: &str, max_len: usize) -> Result<String, RegisterError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegisterError::validation(format!("{field} must not be blank")));
    }
    check_len(field, trimmed, max_len)?;
    Ok(trimmed.to_string())
}

/// Trims an optional text field, treating blank as absent.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trims cashier names, dropping blanks and repeats.
fn normalize_cashiers(raw: &[String]) -> Result<Vec<String>, RegisterError> {
    let mut cashiers: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let Some(name) = optional_text(Some(name.as_str())) else {
            continue;
        };
        check_len("cashier", &name, MAX_TEXT_LEN)?;
        if !cashiers.contains(&name) {
            cashiers.push(name);
        }
    }
    Ok(cashiers)
}

/// Validates an open request and builds the new session.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if any field is blank or too long, the
/// breakdown is empty or has negative, out-of-range or duplicate methods, or a
/// supplied total disagrees with the breakdown sum at currency precision.
pub fn validate_open(
    input: &OpenSessionInput,
    currency: Currency,
    opened_at: DateTime<Utc>,
) -> Result<RegisterSession, RegisterError> {
    let register_id = require_text("register_id", &input.register_id, MAX_REGISTER_ID_LEN)?;
    let name = require_text("name", &input.name, MAX_TEXT_LEN)?;
    let responsible = require_text("responsible", &input.responsible, MAX_TEXT_LEN)?;
    let cashiers = normalize_cashiers(&input.cashiers)?;

    if input.opening_float_breakdown.is_empty() {
        return Err(RegisterError::validation(
            "opening float breakdown must list at least one payment method",
        ));
    }
    let breakdown = normalize_breakdown(&input.opening_float_breakdown, "opening float")?;
    let opening_float = breakdown_total(&breakdown)?;
    if opening_float > MAX_AMOUNT {
        return Err(RegisterError::validation(format!(
            "opening float must not exceed {MAX_AMOUNT}, got {opening_float}"
        )));
    }

    if let Some(declared) = input.declared_opening_float {
        if !Money::new(opening_float, currency).same_rounded(declared) {
            return Err(RegisterError::validation(format!(
                "breakdown does not sum to opening float: breakdown {opening_float}, declared {declared}"
            )));
        }
    }

    Ok(RegisterSession {
        id: RegisterSessionId::new(),
        register_id,
        name,
        responsible,
        opened_at,
        closed_at: None,
        opening_float,
        opening_float_breakdown: breakdown,
        cashiers,
        status: SessionStatus::Open,
        notes: optional_text(input.notes.as_deref()),
        revision: 0,
        declared_amounts: None,
        closing_summary: None,
        review_status: ReviewStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        review_notes: None,
    })
}

/// Validates a record request and builds the entry.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the amount is not strictly positive
/// or out of range, the payment method is blank or too long, or the operator
/// name is too long.
pub fn validate_entry(
    session_id: RegisterSessionId,
    input: &RecordEntryInput,
    recorded_at: DateTime<Utc>,
) -> Result<LedgerEntry, RegisterError> {
    if input.amount <= Decimal::ZERO {
        return Err(RegisterError::validation(format!(
            "entry amount must be positive, got {}",
            input.amount
        )));
    }
    check_amount("entry amount", input.amount)?;
    let payment_method = PaymentMethod::parse(&input.payment_method)?;
    let recorded_by = optional_text(input.recorded_by.as_deref());
    if let Some(operator) = &recorded_by {
        check_len("recorded_by", operator, MAX_TEXT_LEN)?;
    }

    Ok(LedgerEntry {
        id: LedgerEntryId::new(),
        session_id,
        kind: input.kind,
        amount: input.amount,
        payment_method,
        description: optional_text(input.description.as_deref()),
        recorded_by,
        recorded_at,
    })
}

/// Validates the counted totals submitted for a summary or close.
///
/// # Errors
///
/// Returns `RegisterError::Validation` for blank, duplicate, negative or
/// out-of-range entries.
pub fn validate_declared(input: &CloseSessionInput) -> Result<Breakdown, RegisterError> {
    normalize_breakdown(&input.declared_amounts, "declared amounts")
}

/// Validates a review decision and builds what the store records.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the reviewer is blank or too long.
pub fn validate_review(
    session_id: RegisterSessionId,
    status: ReviewStatus,
    input: &ReviewInput,
    reviewed_at: DateTime<Utc>,
) -> Result<SessionReview, RegisterError> {
    Ok(SessionReview {
        session_id,
        status,
        reviewed_by: require_text("reviewer", &input.reviewer, MAX_TEXT_LEN)?,
        notes: optional_text(input.notes.as_deref()),
        reviewed_at,
    })
}

/// Validates a half-open time range.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if `start` is after `end`.
pub fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), RegisterError> {
    if start > end {
        return Err(RegisterError::validation(format!(
            "range start {start} is after range end {end}"
        )));
    }
    Ok(())
}
