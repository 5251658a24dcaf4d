//! Payment method vocabulary and per-method amount maps.
//!
//! The vocabulary is open: any non-blank key is a method. Keys are trimmed and
//! lower-cased at every boundary so "Efectivo " and "efectivo" are one method.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::RegisterError;

/// Largest magnitude an amount column holds, NUMERIC(19,4).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_313_682_943, 2_328_306_436, 0, false, 4);

/// Fractional digits an amount column holds.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// Longest payment method key a ledger row holds.
pub const MAX_METHOD_LEN: usize = 64;

/// A normalized payment method key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Method that feed rows without a payment method are attributed to.
    pub const OTHER: &'static str = "other";

    /// Normalizes and validates a raw method key.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::Validation` if the key is blank or longer than
    /// [`MAX_METHOD_LEN`] characters.
    pub fn parse(raw: &str) -> Result<Self, RegisterError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(RegisterError::validation("payment method must not be blank"));
        }
        if normalized.chars().count() > MAX_METHOD_LEN {
            return Err(RegisterError::validation(format!(
                "payment method must be at most {MAX_METHOD_LEN} characters"
            )));
        }
        Ok(Self(normalized))
    }

    /// Maps an optional raw key from an external feed, falling back to `other`.
    #[must_use]
    pub fn from_feed(raw: Option<&str>) -> Self {
        raw.and_then(|m| Self::parse(m).ok())
            .unwrap_or_else(Self::other)
    }

    /// The catch-all method.
    #[must_use]
    pub fn other() -> Self {
        Self(Self::OTHER.to_string())
    }

    /// Returns the normalized key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = RegisterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.0
    }
}

/// Amounts keyed by payment method, iterated in lexical order.
pub type Breakdown = BTreeMap<PaymentMethod, Decimal>;

/// Checks that an amount fits the NUMERIC(19,4) columns it is stored in.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the amount carries more than
/// [`MAX_AMOUNT_SCALE`] decimal places or its magnitude exceeds [`MAX_AMOUNT`].
pub fn check_amount(label: &str, amount: Decimal) -> Result<(), RegisterError> {
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(RegisterError::validation(format!(
            "{label} must have at most {MAX_AMOUNT_SCALE} decimal places, got {amount}"
        )));
    }
    if amount.abs() > MAX_AMOUNT {
        return Err(RegisterError::validation(format!(
            "{label} must not exceed {MAX_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}

/// Adds two amounts, failing instead of overflowing.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the sum leaves the decimal range.
pub fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, RegisterError> {
    a.checked_add(b).ok_or_else(out_of_range)
}

/// Subtracts two amounts, failing instead of overflowing.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the difference leaves the decimal range.
pub fn checked_diff(a: Decimal, b: Decimal) -> Result<Decimal, RegisterError> {
    a.checked_sub(b).ok_or_else(out_of_range)
}

fn out_of_range() -> RegisterError {
    RegisterError::validation(format!(
        "amount total is out of range, amounts must not exceed {MAX_AMOUNT}"
    ))
}

/// Normalizes a caller-supplied amount map.
///
/// `label` names the map in error messages ("opening float", "declared amounts").
///
/// # Errors
///
/// Returns `RegisterError::Validation` for blank keys, negative or out-of-range
/// amounts, or two keys that normalize to the same method.
pub fn normalize_breakdown(
    raw: &BTreeMap<String, Decimal>,
    label: &str,
) -> Result<Breakdown, RegisterError> {
    let mut normalized = Breakdown::new();
    for (key, amount) in raw {
        let method = PaymentMethod::parse(key).map_err(|e| match e {
            RegisterError::Validation(msg) => RegisterError::validation(format!("{label}: {msg}")),
            other => other,
        })?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(RegisterError::validation(format!(
                "{label} for {method} must not be negative"
            )));
        }
        check_amount(&format!("{label} for {method}"), *amount)?;
        if normalized.insert(method.clone(), *amount).is_some() {
            return Err(RegisterError::validation(format!(
                "{label} lists payment method {method} more than once"
            )));
        }
    }
    Ok(normalized)
}

/// Sum of every amount in a breakdown.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the sum overflows.
pub fn breakdown_total(breakdown: &Breakdown) -> Result<Decimal, RegisterError> {
    breakdown
        .values()
        .try_fold(Decimal::ZERO, |total, amount| checked_sum(total, *amount))
}

/// Adds `amount` to the running total for `method`.
///
/// # Errors
///
/// Returns `RegisterError::Validation` if the running total overflows.
pub fn accumulate(
    breakdown: &mut Breakdown,
    method: PaymentMethod,
    amount: Decimal,
) -> Result<(), RegisterError> {
    let total = breakdown.entry(method).or_insert(Decimal::ZERO);
    *total = checked_sum(*total, amount)?;
    Ok(())
}
