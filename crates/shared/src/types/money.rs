//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g., pesos, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "COP", "USD").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Colombian Peso
    Cop,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Mexican Peso
    Mxn,
}

impl Currency {
    /// Number of decimal places amounts in this currency are kept at.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Cop | Self::Usd | Self::Eur | Self::Mxn => 2,
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Rounds the amount to the currency's minor units using Banker's Rounding.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                self.currency.minor_units(),
                RoundingStrategy::MidpointNearestEven,
            ),
            currency: self.currency,
        }
    }

    /// Returns true if both amounts are equal once rounded to currency precision.
    #[must_use]
    pub fn same_rounded(&self, other: Decimal) -> bool {
        self.rounded().amount == Self::new(other, self.currency).rounded().amount
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cop => write!(f, "COP"),
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
            Self::Mxn => write!(f, "MXN"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "COP" => Ok(Self::Cop),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "MXN" => Ok(Self::Mxn),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
