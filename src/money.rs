//! Money types: `Currency` and `Amount`.
//!
//! `Amount` is the single value type moved by a transfer. It is constructed
//! only through [`Amount::new`], which rejects negative values, so any
//! `Amount` reaching the engine is already known to be non-negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from constructing or combining amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("decimal overflow")]
    Overflow,
}

/// A currency known to the wallet service.
///
/// `symbol` is the unique key; `scale` is the decimal scale used for
/// display and rounding. Immutable once a wallet references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub name: String,
    pub scale: u32,
}

impl Currency {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, scale: u32) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            scale,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A (currency, quantity) pair.
///
/// # Invariants (enforced by private fields):
/// - `value >= 0` - negative amounts are unrepresentable
/// - arithmetic is checked; a subtraction that would go negative fails
///   instead of clamping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    currency: Currency,
    value: Decimal,
}

impl Amount {
    /// Create an amount. Rejects negative values.
    pub fn new(currency: Currency, value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() {
            return Err(AmountError::Negative(value));
        }
        Ok(Self { currency, value })
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            currency,
            value: Decimal::ZERO,
        }
    }

    #[inline]
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.value
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Two amounts are compatible only if their currencies are identical
    pub fn same_currency(&self, other: &Amount) -> bool {
        self.currency.symbol == other.currency.symbol
    }

    fn check_currency(&self, other: &Amount) -> Result<(), AmountError> {
        if !self.same_currency(other) {
            return Err(AmountError::CurrencyMismatch {
                expected: self.currency.symbol.clone(),
                actual: other.currency.symbol.clone(),
            });
        }
        Ok(())
    }

    /// Checked addition. Fails on currency mismatch or overflow.
    pub fn checked_add(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.check_currency(other)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or(AmountError::Overflow)?;
        Amount::new(self.currency.clone(), value)
    }

    /// Checked subtraction. Fails on currency mismatch or a negative result.
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.check_currency(other)?;
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or(AmountError::Overflow)?;
        Amount::new(self.currency.clone(), value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency.symbol)
    }
}
