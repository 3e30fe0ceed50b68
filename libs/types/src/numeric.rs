//! Price and quantity types.
//!
//! Prices use `rust_decimal` so they order totally (usable as `BTreeMap`
//! keys) and arithmetic stays deterministic. Quantities are integral units.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Limit price. Always strictly positive.
///
/// Crosses the binary wire as an IEEE-754 double; `from_f64` is the only
/// entry point for untrusted values and rejects NaN, infinities, zero and
/// negatives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Try to create a price, returning `None` unless strictly positive.
    pub fn try_new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    /// Validate an untrusted wire double.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_f64(value).and_then(Self::try_new)
    }

    /// Create from integer (tests and fixtures).
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Lossy view for the market-data wire format.
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Cash value of `quantity` units at this price.
    pub fn notional(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.value())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order or position quantity in whole units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Position bookkeeping never goes below zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
