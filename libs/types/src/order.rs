//! Order records and the resting-order state machine.

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// The canonical order record: immutable once constructed.
///
/// Remaining quantity during matching is tracked on the book's resting
/// entry, never on this record. Storage for order records comes from the
/// engine's pool; the record itself is plain data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl Order {
    /// Build an order, rejecting a zero quantity. Price positivity is
    /// already guaranteed by the `Price` type.
    pub fn try_new(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Option<Self> {
        (!quantity.is_zero()).then_some(Self {
            id,
            side,
            price,
            quantity,
        })
    }
}

/// Lifecycle of an order resting on the book.
///
/// `Closed` covers both full fill and cancellation; it is terminal, and a
/// closed order's storage goes back to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    Queued,
    PartiallyFilled,
    Closed,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Closed)
    }

    /// State after a fill that leaves `remaining` on the book.
    pub fn after_fill(remaining: Quantity) -> Self {
        if remaining.is_zero() {
            OrderState::Closed
        } else {
            OrderState::PartiallyFilled
        }
    }
}
