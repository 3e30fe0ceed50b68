//! Executed-fill records.
//!
//! One `Trade` is produced per maker order consumed (fully or partially)
//! by an incoming order, always at the maker's resting price. Settlement
//! applies balance and position deltas per trade, at the executed price and
//! quantity, never at the taker's limit for the full requested amount.

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Per-book monotone sequence; ties broken by the write-lock order.
    pub sequence: u64,
    pub symbol: Symbol,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    /// Username of the resting side's owner.
    pub maker: String,
    /// Side of the incoming (taker) order.
    pub taker_side: Side,
    pub price: Price,
    pub quantity: Quantity,
    /// Unix nanoseconds.
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        symbol: Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker: String,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            symbol,
            maker_order_id,
            taker_order_id,
            maker,
            taker_side,
            price,
            quantity,
            executed_at,
        }
    }

    /// Cash value exchanged: price × quantity.
    pub fn notional(&self) -> Decimal {
        self.price.notional(self.quantity)
    }
}
