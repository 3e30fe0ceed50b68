//! Per-symbol concurrent order book.
//!
//! Both ladders and the trade-sequence counter sit behind one
//! readers–writer lock: mutators take it exclusively, the best-of-book
//! probes take it shared. No I/O happens under the lock, and every empty
//! level is pruned before the lock is dropped, so observers never see a
//! crossed book or a hollow level.

use crate::book::{AskBook, BidBook, RestingOrder};
use crate::matching::{crossing, MatchExecutor};
use crate::pool::{OrderHandle, OrderPool};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderState, Side};
use types::trade::Trade;

/// Result of `add_order`.
#[derive(Debug)]
pub enum AddOutcome {
    /// Fully consumed on entry; the handle went back to the pool.
    Filled { trades: Vec<Trade> },
    /// Some quantity rests on the book; the book now owns the handle.
    Rested {
        trades: Vec<Trade>,
        remaining: Quantity,
    },
}

/// Result of a `match_order` that executed at least one fill.
#[derive(Debug)]
pub struct MatchOutcome {
    pub remaining: Quantity,
    pub trades: Vec<Trade>,
}

/// Coherent top-of-book snapshot: each side as (price, aggregate size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookTop {
    pub bid: Option<(Price, u64)>,
    pub ask: Option<(Price, u64)>,
}

struct BookInner {
    bids: BidBook,
    asks: AskBook,
    executor: MatchExecutor,
}

pub struct OrderBook {
    symbol: Symbol,
    pool: Arc<OrderPool>,
    inner: RwLock<BookInner>,
}

impl OrderBook {
    pub fn new(symbol: Symbol, pool: Arc<OrderPool>) -> Self {
        Self {
            symbol,
            pool,
            inner: RwLock::new(BookInner {
                bids: BidBook::new(),
                asks: AskBook::new(),
                executor: MatchExecutor::new(0),
            }),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Match first, then post any residual at the limit price.
    ///
    /// Ownership of `handle` transfers to the book: it is either parked in
    /// a level with the residual or released straight back to the pool.
    pub fn add_order(&self, order: &Order, owner: &str, handle: OrderHandle) -> AddOutcome {
        let mut inner = self.inner.write().expect("order book lock poisoned");
        let BookInner {
            bids,
            asks,
            executor,
        } = &mut *inner;

        let (remaining, trades) = match order.side {
            Side::Buy => Self::match_buy(&self.symbol, asks, executor, &self.pool, order),
            Side::Sell => Self::match_sell(&self.symbol, bids, executor, &self.pool, order),
        };

        if !trades.is_empty() {
            tracing::debug!(
                symbol = %self.symbol,
                order_id = %order.id,
                fills = trades.len(),
                "incoming order crossed on entry"
            );
        }

        if remaining.is_zero() {
            self.pool.release(handle);
            AddOutcome::Filled { trades }
        } else {
            let entry = RestingOrder {
                handle,
                id: order.id,
                owner: owner.to_string(),
                remaining,
                state: if trades.is_empty() {
                    OrderState::Queued
                } else {
                    OrderState::PartiallyFilled
                },
            };
            match order.side {
                Side::Buy => bids.insert(order.price, entry),
                Side::Sell => asks.insert(order.price, entry),
            }
            AddOutcome::Rested { trades, remaining }
        }
    }

    /// Match without ever inserting the residual.
    ///
    /// Returns `None` when nothing crossed. The caller keeps ownership of
    /// the order's handle either way.
    pub fn match_order(&self, order: &Order) -> Option<MatchOutcome> {
        let mut inner = self.inner.write().expect("order book lock poisoned");
        let BookInner {
            bids,
            asks,
            executor,
        } = &mut *inner;

        let (remaining, trades) = match order.side {
            Side::Buy => Self::match_buy(&self.symbol, asks, executor, &self.pool, order),
            Side::Sell => Self::match_sell(&self.symbol, bids, executor, &self.pool, order),
        };

        if trades.is_empty() {
            None
        } else {
            Some(MatchOutcome { remaining, trades })
        }
    }

    /// Remove a resting order by id, releasing its storage.
    pub fn cancel_order(&self, id: OrderId) -> bool {
        let entry = {
            let mut inner = self.inner.write().expect("order book lock poisoned");
            let BookInner { bids, asks, .. } = &mut *inner;
            bids.remove_order(id).or_else(|| asks.remove_order(id))
        };
        match entry {
            Some(entry) => {
                tracing::debug!(symbol = %self.symbol, order_id = %id, "order cancelled");
                self.pool.release(entry.handle);
                true
            }
            None => false,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.inner
            .read()
            .expect("order book lock poisoned")
            .bids
            .best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.inner
            .read()
            .expect("order book lock poisoned")
            .asks
            .best_price()
    }

    /// One coherent snapshot of both sides for market data.
    pub fn top_of_book(&self) -> BookTop {
        let inner = self.inner.read().expect("order book lock poisoned");
        BookTop {
            bid: inner.bids.top(),
            ask: inner.asks.top(),
        }
    }

    /// Drop every level on both sides, returning all storage to the pool.
    pub fn clear(&self) {
        let entries = {
            let mut inner = self.inner.write().expect("order book lock poisoned");
            let mut entries = inner.bids.take_all();
            entries.extend(inner.asks.take_all());
            entries
        };
        for entry in entries {
            self.pool.release(entry.handle);
        }
    }

    /// Whether an order currently rests on either side.
    pub fn contains(&self, id: OrderId) -> bool {
        let inner = self.inner.read().expect("order book lock poisoned");
        inner.bids.contains(id) || inner.asks.contains(id)
    }

    pub fn bid_depth(&self) -> usize {
        self.inner
            .read()
            .expect("order book lock poisoned")
            .bids
            .level_count()
    }

    pub fn ask_depth(&self) -> usize {
        self.inner
            .read()
            .expect("order book lock poisoned")
            .asks
            .level_count()
    }

    /// Walk asks from the lowest price up while the buy limit crosses.
    fn match_buy(
        symbol: &Symbol,
        asks: &mut AskBook,
        executor: &mut MatchExecutor,
        pool: &OrderPool,
        taker: &Order,
    ) -> (Quantity, Vec<Trade>) {
        let mut remaining = taker.quantity;
        let mut trades = Vec::new();
        let executed_at = now_nanos();

        while !remaining.is_zero() {
            let Some(level_price) = asks.best_price() else {
                break;
            };
            if !crossing::taker_crosses(taker.side, taker.price, level_price) {
                break;
            }
            let level = asks.level_mut(&level_price).expect("best level present");
            while !remaining.is_zero() {
                let Some(front) = level.front() else {
                    break;
                };
                let maker_id = front.id;
                let maker = front.owner.clone();
                let fill = remaining.min(front.remaining);
                trades.push(executor.execute(
                    symbol,
                    maker_id,
                    taker.id,
                    maker,
                    taker.side,
                    level_price,
                    fill,
                    executed_at,
                ));
                remaining = remaining.saturating_sub(fill);
                if let Some(done) = level.fill_front(fill) {
                    pool.release(done.handle);
                }
            }
            if level.is_empty() {
                asks.remove_level(&level_price);
            }
        }

        (remaining, trades)
    }

    /// Mirror walk over bids from the highest price down.
    fn match_sell(
        symbol: &Symbol,
        bids: &mut BidBook,
        executor: &mut MatchExecutor,
        pool: &OrderPool,
        taker: &Order,
    ) -> (Quantity, Vec<Trade>) {
        let mut remaining = taker.quantity;
        let mut trades = Vec::new();
        let executed_at = now_nanos();

        while !remaining.is_zero() {
            let Some(level_price) = bids.best_price() else {
                break;
            };
            if !crossing::taker_crosses(taker.side, taker.price, level_price) {
                break;
            }
            let level = bids.level_mut(&level_price).expect("best level present");
            while !remaining.is_zero() {
                let Some(front) = level.front() else {
                    break;
                };
                let maker_id = front.id;
                let maker = front.owner.clone();
                let fill = remaining.min(front.remaining);
                trades.push(executor.execute(
                    symbol,
                    maker_id,
                    taker.id,
                    maker,
                    taker.side,
                    level_price,
                    fill,
                    executed_at,
                ));
                remaining = remaining.saturating_sub(fill);
                if let Some(done) = level.fill_front(fill) {
                    pool.release(done.handle);
                }
            }
            if level.is_empty() {
                bids.remove_level(&level_price);
            }
        }

        (remaining, trades)
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or_default()
}
