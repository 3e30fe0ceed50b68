//! Buy-side ladder: price levels keyed descending, best bid first.

use super::price_level::{PriceLevel, RestingOrder};
use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::Price;

/// Bid levels in a `BTreeMap`; iteration from `next_back()` gives the
/// highest (best) bid.
#[derive(Debug, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, price: Price, entry: RestingOrder) {
        self.levels.entry(price).or_default().push_back(entry);
    }

    /// Highest resting bid price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Best price with its aggregate size.
    pub fn top(&self) -> Option<(Price, u64)> {
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    pub fn level_mut(&mut self, price: &Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(price)
    }

    pub fn remove_level(&mut self, price: &Price) {
        self.levels.remove(price);
    }

    /// Cancel path: linear scan for the order, pruning the level if the
    /// removal empties it.
    pub fn remove_order(&mut self, id: OrderId) -> Option<RestingOrder> {
        let mut hit: Option<(Price, RestingOrder)> = None;
        for (price, level) in self.levels.iter_mut() {
            if let Some(entry) = level.remove(id) {
                hit = Some((*price, entry));
                break;
            }
        }
        let (price, entry) = hit?;
        if self.levels.get(&price).is_some_and(|level| level.is_empty()) {
            self.levels.remove(&price);
        }
        Some(entry)
    }

    pub fn take_all(&mut self) -> Vec<RestingOrder> {
        let mut orders = Vec::new();
        for (_, mut level) in std::mem::take(&mut self.levels) {
            orders.extend(level.take_all());
        }
        orders
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.levels.values().any(|level| level.contains(id))
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
