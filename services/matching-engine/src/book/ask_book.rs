//! Sell-side ladder: price levels keyed ascending, best ask first.

use super::price_level::{PriceLevel, RestingOrder};
use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::Price;

/// Ask levels in a `BTreeMap`; the first key is the lowest (best) ask.
#[derive(Debug, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, price: Price, entry: RestingOrder) {
        self.levels.entry(price).or_default().push_back(entry);
    }

    /// Lowest resting ask price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Best price with its aggregate size.
    pub fn top(&self) -> Option<(Price, u64)> {
        self.levels
            .iter()
            .next()
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
