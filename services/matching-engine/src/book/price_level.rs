//! One price level: a FIFO of resting orders plus a cached aggregate.
//!
//! The cached `total_quantity` is adjusted on every mutation, including
//! partial fills, so it always equals the sum of the members' remainders.

use crate::pool::OrderHandle;
use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::OrderState;

/// A live order resting on the book.
///
/// The canonical record stays immutable in the pool; the remaining
/// quantity lives here. The entry owns the pool handle until the order
/// leaves the book.
#[derive(Debug)]
pub struct RestingOrder {
    pub handle: OrderHandle,
    pub id: OrderId,
    /// Username of the submitting user, for trade attribution.
    pub owner: String,
    pub remaining: Quantity,
    pub state: OrderState,
}

#[derive(Debug, Default)]
pub struct PriceLevel {
    orders: VecDeque<RestingOrder>,
    total_quantity: u64,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the back: time priority is arrival order.
    pub fn push_back(&mut self, entry: RestingOrder) {
        self.total_quantity += u64::from(entry.remaining.value());
        self.orders.push_back(entry);
    }

    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// Consume `quantity` from the front order. Returns the entry when the
    /// fill exhausts it (the caller releases its handle); on a partial fill
    /// the entry stays queued with its state advanced.
    pub fn fill_front(&mut self, quantity: Quantity) -> Option<RestingOrder> {
        let front = self.orders.front_mut()?;
        let taken = quantity.min(front.remaining);
        self.total_quantity -= u64::from(taken.value());
        front.remaining = front.remaining.saturating_sub(taken);
        front.state = OrderState::after_fill(front.remaining);
        if front.remaining.is_zero() {
            self.orders.pop_front()
        } else {
            None
        }
    }

    /// Remove an order by id, wherever it sits in the queue.
    pub fn remove(&mut self, id: OrderId) -> Option<RestingOrder> {
        let position = self.orders.iter().position(|entry| entry.id == id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity -= u64::from(entry.remaining.value());
        Some(entry)
    }

    /// Empty the level, handing back every entry.
    pub fn take_all(&mut self) -> VecDeque<RestingOrder> {
        self.total_quantity = 0;
        std::mem::take(&mut self.orders)
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.iter().any(|entry| entry.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::OrderPool;
    use types::numeric::Price;
    use types::order::{Order, Side};

    fn entry(pool: &OrderPool, id: u64, qty: u32) -> RestingOrder {
        let order = Order::try_new(
            OrderId::new(id),
            Side::Sell,
            Price::from_u64(100),
            Quantity::new(qty),
        )
        .unwrap();
        RestingOrder {
            handle: pool.acquire(order).unwrap(),
            id: order.id,
            owner: "maker".to_string(),
            remaining: order.quantity,
            state: OrderState::Queued,
        }
    }

    #[test]
    fn test_fifo_order() {
        let pool = OrderPool::new();
        let mut level = PriceLevel::new();
        level.push_back(entry(&pool, 1, 5));
        level.push_back(entry(&pool, 2, 3));

        assert_eq!(level.front().unwrap().id, OrderId::new(1));
        assert_eq!(level.total_quantity(), 8);
        assert_eq!(level.order_count(), 2);
    }

    #[test]
    fn test_partial_fill_updates_total() {
        let pool = OrderPool::new();
        let mut level = PriceLevel::new();
        level.push_back(entry(&pool, 1, 10));

        assert!(level.fill_front(Quantity::new(4)).is_none());
        assert_eq!(level.total_quantity(), 6);
        let front = level.front().unwrap();
        assert_eq!(front.remaining, Quantity::new(6));
        assert_eq!(front.state, OrderState::PartiallyFilled);
    }

    #[test]
    fn test_exhausting_fill_pops_entry() {
        let pool = OrderPool::new();
        let mut level = PriceLevel::new();
        level.push_back(entry(&pool, 1, 5));
        level.push_back(entry(&pool, 2, 5));

        let done = level.fill_front(Quantity::new(5)).unwrap();
        assert_eq!(done.id, OrderId::new(1));
        assert_eq!(done.state, OrderState::Closed);
        assert_eq!(level.total_quantity(), 5);
        assert_eq!(level.front().unwrap().id, OrderId::new(2));
        pool.release(done.handle);
    }

    #[test]
    fn test_remove_mid_queue() {
        let pool = OrderPool::new();
        let mut level = PriceLevel::new();
        level.push_back(entry(&pool, 1, 5));
        level.push_back(entry(&pool, 2, 3));
        level.push_back(entry(&pool, 3, 2));

        let removed = level.remove(OrderId::new(2)).unwrap();
        assert_eq!(removed.remaining, Quantity::new(3));
        assert_eq!(level.total_quantity(), 7);
        assert!(!level.contains(OrderId::new(2)));
        assert_eq!(level.remove(OrderId::new(9)).map(|e| e.id), None);
        pool.release(removed.handle);
    }
}
