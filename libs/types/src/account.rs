//! Per-user balance and position bookkeeping.

use crate::ids::{ConnectionId, Symbol};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seed balance for a freshly joined user, in quote units.
pub const STARTING_BALANCE: u64 = 10_000;

/// One user inside a session.
///
/// The user knows only its opaque connection token, never its session; all
/// lookups go through the registry. Callers must run the pre-trade check
/// (`can_afford` for buys, `position` for sells) before settling a trade;
/// the balance may only go negative if that discipline is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    username: String,
    connection: ConnectionId,
    balance: Decimal,
    positions: HashMap<Symbol, Quantity>,
    active: bool,
}

impl User {
    pub fn new(username: impl Into<String>, connection: ConnectionId) -> Self {
        Self::with_balance(username, connection, Decimal::from(STARTING_BALANCE))
    }

    pub fn with_balance(
        username: impl Into<String>,
        connection: ConnectionId,
        balance: Decimal,
    ) -> Self {
        Self {
            username: username.into(),
            connection,
            balance,
            positions: HashMap::new(),
            active: true,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Apply a signed cash delta.
    pub fn update_balance(&mut self, delta: Decimal) {
        self.balance += delta;
    }

    /// Pre-trade check for the buy side: can this user pay price × qty?
    pub fn can_afford(&self, price: Price, quantity: Quantity) -> bool {
        self.balance >= price.notional(quantity)
    }

    pub fn add_position(&mut self, symbol: &Symbol, quantity: Quantity) {
        if quantity.is_zero() {
            return;
        }
        let entry = self.positions.entry(symbol.clone()).or_default();
        *entry = entry.saturating_add(quantity);
    }

    /// Saturating decrement; the entry disappears when it reaches zero.
    pub fn remove_position(&mut self, symbol: &Symbol, quantity: Quantity) {
        if let Some(held) = self.positions.get_mut(symbol) {
            *held = held.saturating_sub(quantity);
            if held.is_zero() {
                self.positions.remove(symbol);
            }
        }
    }

    pub fn position(&self, symbol: &Symbol) -> Quantity {
        self.positions.get(symbol).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("alice", ConnectionId::new(1))
    }

    #[test]
    fn test_new_user_seed_balance() {
        let u = user();
        assert_eq!(u.balance(), Decimal::from(STARTING_BALANCE));
        assert!(u.is_active());
    }

    #[test]
    fn test_can_afford() {
        let u = user();
        assert!(u.can_afford(Price::from_u64(100), Quantity::new(100)));
        assert!(!u.can_afford(Price::from_u64(100), Quantity::new(101)));
    }

    #[test]
    fn test_balance_update() {
        let mut u = user();
        u.update_balance(Decimal::from(-1000));
        assert_eq!(u.balance(), Decimal::from(9000));
        u.update_balance(Decimal::from(500));
        assert_eq!(u.balance(), Decimal::from(9500));
    }

    #[test]
    fn test_positions_accumulate() {
        let mut u = user();
        let stock = Symbol::from("STOCK");
        u.add_position(&stock, Quantity::new(10));
        u.add_position(&stock, Quantity::new(5));
        assert_eq!(u.position(&stock), Quantity::new(15));
    }

    #[test]
    fn test_position_removed_at_zero() {
        let mut u = user();
        let stock = Symbol::from("STOCK");
        u.add_position(&stock, Quantity::new(10));
        u.remove_position(&stock, Quantity::new(10));
        assert_eq!(u.position(&stock), Quantity::zero());
        // Saturates rather than going negative.
        u.remove_position(&stock, Quantity::new(3));
        assert_eq!(u.position(&stock), Quantity::zero());
    }

    #[test]
    fn test_unknown_symbol_position_is_zero() {
        assert_eq!(user().position(&Symbol::from("OTHER")), Quantity::zero());
    }
}
