//! A session: named container of users and per-symbol order books.
//!
//! One mutex guards the user maps and the symbol table for the duration of
//! each method's critical section. The two user maps (by name, by
//! connection) are only ever updated together. Book operations happen
//! outside this mutex: callers fetch the `Arc<OrderBook>` and drop the
//! session lock before touching it.

use matching_engine::{OrderBook, OrderPool};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use types::account::{User, STARTING_BALANCE};
use types::errors::RequestError;
use types::ids::{ConnectionId, SessionId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

struct SessionState {
    users: HashMap<String, User>,
    by_connection: HashMap<ConnectionId, String>,
    books: HashMap<Symbol, Arc<OrderBook>>,
}

pub struct Session {
    id: SessionId,
    pool: Arc<OrderPool>,
    starting_balance: Decimal,
    state: Mutex<SessionState>,
    active: AtomicBool,
}

impl Session {
    /// A new session always carries the default symbol's book.
    pub fn new(id: SessionId, pool: Arc<OrderPool>) -> Self {
        Self::with_starting_balance(id, pool, Decimal::from(STARTING_BALANCE))
    }

    pub fn with_starting_balance(
        id: SessionId,
        pool: Arc<OrderPool>,
        starting_balance: Decimal,
    ) -> Self {
        let default_symbol = Symbol::default();
        let mut books = HashMap::new();
        books.insert(
            default_symbol.clone(),
            Arc::new(OrderBook::new(default_symbol, Arc::clone(&pool))),
        );
        Self {
            id,
            pool,
            starting_balance,
            state: Mutex::new(SessionState {
                users: HashMap::new(),
                by_connection: HashMap::new(),
                books,
            }),
            active: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Admit a user. Usernames are unique within the session.
    pub fn add_user(&self, username: &str, connection: ConnectionId) -> Result<(), RequestError> {
        let mut state = self.lock();
        if state.users.contains_key(username) {
            return Err(RequestError::DuplicateUsername);
        }
        state.users.insert(
            username.to_string(),
            User::with_balance(username, connection, self.starting_balance),
        );
        state.by_connection.insert(connection, username.to_string());
        Ok(())
    }

    pub fn remove_user(&self, username: &str) -> Result<(), RequestError> {
        let mut state = self.lock();
        let user = state
            .users
            .remove(username)
            .ok_or(RequestError::UserNotFound)?;
        state.by_connection.remove(&user.connection());
        Ok(())
    }

    /// Drop whichever user is bound to a closed connection.
    pub fn remove_connection(&self, connection: ConnectionId) -> Option<String> {
        let mut state = self.lock();
        let username = state.by_connection.remove(&connection)?;
        state.users.remove(&username);
        Some(username)
    }

    pub fn user_by_name(&self, username: &str) -> Option<User> {
        self.lock().users.get(username).cloned()
    }

    pub fn user_by_connection(&self, connection: ConnectionId) -> Option<User> {
        let state = self.lock();
        let username = state.by_connection.get(&connection)?;
        state.users.get(username).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Idempotent: an existing book is left untouched.
    pub fn create_book(&self, symbol: Symbol) {
        let mut state = self.lock();
        if !state.books.contains_key(&symbol) {
            let book = Arc::new(OrderBook::new(symbol.clone(), Arc::clone(&self.pool)));
            state.books.insert(symbol, book);
        }
    }

    pub fn book(&self, symbol: &Symbol) -> Result<Arc<OrderBook>, RequestError> {
        self.lock()
            .books
            .get(symbol)
            .cloned()
            .ok_or(RequestError::SymbolNotFound)
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.lock().books.keys().cloned().collect()
    }

    /// Resolve the submitting user and run the side's pre-trade check.
    ///
    /// Buys need cash for price × qty; sells need the position. Returns the
    /// username for later settlement.
    pub fn pre_trade_check(
        &self,
        connection: ConnectionId,
        side: Side,
        price: Price,
        quantity: Quantity,
        symbol: &Symbol,
    ) -> Result<String, RequestError> {
        let state = self.lock();
        let username = state
            .by_connection
            .get(&connection)
            .ok_or(RequestError::UserNotFound)?;
        let user = state
            .users
            .get(username)
            .ok_or(RequestError::UserNotFound)?;
        match side {
            Side::Buy => {
                if !user.can_afford(price, quantity) {
                    return Err(RequestError::InsufficientFunds);
                }
            }
            Side::Sell => {
                if user.position(symbol) < quantity {
                    return Err(RequestError::InsufficientPosition);
                }
            }
        }
        Ok(username.clone())
    }

    /// Grant inventory to a user, e.g. when seeding a trading group.
    /// Returns false if the user is unknown.
    pub fn credit_position(&self, username: &str, symbol: &Symbol, quantity: Quantity) -> bool {
        let mut state = self.lock();
        match state.users.get_mut(username) {
            Some(user) => {
                user.add_position(symbol, quantity);
                true
            }
            None => false,
        }
    }

    /// Apply one trade's deltas to both counterparties, at the executed
    /// price and quantity. A counterparty that already left the session is
    /// skipped.
    pub fn settle_trade(&self, taker: &str, trade: &Trade) {
        let (buyer, seller) = match trade.taker_side {
            Side::Buy => (taker, trade.maker.as_str()),
            Side::Sell => (trade.maker.as_str(), taker),
        };
        let notional = trade.notional();

        let mut state = self.lock();
        match state.users.get_mut(buyer) {
            Some(user) => {
                user.update_balance(-notional);
                user.add_position(&trade.symbol, trade.quantity);
            }
            None => tracing::warn!(session = %self.id, buyer, "buyer left before settlement"),
        }
        match state.users.get_mut(seller) {
            Some(user) => {
                user.update_balance(notional);
                user.remove_position(&trade.symbol, trade.quantity);
            }
            None => tracing::warn!(session = %self.id, seller, "seller left before settlement"),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session mutex poisoned")
    }
}
