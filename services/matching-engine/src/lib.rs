//! Matching engine: order storage, price-time priority matching, and the
//! per-symbol concurrent order book.
//!
//! Key invariants:
//! - best bid < best ask whenever both sides are non-empty
//! - a level's cached total equals the sum of its members' remainders
//! - empty levels are pruned before the book's write lock is released
//! - strict FIFO within a price level; price priority across levels

pub mod book;
pub mod engine;
pub mod matching;
pub mod pool;

pub use engine::{AddOutcome, BookTop, MatchOutcome, OrderBook};
pub use pool::{OrderHandle, OrderPool, Pool, PoolError};
