//! Shared domain types for the trading workspace.
//!
//! Every other crate builds on these definitions:
//! - `ids`: identifier newtypes (OrderId, TradeId, ConnectionId, Symbol, SessionId)
//! - `numeric`: price and quantity types with validated construction
//! - `order`: order records, sides, and the resting-order state machine
//! - `trade`: executed-fill records with maker/taker attribution
//! - `account`: per-user balance and position bookkeeping
//! - `errors`: the request-error taxonomy surfaced to clients

pub mod account;
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::account::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
}
