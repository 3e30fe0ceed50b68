//! Wire protocol: framing and codecs for client traffic and market data.
//!
//! Two formats share one request/response taxonomy:
//! - `binary`: length-prefixed fixed-layout frames, all multi-byte integers
//!   and doubles in network byte order;
//! - `text`: one JSON object per write.
//!
//! The server selects the format at construction; market data always uses
//! the binary MARKET_DATA frame.

pub mod binary;
pub mod error;
pub mod frame;
pub mod messages;
pub mod text;

pub use error::ProtocolError;
pub use frame::{Header, MsgType, HEADER_LEN};
pub use messages::{JoinRequest, MarketDataFrame, NewOrderRequest, OrderAck, Request, Response};
