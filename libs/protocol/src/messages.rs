//! Request/response taxonomy shared by the binary and text codecs.

use serde::{Deserialize, Serialize};
use types::ids::{OrderId, SessionId, Symbol};
use types::order::Side;

/// A decoded client request, whichever codec produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Join(JoinRequest),
    NewOrder(NewOrderRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub username: String,
    pub session_id: SessionId,
}

/// An order submission. Price and quantity arrive untrusted and are
/// validated by the dispatcher, not the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderRequest {
    pub order_id: OrderId,
    pub side: Side,
    pub price: f64,
    pub quantity: u32,
    pub symbol: Symbol,
    pub session_id: SessionId,
}

/// Structured response written back on the same stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            order_id: None,
            session_id: None,
            username: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            order_id: None,
            session_id: None,
            username: None,
        }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_session(mut self, session_id: SessionId, username: impl Into<String>) -> Self {
        self.session_id = Some(session_id);
        self.username = Some(username.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Decoded ORDER_ACK frame, the binary rendering of a `Response`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub success: bool,
    pub message: String,
}

/// Top-of-book snapshot as it appears in a MARKET_DATA datagram.
///
/// An empty side is rendered as price 0.0 with size 0.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataFrame {
    pub symbol: Symbol,
    pub best_bid: f64,
    pub best_ask: f64,
    pub bid_size: u32,
    pub ask_size: u32,
    /// Unix nanoseconds at publication.
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json_shape() {
        let resp = Response::success("Joined session")
            .with_session(SessionId::from("default"), "alice");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Joined session");
        assert_eq!(json["session_id"], "default");
        assert_eq!(json["username"], "alice");
        assert!(json.get("order_id").is_none());
    }

    #[test]
    fn test_error_response_omits_optionals() {
        let json = serde_json::to_value(Response::error("Session not found")).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("session_id").is_none());
        assert!(json.get("username").is_none());
    }
}
