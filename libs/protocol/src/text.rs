//! Text codec: one JSON object per write, UTF-8.

use crate::error::ProtocolError;
use crate::messages::{JoinRequest, NewOrderRequest, Request, Response};
use serde::Deserialize;
use types::ids::{OrderId, SessionId, Symbol};
use types::order::Side;

#[derive(Deserialize)]
struct JoinFields {
    username: String,
    session_id: Option<String>,
}

#[derive(Deserialize)]
struct NewOrderFields {
    order_id: u64,
    side: Side,
    price: f64,
    quantity: u32,
    symbol: Option<String>,
    session_id: Option<String>,
}

fn session_or_default(session_id: Option<String>) -> SessionId {
    session_id.map(SessionId::new).unwrap_or_default()
}

/// Decode one JSON request. The `type` field selects the shape; omitted
/// `session_id` and `symbol` fall back to `"default"` and `"STOCK"`.
pub fn decode_request(bytes: &[u8]) -> Result<Request, ProtocolError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let msg_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(ProtocolError::MissingField("type"))?
        .to_string();

    match msg_type.as_str() {
        "join" => {
            let fields: JoinFields = serde_json::from_value(value)?;
            Ok(Request::Join(JoinRequest {
                username: fields.username,
                session_id: session_or_default(fields.session_id),
            }))
        }
        "new_order" => {
            let fields: NewOrderFields = serde_json::from_value(value)?;
            Ok(Request::NewOrder(NewOrderRequest {
                order_id: OrderId::new(fields.order_id),
                side: fields.side,
                price: fields.price,
                quantity: fields.quantity,
                symbol: fields.symbol.map(Symbol::new).unwrap_or_default(),
                session_id: session_or_default(fields.session_id),
            }))
        }
        other => Err(ProtocolError::UnknownType(other.to_string())),
    }
}

/// Encode a response as a single JSON object.
pub fn encode_response(response: &Response) -> Vec<u8> {
    // Serializing a Response cannot fail: it is a plain struct of strings
    // and integers.
    serde_json::to_vec(response).unwrap_or_default()
}
