//! Fixed-layout binary codec.
//!
//! Every frame is a packed header followed by a fixed-size payload; there
//! are no variable-length fields. String fields are NUL-padded and may lose
//! their final byte to the terminator on encode.

use crate::error::ProtocolError;
use crate::frame::{put_fixed_str, Header, MsgType, Reader};
use crate::messages::{JoinRequest, MarketDataFrame, NewOrderRequest, OrderAck, Request};
use types::ids::{OrderId, SessionId, Symbol};
use types::order::Side;

pub const USERNAME_WIDTH: usize = 32;
pub const SESSION_ID_WIDTH: usize = 32;
pub const SYMBOL_WIDTH: usize = 8;
pub const ACK_MESSAGE_WIDTH: usize = 256;

pub const JOIN_PAYLOAD_LEN: usize = USERNAME_WIDTH + SESSION_ID_WIDTH;
pub const NEW_ORDER_PAYLOAD_LEN: usize = 8 + 1 + 8 + 4 + SYMBOL_WIDTH + SESSION_ID_WIDTH;
pub const ORDER_ACK_PAYLOAD_LEN: usize = 8 + 1 + ACK_MESSAGE_WIDTH;
pub const MARKET_DATA_PAYLOAD_LEN: usize = SYMBOL_WIDTH + 8 + 8 + 4 + 4 + 8;

fn frame(msg_type: MsgType, seq_num: u32, payload_len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(crate::HEADER_LEN + payload_len);
    Header::new(msg_type, payload_len as u16, seq_num).encode_into(&mut buf);
    buf
}

/// Encode a JOIN frame. Also the server's reply to a successful join: the
/// request is echoed back to the client.
pub fn encode_join(username: &str, session_id: &SessionId, seq_num: u32) -> Vec<u8> {
    let mut buf = frame(MsgType::Join, seq_num, JOIN_PAYLOAD_LEN);
    put_fixed_str(&mut buf, username, USERNAME_WIDTH);
    put_fixed_str(&mut buf, session_id.as_str(), SESSION_ID_WIDTH);
    buf
}

pub fn encode_new_order(order: &NewOrderRequest, seq_num: u32) -> Vec<u8> {
    let mut buf = frame(MsgType::NewOrder, seq_num, NEW_ORDER_PAYLOAD_LEN);
    buf.extend_from_slice(&order.order_id.value().to_be_bytes());
    buf.push(match order.side {
        Side::Buy => 0,
        Side::Sell => 1,
    });
    buf.extend_from_slice(&order.price.to_bits().to_be_bytes());
    buf.extend_from_slice(&order.quantity.to_be_bytes());
    put_fixed_str(&mut buf, order.symbol.as_str(), SYMBOL_WIDTH);
    put_fixed_str(&mut buf, order.session_id.as_str(), SESSION_ID_WIDTH);
    buf
}

pub fn encode_order_ack(
    order_id: OrderId,
    success: bool,
    message: &str,
    seq_num: u32,
) -> Vec<u8> {
    let mut buf = frame(MsgType::OrderAck, seq_num, ORDER_ACK_PAYLOAD_LEN);
    buf.extend_from_slice(&order_id.value().to_be_bytes());
    buf.push(success as u8);
    put_fixed_str(&mut buf, message, ACK_MESSAGE_WIDTH);
    buf
}

pub fn encode_market_data(data: &MarketDataFrame, seq_num: u32) -> Vec<u8> {
    let mut buf = frame(MsgType::MarketData, seq_num, MARKET_DATA_PAYLOAD_LEN);
    put_fixed_str(&mut buf, data.symbol.as_str(), SYMBOL_WIDTH);
    buf.extend_from_slice(&data.best_bid.to_bits().to_be_bytes());
    buf.extend_from_slice(&data.best_ask.to_bits().to_be_bytes());
    buf.extend_from_slice(&data.bid_size.to_be_bytes());
    buf.extend_from_slice(&data.ask_size.to_be_bytes());
    buf.extend_from_slice(&data.timestamp.to_be_bytes());
    buf
}

/// Decode a client request payload. ORDER_ACK, TRADE and MARKET_DATA are
/// server-to-client only and rejected here.
pub fn decode_request(msg_type: MsgType, payload: &[u8]) -> Result<Request, ProtocolError> {
    match msg_type {
        MsgType::Join => decode_join(payload).map(Request::Join),
        MsgType::NewOrder => decode_new_order(payload).map(Request::NewOrder),
        other => Err(ProtocolError::UnknownType(format!("{:?}", other))),
    }
}

fn decode_join(payload: &[u8]) -> Result<JoinRequest, ProtocolError> {
    let mut r = Reader::new(payload);
    let username = r.fixed_str(USERNAME_WIDTH)?;
    let session_id = SessionId::new(r.fixed_str(SESSION_ID_WIDTH)?);
    Ok(JoinRequest {
        username,
        session_id,
    })
}

fn decode_new_order(payload: &[u8]) -> Result<NewOrderRequest, ProtocolError> {
    let mut r = Reader::new(payload);
    let order_id = OrderId::new(r.u64()?);
    let side = match r.u8()? {
        0 => Side::Buy,
        1 => Side::Sell,
        other => return Err(ProtocolError::BadSide(other)),
    };
    let price = r.f64()?;
    let quantity = r.u32()?;
    let symbol = Symbol::new(r.fixed_str(SYMBOL_WIDTH)?);
    let session_id = SessionId::new(r.fixed_str(SESSION_ID_WIDTH)?);
    Ok(NewOrderRequest {
        order_id,
        side,
        price,
        quantity,
        symbol,
        session_id,
    })
}

/// Client-side decode of a server acknowledgement.
pub fn decode_order_ack(payload: &[u8]) -> Result<OrderAck, ProtocolError> {
    let mut r = Reader::new(payload);
    let order_id = OrderId::new(r.u64()?);
    let success = r.u8()? != 0;
    let message = r.fixed_str(ACK_MESSAGE_WIDTH)?;
    Ok(OrderAck {
        order_id,
        success,
        message,
    })
}

/// Subscriber-side decode of a market-data datagram payload.
pub fn decode_market_data(payload: &[u8]) -> Result<MarketDataFrame, ProtocolError> {
    let mut r = Reader::new(payload);
    let symbol = Symbol::new(r.fixed_str(SYMBOL_WIDTH)?);
    let best_bid = r.f64()?;
    let best_ask = r.f64()?;
    let bid_size = r.u32()?;
    let ask_size = r.u32()?;
    let timestamp = r.u64()?;
    Ok(MarketDataFrame {
        symbol,
        best_bid,
        best_ask,
        bid_size,
        ask_size,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::HEADER_LEN;

    fn split(frame: &[u8]) -> (Header, &[u8]) {
        let header = Header::decode(&frame[..HEADER_LEN]).unwrap();
        (header, &frame[HEADER_LEN..])
    }

    #[test]
    fn test_join_roundtrip() {
        let buf = encode_join("alice", &SessionId::from("default"), 1);
        let (header, payload) = split(&buf);
        assert_eq!(header.msg_type, MsgType::Join);
        assert_eq!(header.length as usize, JOIN_PAYLOAD_LEN);
        assert_eq!(payload.len(), JOIN_PAYLOAD_LEN);

        match decode_request(header.msg_type, payload).unwrap() {
            Request::Join(join) => {
                assert_eq!(join.username, "alice");
                assert_eq!(join.session_id.as_str(), "default");
            }
            other => panic!("expected join, got {:?}", other),
        }
    }

    #[test]
    fn test_new_order_roundtrip() {
        let request = NewOrderRequest {
            order_id: OrderId::new(99),
            side: Side::Sell,
            price: 101.25,
            quantity: 7,
            symbol: Symbol::from("STOCK"),
            session_id: SessionId::from("default"),
        };
        let buf = encode_new_order(&request, 3);
        let (header, payload) = split(&buf);
        assert_eq!(header.msg_type, MsgType::NewOrder);
        assert_eq!(header.seq_num, 3);

        match decode_request(header.msg_type, payload).unwrap() {
            Request::NewOrder(decoded) => assert_eq!(decoded, request),
            other => panic!("expected new_order, got {:?}", other),
        }
    }

    #[test]
    fn test_order_ack_roundtrip() {
        let buf = encode_order_ack(OrderId::new(12), true, "Order matched", 5);
        let (header, payload) = split(&buf);
        assert_eq!(header.msg_type, MsgType::OrderAck);
        assert_eq!(payload.len(), ORDER_ACK_PAYLOAD_LEN);

        let ack = decode_order_ack(payload).unwrap();
        assert_eq!(ack.order_id, OrderId::new(12));
        assert!(ack.success);
        assert_eq!(ack.message, "Order matched");
    }

    #[test]
    fn test_market_data_roundtrip() {
        let data = MarketDataFrame {
            symbol: Symbol::from("STOCK"),
            best_bid: 100.5,
            best_ask: 101.0,
            bid_size: 40,
            ask_size: 25,
            timestamp: 1_708_123_456_789_000_000,
        };
        let buf = encode_market_data(&data, 17);
        let (header, payload) = split(&buf);
        assert_eq!(header.msg_type, MsgType::MarketData);
        assert_eq!(decode_market_data(payload).unwrap(), data);
    }

    #[test]
    fn test_negative_price_bits_survive_the_wire() {
        // The codec moves raw IEEE-754 bits; validation happens later.
        let request = NewOrderRequest {
            order_id: OrderId::new(1),
            side: Side::Buy,
            price: -1.5,
            quantity: 1,
            symbol: Symbol::from("STOCK"),
            session_id: SessionId::from("default"),
        };
        let buf = encode_new_order(&request, 0);
        let (header, payload) = split(&buf);
        match decode_request(header.msg_type, payload).unwrap() {
            Request::NewOrder(decoded) => assert_eq!(decoded.price, -1.5),
            other => panic!("expected new_order, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let buf = encode_new_order(
            &NewOrderRequest {
                order_id: OrderId::new(1),
                side: Side::Buy,
                price: 100.0,
                quantity: 1,
                symbol: Symbol::from("STOCK"),
                session_id: SessionId::from("default"),
            },
            0,
        );
        let payload = &buf[HEADER_LEN..HEADER_LEN + 10];
        assert!(matches!(
            decode_request(MsgType::NewOrder, payload),
            Err(ProtocolError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_bad_side_byte() {
        let buf = encode_new_order(
            &NewOrderRequest {
                order_id: OrderId::new(1),
                side: Side::Buy,
                price: 100.0,
                quantity: 1,
                symbol: Symbol::from("STOCK"),
                session_id: SessionId::from("default"),
            },
            0,
        );
        let mut payload = buf[HEADER_LEN..].to_vec();
        payload[8] = 9;
        assert!(matches!(
            decode_request(MsgType::NewOrder, &payload),
            Err(ProtocolError::BadSide(9))
        ));
    }

    #[test]
    fn test_ack_frames_are_not_requests() {
        assert!(matches!(
            decode_request(MsgType::OrderAck, &[0; ORDER_ACK_PAYLOAD_LEN]),
            Err(ProtocolError::UnknownType(_))
        ));
    }

    #[test]
    fn test_long_username_truncated_with_terminator() {
        let name = "x".repeat(40);
        let buf = encode_join(&name, &SessionId::from("default"), 0);
        let (header, payload) = split(&buf);
        match decode_request(header.msg_type, payload).unwrap() {
            Request::Join(join) => assert_eq!(join.username, "x".repeat(USERNAME_WIDTH - 1)),
            other => panic!("expected join, got {:?}", other),
        }
    }
}
