//! Live-socket tests: a real server, real `TcpStream` clients, both wire
//! formats.

use gateway::{Dispatcher, ProtocolMode, Server, ServerConfig, SessionRegistry};
use matching_engine::OrderPool;
use protocol::{binary, Header, MsgType, NewOrderRequest, HEADER_LEN};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;
use types::ids::{OrderId, SessionId, Symbol};
use types::order::Side;

fn start_server(mode: ProtocolMode) -> (Server, SocketAddr) {
    let registry = Arc::new(SessionRegistry::new(Arc::new(OrderPool::new())));
    let dispatcher = Arc::new(Dispatcher::new(registry));
    let mut server = Server::new(
        ServerConfig {
            port: 0,
            mode,
            workers: 2,
        },
        dispatcher,
    );
    server.start().expect("server failed to start");
    let addr = server.local_addr().expect("server has a bound address");
    (server, addr)
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("connect to server");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

fn read_frame(stream: &mut TcpStream) -> (Header, Vec<u8>) {
    let mut header_buf = [0u8; HEADER_LEN];
    stream.read_exact(&mut header_buf).expect("read header");
    let header = Header::decode(&header_buf).expect("valid header");
    let mut payload = vec![0u8; usize::from(header.length)];
    stream.read_exact(&mut payload).expect("read payload");
    (header, payload)
}

fn order(id: u64, side: Side, price: f64, quantity: u32) -> NewOrderRequest {
    NewOrderRequest {
        order_id: OrderId::new(id),
        side,
        price,
        quantity,
        symbol: Symbol::default(),
        session_id: SessionId::default(),
    }
}

#[test]
fn binary_join_and_order_round_trip() {
    let (mut server, addr) = start_server(ProtocolMode::Binary);
    {
        let mut client = connect(addr);

        // Join echoes the frame back on success.
        client
            .write_all(&binary::encode_join("alice", &SessionId::default(), 0))
            .unwrap();
        let (header, _payload) = read_frame(&mut client);
        assert_eq!(header.msg_type, MsgType::Join);

        // A resting buy is acknowledged.
        client
            .write_all(&binary::encode_new_order(&order(1, Side::Buy, 100.0, 5), 1))
            .unwrap();
        let (header, payload) = read_frame(&mut client);
        assert_eq!(header.msg_type, MsgType::OrderAck);
        let ack = binary::decode_order_ack(&payload).unwrap();
        assert!(ack.success);
        assert_eq!(ack.order_id, OrderId::new(1));
        assert_eq!(ack.message, "Order added to book");
    }
    server.stop();
}

#[test]
fn binary_errors_come_back_as_failed_acks() {
    let (mut server, addr) = start_server(ProtocolMode::Binary);
    {
        let mut client = connect(addr);

        // Order before joining: the connection is bound to no user.
        client
            .write_all(&binary::encode_new_order(&order(1, Side::Buy, 100.0, 5), 0))
            .unwrap();
        let (header, payload) = read_frame(&mut client);
        assert_eq!(header.msg_type, MsgType::OrderAck);
        let ack = binary::decode_order_ack(&payload).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message, "User not found");

        // The connection survived the error.
        client
            .write_all(&binary::encode_join("bob", &SessionId::default(), 1))
            .unwrap();
        let (header, _) = read_frame(&mut client);
        assert_eq!(header.msg_type, MsgType::Join);
    }
    server.stop();
}

#[test]
fn binary_duplicate_username_across_connections() {
    let (mut server, addr) = start_server(ProtocolMode::Binary);
    {
        let mut first = connect(addr);
        first
            .write_all(&binary::encode_join("carol", &SessionId::default(), 0))
            .unwrap();
        let (header, _) = read_frame(&mut first);
        assert_eq!(header.msg_type, MsgType::Join);

        let mut second = connect(addr);
        second
            .write_all(&binary::encode_join("carol", &SessionId::default(), 0))
            .unwrap();
        let (header, payload) = read_frame(&mut second);
        assert_eq!(header.msg_type, MsgType::OrderAck);
        let ack = binary::decode_order_ack(&payload).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message, "Username already taken");
    }
    server.stop();
}

#[test]
fn json_round_trip_and_error_recovery() {
    let (mut server, addr) = start_server(ProtocolMode::Json);
    {
        let mut client = connect(addr);
        let mut buf = [0u8; 4096];

        client
            .write_all(br#"{"type":"join","username":"dave"}"#)
            .unwrap();
        let n = client.read(&mut buf).unwrap();
        let response: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(response["status"], "success");
        assert_eq!(response["username"], "dave");

        // Malformed JSON is answered in-band, connection preserved.
        client.write_all(b"{this is not json").unwrap();
        let n = client.read(&mut buf).unwrap();
        let response: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(response["status"], "error");

        client
            .write_all(
                br#"{"type":"new_order","side":"buy","price":101.5,"quantity":3,"order_id":7}"#,
            )
            .unwrap();
        let n = client.read(&mut buf).unwrap();
        let response: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(response["status"], "success");
        assert_eq!(response["message"], "Order added to book");
        assert_eq!(response["order_id"], 7);
    }
    server.stop();
}
