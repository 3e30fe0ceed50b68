//! UDP multicast sink for market-data frames.

use crate::emitter::DatagramSink;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

/// Sends each datagram to a multicast group. A failed send is logged and
/// dropped; the publisher never blocks or retries.
pub struct MulticastPublisher {
    socket: UdpSocket,
    target: SocketAddrV4,
}

impl MulticastPublisher {
    pub fn new(group: Ipv4Addr, port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_multicast_ttl_v4(1)?;
        Ok(Self {
            socket,
            target: SocketAddrV4::new(group, port),
        })
    }

    pub fn target(&self) -> SocketAddrV4 {
        self.target
    }
}

impl DatagramSink for MulticastPublisher {
    fn send(&self, payload: &[u8]) {
        if let Err(err) = self.socket.send_to(payload, self.target) {
            tracing::warn!(target = %self.target, %err, "market data send failed");
        }
    }
}
