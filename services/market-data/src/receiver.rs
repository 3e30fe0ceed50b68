//! Multicast receive side: background loop plus a per-symbol client.

use protocol::{binary, Header, MarketDataFrame, MsgType, HEADER_LEN};
use std::collections::HashSet;
use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use types::ids::Symbol;

pub type DataCallback = Box<dyn Fn(MarketDataFrame) + Send + 'static>;

/// Joins a multicast group on a background thread and invokes a callback
/// per decoded MARKET_DATA frame until stopped. Frames that fail to decode
/// are dropped; gaps in sequence numbers are the subscriber's problem.
pub struct MarketDataReceiver {
    group: Ipv4Addr,
    port: u16,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MarketDataReceiver {
    pub fn new(group: Ipv4Addr, port: u16) -> Self {
        Self {
            group,
            port,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn start(&mut self, callback: DataCallback) -> io::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.port))?;
        socket.join_multicast_v4(&self.group, &Ipv4Addr::UNSPECIFIED)?;
        // Short read timeout so stop() is honored promptly.
        socket.set_read_timeout(Some(Duration::from_millis(250)))?;

        let running = Arc::clone(&self.running);
        self.worker = Some(std::thread::spawn(move || {
            receive_loop(socket, running, callback);
        }));
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for MarketDataReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn receive_loop(socket: UdpSocket, running: Arc<AtomicBool>, callback: DataCallback) {
    let mut buf = [0u8; 512];
    while running.load(Ordering::SeqCst) {
        let received = match socket.recv(&mut buf) {
            Ok(n) => n,
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(err) => {
                tracing::warn!(%err, "market data receive failed");
                break;
            }
        };
        if received < HEADER_LEN {
            continue;
        }
        let Ok(header) = Header::decode(&buf[..HEADER_LEN]) else {
            continue;
        };
        if header.msg_type != MsgType::MarketData {
            continue;
        }
        match binary::decode_market_data(&buf[HEADER_LEN..received]) {
            Ok(frame) => callback(frame),
            Err(err) => tracing::debug!(%err, "dropping malformed market data frame"),
        }
    }
}

/// Subscriber with per-symbol filtering on top of the raw receiver.
pub struct MarketDataClient {
    receiver: MarketDataReceiver,
    subscriptions: Arc<Mutex<HashSet<Symbol>>>,
}

impl MarketDataClient {
    pub fn new(group: Ipv4Addr, port: u16) -> Self {
        Self {
            receiver: MarketDataReceiver::new(group, port),
            subscriptions: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Returns false if the symbol was already subscribed.
    pub fn subscribe(&self, symbol: Symbol) -> bool {
        self.subscriptions
            .lock()
            .expect("subscription set poisoned")
            .insert(symbol)
    }

    /// Returns false if the symbol was not subscribed.
    pub fn unsubscribe(&self, symbol: &Symbol) -> bool {
        self.subscriptions
            .lock()
            .expect("subscription set poisoned")
            .remove(symbol)
    }

    /// Start receiving; only frames for subscribed symbols reach `on_data`.
    pub fn start(&mut self, on_data: impl Fn(MarketDataFrame) + Send + 'static) -> io::Result<()> {
        let subscriptions = Arc::clone(&self.subscriptions);
        self.receiver.start(Box::new(move |frame| {
            let wanted = subscriptions
                .lock()
                .expect("subscription set poisoned")
                .contains(&frame.symbol);
            if wanted {
                on_data(frame);
            }
        }))
    }

    pub fn stop(&mut self) {
        self.receiver.stop();
    }
}
