//! Snapshot emitter: formats top-of-book frames and hands them to a sink.

use protocol::binary;
use protocol::MarketDataFrame;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use types::ids::Symbol;
use types::numeric::Price;

/// Fire-and-forget datagram transport. The emitter never learns whether a
/// send arrived.
pub trait DatagramSink: Send + Sync {
    fn send(&self, payload: &[u8]);
}

/// Top of one book, ready for publication. An empty side is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopOfBook {
    pub symbol: Symbol,
    pub bid: Option<(Price, u64)>,
    pub ask: Option<(Price, u64)>,
}

impl TopOfBook {
    fn side_as_wire(side: Option<(Price, u64)>) -> (f64, u32) {
        match side {
            // Aggregate sizes can exceed the wire's u32; clamp rather than
            // wrap.
            Some((price, size)) => (price.as_f64(), size.min(u64::from(u32::MAX)) as u32),
            None => (0.0, 0),
        }
    }
}

/// Stamps frames with a wrapping sequence number and a nanosecond
/// timestamp, then hands them to the sink.
pub struct SnapshotEmitter {
    sequence: AtomicU32,
    sink: Box<dyn DatagramSink>,
}

impl SnapshotEmitter {
    pub fn new(sink: Box<dyn DatagramSink>) -> Self {
        Self {
            sequence: AtomicU32::new(0),
            sink,
        }
    }

    pub fn publish(&self, top: &TopOfBook) {
        let (best_bid, bid_size) = TopOfBook::side_as_wire(top.bid);
        let (best_ask, ask_size) = TopOfBook::side_as_wire(top.ask);
        let frame = MarketDataFrame {
            symbol: top.symbol.clone(),
            best_bid,
            best_ask,
            bid_size,
            ask_size,
            timestamp: now_nanos(),
        };
        // fetch_add wraps on overflow, as the wire format expects.
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let bytes = binary::encode_market_data(&frame, seq);
        tracing::trace!(symbol = %top.symbol, seq, "publishing top-of-book");
        self.sink.send(&bytes);
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{binary::decode_market_data, Header, MsgType, HEADER_LEN};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CaptureSink {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl DatagramSink for Arc<CaptureSink> {
        fn send(&self, payload: &[u8]) {
            self.frames.lock().unwrap().push(payload.to_vec());
        }
    }

    fn top(bid: Option<(u64, u64)>, ask: Option<(u64, u64)>) -> TopOfBook {
        TopOfBook {
            symbol: Symbol::from("STOCK"),
            bid: bid.map(|(p, q)| (Price::from_u64(p), q)),
            ask: ask.map(|(p, q)| (Price::from_u64(p), q)),
        }
    }

    #[test]
    fn test_publish_encodes_frame() {
        let sink = Arc::new(CaptureSink::default());
        let emitter = SnapshotEmitter::new(Box::new(Arc::clone(&sink)));

        emitter.publish(&top(Some((100, 40)), Some((101, 25))));

        let frames = sink.frames.lock().unwrap();
        let header = Header::decode(&frames[0][..HEADER_LEN]).unwrap();
        assert_eq!(header.msg_type, MsgType::MarketData);

        let frame = decode_market_data(&frames[0][HEADER_LEN..]).unwrap();
        assert_eq!(frame.symbol.as_str(), "STOCK");
        assert_eq!(frame.best_bid, 100.0);
        assert_eq!(frame.best_ask, 101.0);
        assert_eq!(frame.bid_size, 40);
        assert_eq!(frame.ask_size, 25);
        assert!(frame.timestamp > 0);
    }

    #[test]
    fn test_empty_side_renders_as_zero() {
        let sink = Arc::new(CaptureSink::default());
        let emitter = SnapshotEmitter::new(Box::new(Arc::clone(&sink)));

        emitter.publish(&top(None, Some((101, 5))));

        let frames = sink.frames.lock().unwrap();
        let frame = decode_market_data(&frames[0][HEADER_LEN..]).unwrap();
        assert_eq!(frame.best_bid, 0.0);
        assert_eq!(frame.bid_size, 0);
        assert_eq!(frame.best_ask, 101.0);
    }

    #[test]
    fn test_sequence_increments_per_frame() {
        let sink = Arc::new(CaptureSink::default());
        let emitter = SnapshotEmitter::new(Box::new(Arc::clone(&sink)));

        for _ in 0..3 {
            emitter.publish(&top(Some((100, 1)), None));
        }

        let frames = sink.frames.lock().unwrap();
        let seqs: Vec<u32> = frames
            .iter()
            .map(|f| Header::decode(&f[..HEADER_LEN]).unwrap().seq_num)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
