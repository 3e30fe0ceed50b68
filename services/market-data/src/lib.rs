//! Market data: top-of-book snapshots over UDP multicast.
//!
//! The emitter turns book tops into MARKET_DATA frames and hands them to a
//! datagram sink. Delivery is best-effort: no retries, no acknowledgements,
//! no flow control. Sequence numbers wrap on overflow and receivers are
//! expected to tolerate gaps.

pub mod emitter;
pub mod publisher;
pub mod receiver;

pub use emitter::{DatagramSink, SnapshotEmitter, TopOfBook};
pub use publisher::MulticastPublisher;
pub use receiver::{MarketDataClient, MarketDataReceiver};
