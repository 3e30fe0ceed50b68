//! Gateway service: TCP front-end over the matching engine.
//!
//! A fixed worker pool runs one dispatcher loop per accepted connection.
//! Sessions group users and their order books; the registry owns the
//! sessions and the shared order pool. Lock order is always
//! registry → session → book, and no lock is held across I/O.

pub mod config;
pub mod dispatch;
pub mod registry;
pub mod server;
pub mod session;
pub mod thread_pool;

pub use config::{Cli, ProtocolMode};
pub use dispatch::Dispatcher;
pub use registry::SessionRegistry;
pub use server::{Server, ServerConfig};
pub use session::Session;
