//! Command-line configuration for the server binary.

use clap::{Parser, ValueEnum};
use std::net::Ipv4Addr;

/// Wire format spoken on the TCP port, chosen at server construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolMode {
    /// Length-prefixed binary frames in network byte order.
    Binary,
    /// One JSON object per write.
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "gateway", about = "Multi-user limit-order matching server")]
pub struct Cli {
    /// TCP port to bind.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Client wire format.
    #[arg(long, value_enum, default_value_t = ProtocolMode::Binary)]
    pub protocol: ProtocolMode,

    /// Multicast group for market data; publication is enabled when both
    /// this and --multicast-port are set.
    #[arg(long)]
    pub multicast_addr: Option<Ipv4Addr>,

    /// Multicast port for market data.
    #[arg(long)]
    pub multicast_port: Option<u16>,

    /// Worker threads; defaults to the machine's available parallelism.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Cap on order-pool storage blocks; defaults to the engine's built-in
    /// limit.
    #[arg(long)]
    pub pool_blocks: Option<usize>,
}
