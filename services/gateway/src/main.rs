use clap::Parser;
use gateway::{Cli, Dispatcher, Server, ServerConfig, SessionRegistry};
use market_data::{MulticastPublisher, SnapshotEmitter};
use matching_engine::OrderPool;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    tracing_subscriber::fmt::init();

    let pool = Arc::new(match cli.pool_blocks {
        Some(blocks) => OrderPool::with_max_blocks(blocks),
        None => OrderPool::new(),
    });
    let registry = Arc::new(SessionRegistry::new(pool));

    let mut dispatcher = Dispatcher::new(Arc::clone(&registry));
    if let (Some(group), Some(port)) = (cli.multicast_addr, cli.multicast_port) {
        let publisher = MulticastPublisher::new(group, port)?;
        dispatcher = dispatcher.with_emitter(Arc::new(SnapshotEmitter::new(Box::new(publisher))));
        tracing::info!(%group, port, "market data publication enabled");
    }

    let config = ServerConfig {
        port: cli.port,
        mode: cli.protocol,
        workers: cli.workers.unwrap_or_else(ServerConfig::default_workers),
    };
    let mut server = Server::new(config, Arc::new(dispatcher));
    server.start()?;

    // The acceptor and workers carry the load; park here until killed.
    loop {
        std::thread::sleep(Duration::from_secs(1));
    }
}
