//! TCP server: accept loop plus per-connection dispatcher tasks.
//!
//! The acceptor thread hands each connection to the worker pool; within a
//! task, work is strictly sequential. Shutdown is cooperative: the running
//! flag is cleared, the acceptor winds down, and in-flight tasks run to
//! completion while no new work is admitted.

use crate::config::ProtocolMode;
use crate::dispatch::{encode_binary_response, Dispatcher};
use crate::thread_pool::ThreadPool;
use protocol::{binary, text, Header, MsgType, Response, HEADER_LEN};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use types::errors::RequestError;
use types::ids::ConnectionId;

pub struct ServerConfig {
    pub port: u16,
    pub mode: ProtocolMode,
    pub workers: usize,
}

impl ServerConfig {
    pub fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            mode: ProtocolMode::Binary,
            workers: Self::default_workers(),
        }
    }
}

pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    running: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
    workers: Option<Arc<ThreadPool>>,
    local_addr: Option<SocketAddr>,
    next_connection: Arc<AtomicU64>,
}

impl Server {
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            running: Arc::new(AtomicBool::new(false)),
            acceptor: None,
            workers: None,
            local_addr: None,
            next_connection: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bind the listener and start accepting. Idempotent while running.
    pub fn start(&mut self) -> io::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let listener = TcpListener::bind(("0.0.0.0", self.config.port))?;
        let addr = listener.local_addr()?;
        self.local_addr = Some(addr);
        // Non-blocking accept so the loop notices the running flag.
        listener.set_nonblocking(true)?;

        let workers = Arc::new(ThreadPool::new(self.config.workers));
        self.workers = Some(Arc::clone(&workers));
        tracing::info!(%addr, workers = workers.size(), mode = ?self.config.mode, "server started");

        let running = Arc::clone(&self.running);
        let dispatcher = Arc::clone(&self.dispatcher);
        let next_connection = Arc::clone(&self.next_connection);
        let mode = self.config.mode;
        self.acceptor = Some(
            std::thread::Builder::new()
                .name("acceptor".to_string())
                .spawn(move || {
                    accept_loop(listener, running, workers, dispatcher, mode, next_connection)
                })
                .expect("failed to spawn acceptor thread"),
        );
        Ok(())
    }

    /// Cooperative shutdown: stop accepting, drain the worker pool.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(acceptor) = self.acceptor.take() {
            let _ = acceptor.join();
        }
        // Dropping the last pool reference joins the workers once their
        // in-flight connections finish.
        self.workers.take();
        tracing::info!("server stopped");
    }

    /// Actual bound address, useful when the configured port was 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    workers: Arc<ThreadPool>,
    dispatcher: Arc<Dispatcher>,
    mode: ProtocolMode,
    next_connection: Arc<AtomicU64>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let connection = ConnectionId::new(next_connection.fetch_add(1, Ordering::Relaxed) + 1);
                tracing::info!(%peer, %connection, "accepted connection");
                let dispatcher = Arc::clone(&dispatcher);
                let running = Arc::clone(&running);
                workers.execute(move || {
                    handle_connection(stream, connection, dispatcher, mode, running)
                });
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                tracing::warn!(%err, "accept failed");
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
    tracing::debug!("acceptor stopped");
}

fn handle_connection(
    mut stream: TcpStream,
    connection: ConnectionId,
    dispatcher: Arc<Dispatcher>,
    mode: ProtocolMode,
    running: Arc<AtomicBool>,
) {
    let _ = stream.set_nodelay(true);
    if let Err(err) = serve(&mut stream, connection, &dispatcher, mode, &running) {
        tracing::debug!(%connection, %err, "connection loop ended");
    }
    dispatcher.disconnect(connection);
    tracing::info!(%connection, "client disconnected");
}

/// Per-connection read → dispatch → respond loop. Returns only when the
/// peer goes away or the server shuts down; every request-level failure is
/// answered in-band.
fn serve(
    stream: &mut TcpStream,
    connection: ConnectionId,
    dispatcher: &Dispatcher,
    mode: ProtocolMode,
    running: &AtomicBool,
) -> Result<(), RequestError> {
    let mut seq_num: u32 = 0;
    while running.load(Ordering::SeqCst) {
        let response_bytes = match mode {
            ProtocolMode::Binary => {
                let mut header_buf = [0u8; HEADER_LEN];
                read_exact(stream, &mut header_buf)?;
                let (type_byte, length, _client_seq) =
                    Header::split(&header_buf).map_err(|_| RequestError::ConnectionClosed)?;
                let mut payload = vec![0u8; usize::from(length)];
                read_exact(stream, &mut payload)?;

                let decoded = MsgType::try_from(type_byte)
                    .and_then(|msg_type| binary::decode_request(msg_type, &payload));
                let response = match decoded {
                    Ok(request) => dispatcher.process(connection, &request),
                    Err(err) => Response::error(RequestError::from(err).to_string()),
                };
                let bytes = encode_binary_response(&response, seq_num);
                seq_num = seq_num.wrapping_add(1);
                bytes
            }
            ProtocolMode::Json => {
                let mut buf = [0u8; 4096];
                let n = stream
                    .read(&mut buf)
                    .map_err(|_| RequestError::ConnectionClosed)?;
                if n == 0 {
                    return Err(RequestError::ConnectionClosed);
                }
                let response = match text::decode_request(&buf[..n]) {
                    Ok(request) => dispatcher.process(connection, &request),
                    Err(err) => Response::error(RequestError::from(err).to_string()),
                };
                text::encode_response(&response)
            }
        };
        stream
            .write_all(&response_bytes)
            .map_err(|_| RequestError::ConnectionClosed)?;
    }
    Ok(())
}

fn read_exact(stream: &mut TcpStream, buf: &mut [u8]) -> Result<(), RequestError> {
    stream
        .read_exact(buf)
        .map_err(|_| RequestError::ConnectionClosed)
}
