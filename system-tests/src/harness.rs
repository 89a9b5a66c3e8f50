// system-tests/src/harness.rs
// ============================================================================
// Module: System Test Harness
// Description: Boots the real TCP server for end-to-end suites.
// Purpose: Provide per-test servers on ephemeral ports with real clients.
// Dependencies: deckhand-cli, deckhand-server, tokio
// ============================================================================

//! ## Overview
//! Each test boots its own server over a fresh in-memory game session, so
//! suites never share state and can run in parallel. The server thread is
//! detached; it dies with the test process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use deckhand_cli::RpcClient;
use deckhand_core::GameSession;
use deckhand_server::ApiServer;
use deckhand_server::AuditConfig;
use deckhand_server::DeckhandConfig;
use deckhand_server::InMemoryGame;
use deckhand_server::NoopAuditSink;
use deckhand_server::NoopMetrics;
use deckhand_server::ServerConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Per-call client timeout used by the suites.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Handle to a running test server.
pub struct TestServer {
    /// Bound address of the server.
    addr: SocketAddr,
}

impl TestServer {
    /// Boots a server over a fresh in-memory game session.
    ///
    /// # Panics
    ///
    /// Panics when the server cannot bind; the test cannot proceed.
    #[must_use]
    pub fn start() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_io()
                .enable_time()
                .build()
            {
                Ok(runtime) => runtime,
                Err(_) => return,
            };
            runtime.block_on(async move {
                let config = DeckhandConfig {
                    server: ServerConfig {
                        host: "127.0.0.1".to_string(),
                        port: 0,
                    },
                    audit: AuditConfig::default(),
                };
                let game: Arc<dyn GameSession> = Arc::new(InMemoryGame::new());
                let Ok(server) = ApiServer::bind(
                    &config,
                    game,
                    Arc::new(NoopMetrics),
                    Arc::new(NoopAuditSink),
                )
                .await
                else {
                    return;
                };
                let Ok(addr) = server.local_addr() else {
                    return;
                };
                let _ = tx.send(addr);
                let _ = server.serve().await;
            });
        });
        let Ok(addr) = rx.recv_timeout(Duration::from_secs(10)) else {
            server_start_failure()
        };
        Self {
            addr,
        }
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns an RPC client bound to this server.
    #[must_use]
    pub fn client(&self) -> RpcClient {
        RpcClient::new(self.addr.ip().to_string(), self.addr.port(), CLIENT_TIMEOUT)
    }

    /// Opens a raw line-framed connection for protocol-level suites.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when the connection cannot be opened.
    pub fn raw(&self) -> std::io::Result<RawConnection> {
        RawConnection::open(self.addr)
    }
}

// ============================================================================
// SECTION: Raw Connection
// ============================================================================

/// Blocking raw-line connection for wire-level assertions.
pub struct RawConnection {
    /// Buffered stream shared by reads and writes.
    reader: std::io::BufReader<std::net::TcpStream>,
}

impl RawConnection {
    /// Connects to the server with read/write timeouts applied.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when the connection cannot be opened.
    pub fn open(addr: SocketAddr) -> std::io::Result<Self> {
        let stream = std::net::TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
        stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;
        Ok(Self {
            reader: std::io::BufReader::new(stream),
        })
    }

    /// Writes raw bytes exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when the write fails.
    pub fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        use std::io::Write;
        self.reader.get_mut().write_all(bytes)
    }

    /// Reads one response line, terminator included.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when the read fails.
    pub fn read_line(&mut self) -> std::io::Result<String> {
        use std::io::BufRead;
        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line)
    }

    /// Sends one frame and reads one response line.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when either direction fails.
    pub fn roundtrip(&mut self, frame: &str) -> std::io::Result<String> {
        self.send(frame.as_bytes())?;
        self.read_line()
    }
}

/// Aborts the calling test when the server never reported an address.
#[allow(clippy::panic, reason = "Harness failure must abort the test.")]
fn server_start_failure() -> ! {
    panic!("test server failed to start")
}
