// crates/deckhand-server/src/server.rs
// ============================================================================
// Module: Deckhand TCP Server
// Description: Sequential line-framed TCP transport over the dispatcher.
// Purpose: Serve one connection at a time with strict request serialization.
// Dependencies: deckhand-core, tokio
// ============================================================================

//! ## Overview
//! The server owns the accept loop and the per-connection read-dispatch-write
//! loop. Connections are served sequentially; within a connection, response
//! `i` is fully written before request `i + 1` is read. I/O errors tear the
//! connection down silently and return control to the accept loop; they are
//! never surfaced as API errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use deckhand_core::Dispatcher;
use deckhand_core::DomainError;
use deckhand_core::GameSession;
use deckhand_core::Response;
use deckhand_core::StateSource;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::net::TcpStream;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::StderrAuditSink;
use crate::config::AuditConfig;
use crate::config::DeckhandConfig;
use crate::endpoints::build_registry;
use crate::frame::FrameOutcome;
use crate::frame::discard_to_newline;
use crate::frame::read_frame;
use crate::telemetry::RequestMetricEvent;
use crate::telemetry::RequestOutcome;
use crate::telemetry::ServerMetrics;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Line-framed TCP API server.
///
/// # Invariants
/// - At most one connection is served at a time.
/// - Exactly one response line is written per accepted frame.
pub struct ApiServer {
    /// Bound TCP listener.
    listener: TcpListener,
    /// Request dispatcher shared across connections.
    dispatcher: Arc<Dispatcher>,
    /// Metrics sink for request telemetry.
    metrics: Arc<dyn ServerMetrics>,
    /// Audit sink for request logging.
    audit: Arc<dyn AuditSink>,
}

impl ApiServer {
    /// Binds the listener and builds the dispatcher over the game session.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when registry construction or binding fails.
    pub async fn bind(
        config: &DeckhandConfig,
        game: Arc<dyn GameSession>,
        metrics: Arc<dyn ServerMetrics>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        let registry =
            build_registry(&game).map_err(|err| ServerError::Init(err.to_string()))?;
        let state: Arc<dyn StateSource> = game;
        let dispatcher = Arc::new(Dispatcher::new(registry, state));
        let listener = TcpListener::bind(config.server.bind_addr())
            .await
            .map_err(|err| ServerError::Bind(err.to_string()))?;
        Ok(Self {
            listener,
            dispatcher,
            metrics,
            audit,
        })
    }

    /// Returns the bound local address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(|err| ServerError::Transport(err.to_string()))
    }

    /// Accepts and serves connections sequentially, forever.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the listener itself fails; per-connection
    /// I/O errors only tear down that connection.
    pub async fn serve(self) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|err| ServerError::Transport(err.to_string()))?;
            self.handle_connection(stream, peer).await;
        }
    }

    /// Serves one connection until the peer closes or I/O fails.
    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        loop {
            let started = Instant::now();
            let Ok(outcome) = read_frame(&mut reader).await else {
                return;
            };
            let (report, needs_resync) = match outcome {
                FrameOutcome::Closed => return,
                FrameOutcome::TooLarge {
                    synchronized,
                } => (
                    FrameReport {
                        response: Response::frame_too_large(),
                        method: None,
                        request_bytes: 0,
                    },
                    !synchronized,
                ),
                FrameOutcome::Frame(bytes) => (self.dispatch_frame(bytes), false),
            };
            let Ok(line) = report.response.encode_line() else {
                return;
            };
            self.observe(peer, &report, line.len(), started);
            if write_half.write_all(line.as_bytes()).await.is_err() {
                return;
            }
            if needs_resync && discard_to_newline(&mut reader).await.is_err() {
                return;
            }
        }
    }

    /// Runs the dispatcher over one accepted frame.
    fn dispatch_frame(&self, bytes: Vec<u8>) -> FrameReport {
        let request_bytes = bytes.len();
        match String::from_utf8(bytes) {
            Ok(text) => {
                let outcome = self.dispatcher.dispatch(&text);
                FrameReport {
                    response: outcome.response,
                    method: outcome.method,
                    request_bytes,
                }
            }
            Err(_) => FrameReport {
                response: Response::failure(
                    DomainError::bad_request("Request is not valid UTF-8"),
                    Value::Null,
                ),
                method: None,
                request_bytes,
            },
        }
    }

    /// Emits metrics and audit records for one request.
    fn observe(
        &self,
        peer: SocketAddr,
        report: &FrameReport,
        response_bytes: usize,
        started: Instant,
    ) {
        let outcome = if report.response.error().is_some() {
            RequestOutcome::Error
        } else {
            RequestOutcome::Ok
        };
        let error_code = report.response.error().map(|error| error.code);
        let error_kind = report.response.error().map(|error| error.data.name);
        let event = RequestMetricEvent {
            method: report.method.clone(),
            outcome,
            error_code,
            error_kind,
            request_bytes: report.request_bytes,
            response_bytes,
        };
        self.metrics.record_request(event.clone());
        self.metrics.record_latency(event, started.elapsed());
        self.audit.record(&RequestAuditEvent::new(RequestAuditEventParams {
            peer,
            method: report.method.clone(),
            outcome,
            error_code,
            error_kind,
            request_bytes: report.request_bytes,
            response_bytes,
        }));
    }
}

/// Per-frame dispatch result with observability metadata.
struct FrameReport {
    /// Response to write back.
    response: Response,
    /// Method name when Tier 1 extracted one.
    method: Option<String>,
    /// Frame size in bytes (terminator excluded).
    request_bytes: usize,
}

// ============================================================================
// SECTION: Audit Sink Construction
// ============================================================================

/// Builds an audit sink from server configuration.
///
/// # Errors
///
/// Returns [`ServerError`] when the audit log file cannot be opened.
pub fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    if let Some(path) = &config.path {
        let sink = FileAuditSink::new(Path::new(path))
            .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
        return Ok(Arc::new(sink));
    }
    Ok(Arc::new(StderrAuditSink))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Listener bind errors.
    #[error("bind error: {0}")]
    Bind(String),
    /// Listener-level transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
