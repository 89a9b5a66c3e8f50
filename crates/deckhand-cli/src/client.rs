// crates/deckhand-cli/src/client.rs
// ============================================================================
// Module: Deckhand RPC Client
// Description: Synchronous line-framed JSON-RPC 2.0 client.
// Purpose: Provide one-request-one-response calls with auto-incremented ids.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The client performs one JSON-RPC call per invocation over a pooled TCP
//! connection: it writes one line, reads one line, and either returns the
//! `result` object or surfaces the server's structured error. Connection
//! failures are a distinct error kind from API errors so callers can retry
//! transport problems without misreading domain refusals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structured API error returned by the server.
///
/// # Invariants
/// - `name` is one of the server's stable error kind labels.
#[derive(Debug, Clone, Error)]
#[error("{name}: {message}")]
pub struct ApiError {
    /// Machine-readable error kind.
    pub name: String,
    /// Human-readable error message.
    pub message: String,
    /// JSON-RPC error code.
    pub code: i64,
}

/// RPC client errors.
///
/// # Invariants
/// - Variants are stable for CLI error mapping and tests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection establishment failed.
    #[error("connection error: {0}")]
    Connection(String),
    /// Socket I/O failed mid-call.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response line violated the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The server returned a structured API error.
    #[error(transparent)]
    Api(ApiError),
}

// ============================================================================
// SECTION: Wire Structures
// ============================================================================

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct WireResponse {
    /// Successful result payload.
    result: Option<Value>,
    /// Error payload when the request failed.
    error: Option<WireError>,
    /// Echoed request identifier.
    id: Option<Value>,
}

/// JSON-RPC error payload.
#[derive(Debug, Deserialize)]
struct WireError {
    /// JSON-RPC error code.
    code: i64,
    /// Human-readable error message.
    message: String,
    /// Structured error metadata.
    data: WireErrorData,
}

/// Machine-readable error metadata.
#[derive(Debug, Deserialize)]
struct WireErrorData {
    /// Stable error kind name.
    name: String,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Synchronous line-framed JSON-RPC client.
///
/// # Invariants
/// - Request ids are strictly increasing, starting at 1.
/// - At most one request is in flight at a time.
pub struct RpcClient {
    /// Server host.
    host: String,
    /// Server port.
    port: u16,
    /// Wall-clock timeout applied to connect, send, and receive.
    timeout: Duration,
    /// Pooled connection, re-established on demand.
    stream: Option<BufReader<TcpStream>>,
    /// Last issued request identifier.
    last_id: u64,
}

impl RpcClient {
    /// Creates a client; the connection is established on first use.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            stream: None,
            last_id: 0,
        }
    }

    /// Calls a method and returns the `result` object.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the server reports a structured
    /// error, and a transport-flavored variant when the connection or the
    /// response line is unusable.
    pub fn call(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.last_id.checked_add(1).ok_or_else(|| {
            ClientError::Protocol("request id overflow".to_string())
        })?;
        self.last_id = id;
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        let mut line = serde_json::to_string(&payload)
            .map_err(|err| ClientError::Protocol(format!("request serialization failed: {err}")))?;
        line.push('\n');
        let response_line = match self.roundtrip(&line) {
            Ok(response_line) => response_line,
            Err(err) => {
                // Drop the pooled connection so the next call reconnects.
                self.stream = None;
                return Err(err);
            }
        };
        let response: WireResponse = serde_json::from_str(&response_line)
            .map_err(|err| ClientError::Protocol(format!("invalid response: {err}")))?;
        if let Some(error) = response.error {
            return Err(ClientError::Api(ApiError {
                name: error.data.name,
                message: error.message,
                code: error.code,
            }));
        }
        if response.id != Some(Value::from(id)) {
            return Err(ClientError::Protocol("response id mismatch".to_string()));
        }
        response
            .result
            .ok_or_else(|| ClientError::Protocol("response carries no result".to_string()))
    }

    /// Writes one request line and reads one response line.
    fn roundtrip(&mut self, line: &str) -> Result<String, ClientError> {
        let stream = self.connection()?;
        stream
            .get_mut()
            .write_all(line.as_bytes())
            .map_err(|err| ClientError::Transport(format!("send failed: {err}")))?;
        let mut response_line = String::new();
        let read = stream
            .read_line(&mut response_line)
            .map_err(|err| ClientError::Transport(format!("receive failed: {err}")))?;
        if read == 0 {
            return Err(ClientError::Transport("server closed the connection".to_string()));
        }
        Ok(response_line)
    }

    /// Returns the pooled connection, establishing it when needed.
    fn connection(&mut self) -> Result<&mut BufReader<TcpStream>, ClientError> {
        if self.stream.is_none() {
            let addr = (self.host.as_str(), self.port)
                .to_socket_addrs()
                .map_err(|err| ClientError::Connection(err.to_string()))?
                .next()
                .ok_or_else(|| {
                    ClientError::Connection(format!("no address for {}:{}", self.host, self.port))
                })?;
            let stream = TcpStream::connect_timeout(&addr, self.timeout)
                .map_err(|err| ClientError::Connection(err.to_string()))?;
            stream
                .set_read_timeout(Some(self.timeout))
                .map_err(|err| ClientError::Connection(err.to_string()))?;
            stream
                .set_write_timeout(Some(self.timeout))
                .map_err(|err| ClientError::Connection(err.to_string()))?;
            self.stream = Some(BufReader::new(stream));
        }
        self.stream
            .as_mut()
            .ok_or_else(|| ClientError::Connection("connection unavailable".to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
