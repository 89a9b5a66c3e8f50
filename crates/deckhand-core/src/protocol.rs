// crates/deckhand-core/src/protocol.rs
// ============================================================================
// Module: Deckhand Wire Protocol
// Description: JSON-RPC 2.0 envelope decoding and response encoding.
// Purpose: Provide the canonical request/response forms and error taxonomy.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module defines the wire-level data model: the decoded request
//! envelope, the success/error response envelopes, and the closed four-kind
//! error taxonomy shared by every validation tier. Decoding is strict and
//! fails closed; peers only ever observe one of the four error kinds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum frame size in bytes, including the `\n` terminator.
pub const MAX_FRAME_BYTES: usize = 256;

/// Largest integer magnitude accepted for `integer`-typed fields.
///
/// Matches the 53-bit safe integer range so values survive round-trips
/// through IEEE-754 peers.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// JSON-RPC protocol version tag emitted on every response.
const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// Convenient alias for JSON object payloads.
pub type JsonMap = serde_json::Map<String, Value>;

/// Closed set of error kinds surfaced to peers.
///
/// # Invariants
/// - Variants, codes, and names are stable; tests depend on the exact values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Structurally invalid input: bad frame, bad JSON, unknown method,
    /// schema violation, or handler-rejected input content.
    BadRequest,
    /// Well-formed request issued while the session is in a state where the
    /// endpoint may not run.
    InvalidState,
    /// Well-formed and state-legal request refused by a policy gate.
    NotAllowed,
    /// Unexpected handler failure; peers should treat this as a bug.
    InternalError,
}

impl ErrorKind {
    /// Returns the JSON-RPC error code for the kind.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::BadRequest => -32600,
            Self::InvalidState => -32002,
            Self::NotAllowed => -32003,
            Self::InternalError => -32603,
        }
    }

    /// Returns the stable machine-readable name for the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidState => "INVALID_STATE",
            Self::NotAllowed => "NOT_ALLOWED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Error returned by a handler or raised by a validation tier.
///
/// # Invariants
/// - `message` is user-facing and never contains embedded newlines.
#[derive(Debug, Clone, Error)]
#[error("{}: {}", .kind.name(), .message)]
pub struct DomainError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl DomainError {
    /// Creates a `BAD_REQUEST` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::BadRequest,
            message: message.into(),
        }
    }

    /// Creates an `INVALID_STATE` error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidState,
            message: message.into(),
        }
    }

    /// Creates a `NOT_ALLOWED` error.
    #[must_use]
    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotAllowed,
            message: message.into(),
        }
    }

    /// Creates an `INTERNAL_ERROR` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InternalError,
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Request Envelope
// ============================================================================

/// Decoded request envelope after protocol validation.
///
/// # Invariants
/// - `method` is non-empty and `params` is the request's `params` object.
/// - `id` is the request's `id` value verbatim, or `Value::Null` when absent.
#[derive(Debug, Clone)]
pub struct Request {
    /// Method name to dispatch.
    pub method: String,
    /// Validated `params` object.
    pub params: JsonMap,
    /// Request identifier echoed on the response.
    pub id: Value,
}

/// Decode failure carrying the request id when one was extractable.
#[derive(Debug)]
pub struct DecodeError {
    /// Underlying protocol error.
    pub error: DomainError,
    /// Request id to echo, `Value::Null` when not extractable.
    pub id: Value,
}

impl DecodeError {
    /// Creates a decode error with no extractable id.
    fn anonymous(error: DomainError) -> Self {
        Self {
            error,
            id: Value::Null,
        }
    }
}

/// Decodes a trimmed frame into a request envelope.
///
/// Runs the JSON decode step and Tier 1 protocol validation: the frame must
/// be a JSON object carrying a string `method` and an object `params`.
/// `jsonrpc` is not enforced and `id` defaults to `null`.
///
/// # Errors
///
/// Returns [`DecodeError`] with a `BAD_REQUEST` payload when the frame is
/// not an object, fails to parse, or violates Tier 1 field rules.
pub fn decode_request(frame: &str) -> Result<Request, DecodeError> {
    let trimmed = frame.trim();
    if !trimmed.starts_with('{') {
        return Err(DecodeError::anonymous(DomainError::bad_request(
            "Request must be a JSON object",
        )));
    }
    let root: Value = serde_json::from_str(trimmed).map_err(|_| {
        DecodeError::anonymous(DomainError::bad_request("Request is not valid JSON"))
    })?;
    let Value::Object(root) = root else {
        return Err(DecodeError::anonymous(DomainError::bad_request(
            "Request must be a JSON object",
        )));
    };
    let id = root.get("id").cloned().unwrap_or(Value::Null);
    let method = match root.get("method") {
        None => {
            return Err(DecodeError {
                error: DomainError::bad_request("Request is missing required field 'method'"),
                id,
            });
        }
        Some(Value::String(method)) => method.clone(),
        Some(_) => {
            return Err(DecodeError {
                error: DomainError::bad_request("Field 'method' must be a string"),
                id,
            });
        }
    };
    let params = match root.get("params") {
        None => {
            return Err(DecodeError {
                error: DomainError::bad_request("Request is missing required field 'params'"),
                id,
            });
        }
        Some(Value::Object(params)) => params.clone(),
        Some(_) => {
            return Err(DecodeError {
                error: DomainError::bad_request("Field 'params' must be an object"),
                id,
            });
        }
    };
    Ok(Request {
        method,
        params,
        id,
    })
}

// ============================================================================
// SECTION: Response Envelope
// ============================================================================

/// JSON-RPC response envelope.
///
/// # Invariants
/// - Exactly one of `result` and `error` is set.
/// - Field order is fixed for diff-friendly logs.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Successful result payload (always an object).
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    /// Echoed request identifier, `null` when not extractable.
    id: Value,
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// JSON-RPC error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Structured error metadata.
    pub data: ErrorData,
}

/// Machine-readable error metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    /// Stable error kind name.
    pub name: &'static str,
}

impl Response {
    /// Builds a success response wrapping the handler's result object.
    #[must_use]
    pub fn success(result: JsonMap, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(Value::Object(result)),
            error: None,
            id,
        }
    }

    /// Builds an error response from a domain error.
    #[must_use]
    pub fn failure(error: DomainError, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(ErrorBody {
                code: error.kind.code(),
                message: error.message,
                data: ErrorData {
                    name: error.kind.name(),
                },
            }),
            id,
        }
    }

    /// Builds the canonical oversize-frame rejection.
    ///
    /// Oversize frames are refused before JSON parsing, so no id is known.
    #[must_use]
    pub fn frame_too_large() -> Self {
        Self::failure(
            DomainError::bad_request(format!(
                "Message too large: frames are limited to {MAX_FRAME_BYTES} bytes including \
                 the terminator"
            )),
            Value::Null,
        )
    }

    /// Returns the error payload when the response is a failure.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    /// Returns the result payload when the response is a success.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns the echoed request identifier.
    #[must_use]
    pub const fn id(&self) -> &Value {
        &self.id
    }

    /// Serializes the response as a single `\n`-terminated line.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when serialization fails.
    pub fn encode_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
