// crates/deckhand-core/src/dispatch.rs
// ============================================================================
// Module: Deckhand Dispatcher
// Description: Transport-independent four-tier request pipeline.
// Purpose: Turn one accepted frame into exactly one response envelope.
// Dependencies: crate::{protocol, registry, session}
// ============================================================================

//! ## Overview
//! The dispatcher runs the ordered validation tiers over a decoded frame:
//! protocol structure, parameter schema, state gate, then handler execution.
//! The earliest tier that detects a violation produces the response; later
//! tiers never run. Handler faults are caught and surfaced as
//! `INTERNAL_ERROR`, so no request can take down the transport loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;

use crate::protocol::DomainError;
use crate::protocol::JsonMap;
use crate::protocol::Request;
use crate::protocol::Response;
use crate::protocol::decode_request;
use crate::registry::Endpoint;
use crate::registry::EndpointRegistry;
use crate::session::StateSource;

// ============================================================================
// SECTION: Dispatch Outcome
// ============================================================================

/// Result of dispatching one frame, with metadata for observability.
///
/// # Invariants
/// - `method` is `Some` exactly when Tier 1 extracted a method name, even if
///   a later tier rejected the request.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Response envelope to write back to the peer.
    pub response: Response,
    /// Method name when one was extractable from the frame.
    pub method: Option<String>,
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Request dispatcher orchestrating the four validation tiers.
///
/// # Invariants
/// - Exactly one [`Response`] is produced per accepted frame.
/// - The state accessor is re-read on every request, never cached.
pub struct Dispatcher {
    /// Immutable endpoint registry.
    registry: EndpointRegistry,
    /// Live state accessor supplied by the game session.
    state: Arc<dyn StateSource>,
}

impl Dispatcher {
    /// Creates a dispatcher over a registry and state accessor.
    #[must_use]
    pub fn new(registry: EndpointRegistry, state: Arc<dyn StateSource>) -> Self {
        Self {
            registry,
            state,
        }
    }

    /// Returns the endpoint registry.
    #[must_use]
    pub const fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Runs the full pipeline over one accepted frame.
    ///
    /// The frame must already be size-checked by the transport; oversize
    /// rejection happens before this point.
    #[must_use]
    pub fn dispatch_frame(&self, frame: &str) -> Response {
        self.dispatch(frame).response
    }

    /// Runs the pipeline and reports observability metadata alongside the
    /// response.
    #[must_use]
    pub fn dispatch(&self, frame: &str) -> DispatchOutcome {
        let request = match decode_request(frame) {
            Ok(request) => request,
            Err(decode) => {
                return DispatchOutcome {
                    response: Response::failure(decode.error, decode.id),
                    method: None,
                };
            }
        };
        let method = request.method.clone();
        DispatchOutcome {
            response: self.dispatch_request(&request),
            method: Some(method),
        }
    }

    /// Runs tiers after protocol validation over a decoded request.
    fn dispatch_request(&self, request: &Request) -> Response {
        let Some(endpoint) = self.registry.get(&request.method) else {
            return Response::failure(
                DomainError::bad_request(format!("Unknown method '{}'", request.method)),
                request.id.clone(),
            );
        };
        if let Err(error) = endpoint.schema.validate(&request.params) {
            return Response::failure(error, request.id.clone());
        }
        if let Err(error) = self.check_state(endpoint) {
            return Response::failure(error, request.id.clone());
        }
        match execute(endpoint, &request.params) {
            Ok(result) => Response::success(result, request.id.clone()),
            Err(error) => Response::failure(error, request.id.clone()),
        }
    }

    /// Tier 3: verifies the current state is allowed for the endpoint.
    fn check_state(&self, endpoint: &Endpoint) -> Result<(), DomainError> {
        if endpoint.required_states.is_empty() {
            return Ok(());
        }
        let current = self.state.current_state();
        if endpoint.required_states.contains(&current) {
            return Ok(());
        }
        let allowed = endpoint
            .required_states
            .iter()
            .map(|state| state.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(DomainError::invalid_state(format!(
            "Method '{}' requires one of these states: {allowed}",
            endpoint.name
        )))
    }
}

// ============================================================================
// SECTION: Handler Execution
// ============================================================================

/// Tier 4: invokes the handler, converting panics to `INTERNAL_ERROR`.
fn execute(endpoint: &Endpoint, params: &JsonMap) -> Result<JsonMap, DomainError> {
    let handler = Arc::clone(&endpoint.handler);
    catch_unwind(AssertUnwindSafe(|| handler.call(params)))
        .unwrap_or_else(|payload| Err(DomainError::internal(panic_message(&payload))))
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
