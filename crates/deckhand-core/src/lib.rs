// crates/deckhand-core/src/lib.rs
// ============================================================================
// Module: Deckhand Core Library
// Description: Public API surface for the Deckhand dispatch core.
// Purpose: Expose protocol types, validation tiers, and the dispatcher.
// Dependencies: crate::{protocol, schema, state, registry, dispatch, session}
// ============================================================================

//! ## Overview
//! Deckhand core implements the transport-independent request pipeline for a
//! line-framed JSON-RPC 2.0 control API: envelope decoding, four ordered
//! validation tiers, an immutable endpoint registry, and deterministic
//! response encoding. It owns no sockets and no domain state; transports and
//! game sessions integrate through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dispatch;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod session;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dispatch::DispatchOutcome;
pub use dispatch::Dispatcher;
pub use protocol::DomainError;
pub use protocol::ErrorKind;
pub use protocol::JsonMap;
pub use protocol::MAX_FRAME_BYTES;
pub use protocol::Request;
pub use protocol::Response;
pub use protocol::decode_request;
pub use registry::Endpoint;
pub use registry::EndpointRegistry;
pub use registry::Handler;
pub use registry::RegistryError;
pub use schema::FieldSpec;
pub use schema::FieldType;
pub use schema::Schema;
pub use session::GameSession;
pub use session::StartRun;
pub use session::StateSource;
pub use state::GameState;
