// crates/deckhand-server/src/lib.rs
// ============================================================================
// Module: Deckhand Server
// Description: TCP transport, configuration, and endpoints for Deckhand.
// Purpose: Serve the dispatch core over a line-framed TCP socket.
// Dependencies: deckhand-core, tokio, serde, toml
// ============================================================================

//! ## Overview
//! Deckhand server owns everything the transport-independent core does not:
//! the bounded frame reader, the sequential TCP accept/serve loop, the TOML
//! configuration layer, audit and metrics sinks, the endpoint handlers, and
//! an in-memory game session for tests and demos. Connections are served one
//! at a time and requests within a connection are strictly serialized.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod config;
pub mod endpoints;
pub mod frame;
pub mod game;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::StderrAuditSink;
pub use config::AuditConfig;
pub use config::ConfigError;
pub use config::DeckhandConfig;
pub use config::ServerConfig;
pub use endpoints::build_registry;
pub use game::InMemoryGame;
pub use server::ApiServer;
pub use server::ServerError;
pub use telemetry::NoopMetrics;
pub use telemetry::RequestMetricEvent;
pub use telemetry::RequestOutcome;
pub use telemetry::ServerMetrics;
