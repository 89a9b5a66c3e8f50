// crates/deckhand-cli/src/lib.rs
// ============================================================================
// Module: Deckhand CLI Library
// Description: Client helpers shared by the CLI binary and system tests.
// Purpose: Expose the synchronous RPC client as a library surface.
// Dependencies: crate::client
// ============================================================================

//! ## Overview
//! The CLI crate hosts the synchronous RPC client used by the `deckhand api`
//! subcommand and by the system-test suites. The binary entry point lives in
//! `main.rs`; everything reusable lives here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ApiError;
pub use client::ClientError;
pub use client::RpcClient;
