// system-tests/src/lib.rs
// ============================================================================
// Module: Deckhand System Tests Library
// Description: Shared harness helpers for system test scenarios.
// Purpose: Boot real servers on ephemeral ports for end-to-end suites.
// Dependencies: deckhand-cli, deckhand-server, tokio
// ============================================================================

//! ## Overview
//! This crate hosts the harness used by the Deckhand system-test binaries in
//! `system-tests/tests`: it boots the real TCP server over the in-memory
//! game session on an ephemeral port and hands out clients bound to it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod harness;
