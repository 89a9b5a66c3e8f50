// crates/deckhand-core/src/registry.rs
// ============================================================================
// Module: Deckhand Endpoint Registry
// Description: Immutable name-keyed registry of endpoint records.
// Purpose: Hold the sole source of truth for schema, states, and handlers.
// Dependencies: crate::{protocol, schema, state}
// ============================================================================

//! ## Overview
//! The registry is built once at process start and is immutable thereafter.
//! Each endpoint record carries its parameter schema, the set of states it
//! may run in, side-effect metadata, and the handler itself. Duplicate
//! registrations are a startup error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::protocol::DomainError;
use crate::protocol::JsonMap;
use crate::schema::Schema;
use crate::state::GameState;

// ============================================================================
// SECTION: Handler Trait
// ============================================================================

/// Domain logic behind one endpoint.
///
/// Handlers receive the schema-validated `params` object and return either a
/// result object or a [`DomainError`]. They are pure with respect to
/// dispatcher data; any mutation happens through the game session.
pub trait Handler: Send + Sync {
    /// Executes the endpoint with validated params.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] for input-content, state, and policy
    /// failures.
    fn call(&self, params: &JsonMap) -> Result<JsonMap, DomainError>;
}

impl<F> Handler for F
where
    F: Fn(&JsonMap) -> Result<JsonMap, DomainError> + Send + Sync,
{
    fn call(&self, params: &JsonMap) -> Result<JsonMap, DomainError> {
        self(params)
    }
}

// ============================================================================
// SECTION: Endpoint Records
// ============================================================================

/// Registered endpoint record.
///
/// # Invariants
/// - `name` is unique within a registry.
/// - `required_states` empty means the endpoint is state-independent.
pub struct Endpoint {
    /// Endpoint name used as the JSON-RPC method.
    pub name: &'static str,
    /// Parameter schema enforced before execution.
    pub schema: Schema,
    /// States in which the endpoint may run; empty passes the gate.
    pub required_states: BTreeSet<GameState>,
    /// Whether the handler reads game state (metadata for future use).
    pub reads_game_state: bool,
    /// Whether the handler mutates game state (metadata for future use).
    pub mutates_game_state: bool,
    /// Handler implementing the endpoint.
    pub handler: Arc<dyn Handler>,
}

impl Endpoint {
    /// Creates a state-independent endpoint with no side-effect flags.
    #[must_use]
    pub fn new(name: &'static str, schema: Schema, handler: Arc<dyn Handler>) -> Self {
        Self {
            name,
            schema,
            required_states: BTreeSet::new(),
            reads_game_state: false,
            mutates_game_state: false,
            handler,
        }
    }

    /// Restricts the endpoint to the given states.
    #[must_use]
    pub fn with_states(mut self, states: impl IntoIterator<Item = GameState>) -> Self {
        self.required_states = states.into_iter().collect();
        self
    }

    /// Marks the endpoint as reading game state.
    #[must_use]
    pub const fn reads_state(mut self) -> Self {
        self.reads_game_state = true;
        self
    }

    /// Marks the endpoint as mutating game state.
    #[must_use]
    pub const fn mutates_state(mut self) -> Self {
        self.reads_game_state = true;
        self.mutates_game_state = true;
        self
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry construction errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two endpoints were registered under the same name.
    #[error("duplicate endpoint name: {0}")]
    DuplicateName(String),
}

/// Immutable name-keyed endpoint registry.
///
/// # Invariants
/// - Contents never change after construction.
pub struct EndpointRegistry {
    /// Endpoint records keyed by name.
    endpoints: BTreeMap<&'static str, Endpoint>,
}

impl EndpointRegistry {
    /// Builds a registry from endpoint records.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] when two records share a
    /// name.
    pub fn new(records: Vec<Endpoint>) -> Result<Self, RegistryError> {
        let mut endpoints = BTreeMap::new();
        for record in records {
            let name = record.name;
            if endpoints.insert(name, record).is_some() {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
        }
        Ok(Self {
            endpoints,
        })
    }

    /// Looks up an endpoint by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Returns the registered endpoint names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.endpoints.keys().copied().collect()
    }

    /// Returns the number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns true when no endpoints are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions."
    )]

    use std::sync::Arc;

    use crate::protocol::JsonMap;
    use crate::schema::Schema;
    use crate::state::GameState;

    use super::Endpoint;
    use super::EndpointRegistry;
    use super::RegistryError;

    fn stub_endpoint(name: &'static str) -> Endpoint {
        Endpoint::new(
            name,
            Schema::empty(),
            Arc::new(|_: &JsonMap| -> Result<JsonMap, crate::protocol::DomainError> {
                Ok(JsonMap::new())
            }),
        )
    }

    #[test]
    fn lookup_finds_registered_endpoints() {
        let registry = EndpointRegistry::new(vec![stub_endpoint("health"), stub_endpoint("play")])
            .expect("registry");
        assert!(registry.get("health").is_some());
        assert!(registry.get("play").is_some());
        assert!(registry.get("nosuch").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_names_fail_construction() {
        let result = EndpointRegistry::new(vec![stub_endpoint("health"), stub_endpoint("health")]);
        match result {
            Err(RegistryError::DuplicateName(name)) => assert_eq!(name, "health"),
            Ok(_) => panic!("duplicate registration must fail"),
        }
    }

    #[test]
    fn state_builder_collects_required_states() {
        let endpoint = stub_endpoint("play")
            .with_states([GameState::SelectingHand])
            .mutates_state();
        assert!(endpoint.required_states.contains(&GameState::SelectingHand));
        assert!(endpoint.reads_game_state);
        assert!(endpoint.mutates_game_state);
    }
}
