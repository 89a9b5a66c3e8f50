// crates/deckhand-core/src/session.rs
// ============================================================================
// Module: Deckhand Session Interfaces
// Description: Collaborator contracts between the dispatch core and the game.
// Purpose: Keep the dispatcher free of domain state via explicit interfaces.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The dispatch core owns no game state. The embedding process supplies an
//! implementation of [`GameSession`]; the state gate consumes the narrower
//! [`StateSource`] view and re-reads the state on every request. Session
//! operations return snapshot objects on success and [`DomainError`] values
//! for policy and input-content refusals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::protocol::DomainError;
use crate::protocol::JsonMap;
use crate::state::GameState;

// ============================================================================
// SECTION: State Access
// ============================================================================

/// Read access to the session's current state tag.
///
/// # Invariants
/// - `current_state` reflects the live state at call time; the dispatcher
///   never caches the result across requests.
pub trait StateSource: Send + Sync {
    /// Returns the current application-state tag.
    fn current_state(&self) -> GameState;
}

// ============================================================================
// SECTION: Session Operations
// ============================================================================

/// Parameters for starting a run.
#[derive(Debug, Clone, Default)]
pub struct StartRun {
    /// Deck name, session default when absent.
    pub deck: Option<String>,
    /// Stake level, session default when absent.
    pub stake: Option<u32>,
    /// Seed string, random when absent.
    pub seed: Option<String>,
}

/// Typed operations the endpoint handlers require from the game.
///
/// Implementations mutate their own state; the dispatcher only observes the
/// returned snapshots. Methods return `BAD_REQUEST` for input-content
/// violations (out-of-range index, empty selection) and `NOT_ALLOWED` for
/// policy refusals (unaffordable purchase, unskippable blind).
pub trait GameSession: StateSource {
    /// Returns the externally visible session snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the snapshot cannot be produced.
    fn snapshot(&self) -> Result<JsonMap, DomainError>;

    /// Abandons any run in progress and returns to the menu.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the transition fails.
    fn go_to_menu(&self) -> Result<JsonMap, DomainError>;

    /// Starts a new run from the menu.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the request names an unknown deck or
    /// stake.
    fn start_run(&self, request: &StartRun) -> Result<JsonMap, DomainError>;

    /// Plays the cards at the given hand indices.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the selection is empty, too large, or
    /// out of range.
    fn play_cards(&self, cards: &[usize]) -> Result<JsonMap, DomainError>;

    /// Discards the cards at the given hand indices.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the selection is invalid or no discards
    /// remain.
    fn discard_cards(&self, cards: &[usize]) -> Result<JsonMap, DomainError>;

    /// Accepts the offered blind and deals a hand.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when no blind is offered.
    fn select_blind(&self) -> Result<JsonMap, DomainError>;

    /// Skips the offered blind.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the offered blind may not be skipped.
    fn skip_blind(&self) -> Result<JsonMap, DomainError>;

    /// Buys the shop item at the given index.
    ///
    /// Buying a booster pack opens it for selection instead of adding it to
    /// the owned items.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the index is out of range or the item is
    /// unaffordable.
    fn buy_item(&self, index: usize) -> Result<JsonMap, DomainError>;

    /// Takes the card at the given index from the open booster pack.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the index is out of range for the pack.
    fn pick_pack_card(&self, index: usize) -> Result<JsonMap, DomainError>;

    /// Closes the open booster pack without taking a card.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the pack cannot be closed.
    fn skip_pack(&self) -> Result<JsonMap, DomainError>;

    /// Rerolls the shop stock.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the reroll is unaffordable.
    fn reroll_shop(&self) -> Result<JsonMap, DomainError>;

    /// Banks round winnings and enters the shop.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the transition fails.
    fn cash_out(&self) -> Result<JsonMap, DomainError>;

    /// Leaves the shop and advances to the next blind selection.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] when the transition fails.
    fn next_round(&self) -> Result<JsonMap, DomainError>;
}
