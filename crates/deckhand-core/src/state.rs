// crates/deckhand-core/src/state.rs
// ============================================================================
// Module: Deckhand Game States
// Description: Enumerated application-state tags for the game session.
// Purpose: Provide stable, ordered state tags for gating and snapshots.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the closed set of application-state tags reported by
//! the game session. The dispatch core treats them as opaque labels; only
//! the state gate compares them. The wire form is the screaming-snake label.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: State Tags
// ============================================================================

/// Application-state tag reported by the game session.
///
/// # Invariants
/// - Variant order is stable; allowed-state listings rely on it.
/// - Wire labels are stable for peers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    /// Main menu, no run in progress.
    Menu,
    /// Choosing whether to play or skip the offered blind.
    BlindSelect,
    /// Playing a round: cards may be played or discarded.
    SelectingHand,
    /// Shop between rounds.
    Shop,
    /// Round finished, winnings not yet banked.
    RoundEval,
    /// A booster pack is open and awaiting a pick.
    BoosterOpened,
    /// Run lost; only a return to the menu is possible.
    GameOver,
}

impl GameState {
    /// Returns the stable wire label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "MENU",
            Self::BlindSelect => "BLIND_SELECT",
            Self::SelectingHand => "SELECTING_HAND",
            Self::Shop => "SHOP",
            Self::RoundEval => "ROUND_EVAL",
            Self::BoosterOpened => "BOOSTER_OPENED",
            Self::GameOver => "GAME_OVER",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
