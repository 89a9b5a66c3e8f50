// crates/deckhand-server/src/endpoints.rs
// ============================================================================
// Module: Deckhand Endpoints
// Description: Endpoint registrations over the game session interface.
// Purpose: Declare schemas, state requirements, and thin handler wrappers.
// Dependencies: deckhand-core, serde_json
// ============================================================================

//! ## Overview
//! Every endpoint is a thin wrapper over [`GameSession`]: the schema and
//! state requirements are declared at registration, the handler converts
//! validated params into typed session calls, and the session's snapshot is
//! returned verbatim. Range and domain checks live here or in the session,
//! never in the schema validator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use deckhand_core::DomainError;
use deckhand_core::Endpoint;
use deckhand_core::EndpointRegistry;
use deckhand_core::FieldSpec;
use deckhand_core::FieldType;
use deckhand_core::GameSession;
use deckhand_core::GameState;
use deckhand_core::JsonMap;
use deckhand_core::RegistryError;
use deckhand_core::Schema;
use deckhand_core::StartRun;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Registry Construction
// ============================================================================

/// Builds the full endpoint registry over a game session.
///
/// # Errors
///
/// Returns [`RegistryError`] when endpoint names collide.
pub fn build_registry(game: &Arc<dyn GameSession>) -> Result<EndpointRegistry, RegistryError> {
    EndpointRegistry::new(vec![
        health(),
        gamestate(game),
        menu(game),
        start(game),
        play(game),
        discard(game),
        select(game),
        skip(game),
        buy(game),
        pack(game),
        reroll(game),
        cash_out(game),
        next_round(game),
    ])
}

/// `health`: liveness probe, state-independent.
fn health() -> Endpoint {
    Endpoint::new(
        "health",
        Schema::empty(),
        Arc::new(|_: &JsonMap| -> Result<JsonMap, DomainError> {
            let mut result = JsonMap::new();
            result.insert("status".to_string(), json!("ok"));
            Ok(result)
        }),
    )
}

/// `gamestate`: full session snapshot, state-independent.
fn gamestate(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "gamestate",
        Schema::empty(),
        Arc::new(move |_: &JsonMap| game.snapshot()),
    )
    .reads_state()
}

/// `menu`: abandon any run and return to the menu, state-independent.
fn menu(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "menu",
        Schema::empty(),
        Arc::new(move |_: &JsonMap| game.go_to_menu()),
    )
    .mutates_state()
}

/// `start`: begin a run from the menu.
fn start(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "start",
        Schema::new(vec![
            FieldSpec::optional("deck", FieldType::String),
            FieldSpec::optional("stake", FieldType::Integer),
            FieldSpec::optional("seed", FieldType::String),
        ]),
        Arc::new(move |params: &JsonMap| {
            let stake = params
                .get("stake")
                .and_then(Value::as_i64)
                .map(|value| {
                    u32::try_from(value)
                        .map_err(|_| DomainError::bad_request(format!("Invalid stake: {value}")))
                })
                .transpose()?;
            let request = StartRun {
                deck: string_param(params, "deck"),
                stake,
                seed: string_param(params, "seed"),
            };
            game.start_run(&request)
        }),
    )
    .with_states([GameState::Menu])
    .mutates_state()
}

/// `play`: play cards from the dealt hand.
fn play(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "play",
        cards_schema(),
        Arc::new(move |params: &JsonMap| game.play_cards(&cards_param(params)?)),
    )
    .with_states([GameState::SelectingHand])
    .mutates_state()
}

/// `discard`: discard cards from the dealt hand.
fn discard(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "discard",
        cards_schema(),
        Arc::new(move |params: &JsonMap| game.discard_cards(&cards_param(params)?)),
    )
    .with_states([GameState::SelectingHand])
    .mutates_state()
}

/// `select`: accept the offered blind.
fn select(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "select",
        Schema::empty(),
        Arc::new(move |_: &JsonMap| game.select_blind()),
    )
    .with_states([GameState::BlindSelect])
    .mutates_state()
}

/// `skip`: skip the offered blind.
fn skip(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "skip",
        Schema::empty(),
        Arc::new(move |_: &JsonMap| game.skip_blind()),
    )
    .with_states([GameState::BlindSelect])
    .mutates_state()
}

/// `buy`: purchase the shop item at an index.
fn buy(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "buy",
        Schema::new(vec![FieldSpec::required("index", FieldType::Integer)]),
        Arc::new(move |params: &JsonMap| {
            let index = params.get("index").and_then(Value::as_i64).unwrap_or_default();
            let index = usize::try_from(index)
                .map_err(|_| DomainError::bad_request(format!("Invalid shop index: {index}")))?;
            game.buy_item(index)
        }),
    )
    .with_states([GameState::Shop])
    .mutates_state()
}

/// `pack`: pick from or skip the open booster pack.
///
/// Exactly one of `card` and `skip` must be provided; the exclusivity is a
/// content rule, so it lives here rather than in the schema.
fn pack(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "pack",
        Schema::new(vec![
            FieldSpec::optional("card", FieldType::Integer),
            FieldSpec::optional("skip", FieldType::Boolean),
        ]),
        Arc::new(move |params: &JsonMap| {
            if params.contains_key("card") && params.contains_key("skip") {
                return Err(DomainError::bad_request(
                    "Invalid arguments. Cannot provide both card and skip",
                ));
            }
            if let Some(card) = params.get("card").and_then(Value::as_i64) {
                let card = usize::try_from(card).map_err(|_| {
                    DomainError::bad_request(format!("Invalid card index: {card}"))
                })?;
                return game.pick_pack_card(card);
            }
            if params.get("skip").and_then(Value::as_bool) == Some(true) {
                return game.skip_pack();
            }
            Err(DomainError::bad_request(
                "Invalid arguments. You must provide one of: card, skip",
            ))
        }),
    )
    .with_states([GameState::BoosterOpened])
    .mutates_state()
}

/// `reroll`: reroll the shop stock.
fn reroll(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "reroll",
        Schema::empty(),
        Arc::new(move |_: &JsonMap| game.reroll_shop()),
    )
    .with_states([GameState::Shop])
    .mutates_state()
}

/// `cash_out`: bank winnings and enter the shop.
fn cash_out(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "cash_out",
        Schema::empty(),
        Arc::new(move |_: &JsonMap| game.cash_out()),
    )
    .with_states([GameState::RoundEval])
    .mutates_state()
}

/// `next_round`: leave the shop for the next blind selection.
fn next_round(game: &Arc<dyn GameSession>) -> Endpoint {
    let game = Arc::clone(game);
    Endpoint::new(
        "next_round",
        Schema::empty(),
        Arc::new(move |_: &JsonMap| game.next_round()),
    )
    .with_states([GameState::Shop])
    .mutates_state()
}

// ============================================================================
// SECTION: Parameter Helpers
// ============================================================================

/// Declares the shared `cards` schema for play and discard.
fn cards_schema() -> Schema {
    Schema::new(vec![
        FieldSpec::required("cards", FieldType::Array).with_items(FieldType::Integer),
    ])
}

/// Reads an optional string parameter.
fn string_param(params: &JsonMap, name: &str) -> Option<String> {
    params.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Converts the validated `cards` array into hand indices.
fn cards_param(params: &JsonMap) -> Result<Vec<usize>, DomainError> {
    let cards = params.get("cards").and_then(Value::as_array).cloned().unwrap_or_default();
    cards
        .iter()
        .map(|value| {
            let index = value.as_i64().unwrap_or_default();
            usize::try_from(index)
                .map_err(|_| DomainError::bad_request(format!("Invalid card index: {index}")))
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
