// system-tests/tests/endpoints.rs
// ============================================================================
// Module: Endpoint Suite
// Description: Domain flows over the full client/server stack.
// Purpose: Assert endpoint semantics through the synchronous RPC client.
// ============================================================================

//! ## Overview
//! Drives game flows end to end with the real RPC client: starting runs,
//! blind selection and skipping, playing and discarding, and the shop.
//! Domain refusals must surface as `NOT_ALLOWED`, input-content mistakes as
//! `BAD_REQUEST`, and state mismatches as `INVALID_STATE`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use deckhand_cli::ClientError;
use deckhand_cli::RpcClient;
use serde_json::Value;
use serde_json::json;
use system_tests::harness::TestServer;

/// Unwraps a call expecting a structured API error.
fn expect_api_error(result: Result<Value, ClientError>) -> deckhand_cli::ApiError {
    match result {
        Err(ClientError::Api(api)) => api,
        Err(other) => panic!("expected api error, got {other}"),
        Ok(value) => panic!("expected api error, got result {value}"),
    }
}

/// Starts a run and returns a client parked at BLIND_SELECT.
fn started_client(server: &TestServer) -> RpcClient {
    let mut client = server.client();
    let snapshot = client
        .call("start", json!({"deck": "RED", "stake": 1, "seed": "SUITE"}))
        .expect("start run");
    assert_eq!(snapshot["state"], "BLIND_SELECT");
    client
}

/// Verifies gamestate reports the menu before any run.
#[test]
fn gamestate_reports_menu_initially() {
    let server = TestServer::start();
    let mut client = server.client();
    let snapshot = client.call("gamestate", json!({})).expect("gamestate");
    assert_eq!(snapshot, json!({"state": "MENU"}));
}

/// Verifies start rejects unknown decks with `BAD_REQUEST`.
#[test]
fn start_rejects_unknown_deck() {
    let server = TestServer::start();
    let mut client = server.client();
    let api = expect_api_error(client.call("start", json!({"deck": "CHECKERED"})));
    assert_eq!(api.name, "BAD_REQUEST");
    assert!(api.message.contains("CHECKERED"));
}

/// Verifies start is gated on the menu state.
#[test]
fn start_twice_is_invalid_state() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    let api = expect_api_error(client.call("start", json!({})));
    assert_eq!(api.name, "INVALID_STATE");
    assert!(api.message.contains("Method 'start' requires one of these states: MENU"));
}

/// Verifies select deals a hand and enters SELECTING_HAND.
#[test]
fn select_deals_a_hand() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    let snapshot = client.call("select", json!({})).expect("select blind");
    assert_eq!(snapshot["state"], "SELECTING_HAND");
    assert_eq!(snapshot["hand"].as_array().map(Vec::len), Some(8));
    assert_eq!(snapshot["hands_left"], 4);
    assert_eq!(snapshot["discards_left"], 3);
}

/// Verifies skipping walks small and big blinds but never the boss.
#[test]
fn skip_stops_at_the_boss_blind() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    let snapshot = client.call("skip", json!({})).expect("skip small");
    assert_eq!(snapshot["blinds"]["small"]["status"], "SKIPPED");
    assert_eq!(snapshot["blinds"]["big"]["status"], "SELECT");
    let snapshot = client.call("skip", json!({})).expect("skip big");
    assert_eq!(snapshot["blinds"]["boss"]["status"], "SELECT");
    let api = expect_api_error(client.call("skip", json!({})));
    assert_eq!(api.name, "NOT_ALLOWED");
    assert_eq!(api.code, -32003);
    assert!(api.message.contains("Cannot skip Boss blind"));
}

/// Verifies playing zero cards is rejected by the handler layer.
#[test]
fn play_zero_cards_is_rejected() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    client.call("select", json!({})).expect("select blind");
    let api = expect_api_error(client.call("play", json!({"cards": []})));
    assert_eq!(api.name, "BAD_REQUEST");
    assert!(api.message.contains("Must provide at least one card to play"));
}

/// Verifies playing more than five cards is rejected.
#[test]
fn play_six_cards_is_rejected() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    client.call("select", json!({})).expect("select blind");
    let api = expect_api_error(client.call("play", json!({"cards": [0, 1, 2, 3, 4, 5]})));
    assert_eq!(api.name, "BAD_REQUEST");
    assert!(api.message.contains("only play 5"));
}

/// Verifies out-of-range card indices are rejected naming the index.
#[test]
fn play_out_of_range_index_is_rejected() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    client.call("select", json!({})).expect("select blind");
    let api = expect_api_error(client.call("play", json!({"cards": [999]})));
    assert_eq!(api.name, "BAD_REQUEST");
    assert!(api.message.contains("Invalid card index: 999"));
}

/// Verifies discards are consumed and then refused.
#[test]
fn discards_run_out() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    client.call("select", json!({})).expect("select blind");
    for remaining in (0..3_i64).rev() {
        let snapshot = client.call("discard", json!({"cards": [0]})).expect("discard");
        assert_eq!(snapshot["discards_left"], json!(remaining));
    }
    let api = expect_api_error(client.call("discard", json!({"cards": [0]})));
    assert_eq!(api.name, "NOT_ALLOWED");
    assert!(api.message.contains("No discards left"));
}

/// Drives a started client to the shop; full-size plays always clear the
/// ante-one small blind.
fn shop_client(server: &TestServer) -> RpcClient {
    let mut client = started_client(server);
    let mut snapshot = client.call("select", json!({})).expect("select blind");
    while snapshot["state"] == "SELECTING_HAND" {
        snapshot = client.call("play", json!({"cards": [0, 1, 2, 3, 4]})).expect("play");
    }
    assert_eq!(snapshot["state"], "ROUND_EVAL");
    let snapshot = client.call("cash_out", json!({})).expect("cash out");
    assert_eq!(snapshot["state"], "SHOP");
    client
}

/// Returns the shop index of the named item.
fn shop_index(client: &mut RpcClient, name: &str) -> usize {
    let snapshot = client.call("gamestate", json!({})).expect("gamestate");
    snapshot["shop"]
        .as_array()
        .expect("shop stock")
        .iter()
        .position(|item| item["name"] == name)
        .expect("item in stock")
}

/// Verifies a full round reaches the shop and purchases spend money.
#[test]
fn winning_a_round_opens_the_shop() {
    let server = TestServer::start();
    let mut client = shop_client(&server);
    let snapshot = client.call("gamestate", json!({})).expect("gamestate");
    let money = snapshot["money"].as_i64().expect("money");
    let shop = snapshot["shop"].as_array().expect("shop stock");
    let cost = shop[0]["cost"].as_i64().expect("cost");
    let snapshot = client.call("buy", json!({"index": 0})).expect("buy");
    assert_eq!(snapshot["money"].as_i64().expect("money"), money - cost);
    let snapshot = client.call("next_round", json!({})).expect("next round");
    assert_eq!(snapshot["state"], "BLIND_SELECT");
}

/// Verifies buying a booster opens it and pack selection returns to the
/// shop with the card kept.
#[test]
fn booster_pack_pick_flow() {
    let server = TestServer::start();
    let mut client = shop_client(&server);
    let index = shop_index(&mut client, "Booster Pack");
    let snapshot = client.call("buy", json!({"index": index})).expect("buy booster");
    assert_eq!(snapshot["state"], "BOOSTER_OPENED");
    assert_eq!(snapshot["pack"]["count"], 3);
    let snapshot = client.call("pack", json!({"card": 0})).expect("pick card");
    assert_eq!(snapshot["state"], "SHOP");
    assert_eq!(snapshot["owned"].as_array().map(Vec::len), Some(1));
}

/// Verifies skipping a pack closes it without keeping a card.
#[test]
fn booster_pack_skip_flow() {
    let server = TestServer::start();
    let mut client = shop_client(&server);
    let index = shop_index(&mut client, "Booster Pack");
    client.call("buy", json!({"index": index})).expect("buy booster");
    let snapshot = client.call("pack", json!({"skip": true})).expect("skip pack");
    assert_eq!(snapshot["state"], "SHOP");
    assert_eq!(snapshot["owned"].as_array().map(Vec::len), Some(0));
    assert!(snapshot.get("pack").is_none());
}

/// Verifies pack argument exclusivity: neither or both of card/skip fail.
#[test]
fn pack_requires_exactly_one_of_card_and_skip() {
    let server = TestServer::start();
    let mut client = shop_client(&server);
    let index = shop_index(&mut client, "Booster Pack");
    client.call("buy", json!({"index": index})).expect("buy booster");
    let api = expect_api_error(client.call("pack", json!({})));
    assert_eq!(api.name, "BAD_REQUEST");
    assert!(api.message.contains("You must provide one of: card, skip"));
    let api = expect_api_error(client.call("pack", json!({"card": 0, "skip": true})));
    assert_eq!(api.name, "BAD_REQUEST");
    assert!(api.message.contains("Cannot provide both card and skip"));
}

/// Verifies pack card indices are range-checked against the open pack.
#[test]
fn pack_pick_out_of_range_is_rejected() {
    let server = TestServer::start();
    let mut client = shop_client(&server);
    let index = shop_index(&mut client, "Booster Pack");
    client.call("buy", json!({"index": index})).expect("buy booster");
    let api = expect_api_error(client.call("pack", json!({"card": 999})));
    assert_eq!(api.name, "BAD_REQUEST");
    assert!(api.message.contains("Card index out of range. Index: 999"));
}

/// Verifies pack is gated on the booster state: calling it from the shop
/// with no pack open is an `INVALID_STATE`.
#[test]
fn pack_without_open_pack_is_invalid_state() {
    let server = TestServer::start();
    let mut client = shop_client(&server);
    let api = expect_api_error(client.call("pack", json!({"card": 0})));
    assert_eq!(api.name, "INVALID_STATE");
    assert!(
        api.message.contains("Method 'pack' requires one of these states: BOOSTER_OPENED")
    );
}

/// Verifies a mega booster stays open for its second selection.
#[test]
fn mega_booster_allows_two_picks() {
    let server = TestServer::start();
    let mut client = shop_client(&server);
    let index = shop_index(&mut client, "Mega Booster Pack");
    client.call("buy", json!({"index": index})).expect("buy mega booster");
    let snapshot = client.call("pack", json!({"card": 0})).expect("first pick");
    assert_eq!(snapshot["state"], "BOOSTER_OPENED");
    assert_eq!(snapshot["pack"]["picks_left"], 1);
    let snapshot = client.call("pack", json!({"card": 0})).expect("second pick");
    assert_eq!(snapshot["state"], "SHOP");
    assert_eq!(snapshot["owned"].as_array().map(Vec::len), Some(2));
}

/// Verifies buying an out-of-range shop index is rejected.
#[test]
fn buy_out_of_range_index_is_rejected() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    let api = expect_api_error(client.call("buy", json!({"index": 99})));
    // BLIND_SELECT is not a shop state, so the gate fires first.
    assert_eq!(api.name, "INVALID_STATE");
    assert!(api.message.contains("Method 'buy' requires one of these states: SHOP"));
}

/// Verifies menu abandons a run from any state.
#[test]
fn menu_resets_from_mid_round() {
    let server = TestServer::start();
    let mut client = started_client(&server);
    client.call("select", json!({})).expect("select blind");
    let snapshot = client.call("menu", json!({})).expect("menu");
    assert_eq!(snapshot, json!({"state": "MENU"}));
}
