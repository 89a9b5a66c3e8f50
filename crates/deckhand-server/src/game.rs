// crates/deckhand-server/src/game.rs
// ============================================================================
// Module: Deckhand In-Memory Game
// Description: Deterministic in-memory game session for tests and demos.
// Purpose: Provide a GameSession implementation without external processes.
// Dependencies: deckhand-core, serde_json
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`GameSession`] for tests and local demos. It models the minimum the
//! endpoints need: state transitions, money, blinds, a dealt hand, and a
//! shop. Dealing is driven by a seedable linear congruential generator so
//! runs are reproducible. It is not intended to be a faithful game.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use deckhand_core::DomainError;
use deckhand_core::GameSession;
use deckhand_core::GameState;
use deckhand_core::JsonMap;
use deckhand_core::StartRun;
use deckhand_core::StateSource;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Known deck names accepted by `start`.
const DECKS: &[&str] = &["RED", "BLUE", "YELLOW", "BLACK"];
/// Highest accepted stake level.
const MAX_STAKE: u32 = 8;
/// Cards dealt into the hand.
const HAND_SIZE: usize = 8;
/// Largest selection accepted by play and discard.
const MAX_SELECTION: usize = 5;
/// Hands available per round.
const HANDS_PER_ROUND: u32 = 4;
/// Discards available per round.
const DISCARDS_PER_ROUND: u32 = 3;
/// Ante at which defeating the boss wins the run.
const FINAL_ANTE: u32 = 8;
/// Starting money for a new run.
const STARTING_MONEY: i64 = 4;
/// Base chip requirement for the small blind, scaled by ante.
///
/// Low enough that four full-size plays always clear it at ante one, so
/// the shop is reachable on every deal.
const SMALL_BLIND_BASE: i64 = 150;
/// Base chip requirement for the big blind, scaled by ante.
const BIG_BLIND_BASE: i64 = 300;
/// Base chip requirement for the boss blind, scaled by ante.
const BOSS_BLIND_BASE: i64 = 450;
/// Shop stock presented after each round: name, cost, and pack picks.
///
/// Entries with a non-zero pick count are booster packs; buying one opens
/// it instead of adding it to the owned items.
const SHOP_STOCK: &[(&str, i64, u32)] = &[
    ("Joker", 4, 0),
    ("Planet", 3, 0),
    ("Tarot", 3, 0),
    ("Booster Pack", 4, 1),
    ("Mega Booster Pack", 6, 2),
];
/// Initial cost of a shop reroll.
const BASE_REROLL_COST: i64 = 5;
/// Card rank labels in deal order.
const RANKS: &[&str] =
    &["2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A"];
/// Card suit labels in deal order.
const SUITS: &[&str] = &["S", "H", "D", "C"];

// ============================================================================
// SECTION: Blind Model
// ============================================================================

/// Lifecycle of one blind within an ante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlindStatus {
    /// Not yet offered.
    Upcoming,
    /// Currently offered.
    Select,
    /// Skipped by the player.
    Skipped,
    /// Defeated by the player.
    Defeated,
}

impl BlindStatus {
    /// Returns the stable wire label for the status.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::Select => "SELECT",
            Self::Skipped => "SKIPPED",
            Self::Defeated => "DEFEATED",
        }
    }
}

/// Position of a blind within an ante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlindKind {
    /// Small blind, first offer.
    Small,
    /// Big blind, second offer.
    Big,
    /// Boss blind, final offer; never skippable.
    Boss,
}

impl BlindKind {
    /// Returns the chip requirement base for the blind.
    const fn chip_base(self) -> i64 {
        match self {
            Self::Small => SMALL_BLIND_BASE,
            Self::Big => BIG_BLIND_BASE,
            Self::Boss => BOSS_BLIND_BASE,
        }
    }
}

/// Blind statuses for the current ante.
#[derive(Debug, Clone, Copy)]
struct Blinds {
    /// Small blind status.
    small: BlindStatus,
    /// Big blind status.
    big: BlindStatus,
    /// Boss blind status.
    boss: BlindStatus,
}

impl Blinds {
    /// Returns a fresh ante with the small blind offered.
    const fn fresh() -> Self {
        Self {
            small: BlindStatus::Select,
            big: BlindStatus::Upcoming,
            boss: BlindStatus::Upcoming,
        }
    }

    /// Returns the currently offered blind, when any.
    const fn offered(&self) -> Option<BlindKind> {
        match (self.small, self.big, self.boss) {
            (BlindStatus::Select, _, _) => Some(BlindKind::Small),
            (_, BlindStatus::Select, _) => Some(BlindKind::Big),
            (_, _, BlindStatus::Select) => Some(BlindKind::Boss),
            _ => None,
        }
    }

    /// Resolves the offered blind and offers the next one.
    fn resolve(&mut self, outcome: BlindStatus) {
        match self.offered() {
            Some(BlindKind::Small) => {
                self.small = outcome;
                self.big = BlindStatus::Select;
            }
            Some(BlindKind::Big) => {
                self.big = outcome;
                self.boss = BlindStatus::Select;
            }
            Some(BlindKind::Boss) => self.boss = outcome,
            None => {}
        }
    }

    /// Serializes the blind statuses.
    fn snapshot(&self) -> Value {
        json!({
            "small": {"status": self.small.as_str()},
            "big": {"status": self.big.as_str()},
            "boss": {"status": self.boss.as_str()},
        })
    }
}

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Shop stock entry.
#[derive(Debug, Clone)]
struct ShopItem {
    /// Item display name.
    name: String,
    /// Purchase cost.
    cost: i64,
    /// Selections granted when the item is a booster pack; zero otherwise.
    pack_picks: u32,
}

/// Open booster pack awaiting selections.
#[derive(Debug, Clone)]
struct PackState {
    /// Cards offered by the pack.
    cards: Vec<String>,
    /// Selections remaining before the pack closes.
    picks_left: u32,
}

/// Mutable session state behind the mutex.
#[derive(Debug)]
struct GameInner {
    /// Current application-state tag.
    state: GameState,
    /// Deal generator state.
    rng: u64,
    /// Active deck name.
    deck: String,
    /// Active stake level.
    stake: u32,
    /// Current money.
    money: i64,
    /// Current ante number.
    ante: u32,
    /// Rounds completed this run.
    round: u32,
    /// Chips scored against the current blind.
    chips: i64,
    /// Chip requirement of the current blind.
    blind_target: i64,
    /// Hands remaining this round.
    hands_left: u32,
    /// Discards remaining this round.
    discards_left: u32,
    /// Dealt hand, indexed from zero.
    hand: Vec<String>,
    /// Blind statuses for the current ante.
    blinds: Blinds,
    /// Current shop stock.
    shop: Vec<ShopItem>,
    /// Open booster pack, when one is being resolved.
    pack: Option<PackState>,
    /// Cost of the next reroll.
    reroll_cost: i64,
    /// Items bought this run.
    owned: Vec<String>,
    /// Whether the run has been won.
    won: bool,
}

impl GameInner {
    /// Returns a session parked at the menu.
    fn menu() -> Self {
        Self {
            state: GameState::Menu,
            rng: 0x5DEE_CE66_D00D_CAFE,
            deck: DECKS[0].to_string(),
            stake: 1,
            money: 0,
            ante: 0,
            round: 0,
            chips: 0,
            blind_target: 0,
            hands_left: 0,
            discards_left: 0,
            hand: Vec::new(),
            blinds: Blinds::fresh(),
            shop: Vec::new(),
            pack: None,
            reroll_cost: BASE_REROLL_COST,
            owned: Vec::new(),
            won: false,
        }
    }

    /// Advances the deal generator and returns the next raw value.
    fn next_raw(&mut self) -> u64 {
        self.rng = self
            .rng
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.rng >> 33
    }

    /// Deals one card label.
    fn deal_card(&mut self) -> String {
        let raw = self.next_raw();
        let rank = RANKS[usize::try_from(raw % 13).unwrap_or(0)];
        let suit = SUITS[usize::try_from((raw / 13) % 4).unwrap_or(0)];
        format!("{rank}{suit}")
    }

    /// Returns the chip value scored by a card label.
    fn card_chips(card: &str) -> i64 {
        let rank = card.get(..card.len().saturating_sub(1)).unwrap_or_default();
        match rank {
            "A" => 11,
            "J" | "Q" | "K" | "10" => 10,
            _ => rank.parse::<i64>().unwrap_or(0),
        }
    }

    /// Restocks the shop with the base stock.
    fn restock(&mut self) {
        self.shop = SHOP_STOCK
            .iter()
            .map(|(name, cost, pack_picks)| ShopItem {
                name: (*name).to_string(),
                cost: *cost,
                pack_picks: *pack_picks,
            })
            .collect();
    }

    /// Validates a play/discard selection and returns the sorted indices.
    fn checked_selection(&self, cards: &[usize], verb: &str) -> Result<Vec<usize>, DomainError> {
        if cards.is_empty() {
            return Err(DomainError::bad_request(format!(
                "Must provide at least one card to {verb}"
            )));
        }
        if cards.len() > MAX_SELECTION {
            return Err(DomainError::bad_request(format!(
                "You can only {verb} {MAX_SELECTION} cards"
            )));
        }
        let mut seen = Vec::with_capacity(cards.len());
        for &index in cards {
            if index >= self.hand.len() {
                return Err(DomainError::bad_request(format!("Invalid card index: {index}")));
            }
            if seen.contains(&index) {
                return Err(DomainError::bad_request(format!("Duplicate card index: {index}")));
            }
            seen.push(index);
        }
        seen.sort_unstable();
        Ok(seen)
    }

    /// Removes the selected cards and deals replacements.
    fn replace_cards(&mut self, sorted: &[usize]) {
        for &index in sorted.iter().rev() {
            self.hand.remove(index);
        }
        while self.hand.len() < HAND_SIZE {
            let card = self.deal_card();
            self.hand.push(card);
        }
    }

    /// Serializes the externally visible session state.
    fn snapshot(&self) -> JsonMap {
        let mut map = JsonMap::new();
        map.insert("state".to_string(), json!(self.state.as_str()));
        if self.state == GameState::Menu {
            return map;
        }
        map.insert("deck".to_string(), json!(self.deck));
        map.insert("stake".to_string(), json!(self.stake));
        map.insert("money".to_string(), json!(self.money));
        map.insert("ante".to_string(), json!(self.ante));
        map.insert("round".to_string(), json!(self.round));
        map.insert("won".to_string(), json!(self.won));
        map.insert("blinds".to_string(), self.blinds.snapshot());
        map.insert("owned".to_string(), json!(self.owned));
        if self.state == GameState::SelectingHand {
            map.insert("hand".to_string(), json!(self.hand));
            map.insert("hands_left".to_string(), json!(self.hands_left));
            map.insert("discards_left".to_string(), json!(self.discards_left));
            map.insert("chips".to_string(), json!(self.chips));
            map.insert("blind_target".to_string(), json!(self.blind_target));
        }
        if self.state == GameState::Shop {
            let stock: Vec<Value> = self
                .shop
                .iter()
                .map(|item| json!({"name": item.name, "cost": item.cost}))
                .collect();
            map.insert("shop".to_string(), json!(stock));
            map.insert("reroll_cost".to_string(), json!(self.reroll_cost));
        }
        if let Some(pack) = &self.pack {
            map.insert(
                "pack".to_string(),
                json!({
                    "cards": pack.cards,
                    "count": pack.cards.len(),
                    "picks_left": pack.picks_left,
                }),
            );
        }
        map
    }
}

// ============================================================================
// SECTION: In-Memory Game
// ============================================================================

/// In-memory game session for tests and demos.
pub struct InMemoryGame {
    /// Session state protected by a mutex.
    inner: Mutex<GameInner>,
}

impl InMemoryGame {
    /// Creates a session parked at the menu.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GameInner::menu()),
        }
    }

    /// Locks the inner state, mapping poisoning to an internal error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, GameInner>, DomainError> {
        self.inner
            .lock()
            .map_err(|_| DomainError::internal("game session mutex poisoned"))
    }
}

impl Default for InMemoryGame {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSource for InMemoryGame {
    fn current_state(&self) -> GameState {
        self.inner.lock().map_or(GameState::Menu, |inner| inner.state)
    }
}

impl GameSession for InMemoryGame {
    fn snapshot(&self) -> Result<JsonMap, DomainError> {
        Ok(self.lock()?.snapshot())
    }

    fn go_to_menu(&self) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        *inner = GameInner::menu();
        Ok(inner.snapshot())
    }

    fn start_run(&self, request: &StartRun) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        let deck = request.deck.clone().unwrap_or_else(|| DECKS[0].to_string());
        if !DECKS.contains(&deck.as_str()) {
            return Err(DomainError::bad_request(format!("Unknown deck '{deck}'")));
        }
        let stake = request.stake.unwrap_or(1);
        if stake == 0 || stake > MAX_STAKE {
            return Err(DomainError::bad_request(format!(
                "Invalid stake: {stake} (must be 1 to {MAX_STAKE})"
            )));
        }
        let mut fresh = GameInner::menu();
        if let Some(seed) = &request.seed {
            fresh.rng = seed.bytes().fold(fresh.rng, |acc, byte| {
                acc.rotate_left(8) ^ u64::from(byte)
            });
        }
        fresh.state = GameState::BlindSelect;
        fresh.deck = deck;
        fresh.stake = stake;
        fresh.money = STARTING_MONEY;
        fresh.ante = 1;
        *inner = fresh;
        Ok(inner.snapshot())
    }

    fn play_cards(&self, cards: &[usize]) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        let sorted = inner.checked_selection(cards, "play")?;
        let base: i64 = sorted
            .iter()
            .map(|&index| GameInner::card_chips(&inner.hand[index]))
            .sum();
        // Chips times cards played, a stand-in for hand multipliers.
        let count = i64::try_from(sorted.len()).unwrap_or(1);
        inner.chips += base * count;
        inner.hands_left = inner.hands_left.saturating_sub(1);
        if inner.chips >= inner.blind_target {
            let boss_beaten = inner.blinds.offered() == Some(BlindKind::Boss);
            inner.blinds.resolve(BlindStatus::Defeated);
            if boss_beaten && inner.ante >= FINAL_ANTE {
                inner.won = true;
            }
            inner.round += 1;
            inner.hand.clear();
            inner.state = GameState::RoundEval;
        } else if inner.hands_left == 0 {
            inner.hand.clear();
            inner.state = GameState::GameOver;
        } else {
            inner.replace_cards(&sorted);
        }
        Ok(inner.snapshot())
    }

    fn discard_cards(&self, cards: &[usize]) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        let sorted = inner.checked_selection(cards, "discard")?;
        if inner.discards_left == 0 {
            return Err(DomainError::not_allowed("No discards left"));
        }
        inner.discards_left -= 1;
        inner.replace_cards(&sorted);
        Ok(inner.snapshot())
    }

    fn select_blind(&self) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        let Some(blind) = inner.blinds.offered() else {
            return Err(DomainError::internal("no blind offered in BLIND_SELECT"));
        };
        inner.blind_target = blind.chip_base() * i64::from(inner.ante);
        inner.chips = 0;
        inner.hands_left = HANDS_PER_ROUND;
        inner.discards_left = DISCARDS_PER_ROUND;
        inner.hand.clear();
        for _ in 0..HAND_SIZE {
            let card = inner.deal_card();
            inner.hand.push(card);
        }
        inner.state = GameState::SelectingHand;
        Ok(inner.snapshot())
    }

    fn skip_blind(&self) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        match inner.blinds.offered() {
            Some(BlindKind::Boss) => Err(DomainError::not_allowed("Cannot skip Boss blind")),
            Some(_) => {
                inner.blinds.resolve(BlindStatus::Skipped);
                Ok(inner.snapshot())
            }
            None => Err(DomainError::internal("no blind offered in BLIND_SELECT")),
        }
    }

    fn buy_item(&self, index: usize) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        if index >= inner.shop.len() {
            return Err(DomainError::bad_request(format!("Invalid shop index: {index}")));
        }
        let cost = inner.shop[index].cost;
        if cost > inner.money {
            let name = inner.shop[index].name.clone();
            return Err(DomainError::not_allowed(format!("Cannot afford {name}")));
        }
        let item = inner.shop.remove(index);
        inner.money -= cost;
        if item.pack_picks > 0 {
            // A bought booster opens immediately instead of joining the
            // owned items.
            let count = usize::try_from(item.pack_picks).unwrap_or(1) * 2 + 1;
            let mut cards = Vec::with_capacity(count);
            for _ in 0..count {
                let card = inner.deal_card();
                cards.push(card);
            }
            inner.pack = Some(PackState {
                cards,
                picks_left: item.pack_picks,
            });
            inner.state = GameState::BoosterOpened;
        } else {
            inner.owned.push(item.name);
        }
        Ok(inner.snapshot())
    }

    fn pick_pack_card(&self, index: usize) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        let (card, closed) = {
            let Some(pack) = inner.pack.as_mut() else {
                return Err(DomainError::internal("no pack open in BOOSTER_OPENED"));
            };
            if index >= pack.cards.len() {
                let count = pack.cards.len();
                return Err(DomainError::bad_request(format!(
                    "Card index out of range. Index: {index}, Available cards: {count}"
                )));
            }
            let card = pack.cards.remove(index);
            pack.picks_left = pack.picks_left.saturating_sub(1);
            (card, pack.picks_left == 0 || pack.cards.is_empty())
        };
        inner.owned.push(card);
        if closed {
            inner.pack = None;
            inner.state = GameState::Shop;
        }
        Ok(inner.snapshot())
    }

    fn skip_pack(&self) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        inner.pack = None;
        inner.state = GameState::Shop;
        Ok(inner.snapshot())
    }

    fn reroll_shop(&self) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        if inner.reroll_cost > inner.money {
            return Err(DomainError::not_allowed("Cannot afford reroll"));
        }
        inner.money -= inner.reroll_cost;
        inner.reroll_cost += 1;
        inner.restock();
        Ok(inner.snapshot())
    }

    fn cash_out(&self) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        inner.money += 5 + i64::from(inner.hands_left);
        inner.restock();
        inner.reroll_cost = BASE_REROLL_COST;
        inner.state = GameState::Shop;
        Ok(inner.snapshot())
    }

    fn next_round(&self) -> Result<JsonMap, DomainError> {
        let mut inner = self.lock()?;
        if inner.blinds.offered().is_none() {
            inner.ante += 1;
            inner.blinds = Blinds::fresh();
        }
        inner.state = GameState::BlindSelect;
        Ok(inner.snapshot())
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

    use deckhand_core::ErrorKind;
    use deckhand_core::GameSession;
    use deckhand_core::GameState;
    use deckhand_core::StartRun;
    use deckhand_core::StateSource;
    use serde_json::json;

    use super::InMemoryGame;

    fn started_game() -> InMemoryGame {
        let game = InMemoryGame::new();
        game.start_run(&StartRun::default()).expect("start run");
        game
    }

    #[test]
    fn starts_at_the_menu() {
        let game = InMemoryGame::new();
        assert_eq!(game.current_state(), GameState::Menu);
        let snapshot = game.snapshot().expect("snapshot");
        assert_eq!(snapshot["state"], json!("MENU"));
    }

    #[test]
    fn start_run_offers_the_small_blind() {
        let game = started_game();
        assert_eq!(game.current_state(), GameState::BlindSelect);
        let snapshot = game.snapshot().expect("snapshot");
        assert_eq!(snapshot["blinds"]["small"]["status"], json!("SELECT"));
        assert_eq!(snapshot["money"], json!(4));
    }

    #[test]
    fn start_run_rejects_unknown_deck() {
        let game = InMemoryGame::new();
        let error = game
            .start_run(&StartRun {
                deck: Some("CHECKERED".to_string()),
                ..StartRun::default()
            })
            .expect_err("unknown deck");
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert!(error.message.contains("CHECKERED"));
    }

    #[test]
    fn select_deals_a_full_hand() {
        let game = started_game();
        let snapshot = game.select_blind().expect("select");
        assert_eq!(snapshot["state"], json!("SELECTING_HAND"));
        assert_eq!(snapshot["hand"].as_array().map(Vec::len), Some(8));
        assert_eq!(snapshot["hands_left"], json!(4));
    }

    #[test]
    fn seeded_runs_deal_identically() {
        let seed = StartRun {
            seed: Some("EXAMPLE".to_string()),
            ..StartRun::default()
        };
        let first = InMemoryGame::new();
        first.start_run(&seed).expect("start");
        let second = InMemoryGame::new();
        second.start_run(&seed).expect("start");
        let hand_a = first.select_blind().expect("select")["hand"].clone();
        let hand_b = second.select_blind().expect("select")["hand"].clone();
        assert_eq!(hand_a, hand_b);
    }

    #[test]
    fn play_rejects_empty_and_oversized_selections() {
        let game = started_game();
        game.select_blind().expect("select");
        let empty = game.play_cards(&[]).expect_err("empty selection");
        assert!(empty.message.contains("at least one card"));
        let oversized =
            game.play_cards(&[0, 1, 2, 3, 4, 5]).expect_err("oversized selection");
        assert!(oversized.message.contains("only play 5"));
    }

    #[test]
    fn play_rejects_out_of_range_index() {
        let game = started_game();
        game.select_blind().expect("select");
        let error = game.play_cards(&[999]).expect_err("out of range");
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert!(error.message.contains("Invalid card index: 999"));
    }

    #[test]
    fn skip_advances_to_the_big_blind() {
        let game = started_game();
        let snapshot = game.skip_blind().expect("skip small");
        assert_eq!(snapshot["blinds"]["small"]["status"], json!("SKIPPED"));
        assert_eq!(snapshot["blinds"]["big"]["status"], json!("SELECT"));
    }

    #[test]
    fn boss_blind_cannot_be_skipped() {
        let game = started_game();
        game.skip_blind().expect("skip small");
        game.skip_blind().expect("skip big");
        let error = game.skip_blind().expect_err("skip boss");
        assert_eq!(error.kind, ErrorKind::NotAllowed);
        assert!(error.message.contains("Cannot skip Boss blind"));
    }

    #[test]
    fn discards_are_limited() {
        let game = started_game();
        game.select_blind().expect("select");
        for _ in 0..3 {
            game.discard_cards(&[0]).expect("discard");
        }
        let error = game.discard_cards(&[0]).expect_err("no discards left");
        assert_eq!(error.kind, ErrorKind::NotAllowed);
    }

    /// Drives a fresh game to the shop; full-size plays always clear the
    /// ante-one small blind.
    fn shop_game() -> InMemoryGame {
        let game = started_game();
        let mut snapshot = game.select_blind().expect("select");
        while snapshot["state"] == json!("SELECTING_HAND") {
            snapshot = game.play_cards(&[0, 1, 2, 3, 4]).expect("play");
        }
        assert_eq!(snapshot["state"], json!("ROUND_EVAL"));
        game.cash_out().expect("cash out");
        game
    }

    /// Returns the shop index of the named item.
    fn shop_index(game: &InMemoryGame, name: &str) -> usize {
        let snapshot = game.snapshot().expect("snapshot");
        snapshot["shop"]
            .as_array()
            .expect("shop stock")
            .iter()
            .position(|item| item["name"] == json!(name))
            .expect("item in stock")
    }

    #[test]
    fn shop_purchases_spend_money() {
        let game = shop_game();
        let snapshot = game.snapshot().expect("snapshot");
        let money = snapshot["money"].as_i64().expect("money");
        let bought = game.buy_item(0).expect("buy");
        assert_eq!(bought["money"].as_i64().expect("money"), money - 4);
        assert_eq!(bought["owned"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn buying_a_booster_opens_a_pack() {
        let game = shop_game();
        let index = shop_index(&game, "Booster Pack");
        let snapshot = game.buy_item(index).expect("buy booster");
        assert_eq!(snapshot["state"], json!("BOOSTER_OPENED"));
        assert_eq!(snapshot["pack"]["count"], json!(3));
        assert_eq!(snapshot["pack"]["picks_left"], json!(1));
        assert_eq!(game.current_state(), GameState::BoosterOpened);
    }

    #[test]
    fn picking_a_pack_card_closes_the_pack() {
        let game = shop_game();
        let index = shop_index(&game, "Booster Pack");
        game.buy_item(index).expect("buy booster");
        let snapshot = game.pick_pack_card(0).expect("pick");
        assert_eq!(snapshot["state"], json!("SHOP"));
        assert_eq!(snapshot["owned"].as_array().map(Vec::len), Some(1));
        assert!(snapshot.get("pack").is_none());
    }

    #[test]
    fn pack_pick_out_of_range_names_index_and_count() {
        let game = shop_game();
        let index = shop_index(&game, "Booster Pack");
        game.buy_item(index).expect("buy booster");
        let error = game.pick_pack_card(999).expect_err("out of range");
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert_eq!(
            error.message,
            "Card index out of range. Index: 999, Available cards: 3"
        );
    }

    #[test]
    fn skipping_a_pack_returns_to_the_shop() {
        let game = shop_game();
        let index = shop_index(&game, "Booster Pack");
        game.buy_item(index).expect("buy booster");
        let snapshot = game.skip_pack().expect("skip pack");
        assert_eq!(snapshot["state"], json!("SHOP"));
        assert!(snapshot.get("pack").is_none());
        assert_eq!(snapshot["owned"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn mega_booster_allows_two_picks() {
        let game = shop_game();
        let index = shop_index(&game, "Mega Booster Pack");
        game.buy_item(index).expect("buy mega booster");
        let snapshot = game.pick_pack_card(0).expect("first pick");
        assert_eq!(snapshot["state"], json!("BOOSTER_OPENED"));
        assert_eq!(snapshot["pack"]["picks_left"], json!(1));
        let snapshot = game.pick_pack_card(0).expect("second pick");
        assert_eq!(snapshot["state"], json!("SHOP"));
        assert_eq!(snapshot["owned"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn buy_rejects_out_of_range_index() {
        let game = started_game();
        let error = game.buy_item(99).expect_err("bad index");
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert!(error.message.contains("99"));
    }

    #[test]
    fn menu_resets_the_session() {
        let game = started_game();
        let snapshot = game.go_to_menu().expect("menu");
        assert_eq!(snapshot["state"], json!("MENU"));
        assert_eq!(game.current_state(), GameState::Menu);
    }
}
