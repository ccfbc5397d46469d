//! Position codec round trips over reachable states.

use hostage_chess::{Action, Color, Game, GameState, STARTING_STATE, decode, encode};

fn reach(notations: &[&str]) -> Game {
    let actions: Vec<Action> = notations.iter().map(|n| n.parse().unwrap()).collect();
    Game::replay(GameState::new(), &actions).unwrap()
}

fn assert_roundtrip(state: &GameState) {
    let text = encode(state);
    let decoded = decode(&text).unwrap_or_else(|e| panic!("{text} failed to decode: {e}"));
    assert_eq!(&decoded, state, "{text}");
}

#[test]
fn test_initial_state_roundtrip() {
    assert_eq!(encode(&GameState::new()), STARTING_STATE);
    assert_roundtrip(&GameState::new());
}

#[test]
fn test_hostage_pools_roundtrip() {
    let game = reach(&["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5e5"]);
    assert_eq!(game.state().ledger().hostages(Color::White).len(), 1);
    assert_eq!(game.state().ledger().hostages(Color::Black).len(), 1);
    assert_roundtrip(game.state());
}

#[test]
fn test_reserve_pools_roundtrip() {
    // Both sides capture a pawn, then white trades its hostage back.
    let game = reach(&["e2e4", "d7d5", "e4d5", "d8d5", "x0:0"]);
    let ledger = game.state().ledger();
    assert_eq!(ledger.reserves(Color::White).len(), 1);
    assert_eq!(ledger.reserves(Color::Black).len(), 1);
    assert_roundtrip(game.state());
}

#[test]
fn test_en_passant_and_clocks_roundtrip() {
    let game = reach(&["e2e4", "a7a6", "e4e5", "d7d5"]);
    let text = encode(game.state());
    assert!(text.contains(" d6 "), "{text}");
    assert_roundtrip(game.state());
}

#[test]
fn test_decoded_state_resumes_play() {
    let game = reach(&["e2e4", "d7d5", "e4d5"]);
    let resumed = Game::from_state(decode(&encode(game.state())).unwrap()).unwrap();
    assert_eq!(resumed.side_to_move(), Color::Black);
    assert_eq!(resumed.legal_actions(), game.legal_actions());
}

#[test]
fn test_state_serializes_to_json() {
    let game = reach(&["e2e4", "d7d5", "e4d5"]);
    let json = serde_json::to_string(game.state()).unwrap();
    let back: GameState = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, game.state());
}

#[test]
fn test_state_with_short_board_fails_to_deserialize() {
    let mut value = serde_json::to_value(GameState::new()).unwrap();
    value["position"]["board"]["squares"] = serde_json::json!([null]);
    let result: Result<GameState, _> = serde_json::from_value(value);
    assert!(result.is_err());
}
