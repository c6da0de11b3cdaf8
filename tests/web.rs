//! 浏览器环境下的 wasm 接口测试（`wasm-pack test --headless --firefox`）。

#![cfg(target_arch = "wasm32")]

use serde_wasm_bindgen::{from_value, to_value};
use ttt_core::{
    check_winner, compute_ai_move, create_game_state, string_to_board, AiDecision, Board,
    GameEngine, GameState, Mark, Outcome,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn js_board(s: &str) -> JsValue {
    let board: Board = s.parse().expect("test board should parse");
    to_value(&board).expect("board should convert")
}

#[wasm_bindgen_test]
fn check_winner_reports_draw() {
    let outcome: Outcome =
        from_value(check_winner(js_board("XOXXOOOXX")).expect("checkWinner should succeed"))
            .expect("outcome should convert");
    assert_eq!(outcome, Outcome::Draw);
}

#[wasm_bindgen_test]
fn compute_ai_move_takes_immediate_win() {
    let decision: AiDecision = from_value(
        compute_ai_move(js_board("OO XX    "), Some("expert".into()), Some(1))
            .expect("computeAiMove should succeed"),
    )
    .expect("decision should convert");
    assert_eq!(decision.position, Some(2));
}

#[wasm_bindgen_test]
fn compute_ai_move_on_full_board_has_no_position() {
    let decision: AiDecision = from_value(
        compute_ai_move(js_board("XOXXOOOXX"), None, Some(1))
            .expect("computeAiMove should succeed"),
    )
    .expect("decision should convert");
    assert!(decision.position.is_none());
}

#[wasm_bindgen_test]
fn create_game_state_from_storage_string() {
    let state: GameState = from_value(
        create_game_state("XXXOO    ", "X").expect("createGameState should succeed"),
    )
    .expect("state should convert");
    assert!(state.is_finished());
    assert_eq!(state.winner(), Some(Mark::X));
}

#[wasm_bindgen_test]
fn string_to_board_rejects_bad_length() {
    assert!(string_to_board("XO").is_err());
}

#[wasm_bindgen_test]
fn occupied_cell_is_rejected_by_engine() {
    let mut engine = GameEngine::new(None, None).expect("engine should construct");
    engine.play_move(0).expect("first move should succeed");
    assert!(engine.play_move(0).is_err());
}

#[wasm_bindgen_test]
fn human_move_on_ai_turn_is_rejected_by_engine() {
    let mut engine = GameEngine::new(None, Some("expert".into())).expect("engine should construct");
    engine.play_move(0).expect("human move should succeed");
    assert!(engine.play_move(1).is_err());
    assert_eq!(engine.board_string(), "X        ");
}

#[wasm_bindgen_test]
async fn think_ai_resolves_without_applying() {
    let mut engine = GameEngine::new(None, Some("expert".into())).expect("engine should construct");
    engine.play_move(0).expect("human move should succeed");

    let value = JsFuture::from(engine.think_ai(None, Some(10), Some(3)))
        .await
        .expect("think_ai should resolve");
    let json = value.as_string().expect("think_ai resolves to a JSON string");
    assert!(json.contains("\"position\":4"));
    assert_eq!(engine.board_string(), "X        ");
}
