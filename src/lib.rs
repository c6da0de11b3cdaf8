pub mod ai;
pub mod game;
mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

use utils::console_log;

pub use ai::{best_move, choose_move, AiAgent, AiConfig, AiDecision, AiDifficulty};
pub use game::{
    apply_move, evaluate, legal_moves, opponent, Board, BoardError, Cell, GameEvent, GameMode,
    GameResult, GameState, GameStatus, IntegrityError, Mark, MoveRecord, Outcome, PlayMoveAction,
    RuleEngine, RuleError, RuleResolution,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_difficulty(value: Option<&str>) -> AiDifficulty {
    value
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or_default()
}

fn parse_mark(value: &str) -> Result<Mark, JsValue> {
    Mark::from_str(value).map_err(|_| JsValue::from_str(&format!("invalid mark {value:?}")))
}

fn make_agent(config: AiConfig, seed: Option<u32>) -> AiAgent {
    match seed {
        Some(seed) => AiAgent::with_seed(config, u64::from(seed)),
        None => AiAgent::new(config),
    }
}

/// AI 为当前行棋方思考一步；非 AI 对局时按给定难度（默认中等）计算。
fn decide_for_state(state: &GameState, difficulty: Option<AiDifficulty>, seed: Option<u32>) -> AiDecision {
    let difficulty = difficulty
        .or_else(|| state.ai_difficulty())
        .unwrap_or_default();
    if state.is_finished() {
        return AiDecision {
            position: None,
            evaluation: None,
            randomized: false,
            nodes: 0,
            difficulty,
        };
    }
    let config = AiConfig::from_difficulty(difficulty).with_engine_mark(state.current_turn);
    make_agent(config, seed).decide_move(&state.board)
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
}

#[wasm_bindgen]
impl GameEngine {
    /// `initial_state_json` 优先；否则按 `ai_difficulty` 创建 AI 对局，缺省为本地双人对局。
    #[wasm_bindgen(constructor)]
    pub fn new(
        initial_state_json: Option<String>,
        ai_difficulty: Option<String>,
    ) -> Result<GameEngine, JsValue> {
        let state = if let Some(json) = initial_state_json {
            let state: GameState = serde_json::from_str(&json).map_err(serde_to_js_error)?;
            state
                .integrity_check()
                .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
            state
        } else if let Some(difficulty) = ai_difficulty {
            GameState::new(GameMode::Ai {
                difficulty: parse_difficulty(Some(&difficulty)),
            })
        } else {
            GameState::new(GameMode::Local)
        };
        Ok(GameEngine { state })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        state
            .integrity_check()
            .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
        self.state = state;
        Ok(())
    }

    pub fn board_string(&self) -> String {
        self.state.board.to_compact_string()
    }

    pub fn play_move(&mut self, position: usize) -> Result<String, JsValue> {
        self.apply_action(PlayMoveAction::at(position))
    }

    pub fn play_move_json(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: PlayMoveAction =
            serde_json::from_str(action_json).map_err(serde_to_js_error)?;
        self.apply_action(action)
    }

    pub fn apply_ai_move(&mut self, seed: Option<u32>) -> Result<String, JsValue> {
        let difficulty = self.state.ai_difficulty().unwrap_or_default();
        let mut agent = make_agent(AiConfig::from_difficulty(difficulty), seed);
        let mut engine = RuleEngine::new();

        let (decision, events) = engine
            .play_ai_move(&mut self.state, &mut agent)
            .map_err(|error| {
                console_log!("ai move rejected: {error}");
                to_js_error(error)
            })?;
        console_log!(
            "ai ({:?}) played {:?}, randomized={}, nodes={}",
            decision.difficulty,
            decision.position,
            decision.randomized,
            decision.nodes
        );

        let response = AiMoveResponse {
            decision,
            applied: Some(RuleResolution::new(self.state.clone(), events)),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 延迟 `delay_ms` 后为当前行棋方计算一步，不修改引擎状态。
    pub fn think_ai(
        &self,
        difficulty: Option<String>,
        delay_ms: Option<u32>,
        seed: Option<u32>,
    ) -> Promise {
        let state = self.state.clone();
        let difficulty = difficulty.and_then(|value| AiDifficulty::from_str(&value).ok());
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = decide_for_state(&state, difficulty, seed);
            let response = AiMoveResponse {
                decision,
                applied: None,
            };
            let json = serde_json::to_string(&response).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    fn apply_action(&mut self, action: PlayMoveAction) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        let events = engine.play_move(&mut self.state, action).map_err(|error| {
            console_log!("move rejected: {error}");
            to_js_error(error)
        })?;
        make_resolution_json(RuleResolution::new(self.state.clone(), events))
    }
}

/// 由存储的棋盘字符串（9 个字符，`X`/`O`/空格）与当前回合重建游戏状态。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state(board: &str, current_turn: &str) -> Result<JsValue, JsValue> {
    let board = Board::from_str(board).map_err(|error| to_js_error(error.into()))?;
    let current_turn = parse_mark(current_turn)?;
    let state = GameState::from_board(board, current_turn, GameMode::Local);
    to_value(&state).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "checkWinner")]
pub fn check_winner(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&evaluate(&board)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "legalMoves")]
pub fn legal_moves_js(board: JsValue) -> Result<Vec<u32>, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    Ok(legal_moves(&board)
        .into_iter()
        .map(|index| index as u32)
        .collect())
}

#[wasm_bindgen(js_name = "boardToString")]
pub fn board_to_string(board: JsValue) -> Result<String, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    Ok(board.to_compact_string())
}

#[wasm_bindgen(js_name = "stringToBoard")]
pub fn string_to_board(value: &str) -> Result<JsValue, JsValue> {
    let board = Board::from_str(value).map_err(|error| to_js_error(error.into()))?;
    to_value(&board).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "playMove")]
pub fn play_move(state: JsValue, action: JsValue) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let action: PlayMoveAction = from_value(action).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.play_move(&mut state, action) {
        Ok(events) => to_value(&RuleResolution::new(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

/// O 方（AI）在给定棋盘上的选点；棋盘已满时结果中不含 `position`。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    board: JsValue,
    difficulty: Option<String>,
    seed: Option<u32>,
) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let difficulty = parse_difficulty(difficulty.as_deref());
    let mut agent = make_agent(AiConfig::from_difficulty(difficulty), seed);
    let decision = agent.decide_move(&board);
    to_value(&decision).map_err(JsValue::from)
}
