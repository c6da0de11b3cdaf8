use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    board::{BoardError, Mark, Outcome, BOARD_SIZE},
    state::{GameEvent, GameState, IntegrityError},
};
use crate::ai::{AiAgent, AiDecision};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayMoveAction {
    pub position: usize,
    #[serde(default)]
    pub mark: Option<Mark>,
}

impl PlayMoveAction {
    pub fn at(position: usize) -> Self {
        Self {
            position,
            mark: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    NotPlayerTurn { expected: Mark, actual: Mark },
    InvalidPosition { position: usize },
    CellOccupied { position: usize },
    NotAiTurn,
    NoMoveAvailable,
    IntegrityViolation { error: IntegrityError },
    InvalidBoard { error: BoardError },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::GameFinished => write!(f, "game is already finished"),
            RuleError::NotPlayerTurn { expected, actual } => {
                write!(f, "not {actual}'s turn, {expected} to move")
            }
            RuleError::InvalidPosition { position } => write!(f, "invalid position {position}"),
            RuleError::CellOccupied { position } => {
                write!(f, "position {position} already occupied")
            }
            RuleError::NotAiTurn => write!(f, "not the AI's turn"),
            RuleError::NoMoveAvailable => write!(f, "no move available"),
            RuleError::IntegrityViolation { error } => write!(f, "integrity violation: {error:?}"),
            RuleError::InvalidBoard { error } => write!(f, "invalid board: {error}"),
        }
    }
}

impl std::error::Error for RuleError {}

impl From<BoardError> for RuleError {
    fn from(error: BoardError) -> Self {
        RuleError::InvalidBoard { error }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub outcome: Outcome,
}

impl RuleResolution {
    pub fn new(state: GameState, mut events: Vec<GameEvent>) -> Self {
        let outcome = state.outcome;
        if let Some(terminal) = GameEvent::from_outcome(&outcome) {
            let has_event = events.iter().any(GameEvent::is_terminal);
            if !has_event {
                events.push(terminal);
            }
        }

        Self {
            state,
            events,
            outcome,
        }
    }
}

#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_in_progress(state: &GameState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn ensure_playable(state: &GameState, position: usize) -> Result<(), RuleError> {
        if position >= BOARD_SIZE {
            return Err(RuleError::InvalidPosition { position });
        }
        if !state.board.is_cell_empty(position) {
            return Err(RuleError::CellOccupied { position });
        }
        Ok(())
    }

    pub fn play_move(
        &mut self,
        state: &mut GameState,
        action: PlayMoveAction,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_in_progress(state)?;
        // AI 对局中 O 只能由 AI 落子。
        if state.is_ai_turn() {
            return Err(RuleError::NotPlayerTurn {
                expected: Mark::X,
                actual: state.current_turn,
            });
        }
        Self::ensure_integrity(state)?;
        Self::ensure_playable(state, action.position)?;

        if let Some(mark) = action.mark {
            if mark != state.current_turn {
                return Err(RuleError::NotPlayerTurn {
                    expected: state.current_turn,
                    actual: mark,
                });
            }
        }

        Ok(state.place_mark(action.position, false))
    }

    /// 由 AI 代理为 O 方选点并落子，仅在 AI 对局且轮到 AI 时有效。
    pub fn play_ai_move<R: Rng>(
        &mut self,
        state: &mut GameState,
        agent: &mut AiAgent<R>,
    ) -> Result<(AiDecision, Vec<GameEvent>), RuleError> {
        Self::ensure_in_progress(state)?;
        if !state.is_ai_turn() {
            return Err(RuleError::NotAiTurn);
        }
        Self::ensure_integrity(state)?;

        let decision = agent.decide_move(&state.board);
        let position = decision.position.ok_or(RuleError::NoMoveAvailable)?;
        Self::ensure_playable(state, position)?;

        let events = state.place_mark(position, true);
        Ok((decision, events))
    }

    pub fn check_outcome(state: &GameState) -> Outcome {
        state.board.evaluate()
    }
}
