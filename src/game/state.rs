use serde::{Deserialize, Serialize};

use super::board::{Board, Cell, Mark, Outcome};
use crate::ai::AiDifficulty;

/// 对局模式。AI 对局中人类执 X，AI 执 O。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum GameMode {
    Local,
    Ai { difficulty: AiDifficulty },
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Local
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InProgress,
    Completed,
}

/// 从某一方视角看到的对局结果（用于历史记录展示）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameResult {
    Won,
    Lost,
    Draw,
    InProgress,
}

/// 单步落子记录，`move_number` 从 1 开始。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveRecord {
    pub move_number: u32,
    pub position: usize,
    pub mark: Mark,
    #[serde(default)]
    pub by_ai: bool,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MovePlayed {
        move_number: u32,
        position: usize,
        mark: Mark,
        by_ai: bool,
    },
    GameWon {
        winner: Mark,
        line: [usize; 3],
    },
    GameDrawn,
}

impl GameEvent {
    /// 终局事件；对局未结束时返回 `None`。
    pub fn from_outcome(outcome: &Outcome) -> Option<GameEvent> {
        match outcome {
            Outcome::Win { mark, line } => Some(GameEvent::GameWon {
                winner: *mark,
                line: *line,
            }),
            Outcome::Draw => Some(GameEvent::GameDrawn),
            Outcome::InProgress => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEvent::GameWon { .. } | GameEvent::GameDrawn)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkCountImbalance { x: usize, o: usize },
    WinnerCountMismatch { winner: Mark, x: usize, o: usize },
    TurnMismatch { expected: Mark, actual: Mark },
    MoveLogMismatch { move_number: u32, position: usize },
    OutcomeMismatch,
    StatusMismatch { status: GameStatus },
}

/// 单局完整状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub current_turn: Mark,
    #[serde(default)]
    pub mode: GameMode,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<MoveRecord>,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl GameState {
    pub fn new(mode: GameMode) -> Self {
        Self {
            board: Board::empty(),
            current_turn: Mark::X,
            mode,
            status: GameStatus::InProgress,
            moves: Vec::new(),
            outcome: Outcome::InProgress,
            event_log: Vec::new(),
        }
    }

    /// 由存储层的棋盘和当前回合重建状态，胜负与状态从棋盘推导。
    pub fn from_board(board: Board, current_turn: Mark, mode: GameMode) -> Self {
        let outcome = board.evaluate();
        let status = if outcome.is_terminal() {
            GameStatus::Completed
        } else {
            GameStatus::InProgress
        };
        Self {
            board,
            current_turn,
            mode,
            status,
            moves: Vec::new(),
            outcome,
            event_log: Vec::new(),
        }
    }

    pub fn with_moves(mut self, moves: Vec<MoveRecord>) -> Self {
        self.moves = moves;
        self
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Completed
    }

    pub fn winner(&self) -> Option<Mark> {
        self.outcome.winner()
    }

    pub fn winning_line(&self) -> Option<[usize; 3]> {
        match self.outcome {
            Outcome::Win { line, .. } => Some(line),
            _ => None,
        }
    }

    pub fn ai_difficulty(&self) -> Option<AiDifficulty> {
        match self.mode {
            GameMode::Ai { difficulty } => Some(difficulty),
            GameMode::Local => None,
        }
    }

    pub fn is_ai_turn(&self) -> bool {
        matches!(self.mode, GameMode::Ai { .. })
            && !self.is_finished()
            && self.current_turn == Mark::O
    }

    pub fn next_move_number(&self) -> u32 {
        self.moves.len() as u32 + 1
    }

    pub fn result_for(&self, mark: Mark) -> GameResult {
        match self.outcome {
            Outcome::InProgress => GameResult::InProgress,
            Outcome::Draw => GameResult::Draw,
            Outcome::Win { mark: winner, .. } if winner == mark => GameResult::Won,
            Outcome::Win { .. } => GameResult::Lost,
        }
    }

    /// 落子并推进回合。调用方需事先校验合法性（见 `RuleEngine::play_move`）。
    pub fn place_mark(&mut self, position: usize, by_ai: bool) -> Vec<GameEvent> {
        let mark = self.current_turn;
        let move_number = self.next_move_number();
        self.board = self.board.apply_move(position, mark);
        self.moves.push(MoveRecord {
            move_number,
            position,
            mark,
            by_ai,
        });

        let mut events = vec![GameEvent::MovePlayed {
            move_number,
            position,
            mark,
            by_ai,
        }];

        self.outcome = self.board.evaluate();
        if let Some(event) = GameEvent::from_outcome(&self.outcome) {
            // Turn stays with the side that finished the game.
            self.status = GameStatus::Completed;
            events.push(event);
        } else {
            self.current_turn = mark.opponent();
        }

        for event in &events {
            self.record_event(event.clone());
        }
        events
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let (x, o) = self.board.mark_counts();
        if x < o || x > o + 1 {
            return Err(IntegrityError::MarkCountImbalance { x, o });
        }

        let outcome = self.board.evaluate();
        // 胜方必须是最后落子的一方。
        if let Some(winner) = outcome.winner() {
            let last_mover = if x == o { Mark::O } else { Mark::X };
            if winner != last_mover {
                return Err(IntegrityError::WinnerCountMismatch { winner, x, o });
            }
        }
        if outcome != self.outcome {
            return Err(IntegrityError::OutcomeMismatch);
        }
        if outcome.is_terminal() != self.is_finished() {
            return Err(IntegrityError::StatusMismatch {
                status: self.status,
            });
        }

        if !outcome.is_terminal() {
            let expected = if x == o { Mark::X } else { Mark::O };
            if self.current_turn != expected {
                return Err(IntegrityError::TurnMismatch {
                    expected,
                    actual: self.current_turn,
                });
            }
        }

        // An empty log is allowed for states rebuilt from a stored board.
        if !self.moves.is_empty() {
            if self.moves.len() != x + o {
                let last = self.moves.last().map(|m| (m.move_number, m.position));
                let (move_number, position) = last.unwrap_or((0, 0));
                return Err(IntegrityError::MoveLogMismatch {
                    move_number,
                    position,
                });
            }
            for (index, record) in self.moves.iter().enumerate() {
                let in_order = record.move_number as usize == index + 1;
                let on_board = self.board.get(record.position) == Some(Cell::from(record.mark));
                if !in_order || !on_board {
                    return Err(IntegrityError::MoveLogMismatch {
                        move_number: record.move_number,
                        position: record.position,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new(GameMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().expect("test board should parse")
    }

    #[test]
    fn new_game_starts_with_x() {
        let state = GameState::new(GameMode::Local);
        assert_eq!(state.current_turn, Mark::X);
        assert_eq!(state.status, GameStatus::InProgress);
        assert_eq!(state.next_move_number(), 1);
        assert!(state.integrity_check().is_ok());
    }

    #[test]
    fn from_board_derives_winner_and_status() {
        let state = GameState::from_board(board("XXXOO    "), Mark::X, GameMode::Local);
        assert_eq!(state.status, GameStatus::Completed);
        assert_eq!(state.winner(), Some(Mark::X));
        assert_eq!(state.winning_line(), Some([0, 1, 2]));
        assert_eq!(state.result_for(Mark::X), GameResult::Won);
        assert_eq!(state.result_for(Mark::O), GameResult::Lost);
    }

    #[test]
    fn from_board_full_without_line_is_draw() {
        let state = GameState::from_board(board("XOXXOOOXX"), Mark::O, GameMode::Local);
        assert!(state.is_finished());
        assert_eq!(state.outcome, Outcome::Draw);
        assert_eq!(state.result_for(Mark::X), GameResult::Draw);
        assert!(state.winning_line().is_none());
    }

    #[test]
    fn place_mark_records_move_and_passes_turn() {
        let mut state = GameState::new(GameMode::Local);
        let events = state.place_mark(4, false);

        assert_eq!(state.current_turn, Mark::O);
        assert_eq!(state.moves.len(), 1);
        assert_eq!(
            events,
            vec![GameEvent::MovePlayed {
                move_number: 1,
                position: 4,
                mark: Mark::X,
                by_ai: false
            }]
        );
        assert_eq!(state.event_log, events);
        assert!(state.integrity_check().is_ok());
    }

    #[test]
    fn winning_move_keeps_turn_and_completes() {
        let mut state = GameState::from_board(board("XX OO    "), Mark::X, GameMode::Local);
        let events = state.place_mark(2, false);

        assert!(state.is_finished());
        assert_eq!(state.current_turn, Mark::X);
        assert!(events.last().map(GameEvent::is_terminal).unwrap_or(false));
    }

    #[test]
    fn ai_turn_only_in_ai_mode() {
        let mode = GameMode::Ai {
            difficulty: AiDifficulty::Hard,
        };
        let mut state = GameState::new(mode);
        assert!(!state.is_ai_turn());
        state.place_mark(0, false);
        assert!(state.is_ai_turn());
        assert_eq!(state.ai_difficulty(), Some(AiDifficulty::Hard));

        let mut local = GameState::new(GameMode::Local);
        local.place_mark(0, false);
        assert!(!local.is_ai_turn());
    }

    #[test]
    fn integrity_check_rejects_bad_states() {
        let state = GameState::from_board(board("XXX      "), Mark::O, GameMode::Local);
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::MarkCountImbalance { x: 3, o: 0 })
        );

        let state = GameState::from_board(board("XO       "), Mark::O, GameMode::Local);
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::TurnMismatch {
                expected: Mark::X,
                actual: Mark::O
            })
        );

        let mut state = GameState::from_board(board("XO       "), Mark::X, GameMode::Local);
        state.outcome = Outcome::Draw;
        assert_eq!(state.integrity_check(), Err(IntegrityError::OutcomeMismatch));
    }

    #[test]
    fn integrity_check_rejects_moves_after_a_win() {
        let state = GameState::from_board(board("XXXOOO   "), Mark::X, GameMode::Local);
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::WinnerCountMismatch {
                winner: Mark::X,
                x: 3,
                o: 3
            })
        );

        let state = GameState::from_board(board("OOOXX XX "), Mark::O, GameMode::Local);
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::WinnerCountMismatch {
                winner: Mark::O,
                x: 4,
                o: 3
            })
        );

        let x_win = GameState::from_board(board("XXXOO    "), Mark::X, GameMode::Local);
        assert!(x_win.integrity_check().is_ok());
        let o_win = GameState::from_board(board("OOOXX X  "), Mark::O, GameMode::Local);
        assert!(o_win.integrity_check().is_ok());
    }

    #[test]
    fn integrity_check_validates_move_log() {
        let mut state = GameState::new(GameMode::Local);
        state.place_mark(0, false);
        state.place_mark(4, false);
        assert!(state.integrity_check().is_ok());

        state.moves[1].position = 5;
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::MoveLogMismatch {
                move_number: 2,
                position: 5
            })
        );
    }

    #[test]
    fn restored_move_log_must_match_board() {
        let record = |move_number, position, mark| MoveRecord {
            move_number,
            position,
            mark,
            by_ai: false,
        };
        let restored = GameState::from_board(board("X   O    "), Mark::X, GameMode::Local)
            .with_moves(vec![record(1, 0, Mark::X), record(2, 4, Mark::O)]);
        assert!(restored.integrity_check().is_ok());

        let swapped = GameState::from_board(board("X   O    "), Mark::X, GameMode::Local)
            .with_moves(vec![record(1, 4, Mark::X), record(2, 0, Mark::O)]);
        assert_eq!(
            swapped.integrity_check(),
            Err(IntegrityError::MoveLogMismatch {
                move_number: 1,
                position: 4
            })
        );
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = GameState::new(GameMode::Ai {
            difficulty: AiDifficulty::Expert,
        });
        state.place_mark(4, false);

        let json = serde_json::to_string(&state).expect("state should serialize");
        assert!(json.contains(r#""mode":{"type":"AI","difficulty":"EXPERT"}"#));
        let parsed: GameState = serde_json::from_str(&json).expect("state should deserialize");
        assert_eq!(parsed, state);
    }
}
