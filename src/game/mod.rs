//! 游戏核心逻辑模块（棋盘模型、对局状态、落子规则）。

pub mod board;
pub mod rules;
pub mod state;

pub use board::{
    apply_move,
    evaluate,
    legal_moves,
    opponent,
    Board,
    BoardError,
    Cell,
    Mark,
    Outcome,
    BOARD_SIZE,
    WIN_LINES,
};
pub use rules::{PlayMoveAction, RuleEngine, RuleError, RuleResolution};
pub use state::{
    GameEvent,
    GameMode,
    GameResult,
    GameState,
    GameStatus,
    IntegrityError,
    MoveRecord,
};
