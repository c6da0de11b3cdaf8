//! AI 算法模块（极小化极大搜索 + 难度随机化）。

pub mod minimax;

pub use minimax::{best_move, choose_move, AiAgent, AiConfig, AiDecision, AiDifficulty, WIN_SCORE};
