use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{Board, Mark, Outcome};

/// 终局分值基数：胜局得 `WIN_SCORE - depth`，负局得 `depth - WIN_SCORE`。
pub const WIN_SCORE: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AiDifficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl AiDifficulty {
    /// 放弃最优解、改走随机合法步的概率。
    pub fn substitution_probability(self) -> f64 {
        match self {
            AiDifficulty::Easy => 0.70,
            AiDifficulty::Medium => 0.40,
            AiDifficulty::Hard => 0.15,
            AiDifficulty::Expert => 0.0,
        }
    }

    pub fn all() -> &'static [AiDifficulty] {
        &[
            AiDifficulty::Easy,
            AiDifficulty::Medium,
            AiDifficulty::Hard,
            AiDifficulty::Expert,
        ]
    }
}

impl Default for AiDifficulty {
    fn default() -> Self {
        AiDifficulty::Medium
    }
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            "expert" => Ok(AiDifficulty::Expert),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    pub difficulty: AiDifficulty,
    pub randomness: f64,
    pub engine_mark: Mark,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        Self {
            difficulty,
            randomness: difficulty.substitution_probability(),
            engine_mark: Mark::O,
        }
    }

    pub fn with_randomness(mut self, randomness: f64) -> Self {
        self.randomness = if randomness.is_nan() {
            0.0
        } else {
            randomness.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_engine_mark(mut self, mark: Mark) -> Self {
        self.engine_mark = mark;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<i32>,
    pub randomized: bool,
    pub nodes: u64,
    pub difficulty: AiDifficulty,
}

#[derive(Debug, Default)]
struct SearchStats {
    nodes: u64,
}

/// 持有配置与随机源的 AI 代理。随机源由调用方注入，测试中使用固定种子。
pub struct AiAgent<R: Rng = SmallRng> {
    config: AiConfig,
    rng: R,
}

impl AiAgent<SmallRng> {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> AiAgent<R> {
    pub fn with_rng(config: AiConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn decide_move(&mut self, board: &Board) -> AiDecision {
        let difficulty = self.config.difficulty;
        let moves = board.legal_moves();
        if moves.is_empty() {
            return AiDecision {
                position: None,
                evaluation: None,
                randomized: false,
                nodes: 0,
                difficulty,
            };
        }

        if self.should_randomize() {
            return AiDecision {
                position: moves.choose(&mut self.rng).copied(),
                evaluation: None,
                randomized: true,
                nodes: 0,
                difficulty,
            };
        }

        let mut stats = SearchStats::default();
        let best = search_root(board, self.config.engine_mark, &mut stats);
        AiDecision {
            position: best.map(|(position, _)| position),
            evaluation: best.map(|(_, score)| score),
            randomized: false,
            nodes: stats.nodes,
            difficulty,
        }
    }

    fn should_randomize(&mut self) -> bool {
        if self.config.randomness <= 0.0 {
            return false;
        }
        self.rng.gen::<f64>() < self.config.randomness
    }
}

/// Picks a cell for O. `None` when the board has no empty cell.
pub fn choose_move<R: Rng>(
    board: &Board,
    difficulty: AiDifficulty,
    rng: &mut R,
) -> Option<usize> {
    let moves = board.legal_moves();
    if moves.is_empty() {
        return None;
    }

    let probability = difficulty.substitution_probability();
    if probability > 0.0 && rng.gen::<f64>() < probability {
        return moves.choose(rng).copied();
    }

    best_move(board, Mark::O).map(|(position, _)| position)
}

/// Exhaustive search only. Returns the chosen cell and its exact score.
pub fn best_move(board: &Board, engine_mark: Mark) -> Option<(usize, i32)> {
    let mut stats = SearchStats::default();
    search_root(board, engine_mark, &mut stats)
}

fn search_root(board: &Board, engine_mark: Mark, stats: &mut SearchStats) -> Option<(usize, i32)> {
    let mut best: Option<(usize, i32)> = None;

    for position in board.legal_moves() {
        let child = board.apply_move(position, engine_mark);
        let score = minimax_rec(&child, 0, false, i32::MIN, i32::MAX, engine_mark, stats);

        let improves = match best {
            Some((_, best_score)) => score > best_score,
            None => true,
        };
        if improves {
            best = Some((position, score));
        }
    }

    best
}

fn terminal_score(board: &Board, depth: i32, engine_mark: Mark) -> Option<i32> {
    match board.evaluate() {
        Outcome::Win { mark, .. } if mark == engine_mark => Some(WIN_SCORE - depth),
        Outcome::Win { .. } => Some(depth - WIN_SCORE),
        Outcome::Draw => Some(0),
        Outcome::InProgress => None,
    }
}

fn minimax_rec(
    board: &Board,
    depth: i32,
    maximizing: bool,
    mut alpha: i32,
    mut beta: i32,
    engine_mark: Mark,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    if let Some(score) = terminal_score(board, depth, engine_mark) {
        return score;
    }

    if maximizing {
        let mut value = i32::MIN;
        for position in board.empty_cells() {
            let child = board.apply_move(position, engine_mark);
            let score = minimax_rec(&child, depth + 1, false, alpha, beta, engine_mark, stats);
            value = value.max(score);
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        value
    } else {
        let mut value = i32::MAX;
        for position in board.empty_cells() {
            let child = board.apply_move(position, engine_mark.opponent());
            let score = minimax_rec(&child, depth + 1, true, alpha, beta, engine_mark, stats);
            value = value.min(score);
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        value
    }
}
