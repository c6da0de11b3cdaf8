use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 棋盘格子数量（3×3，行优先）。
pub const BOARD_SIZE: usize = 9;

/// 8 条获胜线，固定顺序：三行（上→下）、三列（左→右）、主对角线、副对角线。
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 玩家标记。X 先手，O 为 AI 的默认标记。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Mark {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Mark::X),
            "O" | "o" => Ok(Mark::O),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Cell {
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }

    fn as_char(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardError {
    InvalidLength { length: usize },
    InvalidCell { index: usize, value: String },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidLength { length } => {
                write!(f, "board must have {BOARD_SIZE} cells, got {length}")
            }
            BoardError::InvalidCell { index, value } => {
                write!(f, "invalid cell value {value:?} at index {index}")
            }
        }
    }
}

impl std::error::Error for BoardError {}

/// 局面评估结果。获胜时附带获胜线的三个下标。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    InProgress,
    Win { mark: Mark, line: [usize; 3] },
    Draw,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    pub fn winner(&self) -> Option<Mark> {
        match self {
            Outcome::Win { mark, .. } => Some(*mark),
            _ => None,
        }
    }
}

/// 3×3 棋盘，值语义：所有变换都返回新棋盘。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: &[Cell]) -> Result<Self, BoardError> {
        let cells: [Cell; BOARD_SIZE] = cells
            .try_into()
            .map_err(|_| BoardError::InvalidLength {
                length: cells.len(),
            })?;
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn is_cell_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Returns `(x_count, o_count)`.
    pub fn mark_counts(&self) -> (usize, usize) {
        self.cells
            .iter()
            .fold((0, 0), |(x, o), cell| match cell {
                Cell::X => (x + 1, o),
                Cell::O => (x, o + 1),
                Cell::Empty => (x, o),
            })
    }

    pub fn apply_move(&self, index: usize, mark: Mark) -> Board {
        apply_move(self, index, mark)
    }

    pub fn legal_moves(&self) -> Vec<usize> {
        legal_moves(self)
    }

    pub fn evaluate(&self) -> Outcome {
        evaluate(self)
    }

    /// 9 个字符，`X`/`O`/空格，与存储层的棋盘字符串格式一致。
    pub fn to_compact_string(&self) -> String {
        self.cells.iter().map(|cell| cell.as_char()).collect()
    }
}

impl TryFrom<Vec<Cell>> for Board {
    type Error = BoardError;

    fn try_from(cells: Vec<Cell>) -> Result<Self, Self::Error> {
        Board::from_cells(&cells)
    }
}

impl From<Board> for Vec<Cell> {
    fn from(board: Board) -> Self {
        board.cells.to_vec()
    }
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != BOARD_SIZE {
            return Err(BoardError::InvalidLength {
                length: chars.len(),
            });
        }

        let mut cells = [Cell::Empty; BOARD_SIZE];
        for (index, ch) in chars.into_iter().enumerate() {
            cells[index] = match ch {
                ' ' => Cell::Empty,
                'X' => Cell::X,
                'O' => Cell::O,
                other => {
                    return Err(BoardError::InvalidCell {
                        index,
                        value: other.to_string(),
                    })
                }
            };
        }
        Ok(Board { cells })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            let line: Vec<String> = (0..3)
                .map(|col| match self.cells[row * 3 + col] {
                    Cell::Empty => ".".to_string(),
                    cell => cell.as_char().to_string(),
                })
                .collect();
            write!(f, "{}", line.join(" "))?;
            if row < 2 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Out-of-range or occupied targets leave the board unchanged.
pub fn apply_move(board: &Board, index: usize, mark: Mark) -> Board {
    if !board.is_cell_empty(index) {
        return *board;
    }
    let mut next = *board;
    next.cells[index] = Cell::from(mark);
    next
}

pub fn legal_moves(board: &Board) -> Vec<usize> {
    board.empty_cells().collect()
}

pub fn evaluate(board: &Board) -> Outcome {
    for line in WIN_LINES {
        let [a, b, c] = line;
        if let Some(mark) = board.cells[a].mark() {
            if board.cells[a] == board.cells[b] && board.cells[a] == board.cells[c] {
                return Outcome::Win { mark, line };
            }
        }
    }

    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

pub fn opponent(mark: Mark) -> Mark {
    mark.opponent()
}
