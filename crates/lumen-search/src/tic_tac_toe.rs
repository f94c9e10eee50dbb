//! Tic-tac-toe as a [`GameState`]. X moves first and maximizes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_tree::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Square {
    #[default]
    Empty,
    X,
    O,
}

/// A 3x3 board indexed `[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TicTacToe {
    pub board: [[Square; 3]; 3],
}

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(2, 0), (1, 1), (0, 2)],
];

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a board from nine characters (`X`, `O`, anything else empty).
    pub fn from_rows(rows: [&str; 3]) -> Self {
        let mut board = [[Square::Empty; 3]; 3];
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().take(3).enumerate() {
                board[r][c] = match ch {
                    'X' | 'x' => Square::X,
                    'O' | 'o' => Square::O,
                    _ => Square::Empty,
                };
            }
        }
        Self { board }
    }

    /// The owner of a completed line, if any.
    pub fn winner(&self) -> Option<Square> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(r, col)| self.board[r][col]);
            (a != Square::Empty && a == b && b == c).then_some(a)
        })
    }

    pub fn is_full(&self) -> bool {
        self.board.iter().flatten().all(|&s| s != Square::Empty)
    }
}

impl GameState for TicTacToe {
    fn possible_moves(&self, max_player: bool) -> Vec<Self> {
        let mark = if max_player { Square::X } else { Square::O };
        let mut moves = Vec::new();
        for r in 0..3 {
            for c in 0..3 {
                if self.board[r][c] == Square::Empty {
                    let mut next = *self;
                    next.board[r][c] = mark;
                    moves.push(next);
                }
            }
        }
        moves
    }

    fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    /// `1` for an X line, `-1` for an O line, `0` otherwise.
    fn score(&self) -> f32 {
        match self.winner() {
            Some(Square::X) => 1.0,
            Some(Square::O) => -1.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.board {
            for square in row {
                let ch = match square {
                    Square::Empty => '.',
                    Square::X => 'X',
                    Square::O => 'O',
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
