//! Connect four on a 6x7 board. Red is the computer and maximizes; Yellow
//! is the human player.
//!
//! Terminal positions score `±10` for a four-in-a-row and `0` for a full
//! board. Other positions use a heuristic on the first three-in-a-row found:
//! `-0.5` for Yellow, `0.5` for Red, or `-0.25` for a Red run whose both ends
//! are blocked by Yellow or the board edge.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_tree::{alpha_beta_decide_limit, GameState};

pub const ROWS: usize = 6;
pub const COLUMNS: usize = 7;

/// Search depth the computer player uses.
pub const CPU_SEARCH_DEPTH: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Disc {
    #[default]
    Empty,
    Red,
    Yellow,
}

/// Row 0 is the top; discs settle toward row 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ConnectFour {
    pub board: [[Disc; COLUMNS]; ROWS],
}

/// Direction steps `(d_row, d_col)`, scanned in this order.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

impl ConnectFour {
    pub fn new() -> Self {
        Self::default()
    }

    fn at(&self, row: isize, col: isize) -> Option<Disc> {
        if (0..ROWS as isize).contains(&row) && (0..COLUMNS as isize).contains(&col) {
            Some(self.board[row as usize][col as usize])
        } else {
            None
        }
    }

    /// Color of a run of `len` equal discs starting at `(row, col)`.
    fn run(&self, row: isize, col: isize, (dr, dc): (isize, isize), len: isize) -> Option<Disc> {
        let first = self.at(row, col)?;
        if first == Disc::Empty {
            return None;
        }
        (1..len)
            .all(|i| self.at(row + dr * i, col + dc * i) == Some(first))
            .then_some(first)
    }

    fn runs(&self, len: isize) -> impl Iterator<Item = (isize, isize, (isize, isize), Disc)> + '_ {
        DIRECTIONS.into_iter().flat_map(move |dir| {
            (0..ROWS as isize).flat_map(move |row| {
                (0..COLUMNS as isize).filter_map(move |col| {
                    self.run(row, col, dir, len).map(|disc| (row, col, dir, disc))
                })
            })
        })
    }

    /// `10` if Red has four in a row, `-10` for Yellow, `0` otherwise.
    pub fn four_in_a_row(&self) -> i32 {
        match self.runs(4).next() {
            Some((_, _, _, Disc::Red)) => 10,
            Some((_, _, _, Disc::Yellow)) => -10,
            _ => 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.board.iter().flatten().all(|&d| d != Disc::Empty)
    }

    /// Heuristic for non-terminal positions.
    pub fn heuristic(&self) -> f32 {
        let blocked = |disc: Option<Disc>| matches!(disc, None | Some(Disc::Yellow));
        for (row, col, (dr, dc), disc) in self.runs(3) {
            match disc {
                Disc::Yellow => return -0.5,
                Disc::Red => {
                    let before = self.at(row - dr, col - dc);
                    let after = self.at(row + 3 * dr, col + 3 * dc);
                    return if blocked(before) && blocked(after) {
                        -0.25
                    } else {
                        0.5
                    };
                }
                Disc::Empty => {}
            }
        }
        0.0
    }

    /// Drop a disc of `disc` into `column`. Returns `false` if the column is
    /// full or out of range.
    pub fn drop_disc(&mut self, column: usize, disc: Disc) -> bool {
        if column >= COLUMNS {
            return false;
        }
        for row in (0..ROWS).rev() {
            if self.board[row][column] == Disc::Empty {
                self.board[row][column] = disc;
                return true;
            }
        }
        false
    }

    /// Drop a Yellow disc for the human player.
    pub fn try_player_move(&mut self, column: usize) -> bool {
        self.drop_disc(column, Disc::Yellow)
    }

    /// Let the computer play Red with a depth-limited alpha-beta search.
    /// Returns `false` if no move was possible.
    pub fn cpu_move(&mut self) -> bool {
        self.cpu_move_with_depth(CPU_SEARCH_DEPTH)
    }

    pub fn cpu_move_with_depth(&mut self, depth: u32) -> bool {
        match alpha_beta_decide_limit(self, depth) {
            Some(next) => {
                *self = next;
                true
            }
            None => false,
        }
    }
}

impl GameState for ConnectFour {
    fn possible_moves(&self, max_player: bool) -> Vec<Self> {
        let disc = if max_player { Disc::Red } else { Disc::Yellow };
        (0..COLUMNS)
            .filter_map(|col| {
                let mut next = *self;
                next.drop_disc(col, disc).then_some(next)
            })
            .collect()
    }

    fn is_terminal(&self) -> bool {
        self.is_full() || self.four_in_a_row() != 0
    }

    fn score(&self) -> f32 {
        if self.is_full() {
            return 0.0;
        }
        match self.four_in_a_row() {
            0 => self.heuristic(),
            n => n as f32,
        }
    }
}

impl fmt::Display for ConnectFour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.board {
            for disc in row {
                let ch = match disc {
                    Disc::Empty => '.',
                    Disc::Red => 'R',
                    Disc::Yellow => 'Y',
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[(usize, Disc)]) -> ConnectFour {
        let mut board = ConnectFour::new();
        for &(col, disc) in moves {
            assert!(board.drop_disc(col, disc));
        }
        board
    }

    #[test]
    fn discs_stack_from_the_bottom() {
        let mut board = ConnectFour::new();
        assert!(board.try_player_move(3));
        assert!(board.drop_disc(3, Disc::Red));
        assert_eq!(board.board[5][3], Disc::Yellow);
        assert_eq!(board.board[4][3], Disc::Red);
        for _ in 0..4 {
            assert!(board.try_player_move(3));
        }
        assert!(!board.try_player_move(3), "column full");
        assert!(!board.try_player_move(COLUMNS));
    }

    #[test]
    fn four_in_a_row_scores_ten() {
        let red_row = play(&[(0, Disc::Red), (1, Disc::Red), (2, Disc::Red), (3, Disc::Red)]);
        assert_eq!(red_row.four_in_a_row(), 10);
        assert!(red_row.is_terminal());

        let yellow_col = play(&[(6, Disc::Yellow); 4]);
        assert_eq!(yellow_col.score(), -10.0);

        let diagonal = play(&[
            (0, Disc::Red),
            (1, Disc::Yellow),
            (1, Disc::Red),
            (2, Disc::Yellow),
            (2, Disc::Yellow),
            (2, Disc::Red),
            (3, Disc::Yellow),
            (3, Disc::Yellow),
            (3, Disc::Yellow),
            (3, Disc::Red),
        ]);
        assert_eq!(diagonal.four_in_a_row(), 10);
    }

    #[test]
    fn heuristic_rewards_open_red_threes() {
        let open = play(&[(2, Disc::Red), (3, Disc::Red), (4, Disc::Red)]);
        assert_eq!(open.score(), 0.5);

        let boxed = play(&[
            (0, Disc::Yellow),
            (1, Disc::Red),
            (2, Disc::Red),
            (3, Disc::Red),
            (4, Disc::Yellow),
        ]);
        assert_eq!(boxed.score(), -0.25);

        let edge = play(&[(0, Disc::Red), (1, Disc::Red), (2, Disc::Red), (3, Disc::Yellow)]);
        assert_eq!(edge.score(), -0.25, "board edge counts as blocked");

        let yellow = play(&[(0, Disc::Yellow), (1, Disc::Yellow), (2, Disc::Yellow)]);
        assert_eq!(yellow.score(), -0.5);
    }

    #[test]
    fn cpu_blocks_or_wins() {
        // Red has three on the bottom row; the CPU completes it.
        let mut board = play(&[
            (0, Disc::Red),
            (0, Disc::Yellow),
            (1, Disc::Red),
            (1, Disc::Yellow),
            (2, Disc::Red),
            (2, Disc::Yellow),
        ]);
        assert!(board.cpu_move_with_depth(2));
        assert_eq!(board.four_in_a_row(), 10);
    }

    #[test]
    fn full_board_is_a_draw() {
        let mut board = ConnectFour::new();
        for row in 0..ROWS {
            for col in 0..COLUMNS {
                // Alternate in pairs of columns so no line of four forms.
                let flip = (col / 2 + row) % 2 == 0;
                board.board[row][col] = if flip { Disc::Red } else { Disc::Yellow };
            }
        }
        assert!(board.is_full());
        assert_eq!(board.score(), 0.0);
        assert!(board.is_terminal());
    }
}
