//! Tic-tac-toe game logic with move history and time travel.
//!
//! # Board Layout
//!
//! ```text
//! Cell indices (row-major order):
//!   (0,0)=0  (0,1)=1  (0,2)=2
//!   (1,0)=3  (1,1)=4  (1,2)=5
//!   (2,0)=6  (2,1)=7  (2,2)=8
//! ```
//!
//! # Compact Cell Encoding
//!
//! ```text
//! 0 = empty, 1 = X, 2 = O
//! ```
//!
//! Used by the wasm bindings, where a board crosses into JavaScript as a
//! `Uint8Array` of nine cells.
//!
//! A [`Board`] is an immutable snapshot: placing a mark produces a new
//! board. [`GameState`] keeps the ordered list of snapshots plus the step
//! currently displayed, and derives whose turn it is from that step alone.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::trace;

mod history;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use history::{Action, GameState, GameView, HistoryEntry, Status};

/// Errors for values the engine cannot represent.
///
/// Illegal moves are not errors: they leave the game unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// A cell index outside `0..=8`.
    #[display("cell index {index} is outside the board (0-8)")]
    CellOutOfRange { index: usize },
    /// A history step that was never recorded.
    #[display("step {step} is outside the recorded history (length {len})")]
    StepOutOfRange { step: usize, len: usize },
    /// A snapshot sequence that normal play could not have produced.
    #[display("invalid history: {reason}")]
    InvalidHistory { reason: String },
}

/// Player mark.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mark {
    X = 1,
    O = 2,
}

impl Mark {
    /// Get the opposing mark.
    #[inline]
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Convert from u8 (1 or 2) to Mark.
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Mark> {
        match bits {
            1 => Some(Mark::X),
            2 => Some(Mark::O),
            _ => None,
        }
    }

    /// The mark that moves from the board at `step`.
    ///
    /// X moves on even steps, O on odd ones.
    #[inline]
    pub fn for_step(step: usize) -> Mark {
        if step % 2 == 0 {
            Mark::X
        } else {
            Mark::O
        }
    }

    /// Single-character symbol.
    #[inline]
    pub fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Position on the 3x3 board (0-8).
///
/// Layout:
/// ```text
///   0 1 2
///   3 4 5
///   6 7 8
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct Pos(pub u8);

impl Pos {
    /// Create a position from a cell index, rejecting anything off the board.
    pub fn new(index: usize) -> Result<Pos, GameError> {
        if index < 9 {
            Ok(Pos(index as u8))
        } else {
            Err(GameError::CellOutOfRange { index })
        }
    }

    /// Create a position from row and column (0-2 each).
    #[inline]
    pub fn from_row_col(row: u8, col: u8) -> Pos {
        debug_assert!(row < 3 && col < 3);
        Pos(row * 3 + col)
    }

    /// Get the row (0-2).
    #[inline]
    pub fn row(self) -> u8 {
        self.0 / 3
    }

    /// Get the column (0-2).
    #[inline]
    pub fn col(self) -> u8 {
        self.0 % 3
    }

    /// Cell index as usize.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a valid position (0-8).
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 < 9
    }

    /// Iterate over all 9 positions.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..9).map(Pos)
    }
}

impl TryFrom<u8> for Pos {
    type Error = GameError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Pos::new(index as usize)
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed line: the mark that owns it and its three cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize)]
pub struct Win {
    pub mark: Mark,
    pub line: [Pos; 3],
}

impl Win {
    /// Whether `pos` is one of the three winning cells.
    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        self.line.contains(&pos)
    }
}

/// One board snapshot.
///
/// Serializes as a 9-element array of `"X"`, `"O"` or `null`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Board(pub [Option<Mark>; 9]);

impl Board {
    /// The 8 winning lines: 3 rows, 3 columns, 2 diagonals, in scan order.
    pub const WIN_LINES: [[Pos; 3]; 8] = [
        [Pos(0), Pos(1), Pos(2)], // Row 0
        [Pos(3), Pos(4), Pos(5)], // Row 1
        [Pos(6), Pos(7), Pos(8)], // Row 2
        [Pos(0), Pos(3), Pos(6)], // Col 0
        [Pos(1), Pos(4), Pos(7)], // Col 1
        [Pos(2), Pos(5), Pos(8)], // Col 2
        [Pos(0), Pos(4), Pos(8)], // Main diagonal
        [Pos(2), Pos(4), Pos(6)], // Anti-diagonal
    ];

    /// Create an empty board.
    #[inline]
    pub fn new() -> Board {
        Board([None; 9])
    }

    /// Create a board from its nine cells.
    #[inline]
    pub fn from_cells(cells: [Option<Mark>; 9]) -> Board {
        Board(cells)
    }

    /// All nine cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Option<Mark>; 9] {
        &self.0
    }

    /// Get the mark at a position.
    #[inline]
    pub fn get(&self, pos: Pos) -> Option<Mark> {
        self.0[pos.index()]
    }

    /// Check if a cell is empty.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.get(pos).is_none()
    }

    /// A copy of this board with `mark` placed at `pos`.
    ///
    /// Does NOT validate - caller must check the cell is empty.
    #[inline]
    pub fn with_mark(&self, pos: Pos, mark: Mark) -> Board {
        let mut next = *self;
        next.0[pos.index()] = Some(mark);
        next
    }

    /// Number of marks on the board.
    pub fn move_count(&self) -> usize {
        self.0.iter().filter(|cell| cell.is_some()).count()
    }

    /// Check if every cell is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Iterate over the empty positions in ascending order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        Pos::all().filter(|&pos| self.is_empty(pos))
    }

    /// First complete line in scan order, if any.
    ///
    /// When a board holds more than one complete line, only the earliest
    /// in [`Board::WIN_LINES`] is reported.
    pub fn evaluate(&self) -> Option<Win> {
        let win = Self::WIN_LINES.iter().find_map(|&line| {
            let [a, b, c] = line;
            let mark = self.get(a)?;
            (self.get(b) == Some(mark) && self.get(c) == Some(mark)).then_some(Win { mark, line })
        });
        trace!(?win, "evaluated board");
        win
    }

    /// The winning mark, if any.
    #[inline]
    pub fn check_winner(&self) -> Option<Mark> {
        self.evaluate().map(|win| win.mark)
    }

    /// Full board with no complete line.
    #[inline]
    pub fn is_draw(&self) -> bool {
        self.is_full() && self.evaluate().is_none()
    }

    /// Encode the cells as bytes (0 empty, 1 X, 2 O).
    pub fn to_bytes(&self) -> [u8; 9] {
        self.0.map(|cell| cell.map_or(0, |mark| mark as u8))
    }

    /// Decode cells from bytes (0 empty, 1 X, 2 O).
    pub fn from_bytes(bytes: [u8; 9]) -> Result<Board, GameError> {
        let mut cells = [None; 9];
        for (index, (&byte, cell)) in bytes.iter().zip(cells.iter_mut()).enumerate() {
            *cell = match byte {
                0 => None,
                bits => Some(Mark::from_bits(bits).ok_or_else(|| GameError::InvalidHistory {
                    reason: format!("cell {index} has unknown encoding {bits}"),
                })?),
            };
        }
        Ok(Board(cells))
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..3u8 {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..3u8 {
                if col > 0 {
                    write!(f, " ")?;
                }
                let symbol = self.get(Pos::from_row_col(row, col)).map_or('.', Mark::symbol);
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

/// Inspect a board for a completed line.
///
/// Pure and total: legality of the position is not assumed.
#[inline]
pub fn evaluate(board: &Board) -> Option<Win> {
    board.evaluate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(marks: &[(u8, Mark)]) -> Board {
        marks
            .iter()
            .fold(Board::new(), |board, &(pos, mark)| board.with_mark(Pos(pos), mark))
    }

    #[test]
    fn test_mark_opponent() {
        assert_eq!(Mark::X.opponent(), Mark::O);
        assert_eq!(Mark::O.opponent(), Mark::X);
    }

    #[test]
    fn test_mark_for_step_parity() {
        for step in 0..10 {
            let expected = if step % 2 == 0 { Mark::X } else { Mark::O };
            assert_eq!(Mark::for_step(step), expected, "step {step}");
        }
    }

    #[test]
    fn test_mark_from_bits() {
        assert_eq!(Mark::from_bits(1), Some(Mark::X));
        assert_eq!(Mark::from_bits(2), Some(Mark::O));
        assert_eq!(Mark::from_bits(0), None);
        assert_eq!(Mark::from_bits(3), None);
    }

    #[test]
    fn test_pos_from_row_col() {
        assert_eq!(Pos::from_row_col(0, 0), Pos(0));
        assert_eq!(Pos::from_row_col(0, 2), Pos(2));
        assert_eq!(Pos::from_row_col(1, 1), Pos(4));
        assert_eq!(Pos::from_row_col(2, 2), Pos(8));
    }

    #[test]
    fn test_pos_row_col() {
        for pos in Pos::all() {
            assert_eq!(Pos::from_row_col(pos.row(), pos.col()), pos);
        }
    }

    #[test]
    fn test_pos_new_rejects_off_board() {
        assert_eq!(Pos::new(8), Ok(Pos(8)));
        assert_eq!(Pos::new(9), Err(GameError::CellOutOfRange { index: 9 }));
        assert!(Pos::try_from(200u8).is_err());
    }

    #[test]
    fn test_board_new_is_empty() {
        let board = Board::new();
        assert_eq!(board.move_count(), 0);
        assert!(!board.is_full());
        assert_eq!(board.empty_cells().count(), 9);
        for pos in Pos::all() {
            assert!(board.is_empty(pos));
        }
    }

    #[test]
    fn test_with_mark_leaves_original_untouched() {
        let before = Board::new();
        let after = before.with_mark(Pos(4), Mark::X);

        assert_eq!(before, Board::new());
        assert_eq!(after.get(Pos(4)), Some(Mark::X));
        assert_eq!(after.move_count(), 1);
    }

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(evaluate(&Board::new()), None);
    }

    #[test]
    fn test_all_winning_lines() {
        for (i, &line) in Board::WIN_LINES.iter().enumerate() {
            for mark in [Mark::X, Mark::O] {
                let board = line.iter().fold(Board::new(), |b, &pos| b.with_mark(pos, mark));
                assert_eq!(evaluate(&board), Some(Win { mark, line }), "line {i}");
            }
        }
    }

    #[test]
    fn test_mixed_line_no_win() {
        let board = board_from(&[(0, Mark::X), (1, Mark::X), (2, Mark::O)]);
        assert_eq!(evaluate(&board), None);
    }

    #[test]
    fn test_multiple_winning_lines() {
        // X completes both row 0 and column 0
        let board = board_from(&[
            (0, Mark::X),
            (1, Mark::X),
            (2, Mark::X),
            (3, Mark::X),
            (6, Mark::X),
        ]);
        let win = evaluate(&board).unwrap();
        assert_eq!(win.line, [Pos(0), Pos(1), Pos(2)]);
    }

    #[test]
    fn test_first_line_wins_across_marks() {
        // Unreachable in play: O owns row 0, X owns row 2
        let board = board_from(&[
            (0, Mark::O),
            (1, Mark::O),
            (2, Mark::O),
            (6, Mark::X),
            (7, Mark::X),
            (8, Mark::X),
        ]);
        assert_eq!(
            evaluate(&board),
            Some(Win { mark: Mark::O, line: [Pos(0), Pos(1), Pos(2)] })
        );

        // Column 0 is scanned before column 2
        let board = board_from(&[
            (2, Mark::X),
            (5, Mark::X),
            (8, Mark::X),
            (0, Mark::O),
            (3, Mark::O),
            (6, Mark::O),
        ]);
        assert_eq!(
            evaluate(&board),
            Some(Win { mark: Mark::O, line: [Pos(0), Pos(3), Pos(6)] })
        );
    }

    #[test]
    fn test_draw_detection() {
        // X O X / X O O / O X X
        let board = board_from(&[
            (0, Mark::X),
            (1, Mark::O),
            (2, Mark::X),
            (3, Mark::X),
            (4, Mark::O),
            (5, Mark::O),
            (6, Mark::O),
            (7, Mark::X),
            (8, Mark::X),
        ]);
        assert!(board.is_full());
        assert_eq!(evaluate(&board), None);
        assert!(board.is_draw());
    }

    #[test]
    fn test_full_board_with_winner_is_not_draw() {
        // X X X / O O X / X O O
        let board = board_from(&[
            (0, Mark::X),
            (1, Mark::X),
            (2, Mark::X),
            (3, Mark::O),
            (4, Mark::O),
            (5, Mark::X),
            (6, Mark::X),
            (7, Mark::O),
            (8, Mark::O),
        ]);
        assert!(board.is_full());
        assert!(!board.is_draw());
        assert_eq!(board.check_winner(), Some(Mark::X));
    }

    #[test]
    fn test_win_contains() {
        let win = Win { mark: Mark::O, line: [Pos(2), Pos(4), Pos(6)] };
        assert!(win.contains(Pos(4)));
        assert!(!win.contains(Pos(0)));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let board = board_from(&[(0, Mark::X), (4, Mark::O)]);
        assert_eq!(board.to_bytes(), [1, 0, 0, 0, 2, 0, 0, 0, 0]);
        assert_eq!(Board::from_bytes(board.to_bytes()), Ok(board));
        assert!(Board::from_bytes([3, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_board_display() {
        let board = board_from(&[(0, Mark::X), (4, Mark::O), (8, Mark::X)]);
        assert_eq!(board.to_string(), "X . .\n. O .\n. . X");
    }
}
