//! Game history with time travel.
//!
//! The state is the list of snapshots and the step on display. Everything
//! else (whose turn it is, the winner, the status line) is derived from
//! those two on demand.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Board, GameError, Mark, Pos, Win};

/// Something the player can do.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Place the mover's mark on a cell.
    Move(Pos),
    /// Display a recorded step.
    Jump(usize),
}

/// Status line for the active board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Winner(Mark),
    Draw,
    NextMover(Mark),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Winner(mark) => write!(f, "Winner: {mark}"),
            Status::Draw => write!(f, "Game Over: Draw"),
            Status::NextMover(mark) => write!(f, "Next player: {mark}"),
        }
    }
}

/// One navigation control per recorded snapshot.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct HistoryEntry {
    pub step: usize,
    pub label: String,
    pub active: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct GameView {
    pub board: Board,
    pub winning_line: Option<[Pos; 3]>,
    pub status: String,
    pub active_step: usize,
    pub entries: Vec<HistoryEntry>,
}

/// Snapshots as received from outside, before validation.
#[derive(Deserialize)]
struct RawGameState {
    history: Vec<Board>,
    active_step: usize,
}

impl TryFrom<RawGameState> for GameState {
    type Error = GameError;

    fn try_from(raw: RawGameState) -> Result<Self, Self::Error> {
        GameState::from_history(raw.history, raw.active_step)
    }
}

/// Snapshot history plus the step currently on display.
///
/// Invariants:
/// - `history` is never empty and starts with the empty board
/// - snapshot `k` adds exactly one `Mark::for_step(k - 1)` mark to snapshot `k - 1`
/// - `active_step < history.len()`
///
/// Every operation returns a fresh state; the receiver is never modified.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawGameState")]
pub struct GameState {
    history: Vec<Board>,
    active_step: usize,
}

impl GameState {
    /// Start a game: one empty snapshot, X to move.
    pub fn new() -> Self {
        Self {
            history: vec![Board::new()],
            active_step: 0,
        }
    }

    /// Rebuild a state from recorded snapshots, checking every invariant.
    #[instrument(skip(history), fields(len = history.len()))]
    pub fn from_history(history: Vec<Board>, active_step: usize) -> Result<Self, GameError> {
        let invalid = |reason: String| GameError::InvalidHistory { reason };

        let first = history
            .first()
            .ok_or_else(|| invalid("history has no snapshots".to_string()))?;
        if *first != Board::new() {
            return Err(invalid("step 0 is not the empty board".to_string()));
        }

        for (step, pair) in history.windows(2).enumerate().map(|(i, w)| (i + 1, w)) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.evaluate().is_some() {
                return Err(invalid(format!("step {step} follows a won board")));
            }
            let changed: Vec<Pos> = Pos::all().filter(|&pos| prev.get(pos) != next.get(pos)).collect();
            let &[pos] = changed.as_slice() else {
                return Err(invalid(format!("step {step} changes {} cells", changed.len())));
            };
            if !prev.is_empty(pos) {
                return Err(invalid(format!("step {step} overwrites cell {pos}")));
            }
            let expected = Mark::for_step(step - 1);
            if next.get(pos) != Some(expected) {
                return Err(invalid(format!("step {step} should be played by {expected}")));
            }
        }

        if active_step >= history.len() {
            return Err(GameError::StepOutOfRange {
                step: active_step,
                len: history.len(),
            });
        }

        Ok(Self { history, active_step })
    }

    /// All recorded snapshots, oldest first.
    #[inline]
    pub fn history(&self) -> &[Board] {
        &self.history
    }

    /// Number of recorded snapshots.
    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Index of the snapshot on display.
    #[inline]
    pub fn active_step(&self) -> usize {
        self.active_step
    }

    /// The snapshot on display.
    #[inline]
    pub fn current(&self) -> &Board {
        &self.history[self.active_step]
    }

    /// Whose turn it is at the active step.
    #[inline]
    pub fn next_mover(&self) -> Mark {
        Mark::for_step(self.active_step)
    }

    /// Completed line on the active board, if any.
    #[inline]
    pub fn winner(&self) -> Option<Win> {
        self.current().evaluate()
    }

    /// Status of the active board.
    pub fn status(&self) -> Status {
        if let Some(win) = self.winner() {
            Status::Winner(win.mark)
        } else if self.active_step > 8 {
            Status::Draw
        } else {
            Status::NextMover(self.next_mover())
        }
    }

    /// Whether the active board is won or drawn.
    #[inline]
    pub fn is_over(&self) -> bool {
        !matches!(self.status(), Status::NextMover(_))
    }

    /// Whether an earlier step exists.
    #[inline]
    pub fn can_undo(&self) -> bool {
        self.active_step > 0
    }

    /// Whether later steps exist past the active one.
    #[inline]
    pub fn can_redo(&self) -> bool {
        self.active_step < self.history.len() - 1
    }

    /// Play the mover's mark at `pos` from the active step.
    ///
    /// Moves onto an occupied cell or a won board are ignored and return an
    /// unchanged copy. A move made after jumping back discards every
    /// snapshot past the active step before appending.
    #[instrument(skip(self), fields(active_step = self.active_step, len = self.history.len()))]
    pub fn apply_move(&self, pos: Pos) -> Self {
        let board = self.current();
        if !pos.is_valid() {
            debug!("ignoring move: cell off the board");
            return self.clone();
        }
        if let Some(win) = board.evaluate() {
            debug!(winner = %win.mark, "ignoring move: game already won");
            return self.clone();
        }
        if let Some(mark) = board.get(pos) {
            debug!(%mark, "ignoring move: cell occupied");
            return self.clone();
        }

        let mover = self.next_mover();
        let mut history = self.history[..=self.active_step].to_vec();
        if history.len() < self.history.len() {
            debug!(
                dropped = self.history.len() - history.len(),
                "branching from the past, discarding future steps"
            );
        }
        history.push(board.with_mark(pos, mover));
        let active_step = history.len() - 1;
        debug!(%mover, active_step, "move applied");

        Self { history, active_step }
    }

    /// Display the snapshot at `step`; history is left as is.
    #[instrument(skip(self), fields(len = self.history.len()))]
    pub fn jump_to(&self, step: usize) -> Result<Self, GameError> {
        if step >= self.history.len() {
            return Err(GameError::StepOutOfRange {
                step,
                len: self.history.len(),
            });
        }
        Ok(Self {
            history: self.history.clone(),
            active_step: step,
        })
    }

    /// Apply an action, returning the next state.
    #[instrument(skip(self))]
    pub fn reduce(&self, action: Action) -> Result<Self, GameError> {
        match action {
            Action::Move(pos) => Ok(self.apply_move(pos)),
            Action::Jump(step) => self.jump_to(step),
        }
    }

    /// One navigation entry per recorded snapshot.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        (0..self.history.len())
            .map(|step| HistoryEntry {
                step,
                label: if step == 0 {
                    "Go to game start".to_string()
                } else {
                    format!("Go to move #{step}")
                },
                active: step == self.active_step,
            })
            .collect()
    }

    /// Build the render view for the active step.
    pub fn view(&self) -> GameView {
        GameView {
            board: *self.current(),
            winning_line: self.winner().map(|win| win.line),
            status: self.status().to_string(),
            active_step: self.active_step,
            entries: self.entries(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
