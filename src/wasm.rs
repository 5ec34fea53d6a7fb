//! WASM bindings for tictactoe-core
//!
//! Provides a JavaScript-friendly API for the game engine.

use wasm_bindgen::prelude::*;
use crate::{Action, GameState, Mark, Pos};

/// WASM-friendly wrapper around GameState
#[wasm_bindgen]
pub struct WasmGame {
    inner: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Start a new game
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame { inner: GameState::new() }
    }

    /// Discard all history and start over
    pub fn reset(&mut self) {
        self.inner = GameState::new();
    }

    /// Play the mover's mark on a cell (0-8). Returns true if the game changed.
    /// Occupied cells, finished games and off-board indices are ignored.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, cell: u8) -> bool {
        let Ok(pos) = Pos::try_from(cell) else {
            return false;
        };
        let next = self.inner.apply_move(pos);
        let changed = next != self.inner;
        self.inner = next;
        changed
    }

    /// Show the board at a recorded step. Throws if the step was never recorded.
    #[wasm_bindgen(js_name = jumpTo)]
    pub fn jump_to(&mut self, step: usize) -> Result<(), JsError> {
        self.inner = self.inner.jump_to(step)?;
        Ok(())
    }

    /// Apply an action object: `{ move: 4 }` or `{ jump: 2 }`
    pub fn dispatch(&mut self, action: JsValue) -> Result<(), JsError> {
        let action: Action = serde_wasm_bindgen::from_value(action)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.inner = self.inner.reduce(action)?;
        Ok(())
    }

    /// Active board as 9 cells: 0 (empty), 1 (X), 2 (O)
    pub fn board(&self) -> Vec<u8> {
        self.inner.current().to_bytes().to_vec()
    }

    /// Winning line as 3 cell indices. Returns empty array if no winner
    #[wasm_bindgen(js_name = winningLine)]
    pub fn winning_line(&self) -> Vec<u8> {
        self.inner
            .winner()
            .map(|win| win.line.iter().map(|pos| pos.0).collect())
            .unwrap_or_default()
    }

    /// Status line: "Winner: X", "Game Over: Draw" or "Next player: O"
    pub fn status(&self) -> String {
        self.inner.status().to_string()
    }

    /// Mark to move at the active step (1 or 2)
    #[wasm_bindgen(js_name = nextMover)]
    pub fn next_mover(&self) -> u8 {
        self.inner.next_mover() as u8
    }

    /// Winning mark (1 or 2), or 0 if none
    pub fn winner(&self) -> u8 {
        self.inner.winner().map_or(0, |win| win.mark as u8)
    }

    /// Index of the step on display
    #[wasm_bindgen(js_name = activeStep)]
    pub fn active_step(&self) -> usize {
        self.inner.active_step()
    }

    /// Number of recorded steps (one navigation button each)
    #[wasm_bindgen(js_name = historyLength)]
    pub fn history_length(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    /// Check if the active board is won or drawn
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.is_over()
    }

    /// Full render view as a JS object
    /// { board, winning_line, status, active_step, entries: [{ step, label, active }] }
    pub fn view(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.inner.view()).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Label for a mark code, for renderers that only hold the u8
    #[wasm_bindgen(js_name = markSymbol)]
    pub fn mark_symbol(code: u8) -> Option<String> {
        Mark::from_bits(code).map(|mark| mark.to_string())
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
