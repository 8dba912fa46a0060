use serde::{Deserialize, Serialize};

use crate::pieces::{GamePiece, PieceBlocks};
use crate::types::SessionPhase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSnapshot {
    pub id: u8,
    pub name: String,
    pub blocks: PieceBlocks,
}

impl From<&GamePiece> for PieceSnapshot {
    fn from(value: &GamePiece) -> Self {
        Self {
            id: value.kind().id(),
            name: value.kind().name().to_string(),
            blocks: *value.blocks(),
        }
    }
}

/// Point-in-time view of a session, for observers and the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub cols: usize,
    pub rows: usize,
    /// Row-major cell values
    pub cells: Vec<i32>,
    pub current: Option<PieceSnapshot>,
    pub next: Option<PieceSnapshot>,
    pub score: u32,
    pub multiplier: u32,
    pub level: u32,
    pub lives: i32,
    pub phase: String,
    pub timer_delay_ms: u32,
}

impl GameSnapshot {
    pub fn playable(&self) -> bool {
        self.phase == SessionPhase::Running.as_str()
    }

    /// Cell value at (x, y), `-1` outside the grid
    pub fn cell(&self, x: usize, y: usize) -> i32 {
        if x >= self.cols || y >= self.rows {
            return crate::types::OUT_OF_BOUNDS;
        }
        self.cells[y * self.cols + x]
    }
}
