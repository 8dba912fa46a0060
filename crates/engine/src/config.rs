//! Session configuration
//!
//! Defaults match the standard challenge mode (5x5 grid, 3 lives, 12 second
//! countdown). Values can be overridden from the environment or loaded from
//! JSON.

use serde::{Deserialize, Serialize};

use tetrecs_core::TimerConfig;
use tetrecs_types::{DEFAULT_COLS, DEFAULT_ROWS, PIECE_PREFETCH, STARTING_LIVES};

use crate::source::OPENING_PIECES;

/// Game session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub cols: usize,
    pub rows: usize,
    pub starting_lives: i32,
    pub timer: TimerConfig,
    /// Pieces buffered from the peer before a multiplayer session starts
    pub prefetch: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            starting_lives: STARTING_LIVES,
            timer: TimerConfig::default(),
            prefetch: PIECE_PREFETCH,
        }
    }
}

impl GameConfig {
    /// Defaults with the early two second countdown
    pub fn legacy() -> Self {
        Self {
            timer: TimerConfig::legacy(),
            ..Self::default()
        }
    }

    /// Create from environment variables
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            get: &impl Fn(&str) -> Option<String>,
            key: &str,
            fallback: T,
        ) -> T {
            get(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(fallback)
        }

        let d = Self::default();
        Self {
            cols: parsed(&get, "TETRECS_COLS", d.cols),
            rows: parsed(&get, "TETRECS_ROWS", d.rows),
            starting_lives: parsed(&get, "TETRECS_LIVES", d.starting_lives),
            timer: TimerConfig {
                base_ms: parsed(&get, "TETRECS_TIMER_BASE_MS", d.timer.base_ms),
                step_ms: parsed(&get, "TETRECS_TIMER_STEP_MS", d.timer.step_ms),
                min_ms: parsed(&get, "TETRECS_TIMER_MIN_MS", d.timer.min_ms),
            },
            prefetch: parsed(&get, "TETRECS_PREFETCH", d.prefetch),
        }
        .sanitized()
    }

    /// Clamp values the engine cannot run with
    ///
    /// The grid must fit at least one footprint, lives cannot start below
    /// zero, and bootstrap needs two buffered pieces.
    pub fn sanitized(mut self) -> Self {
        self.cols = self.cols.max(1);
        self.rows = self.rows.max(1);
        self.starting_lives = self.starting_lives.max(0);
        self.prefetch = self.prefetch.max(OPENING_PIECES);
        self
    }
}
