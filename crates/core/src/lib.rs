//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains the rules of the puzzle: the piece catalog, the grid,
//! the line-clear scan and the scoring/level/countdown arithmetic.
//! It has **zero dependencies** on timers, networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical piece sequences
//! - **Testable**: Every rule is a plain function or method
//! - **Portable**: Usable from the async engine, tests, and benchmarks alike
//!
//! # Module Structure
//!
//! - [`grid`]: `cols x rows` integer grid with placement checks and line scans
//! - [`pieces`]: the fifteen 3x3 shapes and clockwise rotation
//! - [`rng`]: seedable uniform piece generation
//! - [`scoring`]: clear score, level and countdown delay
//! - [`snapshot`]: serializable view of a session
//!
//! # Rules
//!
//! - A piece is placed by its centre cell; every occupied cell of its 3x3
//!   footprint must land on an empty cell inside the grid.
//! - After a placement, every full row and every full column is cleared at
//!   once. Cells shared by a full row and a full column count once.
//! - Pieces never fall; there is no gravity.
//!
//! # Example
//!
//! ```
//! use tetrecs_core::{GamePiece, Grid};
//! use tetrecs_types::PieceKind;
//!
//! let mut grid = Grid::new(5, 5);
//! let line = GamePiece::new(PieceKind::Line);
//! assert!(grid.play_piece(&line, 1, 1));
//! assert!(grid.play_piece(&line, 2, 1));
//! assert!(!grid.play_piece(&line, 1, 2));
//! assert_eq!(grid.scan_full_lines().lines, 0);
//! ```

pub mod grid;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use tetrecs_types as types;

// Re-export commonly used types for convenience
pub use grid::{Grid, GridParseError, LineScan};
pub use pieces::{GamePiece, InvalidPieceId, PieceBlocks, PIECE_SIZE};
pub use rng::{SimpleRng, UniformPieces};
pub use scoring::{calculate_level, calculate_score, TimerConfig};
pub use snapshot::{GameSnapshot, PieceSnapshot};
