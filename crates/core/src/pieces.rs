//! Pieces module - the fifteen-shape catalog and 3x3 rotation
//!
//! Every piece lives in a 3x3 footprint whose centre cell is the placement
//! anchor. Footprints are indexed `[x][y]` (column first), matching how the
//! grid addresses cells.

use std::fmt;

use arrayvec::ArrayVec;

use crate::types::{PieceKind, PIECE_COUNT};

/// Side length of every piece footprint
pub const PIECE_SIZE: usize = 3;

/// 3x3 occupancy matrix indexed `[x][y]`
pub type PieceBlocks = [[i32; PIECE_SIZE]; PIECE_SIZE];

/// Offsets of occupied cells inside a footprint, at most 9
pub type PieceCells = ArrayVec<(usize, usize), { PIECE_SIZE * PIECE_SIZE }>;

/// Raised when a wire id falls outside the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPieceId(pub i64);

impl fmt::Display for InvalidPieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "piece id {} outside catalog range 0..{}",
            self.0, PIECE_COUNT
        )
    }
}

impl std::error::Error for InvalidPieceId {}

/// Base shape of each kind (1 = occupied), indexed `[x][y]`
fn base_shape(kind: PieceKind) -> [[u8; PIECE_SIZE]; PIECE_SIZE] {
    match kind {
        PieceKind::Line => [[0, 0, 0], [1, 1, 1], [0, 0, 0]],
        PieceKind::C => [[0, 0, 0], [1, 1, 1], [1, 0, 1]],
        PieceKind::Plus => [[0, 1, 0], [1, 1, 1], [0, 1, 0]],
        PieceKind::Dot => [[0, 0, 0], [0, 1, 0], [0, 0, 0]],
        PieceKind::Square => [[1, 1, 0], [1, 1, 0], [0, 0, 0]],
        PieceKind::L => [[0, 0, 0], [1, 1, 1], [0, 0, 1]],
        PieceKind::J => [[0, 0, 1], [1, 1, 1], [0, 0, 0]],
        PieceKind::S => [[0, 0, 0], [0, 1, 1], [1, 1, 0]],
        PieceKind::Z => [[1, 1, 0], [0, 1, 1], [0, 0, 0]],
        PieceKind::T => [[1, 0, 0], [1, 1, 0], [1, 0, 0]],
        PieceKind::X => [[1, 0, 1], [0, 1, 0], [1, 0, 1]],
        PieceKind::Corner => [[0, 0, 0], [1, 1, 0], [1, 0, 0]],
        PieceKind::InverseCorner => [[1, 0, 0], [1, 1, 0], [0, 0, 0]],
        PieceKind::Double => [[0, 1, 0], [0, 1, 0], [0, 0, 0]],
        PieceKind::Triple => [[0, 1, 0], [0, 1, 0], [0, 1, 0]],
    }
}

/// A catalog piece: fixed kind and colour, mutable orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GamePiece {
    kind: PieceKind,
    blocks: PieceBlocks,
}

impl GamePiece {
    /// Create a piece in its spawn orientation
    pub fn new(kind: PieceKind) -> Self {
        let value = kind.value();
        let shape = base_shape(kind);
        let mut blocks = [[0; PIECE_SIZE]; PIECE_SIZE];
        for x in 0..PIECE_SIZE {
            for y in 0..PIECE_SIZE {
                blocks[x][y] = shape[x][y] as i32 * value;
            }
        }
        Self { kind, blocks }
    }

    /// Create a piece from its wire id
    ///
    /// # Examples
    ///
    /// ```
    /// use tetrecs_core::GamePiece;
    /// use tetrecs_types::PieceKind;
    ///
    /// assert_eq!(GamePiece::from_id(3).unwrap().kind(), PieceKind::Dot);
    /// assert!(GamePiece::from_id(15).is_err());
    /// assert!(GamePiece::from_id(-1).is_err());
    /// ```
    pub fn from_id(id: i64) -> Result<Self, InvalidPieceId> {
        u8::try_from(id)
            .ok()
            .and_then(PieceKind::from_id)
            .map(Self::new)
            .ok_or(InvalidPieceId(id))
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Colour value written into the grid
    pub fn value(&self) -> i32 {
        self.kind.value()
    }

    /// Current orientation, indexed `[x][y]`
    pub fn blocks(&self) -> &PieceBlocks {
        &self.blocks
    }

    /// Offsets `(x, y)` of every occupied footprint cell
    pub fn occupied(&self) -> PieceCells {
        let mut cells = PieceCells::new();
        for x in 0..PIECE_SIZE {
            for y in 0..PIECE_SIZE {
                if self.blocks[x][y] > 0 {
                    cells.push((x, y));
                }
            }
        }
        cells
    }

    /// Number of occupied footprint cells
    pub fn block_count(&self) -> usize {
        self.occupied().len()
    }

    /// Rotate 90° clockwise in place
    ///
    /// Cell `(x, y)` moves to `(2 - y, x)`; four rotations are the identity.
    pub fn rotate(&mut self) {
        let mut rotated = [[0; PIECE_SIZE]; PIECE_SIZE];
        for x in 0..PIECE_SIZE {
            for y in 0..PIECE_SIZE {
                rotated[PIECE_SIZE - 1 - y][x] = self.blocks[x][y];
            }
        }
        self.blocks = rotated;
    }

    /// Rotate `times` quarter turns clockwise
    pub fn rotate_by(&mut self, times: usize) {
        for _ in 0..times % 4 {
            self.rotate();
        }
    }
}

impl fmt::Display for GamePiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())
    }
}
