//! Grid module - the board model
//!
//! The grid is a `cols x rows` matrix of integer cells stored as a flat,
//! row-major vector (`y * cols + x`). `0` is empty, positive values are the
//! colour of the piece that filled the cell.
//!
//! Reads outside the grid return the `-1` sentinel instead of failing, which
//! lets placement checks treat off-grid footprint cells as conflicts without a
//! separate bounds pass.

use std::collections::BTreeSet;
use std::fmt;

use crate::pieces::GamePiece;
use crate::types::{GridCoordinate, EMPTY_CELL, OUT_OF_BOUNDS};

/// Raised when a flattened board cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridParseError {
    /// Token count does not match `cols * rows`
    WrongSize { expected: usize, found: usize },
    /// A token is not a non-negative integer
    BadToken(String),
}

impl fmt::Display for GridParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridParseError::WrongSize { expected, found } => {
                write!(f, "expected {} cells, found {}", expected, found)
            }
            GridParseError::BadToken(t) => write!(f, "invalid cell value {:?}", t),
        }
    }
}

impl std::error::Error for GridParseError {}

/// Result of scanning for full rows and columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineScan {
    /// Number of full rows plus full columns
    pub lines: u32,
    /// Every cell on a full line, each listed once
    pub blocks: BTreeSet<GridCoordinate>,
}

impl LineScan {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> u32 {
        self.blocks.len() as u32
    }
}

/// The game grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<i32>,
}

impl Grid {
    /// Create an empty grid
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![EMPTY_CELL; cols * rows],
        }
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return None;
        }
        Some(y as usize * self.cols + x as usize)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell value at (x, y), or `-1` outside the grid
    pub fn get(&self, x: i32, y: i32) -> i32 {
        match self.index(x, y) {
            Some(idx) => self.cells[idx],
            None => OUT_OF_BOUNDS,
        }
    }

    /// Write a cell value
    ///
    /// Placement legality is the caller's business; an out-of-range write is
    /// dropped and reported as `false`.
    pub fn set(&mut self, x: i32, y: i32, value: i32) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Whether `piece` fits with its centre on (place_x, place_y)
    ///
    /// Every occupied footprint cell must land on an empty grid cell. Cells
    /// off the grid read as `-1` and so count as conflicts.
    pub fn can_play_piece(&self, piece: &GamePiece, place_x: i32, place_y: i32) -> bool {
        let top_x = place_x - 1;
        let top_y = place_y - 1;
        piece
            .occupied()
            .iter()
            .all(|&(bx, by)| self.get(top_x + bx as i32, top_y + by as i32) == EMPTY_CELL)
    }

    /// Write `piece` centred on (place_x, place_y)
    ///
    /// Re-validates first and does nothing if the piece does not fit, so a
    /// duplicated submission cannot overwrite cells. Returns whether the piece
    /// was written.
    pub fn play_piece(&mut self, piece: &GamePiece, place_x: i32, place_y: i32) -> bool {
        if !self.can_play_piece(piece, place_x, place_y) {
            return false;
        }
        let top_x = place_x - 1;
        let top_y = place_y - 1;
        let value = piece.value();
        for (bx, by) in piece.occupied() {
            self.set(top_x + bx as i32, top_y + by as i32, value);
        }
        true
    }

    /// Empty every cell
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_CELL);
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= self.rows {
            return false;
        }
        let start = y * self.cols;
        self.cells[start..start + self.cols].iter().all(|&c| c > 0)
    }

    /// Check if a column is completely filled
    pub fn is_col_full(&self, x: usize) -> bool {
        if x >= self.cols {
            return false;
        }
        (0..self.rows).all(|y| self.cells[y * self.cols + x] > 0)
    }

    /// Find every full row and full column
    ///
    /// Rows and columns are scanned independently; a cell on both a full row
    /// and a full column appears once in `blocks`.
    pub fn scan_full_lines(&self) -> LineScan {
        let mut scan = LineScan::default();
        for y in 0..self.rows {
            if self.is_row_full(y) {
                scan.lines += 1;
                scan.blocks
                    .extend((0..self.cols).map(|x| GridCoordinate::new(x, y)));
            }
        }
        for x in 0..self.cols {
            if self.is_col_full(x) {
                scan.lines += 1;
                scan.blocks
                    .extend((0..self.rows).map(|y| GridCoordinate::new(x, y)));
            }
        }
        scan
    }

    /// Zero the given cells
    pub fn clear_blocks<'a>(&mut self, blocks: impl IntoIterator<Item = &'a GridCoordinate>) {
        for c in blocks {
            self.set(c.x as i32, c.y as i32, EMPTY_CELL);
        }
    }

    /// Row-major, single-space separated cell values
    ///
    /// # Examples
    ///
    /// ```
    /// use tetrecs_core::Grid;
    ///
    /// let mut grid = Grid::new(2, 2);
    /// grid.set(1, 0, 4);
    /// assert_eq!(grid.flattened(), "0 4 0 0");
    /// ```
    pub fn flattened(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 3);
        for (i, v) in self.cells.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&v.to_string());
        }
        out
    }

    /// Inverse of [`Grid::flattened`]
    pub fn from_flattened(cols: usize, rows: usize, text: &str) -> Result<Self, GridParseError> {
        let tokens: Vec<&str> = if text.trim().is_empty() {
            Vec::new()
        } else {
            text.trim().split(' ').collect()
        };
        if tokens.len() != cols * rows {
            return Err(GridParseError::WrongSize {
                expected: cols * rows,
                found: tokens.len(),
            });
        }
        let mut cells = Vec::with_capacity(tokens.len());
        for t in tokens {
            match t.parse::<i32>() {
                Ok(v) if v >= 0 => cells.push(v),
                _ => return Err(GridParseError::BadToken(t.to_string())),
            }
        }
        Ok(Self { cols, rows, cells })
    }

    /// Flat row-major cell slice
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Rows as vectors, top to bottom
    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        self.cells.chunks(self.cols.max(1)).map(|r| r.to_vec()).collect()
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c > 0).count()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_COLS, crate::types::DEFAULT_ROWS)
    }
}
