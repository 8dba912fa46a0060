//! Core types module - shared data structures and constants
//!
//! This crate defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (rules, engine, wire protocol, headless driver).
//!
//! # Grid Dimensions
//!
//! The default playfield is a 5x5 grid. Cells hold integers:
//!
//! - `0`: empty
//! - `1..=15`: occupied, coloured by the piece that was placed there
//! - `-1`: sentinel returned for reads outside the grid (never stored)
//!
//! # Countdown Timing
//!
//! Every placement races a countdown. The delay shrinks as the level grows:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_TIMER_BASE_MS` | 12000 | Countdown at level 0 |
//! | `DEFAULT_TIMER_STEP_MS` | 500 | Reduction per level |
//! | `DEFAULT_TIMER_MIN_MS` | 500 | Floor for high levels |
//! | `LEGACY_TIMER_BASE_MS` | 2000 | Early, much faster variant |
//!
//! # Scoring
//!
//! A clear is worth `lines * blocks * SCORE_PER_BLOCK * multiplier`, and the
//! level is `score / LEVEL_SCORE_STEP`.

/// Default grid width in cells (5 columns)
pub const DEFAULT_COLS: usize = 5;

/// Default grid height in cells (5 rows)
pub const DEFAULT_ROWS: usize = 5;

/// Value of an empty cell
pub const EMPTY_CELL: i32 = 0;

/// Value returned when reading outside the grid
pub const OUT_OF_BOUNDS: i32 = -1;

/// Number of shapes in the piece catalog
pub const PIECE_COUNT: u8 = 15;

/// Lives at the start of a session
pub const STARTING_LIVES: i32 = 3;

/// Lives value that marks the session as over
pub const TERMINAL_LIVES: i32 = -1;

/// Points per cleared block, before line count and multiplier
pub const SCORE_PER_BLOCK: u32 = 10;

/// Score needed per level
pub const LEVEL_SCORE_STEP: u32 = 1000;

/// Countdown at level 0 (12 seconds)
pub const DEFAULT_TIMER_BASE_MS: u32 = 12_000;

/// Countdown reduction per level
pub const DEFAULT_TIMER_STEP_MS: u32 = 500;

/// Lowest countdown regardless of level
pub const DEFAULT_TIMER_MIN_MS: u32 = 500;

/// Countdown at level 0 in the early, faster variant
pub const LEGACY_TIMER_BASE_MS: u32 = 2_000;

/// Pieces requested from the peer before a multiplayer session starts
pub const PIECE_PREFETCH: usize = 5;

/// The fifteen shapes of the piece catalog, indexed by their wire id.
///
/// The colour value a piece writes into the grid is `id + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    Line,
    C,
    Plus,
    Dot,
    Square,
    L,
    J,
    S,
    Z,
    T,
    X,
    Corner,
    InverseCorner,
    Double,
    Triple,
}

impl PieceKind {
    /// All kinds in id order.
    pub const ALL: [PieceKind; PIECE_COUNT as usize] = [
        PieceKind::Line,
        PieceKind::C,
        PieceKind::Plus,
        PieceKind::Dot,
        PieceKind::Square,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::T,
        PieceKind::X,
        PieceKind::Corner,
        PieceKind::InverseCorner,
        PieceKind::Double,
        PieceKind::Triple,
    ];

    /// Look up a kind by its wire id
    ///
    /// # Examples
    ///
    /// ```
    /// use tetrecs_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_id(0), Some(PieceKind::Line));
    /// assert_eq!(PieceKind::from_id(14), Some(PieceKind::Triple));
    /// assert_eq!(PieceKind::from_id(15), None);
    /// ```
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Wire id (0..15)
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Colour value written into occupied grid cells
    pub fn value(&self) -> i32 {
        self.id() as i32 + 1
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            PieceKind::Line => "Line",
            PieceKind::C => "C",
            PieceKind::Plus => "Plus",
            PieceKind::Dot => "Dot",
            PieceKind::Square => "Square",
            PieceKind::L => "L",
            PieceKind::J => "J",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::T => "T",
            PieceKind::X => "X",
            PieceKind::Corner => "Corner",
            PieceKind::InverseCorner => "Inverse Corner",
            PieceKind::Double => "Double",
            PieceKind::Triple => "Triple",
        }
    }
}

/// A cell position on the grid (column, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoordinate {
    pub x: usize,
    pub y: usize,
}

impl GridCoordinate {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Lifecycle of a game session
///
/// `Idle -> (AwaitingPieces) -> Running -> GameOver`. `AwaitingPieces` only
/// occurs when the piece supply is remote and still filling its prefetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Idle,
    AwaitingPieces,
    Running,
    GameOver,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingPieces => "awaiting_pieces",
            SessionPhase::Running => "running",
            SessionPhase::GameOver => "game_over",
        }
    }
}

/// Player inputs forwarded from the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Play the current piece centred on (col, row)
    Click { col: i32, row: i32 },
    /// Rotate the current piece 90° clockwise
    Rotate,
    /// Rotate the current piece 90° counter-clockwise
    RotateLeft,
    /// Exchange current and next piece
    Swap,
}

impl GameAction {
    /// Parse an action from a command line (case-insensitive keyword)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetrecs_types::GameAction;
    ///
    /// assert_eq!(GameAction::parse("click 2 3"), Some(GameAction::Click { col: 2, row: 3 }));
    /// assert_eq!(GameAction::parse("ROTATE"), Some(GameAction::Rotate));
    /// assert_eq!(GameAction::parse("swap"), Some(GameAction::Swap));
    /// assert_eq!(GameAction::parse("click 2"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let keyword = parts.next()?.to_lowercase();
        let action = match keyword.as_str() {
            "click" | "place" => {
                let col = parts.next()?.parse().ok()?;
                let row = parts.next()?.parse().ok()?;
                GameAction::Click { col, row }
            }
            "rotate" | "rotate-right" => GameAction::Rotate,
            "rotate-left" => GameAction::RotateLeft,
            "swap" => GameAction::Swap,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }
}

/// Semantic notifications emitted by the engine
///
/// The presentation layer decides what (if anything) to play or animate for
/// each of these; the engine never touches audio or rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A piece was written into the grid
    PiecePlaced { kind: PieceKind, x: i32, y: i32 },
    /// A click could not place the current piece
    PlacementRejected { x: i32, y: i32 },
    PieceRotated,
    PieceSwapped,
    /// Lines were cleared and the score increased
    LinesCleared {
        lines: u32,
        blocks: u32,
        score_delta: u32,
    },
    LevelUp { level: u32 },
    /// The countdown expired and a life was spent
    LifeLost { lives: i32 },
    GameOver { score: u32 },
}
