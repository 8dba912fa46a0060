//! Piece supply
//!
//! A session draws its pieces from a [`PieceSource`]. Single-player games use
//! [`LocalPieces`] (uniform RNG, never runs dry). Multiplayer games use
//! [`RemotePieceQueue`], a FIFO of ids sent by the peer so every player sees
//! the same sequence.

use std::collections::VecDeque;

use tetrecs_core::{GamePiece, UniformPieces};
use tetrecs_types::PieceKind;

use crate::error::EngineError;

/// Where the next piece comes from
pub trait PieceSource: Send {
    /// Take the next piece
    fn draw(&mut self) -> Result<GamePiece, EngineError>;

    /// Pieces ready to draw, `None` when unlimited
    fn available(&self) -> Option<usize>;

    /// Accept a piece id from upstream
    fn offer(&mut self, id: i64) -> Result<(), EngineError> {
        Err(EngineError::UnexpectedPiece(id))
    }

    /// Pieces that must be buffered before the session can start
    fn prefetch(&self) -> usize {
        0
    }

    /// Whether each draw should request a replacement from upstream
    fn requests_upstream(&self) -> bool {
        false
    }

    fn can_draw(&self) -> bool {
        self.available().map_or(true, |n| n > 0)
    }

    fn is_ready(&self) -> bool {
        self.available().map_or(true, |n| n >= self.prefetch())
    }
}

/// Uniform random pieces for single-player sessions
#[derive(Debug, Clone)]
pub struct LocalPieces {
    pieces: UniformPieces,
}

impl LocalPieces {
    pub fn new(seed: u32) -> Self {
        Self {
            pieces: UniformPieces::new(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            pieces: UniformPieces::from_entropy(),
        }
    }

    pub fn seed(&self) -> u32 {
        self.pieces.seed()
    }
}

impl PieceSource for LocalPieces {
    fn draw(&mut self) -> Result<GamePiece, EngineError> {
        Ok(GamePiece::new(self.pieces.draw()))
    }

    fn available(&self) -> Option<usize> {
        None
    }
}

/// Pieces dealt when a session starts: the current one and the next one
pub const OPENING_PIECES: usize = 2;

/// Peer-fed FIFO of piece ids
#[derive(Debug, Clone)]
pub struct RemotePieceQueue {
    queue: VecDeque<PieceKind>,
    prefetch: usize,
}

impl RemotePieceQueue {
    /// Queue that buffers `prefetch` pieces before starting, never fewer than
    /// [`OPENING_PIECES`]
    pub fn new(prefetch: usize) -> Self {
        let prefetch = prefetch.max(OPENING_PIECES);
        Self {
            queue: VecDeque::with_capacity(prefetch),
            prefetch,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl PieceSource for RemotePieceQueue {
    fn draw(&mut self) -> Result<GamePiece, EngineError> {
        self.queue
            .pop_front()
            .map(GamePiece::new)
            .ok_or(EngineError::PieceQueueStarved)
    }

    fn available(&self) -> Option<usize> {
        Some(self.queue.len())
    }

    fn offer(&mut self, id: i64) -> Result<(), EngineError> {
        let kind = u8::try_from(id)
            .ok()
            .and_then(PieceKind::from_id)
            .ok_or(EngineError::InvalidPieceId(id))?;
        self.queue.push_back(kind);
        Ok(())
    }

    fn prefetch(&self) -> usize {
        self.prefetch
    }

    fn requests_upstream(&self) -> bool {
        true
    }
}
