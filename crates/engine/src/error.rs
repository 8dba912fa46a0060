use std::fmt;

use tetrecs_core::InvalidPieceId;

/// Errors surfaced by the engine and the session handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// A piece id outside the catalog reached the engine
    InvalidPieceId(i64),
    /// A draw found the remote piece queue empty
    PieceQueueStarved,
    /// The piece source cannot accept pieces from a peer
    UnexpectedPiece(i64),
    /// The session actor has stopped
    SessionClosed,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidPieceId(id) => write!(f, "{}", InvalidPieceId(*id)),
            EngineError::PieceQueueStarved => f.write_str("piece queue is empty"),
            EngineError::UnexpectedPiece(id) => {
                write!(f, "piece {} offered to a source with no remote supply", id)
            }
            EngineError::SessionClosed => f.write_str("session has stopped"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<InvalidPieceId> for EngineError {
    fn from(value: InvalidPieceId) -> Self {
        EngineError::InvalidPieceId(value.0)
    }
}
