//! Outbound reporting
//!
//! The engine reports state that other players need through a [`Telemetry`]
//! sink. Single-player sessions use [`NoTelemetry`]; the networked sink lives
//! in the net crate and turns each call into a wire message.

use tetrecs_core::Grid;

pub trait Telemetry: Send {
    /// Ask upstream for one more piece
    fn request_piece(&mut self) {}

    /// A life was spent; `lives` is the new count
    fn lives_changed(&mut self, _lives: i32) {}

    /// The player is out
    fn died(&mut self) {}

    /// A placement changed the board and possibly the score
    fn board_changed(&mut self, _grid: &Grid, _score: u32) {}
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTelemetry;

impl Telemetry for NoTelemetry {}
