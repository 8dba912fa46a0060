//! Listener registry
//!
//! Listeners are registered on the [`Game`](crate::Game) before it starts, so
//! no lifecycle notification can be missed. Every callback has a no-op default;
//! implement only what you need.

use tokio::sync::mpsc;
use tracing::{debug, info};

use tetrecs_core::GamePiece;
use tetrecs_types::{GameEvent, GridCoordinate};

pub trait GameListener: Send {
    /// The current/next pair changed (advance, rotate or swap)
    fn next_piece(&mut self, _current: &GamePiece, _next: &GamePiece) {}

    /// These cells are about to be emptied
    fn lines_cleared(&mut self, _blocks: &[GridCoordinate]) {}

    /// The countdown was (re)armed with `delay_ms`
    fn timer_reset(&mut self, _delay_ms: u32) {}

    fn game_event(&mut self, _event: &GameEvent) {}
}

/// Subscription list, dispatched in registration order
#[derive(Default)]
pub struct Listeners {
    listeners: Vec<Box<dyn GameListener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl GameListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn next_piece(&mut self, current: &GamePiece, next: &GamePiece) {
        for l in &mut self.listeners {
            l.next_piece(current, next);
        }
    }

    pub(crate) fn lines_cleared(&mut self, blocks: &[GridCoordinate]) {
        for l in &mut self.listeners {
            l.lines_cleared(blocks);
        }
    }

    pub(crate) fn timer_reset(&mut self, delay_ms: u32) {
        for l in &mut self.listeners {
            l.timer_reset(delay_ms);
        }
    }

    pub(crate) fn game_event(&mut self, event: GameEvent) {
        for l in &mut self.listeners {
            l.game_event(&event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

/// Owned copy of a notification, for crossing task boundaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    NextPiece { current: GamePiece, next: GamePiece },
    LinesCleared(Vec<GridCoordinate>),
    TimerReset { delay_ms: u32 },
    Game(GameEvent),
}

/// Forwards every notification into an mpsc channel
///
/// A closed receiver is ignored; the game keeps running without an audience.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelListener {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Listener plus the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl GameListener for ChannelListener {
    fn next_piece(&mut self, current: &GamePiece, next: &GamePiece) {
        let _ = self.tx.send(SessionEvent::NextPiece {
            current: *current,
            next: *next,
        });
    }

    fn lines_cleared(&mut self, blocks: &[GridCoordinate]) {
        let _ = self.tx.send(SessionEvent::LinesCleared(blocks.to_vec()));
    }

    fn timer_reset(&mut self, delay_ms: u32) {
        let _ = self.tx.send(SessionEvent::TimerReset { delay_ms });
    }

    fn game_event(&mut self, event: &GameEvent) {
        let _ = self.tx.send(SessionEvent::Game(*event));
    }
}

/// Logs notifications through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl GameListener for TracingListener {
    fn next_piece(&mut self, current: &GamePiece, next: &GamePiece) {
        debug!(%current, %next, "piece preview changed");
    }

    fn lines_cleared(&mut self, blocks: &[GridCoordinate]) {
        debug!(blocks = blocks.len(), "clearing blocks");
    }

    fn timer_reset(&mut self, delay_ms: u32) {
        debug!(delay_ms, "countdown armed");
    }

    fn game_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::LevelUp { .. } | GameEvent::LifeLost { .. } | GameEvent::GameOver { .. } => {
                info!(?event, "game event")
            }
            _ => debug!(?event, "game event"),
        }
    }
}
