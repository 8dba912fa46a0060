//! Session actor
//!
//! A spawned task owns the [`Game`] and applies commands one at a time, so
//! player input, peer pieces and countdown expiries never interleave. After
//! every command the actor brings its [`TimerDriver`] in line with the game's
//! countdown.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tetrecs_core::GameSnapshot;
use tetrecs_types::GameAction;

use crate::error::EngineError;
use crate::game::{Game, PlacementOutcome};
use crate::timer::TimerDriver;

/// Commands processed by the session actor
#[derive(Debug)]
pub enum SessionCommand {
    Click {
        col: i32,
        row: i32,
        reply: Option<oneshot::Sender<PlacementOutcome>>,
    },
    Rotate,
    RotateLeft,
    Swap,
    SupplyPiece(i64),
    TimerExpired { generation: u64 },
    Snapshot(oneshot::Sender<GameSnapshot>),
    Shutdown,
}

/// Cloneable handle to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    fn send(&self, cmd: SessionCommand) -> Result<(), EngineError> {
        self.tx.send(cmd).map_err(|_| EngineError::SessionClosed)
    }

    /// Queue a click without waiting for the outcome
    pub fn click(&self, col: i32, row: i32) -> Result<(), EngineError> {
        self.send(SessionCommand::Click {
            col,
            row,
            reply: None,
        })
    }

    /// Click and wait for the outcome
    pub async fn place(&self, col: i32, row: i32) -> Result<PlacementOutcome, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Click {
            col,
            row,
            reply: Some(reply),
        })?;
        rx.await.map_err(|_| EngineError::SessionClosed)
    }

    pub fn rotate(&self) -> Result<(), EngineError> {
        self.send(SessionCommand::Rotate)
    }

    pub fn rotate_left(&self) -> Result<(), EngineError> {
        self.send(SessionCommand::RotateLeft)
    }

    pub fn swap(&self) -> Result<(), EngineError> {
        self.send(SessionCommand::Swap)
    }

    pub fn action(&self, action: GameAction) -> Result<(), EngineError> {
        match action {
            GameAction::Click { col, row } => self.click(col, row),
            GameAction::Rotate => self.rotate(),
            GameAction::RotateLeft => self.rotate_left(),
            GameAction::Swap => self.swap(),
        }
    }

    /// Hand a piece id from the peer to the session
    pub fn supply_piece(&self, id: i64) -> Result<(), EngineError> {
        self.send(SessionCommand::SupplyPiece(id))
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply))?;
        rx.await.map_err(|_| EngineError::SessionClosed)
    }

    /// Ask the session to stop; the join handle yields the final snapshot
    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(SessionCommand::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Start `game` on its own task
///
/// The session ends on [`SessionHandle::shutdown`] or once every handle has
/// been dropped. A game that reaches game over keeps answering snapshots
/// until then.
pub fn spawn_session(game: Game) -> (SessionHandle, JoinHandle<GameSnapshot>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let weak = tx.downgrade();
    let task = tokio::spawn(run_session(game, rx, weak));
    (SessionHandle { tx }, task)
}

async fn run_session(
    mut game: Game,
    mut rx: mpsc::UnboundedReceiver<SessionCommand>,
    weak: mpsc::WeakUnboundedSender<SessionCommand>,
) -> GameSnapshot {
    let mut driver = TimerDriver::default();
    game.start();
    driver.sync(game.countdown(), &weak);

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Click { col, row, reply } => {
                let outcome = game.block_clicked(col, row);
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            SessionCommand::Rotate => {
                game.rotate_current_piece();
            }
            SessionCommand::RotateLeft => {
                game.rotate_current_piece_left();
            }
            SessionCommand::Swap => {
                game.swap_current_piece();
            }
            SessionCommand::SupplyPiece(id) => {
                if let Err(err) = game.supply_piece(id) {
                    warn!(%err, "discarding piece from peer");
                }
            }
            SessionCommand::TimerExpired { generation } => {
                game.timer_expired(generation);
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(game.snapshot());
            }
            SessionCommand::Shutdown => {
                debug!("shutdown requested");
                break;
            }
        }
        driver.sync(game.countdown(), &weak);
    }

    game.shutdown();
    driver.cancel();
    info!(score = game.score(), "session ended");
    game.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::listener::{ChannelListener, SessionEvent};
    use crate::source::RemotePieceQueue;
    use crate::telemetry::NoTelemetry;
    use tetrecs_types::{GameEvent, SessionPhase};
    use tokio::time::{advance, Duration};

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_starts_running() {
        let (handle, task) = spawn_session(Game::single_player(GameConfig::default(), 9));
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::Running.as_str());
        assert_eq!(snap.lives, 3);
        assert!(snap.current.is_some());

        handle.shutdown().unwrap();
        let last = task.await.unwrap();
        assert_eq!(last.phase, SessionPhase::GameOver.as_str());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_costs_a_life() {
        let (handle, _task) = spawn_session(Game::single_player(GameConfig::default(), 9));
        settle().await;

        advance(Duration::from_millis(11_999)).await;
        settle().await;
        assert_eq!(handle.snapshot().await.unwrap().lives, 3);

        advance(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(handle.snapshot().await.unwrap().lives, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_placement_restarts_countdown() {
        let (handle, _task) = spawn_session(Game::single_player(GameConfig::default(), 9));
        settle().await;

        advance(Duration::from_millis(8_000)).await;
        settle().await;

        // Find any legal spot for the current piece.
        let mut placed = false;
        'outer: for row in 0..5 {
            for col in 0..5 {
                if handle.place(col, row).await.unwrap().is_placed() {
                    placed = true;
                    break 'outer;
                }
            }
        }
        assert!(placed);

        // The old deadline passes without effect.
        advance(Duration::from_millis(8_000)).await;
        settle().await;
        assert_eq!(handle.snapshot().await.unwrap().lives, 3);

        advance(Duration::from_millis(4_001)).await;
        settle().await;
        assert_eq!(handle.snapshot().await.unwrap().lives, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_runs_out_of_lives() {
        let mut game = Game::single_player(GameConfig::default(), 9);
        let (listener, mut events) = ChannelListener::channel();
        game.subscribe(listener);
        let (handle, _task) = spawn_session(game);
        settle().await;

        for _ in 0..4 {
            advance(Duration::from_millis(12_001)).await;
            settle().await;
        }
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.lives, -1);
        assert!(!snap.playable());

        let mut over = 0;
        while let Ok(e) = events.try_recv() {
            if let SessionEvent::Game(GameEvent::GameOver { .. }) = e {
                over += 1;
            }
        }
        assert_eq!(over, 1);

        // No timer left behind.
        advance(Duration::from_millis(60_000)).await;
        settle().await;
        assert_eq!(handle.snapshot().await.unwrap().lives, -1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_session_waits_for_pieces() {
        let config = GameConfig::default();
        let game = Game::new(config, RemotePieceQueue::new(config.prefetch), NoTelemetry);
        let (handle, _task) = spawn_session(game);

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::AwaitingPieces.as_str());

        // Countdown is not running yet.
        advance(Duration::from_millis(30_000)).await;
        settle().await;
        assert_eq!(handle.snapshot().await.unwrap().lives, 3);

        for id in 0..5 {
            handle.supply_piece(id).unwrap();
        }
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::Running.as_str());
        assert_eq!(snap.current.unwrap().name, "Line");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_ends_session() {
        let (handle, task) = spawn_session(Game::single_player(GameConfig::default(), 1));
        settle().await;
        drop(handle);
        let last = task.await.unwrap();
        assert_eq!(last.phase, SessionPhase::GameOver.as_str());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_session_reports_error() {
        let (handle, task) = spawn_session(Game::single_player(GameConfig::default(), 1));
        handle.shutdown().unwrap();
        task.await.unwrap();
        assert_eq!(handle.rotate(), Err(EngineError::SessionClosed));
        assert_eq!(handle.snapshot().await, Err(EngineError::SessionClosed));
    }
}
