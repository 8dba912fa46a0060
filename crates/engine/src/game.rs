//! Game state module - one player's session
//!
//! Ties together the grid, the piece source, scoring, the countdown and the
//! listener registry. Every method is synchronous and non-blocking; the
//! [`session`](crate::session) actor is what serializes calls and turns
//! countdown expiries into [`Game::timer_expired`] calls.
//!
//! Lifecycle: `Idle -> (AwaitingPieces) -> Running -> GameOver`.

use tracing::{debug, info, warn};

use tetrecs_core::{calculate_level, calculate_score, GamePiece, GameSnapshot, Grid, PieceSnapshot};
use tetrecs_types::{GameAction, GameEvent, GridCoordinate, SessionPhase, TERMINAL_LIVES};

use crate::config::GameConfig;
use crate::error::EngineError;
use crate::listener::{GameListener, Listeners};
use crate::source::{LocalPieces, PieceSource, OPENING_PIECES};
use crate::telemetry::{NoTelemetry, Telemetry};
use crate::timer::Countdown;

/// Summary of one line clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearSummary {
    pub lines: u32,
    pub blocks: u32,
    pub score_delta: u32,
}

/// What a click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// The piece was written; `cleared` is set when lines were cleared
    Placed { cleared: Option<ClearSummary> },
    /// The footprint conflicts with the grid or its edges
    Rejected,
    /// The piece fits but no replacement piece is buffered yet
    Starved,
    /// The session is not running
    Inactive,
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::Placed { .. })
    }
}

/// Complete game session state
pub struct Game {
    config: GameConfig,
    grid: Grid,
    current: Option<GamePiece>,
    next: Option<GamePiece>,
    score: u32,
    multiplier: u32,
    level: u32,
    lives: i32,
    phase: SessionPhase,
    countdown: Countdown,
    source: Box<dyn PieceSource>,
    telemetry: Box<dyn Telemetry>,
    listeners: Listeners,
}

impl Game {
    pub fn new(
        config: GameConfig,
        source: impl PieceSource + 'static,
        telemetry: impl Telemetry + 'static,
    ) -> Self {
        let config = config.sanitized();
        Self {
            grid: Grid::new(config.cols, config.rows),
            current: None,
            next: None,
            score: 0,
            multiplier: 1,
            level: 0,
            lives: config.starting_lives,
            phase: SessionPhase::Idle,
            countdown: Countdown::default(),
            source: Box::new(source),
            telemetry: Box::new(telemetry),
            listeners: Listeners::new(),
            config,
        }
    }

    /// Local single-player game with a seeded piece sequence
    pub fn single_player(config: GameConfig, seed: u32) -> Self {
        Self::new(config, LocalPieces::new(seed), NoTelemetry)
    }

    /// Register a listener; do this before [`Game::start`]
    pub fn subscribe(&mut self, listener: impl GameListener + 'static) {
        self.listeners.subscribe(listener);
    }

    /// Start the session
    ///
    /// A remote source is asked for its prefetch first; the pieces are
    /// dealt and the countdown armed once they have all arrived.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Idle {
            return;
        }
        info!(
            cols = self.config.cols,
            rows = self.config.rows,
            lives = self.lives,
            "starting game"
        );
        for _ in 0..self.source.prefetch() {
            self.telemetry.request_piece();
        }
        if self.source.is_ready() {
            self.bootstrap();
        } else {
            self.phase = SessionPhase::AwaitingPieces;
            debug!(prefetch = self.source.prefetch(), "waiting for pieces");
        }
    }

    fn bootstrap(&mut self) {
        if self
            .source
            .available()
            .is_some_and(|n| n < OPENING_PIECES)
        {
            debug!("opening pieces not buffered yet");
            return;
        }
        let first = match self.spawn_piece() {
            Ok(piece) => piece,
            Err(err) => {
                warn!(%err, "cannot deal opening pieces");
                return;
            }
        };
        self.next = Some(first);
        if let Err(err) = self.advance_piece() {
            warn!(%err, "cannot deal opening pieces");
            self.next = None;
            return;
        }
        self.phase = SessionPhase::Running;
        self.arm_timer();
        info!("game running");
    }

    /// Accept a piece id from the peer
    pub fn supply_piece(&mut self, id: i64) -> Result<(), EngineError> {
        self.source.offer(id)?;
        if self.phase == SessionPhase::AwaitingPieces && self.source.is_ready() {
            self.bootstrap();
        }
        Ok(())
    }

    fn spawn_piece(&mut self) -> Result<GamePiece, EngineError> {
        if self.source.requests_upstream() {
            self.telemetry.request_piece();
        }
        self.source.draw()
    }

    /// Advance: next becomes current and a fresh piece becomes next
    ///
    /// Leaves the pair untouched if no piece can be drawn.
    fn advance_piece(&mut self) -> Result<(), EngineError> {
        let fresh = self.spawn_piece()?;
        self.current = self.next.take();
        self.next = Some(fresh);
        debug!(current = ?self.current.map(|p| p.kind()), next = ?fresh.kind(), "next piece");
        self.notify_next_piece();
        Ok(())
    }

    fn notify_next_piece(&mut self) {
        if let (Some(current), Some(next)) = (self.current, self.next) {
            self.listeners.next_piece(&current, &next);
        }
    }

    fn arm_timer(&mut self) {
        let delay_ms = self.timer_delay_ms();
        self.countdown.arm(delay_ms);
        self.listeners.timer_reset(delay_ms);
    }

    /// Countdown for the current level
    pub fn timer_delay_ms(&self) -> u32 {
        self.config.timer.delay_ms(self.level)
    }

    /// Play the current piece centred on (col, row)
    pub fn block_clicked(&mut self, col: i32, row: i32) -> PlacementOutcome {
        if self.phase != SessionPhase::Running {
            return PlacementOutcome::Inactive;
        }
        let Some(current) = self.current else {
            return PlacementOutcome::Inactive;
        };

        if !self.grid.can_play_piece(&current, col, row) {
            debug!(col, row, piece = %current, "placement rejected");
            self.listeners
                .game_event(GameEvent::PlacementRejected { x: col, y: row });
            return PlacementOutcome::Rejected;
        }

        if !self.source.can_draw() {
            warn!(col, row, "piece queue empty, placement deferred");
            self.telemetry.request_piece();
            return PlacementOutcome::Starved;
        }

        self.grid.play_piece(&current, col, row);
        debug!(col, row, piece = %current, "piece placed");
        self.listeners.game_event(GameEvent::PiecePlaced {
            kind: current.kind(),
            x: col,
            y: row,
        });

        if let Err(err) = self.advance_piece() {
            warn!(%err, "could not advance after placement");
        }
        self.arm_timer();
        let cleared = self.after_piece();
        self.telemetry.board_changed(&self.grid, self.score);

        PlacementOutcome::Placed { cleared }
    }

    /// Clear full rows and columns and score them
    fn after_piece(&mut self) -> Option<ClearSummary> {
        let scan = self.grid.scan_full_lines();
        if scan.is_empty() {
            self.multiplier = 1;
            return None;
        }

        let blocks: Vec<GridCoordinate> = scan.blocks.iter().copied().collect();
        self.listeners.lines_cleared(&blocks);
        self.grid.clear_blocks(&blocks);

        let lines = scan.lines;
        let block_count = scan.block_count();
        let score_delta = calculate_score(lines, block_count, self.multiplier);
        self.score = self.score.saturating_add(score_delta);
        self.multiplier += 1;
        debug!(lines, blocks = block_count, score_delta, score = self.score, "lines cleared");

        let old_level = self.level;
        self.level = calculate_level(self.score);
        if self.level != old_level {
            info!(level = self.level, "level up");
            self.listeners
                .game_event(GameEvent::LevelUp { level: self.level });
        }
        self.listeners.game_event(GameEvent::LinesCleared {
            lines,
            blocks: block_count,
            score_delta,
        });

        self.arm_timer();

        Some(ClearSummary {
            lines,
            blocks: block_count,
            score_delta,
        })
    }

    /// Apply a countdown expiry armed as `generation`
    ///
    /// Returns false (and changes nothing) for stale generations and for
    /// sessions that are not running.
    pub fn timer_expired(&mut self, generation: u64) -> bool {
        if self.phase != SessionPhase::Running || !self.countdown.accepts(generation) {
            debug!(generation, "ignoring stale countdown");
            return false;
        }

        if self.lives > 0 {
            self.lives -= 1;
            info!(lives = self.lives, "countdown expired, life lost");
            self.telemetry.lives_changed(self.lives);
            self.listeners
                .game_event(GameEvent::LifeLost { lives: self.lives });
            if self.source.can_draw() {
                if let Err(err) = self.advance_piece() {
                    warn!(%err, "could not replace forfeited piece");
                }
            } else {
                warn!("piece queue empty, keeping current piece");
                self.telemetry.request_piece();
            }
            self.multiplier = 1;
            self.arm_timer();
        } else {
            self.lives = TERMINAL_LIVES;
            self.countdown.disarm();
            self.phase = SessionPhase::GameOver;
            info!(score = self.score, "game over");
            self.telemetry.died();
            self.listeners
                .game_event(GameEvent::GameOver { score: self.score });
        }
        true
    }

    /// Rotate the current piece clockwise
    pub fn rotate_current_piece(&mut self) -> bool {
        self.rotate_by(1)
    }

    /// Rotate the current piece counter-clockwise
    pub fn rotate_current_piece_left(&mut self) -> bool {
        self.rotate_by(3)
    }

    fn rotate_by(&mut self, quarter_turns: usize) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        current.rotate_by(quarter_turns);
        self.listeners.game_event(GameEvent::PieceRotated);
        self.notify_next_piece();
        true
    }

    /// Exchange the current and next piece
    pub fn swap_current_piece(&mut self) -> bool {
        if self.phase != SessionPhase::Running || self.current.is_none() || self.next.is_none() {
            return false;
        }
        std::mem::swap(&mut self.current, &mut self.next);
        debug!("swapped current and next piece");
        self.listeners.game_event(GameEvent::PieceSwapped);
        self.notify_next_piece();
        true
    }

    /// Apply a player action
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::Click { col, row } => self.block_clicked(col, row).is_placed(),
            GameAction::Rotate => self.rotate_current_piece(),
            GameAction::RotateLeft => self.rotate_current_piece_left(),
            GameAction::Swap => self.swap_current_piece(),
        }
    }

    /// Tear the session down
    ///
    /// Disarms the countdown for good. A player leaving before running out
    /// of lives is reported as dead to peers.
    pub fn shutdown(&mut self) {
        if self.phase == SessionPhase::GameOver {
            return;
        }
        let was_playing = self.phase != SessionPhase::Idle;
        self.countdown.disarm();
        self.phase = SessionPhase::GameOver;
        if was_playing {
            self.telemetry.died();
        }
        info!(score = self.score, "game shut down");
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_piece(&self) -> Option<&GamePiece> {
        self.current.as_ref()
    }

    pub fn next_piece(&self) -> Option<&GamePiece> {
        self.next.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Pieces buffered in the source, `None` when unlimited
    pub fn pieces_available(&self) -> Option<usize> {
        self.source.available()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            cols: self.grid.cols(),
            rows: self.grid.rows(),
            cells: self.grid.cells().to_vec(),
            current: self.current.as_ref().map(PieceSnapshot::from),
            next: self.next.as_ref().map(PieceSnapshot::from),
            score: self.score,
            multiplier: self.multiplier,
            level: self.level,
            lives: self.lives,
            phase: self.phase.as_str().to_string(),
            timer_delay_ms: self.timer_delay_ms(),
        }
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    #[cfg(test)]
    pub(crate) fn set_current(&mut self, piece: GamePiece) {
        self.current = Some(piece);
    }

    #[cfg(test)]
    pub(crate) fn set_score(&mut self, score: u32) {
        self.score = score;
        self.level = calculate_level(score);
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("multiplier", &self.multiplier)
            .field("level", &self.level)
            .field("lives", &self.lives)
            .field("current", &self.current)
            .field("next", &self.next)
            .field("countdown", &self.countdown)
            .field("listeners", &self.listeners)
            .finish()
    }
}
