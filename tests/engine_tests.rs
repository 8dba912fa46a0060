//! Engine integration tests - a full single-player session through the facade

use std::sync::{Arc, Mutex};

use tetrecs::core::{GamePiece, Grid};
use tetrecs::engine::{
    spawn_session, ChannelListener, Game, GameConfig, GameListener, PlacementOutcome,
    SessionEvent, TimerConfig,
};
use tetrecs::types::{GameEvent, GridCoordinate, SessionPhase};
use tokio::time::{advance, Duration};

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Counts callbacks per kind
#[derive(Clone, Default)]
struct Counter(Arc<Mutex<[usize; 4]>>);

impl GameListener for Counter {
    fn next_piece(&mut self, _c: &GamePiece, _n: &GamePiece) {
        self.0.lock().unwrap()[0] += 1;
    }
    fn lines_cleared(&mut self, _blocks: &[GridCoordinate]) {
        self.0.lock().unwrap()[1] += 1;
    }
    fn timer_reset(&mut self, _delay_ms: u32) {
        self.0.lock().unwrap()[2] += 1;
    }
    fn game_event(&mut self, _event: &GameEvent) {
        self.0.lock().unwrap()[3] += 1;
    }
}

/// Play the current piece at the first legal centre, scanning row-major
fn place_anywhere(game: &mut Game) -> Option<(i32, i32)> {
    for row in 0..game.grid().rows() as i32 {
        for col in 0..game.grid().cols() as i32 {
            if game.block_clicked(col, row).is_placed() {
                return Some((col, row));
            }
        }
    }
    None
}

#[test]
fn test_listeners_see_start() {
    let counter = Counter::default();
    let mut game = Game::single_player(GameConfig::default(), 5);
    game.subscribe(counter.clone());
    game.start();
    let counts = *counter.0.lock().unwrap();
    assert_eq!(counts[0], 1, "one next-piece notification at start");
    assert_eq!(counts[2], 1, "one timer reset at start");
}

#[test]
fn test_score_never_decreases_over_a_game() {
    let mut game = Game::single_player(GameConfig::default(), 31337);
    game.start();
    let mut last_score = 0;
    for _ in 0..200 {
        if game.is_over() {
            break;
        }
        if place_anywhere(&mut game).is_none() {
            // No legal spot: let the countdown take a life.
            let g = game.countdown().generation();
            assert!(game.timer_expired(g));
        }
        assert!(game.score() >= last_score);
        assert!(game.multiplier() >= 1);
        assert_eq!(game.level(), game.score() / 1000);
        last_score = game.score();
    }
}

#[test]
fn test_custom_grid_and_lives() {
    let config = GameConfig {
        cols: 7,
        rows: 4,
        starting_lives: 1,
        ..GameConfig::default()
    };
    let mut game = Game::single_player(config, 3);
    game.start();
    assert_eq!(game.grid().cols(), 7);
    assert_eq!(game.grid().rows(), 4);

    let g = game.countdown().generation();
    game.timer_expired(g);
    assert_eq!(game.lives(), 0);
    let g = game.countdown().generation();
    game.timer_expired(g);
    assert_eq!(game.lives(), -1);
    assert_eq!(game.phase(), SessionPhase::GameOver);
}

#[test]
fn test_snapshot_serializes() {
    let mut game = Game::single_player(GameConfig::default(), 8);
    game.start();
    let snap = game.snapshot();
    let json = serde_json::to_string(&snap).unwrap();
    assert!(json.contains("\"phase\":\"running\""));
    assert_eq!(snap.cells.len(), 25);
    assert_eq!(snap.timer_delay_ms, 12_000);
    assert_eq!(Grid::new(5, 5).cells(), snap.cells.as_slice());
}

#[test]
fn test_legacy_timer() {
    let mut game = Game::single_player(GameConfig::legacy(), 8);
    game.start();
    assert_eq!(game.countdown().delay_ms(), 2_000);
}

#[test]
fn test_delay_floor() {
    let timer = TimerConfig {
        base_ms: 2_000,
        step_ms: 500,
        min_ms: 500,
    };
    assert_eq!(timer.delay_ms(0), 2_000);
    assert_eq!(timer.delay_ms(3), 500);
    assert_eq!(timer.delay_ms(40), 500);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_runs_out_three_then_terminal() {
    let mut game = Game::single_player(GameConfig::default(), 77);
    let (listener, mut events) = ChannelListener::channel();
    game.subscribe(listener);
    let (handle, task) = spawn_session(game);
    settle().await;

    let mut lives = Vec::new();
    for _ in 0..4 {
        advance(Duration::from_millis(12_001)).await;
        settle().await;
        lives.push(handle.snapshot().await.unwrap().lives);
    }
    assert_eq!(lives, vec![2, 1, 0, -1]);

    let mut resets = 0;
    let mut game_over = false;
    while let Ok(e) = events.try_recv() {
        match e {
            SessionEvent::TimerReset { delay_ms } => {
                assert_eq!(delay_ms, 12_000);
                resets += 1;
            }
            SessionEvent::Game(GameEvent::GameOver { .. }) => game_over = true,
            _ => {}
        }
    }
    // Start plus three life losses.
    assert_eq!(resets, 4);
    assert!(game_over);

    // Input after game over does nothing.
    assert_eq!(handle.place(2, 2).await.unwrap(), PlacementOutcome::Inactive);

    handle.shutdown().unwrap();
    let last = task.await.unwrap();
    assert_eq!(last.lives, -1);
}
