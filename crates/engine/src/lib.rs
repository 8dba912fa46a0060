//! Game session engine
//!
//! [`Game`] is the synchronous state machine for one player: placement,
//! line clearing, scoring, lives and the countdown. It draws pieces from a
//! [`PieceSource`], reports outward through [`Telemetry`] and notifies
//! registered [`GameListener`]s.
//!
//! [`spawn_session`] runs a game on a tokio task and drives its countdown,
//! returning a [`SessionHandle`] for input.
//!
//! ```
//! use tetrecs_engine::{Game, GameConfig, SessionPhase};
//!
//! let mut game = Game::single_player(GameConfig::default(), 42);
//! game.start();
//! assert_eq!(game.phase(), SessionPhase::Running);
//! assert_eq!(game.lives(), 3);
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod listener;
pub mod session;
pub mod source;
pub mod telemetry;
pub mod timer;

pub use config::GameConfig;
pub use error::EngineError;
pub use game::{ClearSummary, Game, PlacementOutcome};
pub use listener::{ChannelListener, GameListener, Listeners, SessionEvent, TracingListener};
pub use session::{spawn_session, SessionCommand, SessionHandle};
pub use source::{LocalPieces, PieceSource, RemotePieceQueue, OPENING_PIECES};
pub use telemetry::{NoTelemetry, Telemetry};
pub use timer::Countdown;

pub use tetrecs_core::{GameSnapshot, TimerConfig};
pub use tetrecs_types::{GameAction, GameEvent, SessionPhase};
