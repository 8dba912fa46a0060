//! Multiplayer plumbing
//!
//! - [`protocol`]: the text messages exchanged with the game server
//! - [`channel`]: message transports (in-memory pair, TCP lines)
//! - [`peer`]: engine telemetry that reports to the server
//! - [`opponents`]: last known boards and scores of the other players
//! - [`multiplayer`]: routes server messages into a running session

pub mod channel;
pub mod multiplayer;
pub mod opponents;
pub mod peer;
pub mod protocol;

pub use channel::{ConnectConfig, MemoryChannel, MessageChannel, TcpChannel};
pub use multiplayer::{multiplayer_game, MultiplayerSession};
pub use opponents::{Opponent, OpponentTable, PeerUpdate};
pub use peer::PeerTelemetry;
pub use protocol::{InboundMessage, OutboundMessage, ProtocolError, ScoreEntry};
