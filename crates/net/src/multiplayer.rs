//! Multiplayer session
//!
//! Wires a [`Game`] fed by the server to a [`MessageChannel`]:
//!
//! - `PIECE <id>` goes to the session actor, which serializes it with player
//!   input and countdown expiries.
//! - Everything else updates the shared [`OpponentTable`] and is forwarded as
//!   a [`PeerUpdate`].
//!
//! The router subscribes before the session starts, so no piece sent in
//! reply to the opening requests can be missed.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tetrecs_engine::{
    spawn_session, Game, GameConfig, GameSnapshot, RemotePieceQueue, SessionHandle,
};

use crate::channel::MessageChannel;
use crate::peer::PeerTelemetry;
use crate::protocol::{InboundMessage, OutboundMessage, ProtocolError};
use crate::opponents::{OpponentTable, PeerUpdate};

/// Game drawing its pieces from the server and reporting back to it
pub fn multiplayer_game(config: GameConfig, channel: Arc<dyn MessageChannel>) -> Game {
    let config = config.sanitized();
    Game::new(
        config,
        RemotePieceQueue::new(config.prefetch),
        PeerTelemetry::new(channel),
    )
}

/// A running networked session
pub struct MultiplayerSession {
    session: SessionHandle,
    opponents: Arc<RwLock<OpponentTable>>,
    updates: mpsc::UnboundedReceiver<PeerUpdate>,
    router: JoinHandle<()>,
    game: JoinHandle<GameSnapshot>,
}

impl MultiplayerSession {
    /// Start `game` against `channel`
    ///
    /// Register listeners on `game` before calling this. Must run inside a
    /// tokio runtime.
    pub fn start(game: Game, channel: Arc<dyn MessageChannel>) -> Self {
        let (cols, rows) = (game.config().cols, game.config().rows);
        let inbound = channel.subscribe();
        let opponents = Arc::new(RwLock::new(OpponentTable::new(cols, rows)));
        let (updates_tx, updates) = mpsc::unbounded_channel();

        let (session, game) = spawn_session(game);

        for request in [
            OutboundMessage::UsersRequest,
            OutboundMessage::NickRequest,
            OutboundMessage::ScoresRequest,
        ] {
            if let Err(err) = channel.send(&request.to_string()) {
                warn!(%err, "could not request {}", request);
            }
        }

        let router = tokio::spawn(route_inbound(
            inbound,
            channel,
            session.clone(),
            opponents.clone(),
            updates_tx,
        ));
        info!("multiplayer session started");

        Self {
            session,
            opponents,
            updates,
            router,
            game,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn opponents(&self) -> Arc<RwLock<OpponentTable>> {
        self.opponents.clone()
    }

    /// Next opponent-side change, `None` once the channel is gone
    pub async fn next_update(&mut self) -> Option<PeerUpdate> {
        self.updates.recv().await
    }

    pub fn try_update(&mut self) -> Option<PeerUpdate> {
        self.updates.try_recv().ok()
    }

    /// Stop the session and the router, returning the final snapshot
    pub async fn shutdown(self) -> Result<GameSnapshot> {
        // The session may already be gone; its join handle still has the result.
        let _ = self.session.shutdown();
        let snapshot = self.game.await?;
        self.router.abort();
        info!(score = snapshot.score, "multiplayer session ended");
        Ok(snapshot)
    }
}

impl std::fmt::Debug for MultiplayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplayerSession")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

async fn route_inbound(
    mut inbound: broadcast::Receiver<String>,
    channel: Arc<dyn MessageChannel>,
    session: SessionHandle,
    opponents: Arc<RwLock<OpponentTable>>,
    updates: mpsc::UnboundedSender<PeerUpdate>,
) {
    loop {
        let line = match inbound.recv().await {
            Ok(line) => line,
            Err(RecvError::Lagged(skipped)) => {
                // Any of the dropped lines may have been a piece; ask again
                // for each so the queue depth is restored.
                warn!(skipped, "router fell behind, messages dropped");
                let request = OutboundMessage::PieceRequest.to_string();
                for _ in 0..skipped {
                    if let Err(err) = channel.send(&request) {
                        warn!(%err, "could not re-request pieces");
                        break;
                    }
                }
                continue;
            }
            Err(RecvError::Closed) => {
                info!("message channel closed");
                break;
            }
        };

        let msg = match InboundMessage::parse(&line) {
            Ok(msg) => msg,
            Err(ProtocolError::UnknownCommand(keyword)) => {
                debug!(%keyword, "ignoring message");
                continue;
            }
            Err(err) => {
                warn!(%err, %line, "malformed message");
                continue;
            }
        };
        debug!(keyword = msg.keyword(), "received");

        if let InboundMessage::Piece(id) = msg {
            if session.supply_piece(id).is_err() {
                debug!("session closed, router stopping");
                break;
            }
            continue;
        }

        let applied = opponents.write().await.apply(&msg);
        match applied {
            Ok(Some(update)) => {
                let _ = updates.send(update);
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "could not apply {}", msg.keyword()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MemoryChannel, CHANNEL_BACKLOG};
    use tetrecs_types::SessionPhase;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(rx: &mut broadcast::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(m) = rx.try_recv() {
            out.push(m);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requests_pieces_and_roster() {
        let (client, server) = MemoryChannel::pair();
        let mut from_client = server.subscribe();
        let channel: Arc<dyn MessageChannel> = Arc::new(client);

        let mp = MultiplayerSession::start(
            multiplayer_game(GameConfig::default(), channel.clone()),
            channel,
        );
        settle().await;

        let sent = drain(&mut from_client);
        assert_eq!(sent.iter().filter(|m| *m == "PIECE").count(), 5);
        assert!(sent.contains(&"USERS".to_string()));
        assert!(sent.contains(&"NICK".to_string()));
        assert!(sent.contains(&"SCORES".to_string()));

        let snap = mp.session().snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::AwaitingPieces.as_str());
        mp.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pieces_from_server_bootstrap_the_game() {
        let (client, server) = MemoryChannel::pair();
        let channel: Arc<dyn MessageChannel> = Arc::new(client);
        let mp = MultiplayerSession::start(
            multiplayer_game(GameConfig::default(), channel.clone()),
            channel,
        );

        for id in [3, 0, 2, 2, 2] {
            server.send(&format!("PIECE {}", id)).unwrap();
        }
        settle().await;

        let snap = mp.session().snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::Running.as_str());
        assert_eq!(snap.current.unwrap().name, "Dot");
        assert_eq!(snap.next.unwrap().name, "Line");
        mp.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_opponent_messages_update_table() {
        let (client, server) = MemoryChannel::pair();
        let channel: Arc<dyn MessageChannel> = Arc::new(client);
        let mut mp = MultiplayerSession::start(
            multiplayer_game(GameConfig::default(), channel.clone()),
            channel,
        );

        server.send("USERS alice\nbob").unwrap();
        server.send("SCORES alice:40:3\nbob:10:DEAD").unwrap();
        server.send("BOGUS").unwrap();
        server.send("MSG alice:hello").unwrap();

        assert_eq!(
            mp.next_update().await,
            Some(PeerUpdate::Roster(vec!["alice".into(), "bob".into()]))
        );
        assert_eq!(
            mp.next_update().await,
            Some(PeerUpdate::Scores(vec!["alice".into(), "bob".into()]))
        );
        assert_eq!(
            mp.next_update().await,
            Some(PeerUpdate::Chat {
                player: "alice".into(),
                text: "hello".into()
            })
        );

        let table = mp.opponents();
        let table = table.read().await;
        assert_eq!(table.score("alice"), Some(40));
        assert!(table.is_dead("bob"));
        drop(table);
        mp.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_lagging_router_re_requests_dropped_pieces() {
        let (client, server) = MemoryChannel::pair();
        let mut from_client = server.subscribe();
        let channel: Arc<dyn MessageChannel> = Arc::new(client);
        let mp = MultiplayerSession::start(
            multiplayer_game(GameConfig::default(), channel.clone()),
            channel,
        );
        settle().await;
        drain(&mut from_client);

        // Overrun the backlog before the router gets to run.
        let overflow = 7;
        for _ in 0..CHANNEL_BACKLOG + overflow {
            server.send("PIECE 3").unwrap();
        }
        for _ in 0..8 {
            settle().await;
        }

        let snap = mp.session().snapshot().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::Running.as_str());

        let sent = drain(&mut from_client);
        let requests = sent.iter().filter(|m| *m == "PIECE").count();
        // One per dropped line, plus the top-ups for the opening draws.
        assert_eq!(requests, overflow + 2);
        mp.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_reports_death() {
        let (client, server) = MemoryChannel::pair();
        let mut from_client = server.subscribe();
        let channel: Arc<dyn MessageChannel> = Arc::new(client);
        let mp = MultiplayerSession::start(
            multiplayer_game(GameConfig::default(), channel.clone()),
            channel,
        );
        settle().await;
        drain(&mut from_client);

        let snap = mp.shutdown().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::GameOver.as_str());
        assert_eq!(drain(&mut from_client), vec!["DIE".to_string()]);
    }
}
