//! Peer telemetry - reports session state to the server

use std::sync::Arc;

use tracing::{debug, warn};

use tetrecs_core::Grid;
use tetrecs_engine::Telemetry;

use crate::channel::MessageChannel;
use crate::protocol::OutboundMessage;

/// [`Telemetry`] that turns every report into a wire message
#[derive(Clone)]
pub struct PeerTelemetry {
    channel: Arc<dyn MessageChannel>,
}

impl PeerTelemetry {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Self {
        Self { channel }
    }

    fn send(&self, message: OutboundMessage) {
        let line = message.to_string();
        debug!(message = %line, "sending");
        if let Err(err) = self.channel.send(&line) {
            warn!(%err, message = %line, "send failed");
        }
    }
}

impl Telemetry for PeerTelemetry {
    fn request_piece(&mut self) {
        self.send(OutboundMessage::PieceRequest);
    }

    fn lives_changed(&mut self, lives: i32) {
        self.send(OutboundMessage::Lives(lives));
    }

    fn died(&mut self) {
        self.send(OutboundMessage::Die);
    }

    fn board_changed(&mut self, grid: &Grid, score: u32) {
        self.send(OutboundMessage::Board(grid.flattened()));
        self.send(OutboundMessage::Score(score));
    }
}

impl std::fmt::Debug for PeerTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerTelemetry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryChannel;

    #[tokio::test]
    async fn test_reports_become_messages() {
        let (local, server) = MemoryChannel::pair();
        let mut rx = server.subscribe();
        let mut telemetry = PeerTelemetry::new(Arc::new(local));

        let mut grid = Grid::new(2, 2);
        grid.set(0, 1, 5);

        telemetry.request_piece();
        telemetry.lives_changed(1);
        telemetry.board_changed(&grid, 70);
        telemetry.died();

        let mut seen = Vec::new();
        while let Ok(m) = rx.try_recv() {
            seen.push(m);
        }
        assert_eq!(
            seen,
            vec!["PIECE", "LIVES 1", "BOARD 0 0 5 0", "SCORE 70", "DIE"]
        );
    }
}
