//! Opponent table - last known state of every other player
//!
//! Boards are overwritten by every `BOARD` message. Scores only ever grow: a
//! `SCORES` entry replaces the stored value when it is strictly greater, so
//! batches delivered out of order cannot roll a player back.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use tetrecs_core::Grid;

use crate::protocol::{InboundMessage, ProtocolError};

/// What one player looks like from here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub board: Grid,
    pub score: u32,
    pub lives: Option<i32>,
    pub dead: bool,
}

impl Opponent {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            board: Grid::new(cols, rows),
            score: 0,
            lives: None,
            dead: false,
        }
    }
}

/// Change applied to the table, for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerUpdate {
    Roster(Vec<String>),
    Nickname(String),
    Board { player: String },
    /// Players whose score or status changed
    Scores(Vec<String>),
    Chat { player: String, text: String },
}

#[derive(Debug, Clone)]
pub struct OpponentTable {
    cols: usize,
    rows: usize,
    nickname: Option<String>,
    players: BTreeMap<String, Opponent>,
}

impl OpponentTable {
    /// Table for boards of `cols x rows`
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            nickname: None,
            players: BTreeMap::new(),
        }
    }

    /// Fold one inbound message into the table
    ///
    /// `PIECE` belongs to the session, so it yields `Ok(None)`.
    pub fn apply(&mut self, msg: &InboundMessage) -> Result<Option<PeerUpdate>, ProtocolError> {
        match msg {
            InboundMessage::Piece(_) => Ok(None),
            InboundMessage::Users(names) => {
                for name in names {
                    self.entry(name);
                }
                debug!(players = names.len(), "roster received");
                Ok(Some(PeerUpdate::Roster(names.clone())))
            }
            InboundMessage::Nick(name) => {
                self.nickname = Some(name.clone());
                Ok(Some(PeerUpdate::Nickname(name.clone())))
            }
            InboundMessage::Board { player, board } => {
                let grid = Grid::from_flattened(self.cols, self.rows, board)
                    .map_err(ProtocolError::InvalidBoard)?;
                self.entry(player).board = grid;
                Ok(Some(PeerUpdate::Board {
                    player: player.clone(),
                }))
            }
            InboundMessage::Scores(entries) => {
                let mut changed = Vec::new();
                for e in entries {
                    let opp = self.entry(&e.player);
                    if e.dead {
                        if !opp.dead {
                            opp.dead = true;
                            opp.lives = None;
                            changed.push(e.player.clone());
                        }
                        continue;
                    }
                    let mut touched = false;
                    if e.score > opp.score {
                        opp.score = e.score;
                        touched = true;
                    }
                    if e.lives.is_some() && e.lives != opp.lives {
                        opp.lives = e.lives;
                        touched = true;
                    }
                    if touched {
                        changed.push(e.player.clone());
                    }
                }
                Ok(Some(PeerUpdate::Scores(changed)))
            }
            InboundMessage::Chat { player, text } => Ok(Some(PeerUpdate::Chat {
                player: player.clone(),
                text: text.clone(),
            })),
        }
    }

    fn entry(&mut self, player: &str) -> &mut Opponent {
        let (cols, rows) = (self.cols, self.rows);
        self.players
            .entry(player.to_string())
            .or_insert_with(|| Opponent::new(cols, rows))
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn get(&self, player: &str) -> Option<&Opponent> {
        self.players.get(player)
    }

    pub fn board(&self, player: &str) -> Option<&Grid> {
        self.players.get(player).map(|o| &o.board)
    }

    /// Flattened board as last received
    pub fn board_string(&self, player: &str) -> Option<String> {
        self.board(player).map(Grid::flattened)
    }

    pub fn score(&self, player: &str) -> Option<u32> {
        self.players.get(player).map(|o| o.score)
    }

    pub fn is_dead(&self, player: &str) -> bool {
        self.players.get(player).is_some_and(|o| o.dead)
    }

    pub fn players(&self) -> impl Iterator<Item = (&str, &Opponent)> {
        self.players.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players by score, highest first; ties by name
    pub fn leaderboard(&self) -> Vec<(String, u32)> {
        let mut rows: Vec<(String, u32)> = self
            .players
            .iter()
            .map(|(name, o)| (name.clone(), o.score))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    /// Parse `line` and apply it, logging what cannot be used
    pub fn apply_line(&mut self, line: &str) -> Option<PeerUpdate> {
        match InboundMessage::parse(line).and_then(|m| self.apply(&m)) {
            Ok(update) => update,
            Err(err) => {
                warn!(%err, "ignoring message");
                None
            }
        }
    }
}

impl Default for OpponentTable {
    fn default() -> Self {
        Self::new(tetrecs_types::DEFAULT_COLS, tetrecs_types::DEFAULT_ROWS)
    }
}
