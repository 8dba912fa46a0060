//! Protocol module - text messages exchanged with the game server
//!
//! Every message is a keyword optionally followed by a space and a payload.
//! Batch payloads (`SCORES`, `USERS`) separate their entries with `\n`.

use std::fmt;

use tetrecs_core::{Grid, GridParseError};

// ============== Session -> Server ==============

/// Messages this client sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Ask for one more piece id
    PieceRequest,
    Lives(i32),
    Die,
    /// Flattened board after a placement
    Board(String),
    Score(u32),
    ScoresRequest,
    UsersRequest,
    NickRequest,
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundMessage::PieceRequest => f.write_str("PIECE"),
            OutboundMessage::Lives(n) => write!(f, "LIVES {}", n),
            OutboundMessage::Die => f.write_str("DIE"),
            OutboundMessage::Board(board) => write!(f, "BOARD {}", board),
            OutboundMessage::Score(n) => write!(f, "SCORE {}", n),
            OutboundMessage::ScoresRequest => f.write_str("SCORES"),
            OutboundMessage::UsersRequest => f.write_str("USERS"),
            OutboundMessage::NickRequest => f.write_str("NICK"),
        }
    }
}

// ============== Server -> Session ==============

/// One entry of a `SCORES` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub player: String,
    pub score: u32,
    /// Remaining lives when reported, `None` for two-field entries and dead players
    pub lives: Option<i32>,
    pub dead: bool,
}

impl ScoreEntry {
    /// Parse `name:score`, `name:score:lives` or `name:score:DEAD`
    pub fn parse(entry: &str) -> Result<Self, ProtocolError> {
        let mut fields = entry.split(':');
        let player = fields
            .next()
            .filter(|p| !p.is_empty())
            .ok_or(ProtocolError::MissingArgument("SCORES"))?;
        let score = fields
            .next()
            .ok_or(ProtocolError::MissingArgument("SCORES"))?;
        let score = parse_number(score)?;

        let (lives, dead) = match fields.next() {
            None => (None, false),
            Some("DEAD") => (None, true),
            Some(n) => (Some(parse_number(n)?), false),
        };

        Ok(Self {
            player: player.to_string(),
            score,
            lives,
            dead,
        })
    }
}

/// Messages this client understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Piece(i64),
    Board { player: String, board: String },
    Scores(Vec<ScoreEntry>),
    Users(Vec<String>),
    Nick(String),
    Chat { player: String, text: String },
}

impl InboundMessage {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (keyword, payload) = match line.split_once(' ') {
            Some((k, p)) => (k, Some(p)),
            None => (line, None),
        };

        match keyword {
            "PIECE" => {
                let id = payload.ok_or(ProtocolError::MissingArgument("PIECE"))?;
                Ok(InboundMessage::Piece(parse_number(id.trim())?))
            }
            "BOARD" => {
                let payload = payload.ok_or(ProtocolError::MissingArgument("BOARD"))?;
                let (player, board) = payload
                    .split_once(':')
                    .ok_or(ProtocolError::MissingArgument("BOARD"))?;
                let board = board.trim();
                validate_board(board)?;
                Ok(InboundMessage::Board {
                    player: player.to_string(),
                    board: board.to_string(),
                })
            }
            "SCORES" => {
                let payload = payload.ok_or(ProtocolError::MissingArgument("SCORES"))?;
                let entries = payload
                    .split('\n')
                    .filter(|e| !e.trim().is_empty())
                    .map(|e| ScoreEntry::parse(e.trim()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(InboundMessage::Scores(entries))
            }
            "USERS" => {
                let payload = payload.unwrap_or_default();
                Ok(InboundMessage::Users(
                    payload
                        .split('\n')
                        .map(str::trim)
                        .filter(|u| !u.is_empty())
                        .map(String::from)
                        .collect(),
                ))
            }
            "NICK" => {
                let nick = payload
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or(ProtocolError::MissingArgument("NICK"))?;
                Ok(InboundMessage::Nick(nick.to_string()))
            }
            "MSG" => {
                let payload = payload.ok_or(ProtocolError::MissingArgument("MSG"))?;
                let (player, text) = payload
                    .split_once(':')
                    .ok_or(ProtocolError::MissingArgument("MSG"))?;
                Ok(InboundMessage::Chat {
                    player: player.to_string(),
                    text: text.to_string(),
                })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            InboundMessage::Piece(_) => "PIECE",
            InboundMessage::Board { .. } => "BOARD",
            InboundMessage::Scores(_) => "SCORES",
            InboundMessage::Users(_) => "USERS",
            InboundMessage::Nick(_) => "NICK",
            InboundMessage::Chat { .. } => "MSG",
        }
    }
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, ProtocolError> {
    s.parse()
        .map_err(|_| ProtocolError::InvalidNumber(s.to_string()))
}

fn validate_board(board: &str) -> Result<(), ProtocolError> {
    let tokens = board.trim().split(' ').count();
    Grid::from_flattened(tokens, 1, board)
        .map(|_| ())
        .map_err(ProtocolError::InvalidBoard)
}

/// Malformed or unrecognised inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
    InvalidBoard(GridParseError),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownCommand(k) => write!(f, "unknown command {:?}", k),
            ProtocolError::MissingArgument(k) => write!(f, "{} is missing its argument", k),
            ProtocolError::InvalidNumber(s) => write!(f, "invalid number {:?}", s),
            ProtocolError::InvalidBoard(e) => write!(f, "invalid board: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {}
