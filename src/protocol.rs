//! Wire messages exchanged with clients.
//!
//! Both directions are JSON objects tagged by an `action` field with
//! camelCase names, e.g. `{"action":"joinSession","sessionId":"a1b2c3"}`.

use crate::error::CoordinatorError;
use crate::games::tictactoe::{Board, Mark};
use crate::session::{GameStatus, Scores, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

/// Command sent by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Open a new session with the sender as X.
    CreateSession,
    /// Join an existing session as O.
    #[serde(rename_all = "camelCase")]
    JoinSession {
        /// Session to join.
        session_id: SessionId,
    },
    /// Place the sender's mark.
    #[serde(rename_all = "camelCase")]
    MakeMove {
        /// Session the sender believes it is in.
        #[serde(default)]
        session_id: Option<SessionId>,
        /// Target cell, kept raw so that bad values become invalid moves.
        #[serde(default)]
        cell_index: Value,
    },
    /// Start a new game in the sender's session.
    #[serde(rename_all = "camelCase")]
    ResetGame {
        /// Session the sender believes it is in.
        #[serde(default)]
        session_id: Option<SessionId>,
    },
    /// Leave the sender's session.
    #[serde(rename_all = "camelCase")]
    QuitSession {
        /// Session the sender believes it is in.
        #[serde(default)]
        session_id: Option<SessionId>,
    },
}

impl Command {
    /// Parses one inbound text message.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn parse(text: &str) -> Result<Self, CoordinatorError> {
        serde_json::from_str(text).map_err(|e| CoordinatorError::Malformed {
            detail: e.to_string(),
        })
    }
}

/// Interprets a raw `cellIndex` value as a board index.
///
/// Accepts non-negative integers, including integral floats such as `4.0`.
/// Range checking against the board is left to the session.
pub fn cell_index(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    value
        .as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
        .map(|f| f as usize)
}

/// Full game state, broadcast identically to every participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Nine cells, `""`, `"X"` or `"O"`.
    pub board: Board,
    /// Mark to move.
    pub current_player: Mark,
    /// `waiting`, `active`, `won` or `draw`.
    pub game_status: GameStatus,
    /// Winner, present only when won.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_player: Option<Mark>,
    /// Cumulative scores for the session.
    pub scores: Scores,
}

/// Listing entry for one live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session ID.
    pub session_id: SessionId,
    /// Number of participants (0-2).
    pub players: usize,
    /// Status of the current game.
    pub game_status: GameStatus,
    /// Cumulative scores.
    pub scores: Scores,
}

/// Message pushed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Notification {
    /// Reply to `createSession`.
    #[serde(rename_all = "camelCase")]
    SessionCreated {
        /// New session ID.
        session_id: SessionId,
    },
    /// Reply to a successful `joinSession`.
    #[serde(rename_all = "camelCase")]
    SessionJoined {
        /// Joined session ID.
        session_id: SessionId,
    },
    /// Reply to `joinSession` naming no live session.
    #[serde(rename_all = "camelCase")]
    SessionNotFound {
        /// The requested ID.
        session_id: SessionId,
    },
    /// Sent to the creator when the second player arrives.
    #[serde(rename_all = "camelCase")]
    OpponentJoined {
        /// Session ID.
        session_id: SessionId,
    },
    /// Sent to the remaining player when the other one leaves.
    #[serde(rename_all = "camelCase")]
    OpponentLeft {
        /// Session ID.
        session_id: SessionId,
    },
    /// Sent to both players when the first game begins.
    #[serde(rename_all = "camelCase")]
    GameStart {
        /// The recipient's own mark.
        player_type: Mark,
        /// Mark to move first.
        current_player: Mark,
    },
    /// Full state broadcast.
    GameStateUpdate(GameSnapshot),
    /// A move was refused; nothing changed.
    InvalidMove {
        /// Human-readable reason.
        message: String,
    },
    /// A command failed; nothing changed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl Notification {
    /// Notification reporting `err` to the connection that caused it.
    pub fn from_error(err: &CoordinatorError) -> Self {
        match err {
            CoordinatorError::SessionNotFound {
                session_id: Some(session_id),
            } => Notification::SessionNotFound {
                session_id: session_id.clone(),
            },
            CoordinatorError::InvalidMove { reason } => Notification::InvalidMove {
                message: reason.to_string(),
            },
            other => Notification::Error {
                message: other.to_string(),
            },
        }
    }

    /// Serialises to the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
