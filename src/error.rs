//! Error types for the coordinator and configuration.

use crate::games::tictactoe::Mark;
use crate::session::SessionId;
use derive_more::{Display, Error};
use tracing::instrument;

/// Why a move was refused.
///
/// Rejections leave the session untouched and are reported only to the
/// player who attempted the move, as an `invalidMove` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveRejection {
    /// The session has no opponent yet.
    #[display("Waiting for an opponent to join")]
    WaitingForOpponent,
    /// The game is won or drawn; a reset is required.
    #[display("Game already over")]
    GameOver,
    /// The other mark is to move.
    #[display("Not your turn. Current turn: Player {current}")]
    NotYourTurn {
        /// Mark whose turn it is.
        current: Mark,
    },
    /// Cell index missing, not an integer, or outside 0-8.
    #[display("Invalid cell index")]
    InvalidCell,
    /// Target cell already holds a mark.
    #[display("Cell already taken")]
    CellTaken,
}

/// Failure of a coordinator operation.
///
/// None of these mutate session state; each is reported to the requesting
/// connection only.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CoordinatorError {
    /// No live session matches, or the caller is not in any session.
    #[display("Session not found")]
    SessionNotFound {
        /// Identifier the caller asked for, when it named one.
        session_id: Option<SessionId>,
    },
    /// The caller is not a participant of the session it addressed.
    #[display("Player not in session")]
    PlayerNotInSession,
    /// The caller is a participant but holds no mark.
    #[display("Player symbol not assigned")]
    NoSymbolAssigned,
    /// The session already has two participants.
    #[display("Session {session_id} is full")]
    SessionFull {
        /// The full session.
        session_id: SessionId,
    },
    /// Only the O player remains, so the session cannot take a new O.
    #[display("Session {session_id} is not accepting players")]
    SessionUnavailable {
        /// The session that refused the join.
        session_id: SessionId,
    },
    /// The caller tried to join the session it is already in.
    #[display("Already in session {session_id}")]
    AlreadyInSession {
        /// The caller's current session.
        session_id: SessionId,
    },
    /// The operation needs both participants present.
    #[display("Waiting for an opponent to join")]
    WaitingForOpponent,
    /// Soft rejection of a move.
    #[display("{reason}")]
    InvalidMove {
        /// Why the move was refused.
        #[error(not(source))]
        reason: MoveRejection,
    },
    /// Inbound message could not be parsed as a command.
    #[display("Invalid message format")]
    Malformed {
        /// Parser detail, kept for logs only.
        detail: String,
    },
}

impl From<MoveRejection> for CoordinatorError {
    fn from(reason: MoveRejection) -> Self {
        Self::InvalidMove { reason }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            MoveRejection::NotYourTurn { current: Mark::X }.to_string(),
            "Not your turn. Current turn: Player X"
        );
        assert_eq!(MoveRejection::CellTaken.to_string(), "Cell already taken");
        assert_eq!(
            CoordinatorError::from(MoveRejection::GameOver).to_string(),
            "Game already over"
        );
    }

    #[test]
    fn test_config_error_records_location() {
        let err = ConfigError::new("bad port");
        assert_eq!(err.file, file!());
        assert!(err.to_string().starts_with("Config error: bad port at "));
    }
}
