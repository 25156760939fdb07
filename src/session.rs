//! Per-session game state and its transitions.
//!
//! A [`Session`] knows nothing about transports or other sessions. The
//! coordinator serialises access to it and turns its results into
//! notifications.

use crate::error::{CoordinatorError, MoveRejection};
use crate::games::tictactoe::{Board, Mark, evaluate};
use crate::protocol::{GameSnapshot, SessionSummary};
use derive_getters::Getters;
use derive_more::Display;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Ephemeral identity of one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("conn-{_0}")]
pub struct ConnectionId(pub u64);

/// Lifecycle status of the current game in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Only the creator is present.
    Waiting,
    /// Both players present, moves accepted.
    Active,
    /// A line was completed by the given mark.
    Won(Mark),
    /// Board filled with no winner.
    Draw,
}

impl GameStatus {
    /// Wire label: `waiting`, `active`, `won` or `draw`.
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Won(_) => "won",
            GameStatus::Draw => "draw",
        }
    }

    /// Winning mark, only present when won.
    pub fn winner(self) -> Option<Mark> {
        match self {
            GameStatus::Won(mark) => Some(mark),
            _ => None,
        }
    }

    /// True for won or draw.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Won(_) | GameStatus::Draw)
    }
}

impl Serialize for GameStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Cumulative results across every game played in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scores {
    /// Games won by X.
    #[serde(rename = "X")]
    pub x: u32,
    /// Games won by O.
    #[serde(rename = "O")]
    pub o: u32,
    /// Drawn games.
    pub draws: u32,
}

impl Scores {
    fn record_win(&mut self, mark: Mark) {
        match mark {
            Mark::X => self.x += 1,
            Mark::O => self.o += 1,
        }
    }
}

/// One paired match between two connections.
#[derive(Debug, Clone, Getters)]
pub struct Session {
    /// Session ID.
    id: SessionId,
    /// The board of the current game.
    board: Board,
    /// Participants in join order; the first is X.
    participants: Vec<ConnectionId>,
    /// Mark assigned to each participant.
    #[getter(skip)]
    marks: HashMap<ConnectionId, Mark>,
    /// Status of the current game.
    status: GameStatus,
    /// Mark to move; meaningful only while active.
    current_turn: Mark,
    /// Results across games.
    scores: Scores,
    /// Set once the last participant has left.
    closed: bool,
}

impl Session {
    /// Creates a waiting session with `creator` as sole participant, playing X.
    #[instrument(skip_all, fields(session_id = %id, creator = %creator))]
    pub fn new(id: SessionId, creator: ConnectionId) -> Self {
        info!("Creating new game session");
        Self {
            id,
            board: Board::new(),
            participants: vec![creator],
            marks: HashMap::from([(creator, Mark::X)]),
            status: GameStatus::Waiting,
            current_turn: Mark::X,
            scores: Scores::default(),
            closed: false,
        }
    }

    /// Adds the second participant as O and starts a game.
    ///
    /// A session whose O player left mid-game takes a new O: the board is
    /// cleared and X opens, scores are kept.
    #[instrument(skip(self), fields(session_id = %self.id, connection = %conn))]
    pub fn join(&mut self, conn: ConnectionId) -> Result<Mark, CoordinatorError> {
        if self.closed {
            return Err(CoordinatorError::SessionNotFound {
                session_id: Some(self.id.clone()),
            });
        }
        if self.participants.len() >= 2 {
            warn!(players = self.participants.len(), "Session already has 2 players");
            return Err(CoordinatorError::SessionFull {
                session_id: self.id.clone(),
            });
        }
        if self.marks.values().any(|m| *m == Mark::O) {
            warn!("Remaining player holds O, no X to open");
            return Err(CoordinatorError::SessionUnavailable {
                session_id: self.id.clone(),
            });
        }

        if self.status != GameStatus::Waiting {
            debug!(status = self.status.label(), "Replacing departed O player");
            self.board.clear();
        }
        self.participants.push(conn);
        self.marks.insert(conn, Mark::O);
        self.status = GameStatus::Active;
        self.current_turn = Mark::X;
        info!(mark = "O", "Registered player, game active");
        Ok(Mark::O)
    }

    /// Checks membership and returns the caller's mark.
    pub fn mark_of(&self, conn: ConnectionId) -> Result<Mark, CoordinatorError> {
        if !self.participants.contains(&conn) {
            return Err(CoordinatorError::PlayerNotInSession);
        }
        self.marks
            .get(&conn)
            .copied()
            .ok_or(CoordinatorError::NoSymbolAssigned)
    }

    /// Applies a move for `conn` at `cell`.
    ///
    /// `cell` is `None` when the client sent something that is not an
    /// integer. On success returns the status after the move; on any error
    /// the session is unchanged.
    #[instrument(skip(self), fields(session_id = %self.id, connection = %conn))]
    pub fn play(
        &mut self,
        conn: ConnectionId,
        cell: Option<usize>,
    ) -> Result<GameStatus, CoordinatorError> {
        let mark = self.mark_of(conn)?;

        match self.status {
            GameStatus::Waiting => return Err(MoveRejection::WaitingForOpponent.into()),
            GameStatus::Won(_) | GameStatus::Draw => return Err(MoveRejection::GameOver.into()),
            GameStatus::Active => {}
        }
        if mark != self.current_turn {
            return Err(MoveRejection::NotYourTurn {
                current: self.current_turn,
            }
            .into());
        }
        let cell = cell
            .filter(|i| self.board.get(*i).is_some())
            .ok_or(MoveRejection::InvalidCell)?;
        if !self.board.place(cell, mark) {
            return Err(MoveRejection::CellTaken.into());
        }

        let outcome = evaluate(&self.board);
        if let Some(winner) = outcome.winner {
            self.status = GameStatus::Won(winner);
            self.scores.record_win(winner);
            info!(%winner, scores = ?self.scores, "Game won");
        } else if outcome.is_draw {
            self.status = GameStatus::Draw;
            self.scores.draws += 1;
            info!(scores = ?self.scores, "Game drawn");
        } else {
            self.current_turn = mark.opponent();
            debug!(cell, %mark, next = %self.current_turn, "Move accepted");
        }
        debug!(board = %self.board.display(), "Board after move");
        Ok(self.status)
    }

    /// Clears the board for a new game; X always opens. Scores are kept.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn reset(&mut self) -> Result<(), CoordinatorError> {
        if self.status == GameStatus::Waiting {
            return Err(CoordinatorError::WaitingForOpponent);
        }
        self.board.clear();
        self.status = GameStatus::Active;
        self.current_turn = Mark::X;
        info!(scores = ?self.scores, "Game reset");
        Ok(())
    }

    /// Removes `conn` from the session. Returns false if it was not a participant.
    ///
    /// The session is marked closed when nobody is left.
    #[instrument(skip(self), fields(session_id = %self.id, connection = %conn))]
    pub fn leave(&mut self, conn: ConnectionId) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| *p != conn);
        if self.participants.len() == before {
            return false;
        }
        self.marks.remove(&conn);
        if self.participants.is_empty() {
            self.closed = true;
        }
        info!(remaining = self.participants.len(), "Participant left session");
        true
    }

    /// Full state snapshot for broadcast.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.clone(),
            current_player: self.current_turn,
            game_status: self.status,
            winning_player: self.status.winner(),
            scores: self.scores,
        }
    }

    /// Short description for session listings.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            players: self.participants.len(),
            game_status: self.status,
            scores: self.scores,
        }
    }
}
