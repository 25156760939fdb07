//! Session coordinator: the authority that pairs connections and referees games.
//!
//! The coordinator owns two tables, session ID to session and connection to
//! session ID. Each session sits behind its own mutex, so commands for one
//! session apply one at a time while different sessions proceed in parallel.
//! Table locks are only held for lookups and insertions and are never held
//! while waiting on a session lock.
//!
//! Notifications leave through an [`Outbox`]. Broadcasts are handed to it
//! while the session lock is still held, so every participant sees state
//! updates in the order the mutations happened.

use crate::error::CoordinatorError;
use crate::games::tictactoe::Mark;
use crate::protocol::{Command, Notification, SessionSummary, cell_index};
use crate::session::{ConnectionId, Session, SessionId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Shortest and longest session ID the coordinator will hand out.
pub const SESSION_ID_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 6..=32;

/// Default session ID length.
pub const DEFAULT_SESSION_ID_LENGTH: usize = 12;

/// Delivery seam between the coordinator and the transport.
///
/// Implementations must not block; delivery to a connection that has gone
/// away is silently dropped.
pub trait Outbox: Send + Sync {
    /// Queues `notification` for connection `to`.
    fn deliver(&self, to: ConnectionId, notification: Notification);
}

type SharedSession = Arc<Mutex<Session>>;

/// Locks a mutex, recovering the data if a previous holder panicked.
///
/// Sessions are only mutated after validation succeeds, so a poisoned
/// guard still holds consistent state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of live sessions and the connections playing in them.
pub struct Coordinator {
    sessions: Mutex<HashMap<SessionId, SharedSession>>,
    connections: Mutex<HashMap<ConnectionId, SessionId>>,
    next_connection: AtomicU64,
    session_id_length: usize,
    outbox: Arc<dyn Outbox>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("sessions", &lock(&self.sessions).len())
            .field("connections", &lock(&self.connections).len())
            .field("session_id_length", &self.session_id_length)
            .finish()
    }
}

impl Coordinator {
    /// Creates a coordinator with the default session ID length.
    pub fn new(outbox: Arc<dyn Outbox>) -> Self {
        Self::with_session_id_length(outbox, DEFAULT_SESSION_ID_LENGTH)
    }

    /// Creates a coordinator issuing session IDs of `length` hex digits,
    /// clamped to [`SESSION_ID_LENGTH_RANGE`].
    #[instrument(skip(outbox))]
    pub fn with_session_id_length(outbox: Arc<dyn Outbox>, length: usize) -> Self {
        let session_id_length = length.clamp(
            *SESSION_ID_LENGTH_RANGE.start(),
            *SESSION_ID_LENGTH_RANGE.end(),
        );
        info!(session_id_length, "Creating session coordinator");
        Self {
            sessions: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            next_connection: AtomicU64::new(1),
            session_id_length,
            outbox,
        }
    }

    /// Allocates an identity for a newly connected client.
    pub fn connect(&self) -> ConnectionId {
        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
        info!(connection = %id, "Client connected");
        id
    }

    /// Handles a connection-close event: leaves the current session, if any.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn disconnect(&self, conn: ConnectionId) {
        match self.leave_session(conn, None) {
            Ok(()) | Err(CoordinatorError::SessionNotFound { .. }) => {}
            Err(e) => warn!(error = %e, "Cleanup on disconnect failed"),
        }
        info!("Client disconnected");
    }

    /// Parses and dispatches one raw inbound message.
    ///
    /// Unparseable input is answered with an error notification to the
    /// sender only.
    #[instrument(skip(self, text), fields(connection = %conn))]
    pub fn handle_text(&self, conn: ConnectionId, text: &str) {
        match Command::parse(text) {
            Ok(command) => self.handle(conn, command),
            Err(e) => {
                warn!(error = ?e, "Malformed message");
                self.outbox.deliver(conn, Notification::from_error(&e));
            }
        }
    }

    /// Dispatches a parsed command, reporting any failure to the sender.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn handle(&self, conn: ConnectionId, command: Command) {
        let result = match command {
            Command::CreateSession => self.create_session(conn).map(|_| ()),
            Command::JoinSession { session_id } => self.join_session(conn, &session_id),
            Command::MakeMove {
                session_id,
                cell_index,
            } => self.make_move(conn, session_id.as_deref(), &cell_index),
            Command::ResetGame { session_id } => self.reset_game(conn, session_id.as_deref()),
            Command::QuitSession { session_id } => self.leave_session(conn, session_id.as_deref()),
        };

        if let Err(e) = result {
            warn!(error = %e, "Command rejected");
            self.outbox.deliver(conn, Notification::from_error(&e));
        }
    }

    /// Opens a new session with `conn` as X and replies `sessionCreated`.
    ///
    /// A caller already in a session leaves it first.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn create_session(&self, conn: ConnectionId) -> Result<SessionId, CoordinatorError> {
        self.leave_current(conn);

        let session_id = {
            let mut sessions = lock(&self.sessions);
            let id = loop {
                let candidate = self.generate_session_id();
                if !sessions.contains_key(&candidate) {
                    break candidate;
                }
                warn!(session_id = %candidate, "Session ID collision, regenerating");
            };
            let session = Session::new(id.clone(), conn);
            sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
            id
        };
        lock(&self.connections).insert(conn, session_id.clone());

        self.outbox.deliver(
            conn,
            Notification::SessionCreated {
                session_id: session_id.clone(),
            },
        );
        info!(session_id = %session_id, "Session created");
        Ok(session_id)
    }

    /// Adds `conn` to session `session_id` as O and starts the game.
    ///
    /// Sends `sessionJoined` to the joiner, `opponentJoined` to the creator,
    /// `gameStart` to both, then the first state broadcast.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn join_session(
        &self,
        conn: ConnectionId,
        session_id: &str,
    ) -> Result<(), CoordinatorError> {
        let previous = self.session_of(conn);
        if previous.as_deref() == Some(session_id) {
            return Err(CoordinatorError::AlreadyInSession {
                session_id: session_id.to_string(),
            });
        }

        let shared = self
            .lookup(session_id)
            .ok_or_else(|| CoordinatorError::SessionNotFound {
                session_id: Some(session_id.to_string()),
            })?;

        {
            let mut session = lock(&shared);
            session.join(conn)?;
            lock(&self.connections).insert(conn, session_id.to_string());

            self.outbox.deliver(
                conn,
                Notification::SessionJoined {
                    session_id: session_id.to_string(),
                },
            );
            if let Some(creator) = session.participants().first() {
                self.outbox.deliver(
                    *creator,
                    Notification::OpponentJoined {
                        session_id: session_id.to_string(),
                    },
                );
            }
            let current_player = *session.current_turn();
            for participant in session.participants() {
                let player_type = session.mark_of(*participant)?;
                self.outbox.deliver(
                    *participant,
                    Notification::GameStart {
                        player_type,
                        current_player,
                    },
                );
            }
            self.broadcast(&session);
        }
        info!(session_id, "Client joined session");

        if let Some(previous) = previous {
            self.depart(conn, &previous);
        }
        Ok(())
    }

    /// Plays `conn`'s mark at `cell`, then broadcasts the resulting state.
    ///
    /// `session_id`, when given, must match the caller's session.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn make_move(
        &self,
        conn: ConnectionId,
        session_id: Option<&str>,
        cell: &Value,
    ) -> Result<(), CoordinatorError> {
        let shared = self.resolve(conn, session_id)?;
        let mut session = lock(&shared);
        if *session.closed() {
            return Err(CoordinatorError::SessionNotFound { session_id: None });
        }
        let status = session.play(conn, cell_index(cell))?;
        debug!(session_id = %session.id(), status = status.label(), "Move applied");
        self.broadcast(&session);
        Ok(())
    }

    /// Clears the board of the caller's session for a new game.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn reset_game(
        &self,
        conn: ConnectionId,
        session_id: Option<&str>,
    ) -> Result<(), CoordinatorError> {
        let shared = self.resolve(conn, session_id)?;
        let mut session = lock(&shared);
        if *session.closed() {
            return Err(CoordinatorError::SessionNotFound { session_id: None });
        }
        session.mark_of(conn)?;
        session.reset()?;
        self.broadcast(&session);
        Ok(())
    }

    /// Removes the caller from its session, destroying the session if it
    /// becomes empty.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn leave_session(
        &self,
        conn: ConnectionId,
        session_id: Option<&str>,
    ) -> Result<(), CoordinatorError> {
        let current = self.current_session(conn, session_id)?;
        self.depart(conn, &current);
        Ok(())
    }

    /// Session the connection is currently associated with.
    pub fn session_of(&self, conn: ConnectionId) -> Option<SessionId> {
        lock(&self.connections).get(&conn).cloned()
    }

    /// Mark held by `conn` in its current session.
    pub fn mark_of(&self, conn: ConnectionId) -> Option<Mark> {
        let shared = self.resolve(conn, None).ok()?;
        let session = lock(&shared);
        session.mark_of(conn).ok()
    }

    /// Copy of a live session's state.
    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.lookup(session_id).map(|shared| lock(&shared).clone())
    }

    /// Summaries of all live sessions, ordered by ID.
    #[instrument(skip(self))]
    pub fn sessions(&self) -> Vec<SessionSummary> {
        let shared: Vec<SharedSession> = lock(&self.sessions).values().cloned().collect();
        let mut summaries: Vec<SessionSummary> = shared
            .iter()
            .map(|s| lock(s))
            .filter(|s| !*s.closed())
            .map(|s| s.summary())
            .collect();
        summaries.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        debug!(count = summaries.len(), "Listed sessions");
        summaries
    }

    fn generate_session_id(&self) -> SessionId {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(self.session_id_length);
        id
    }

    fn lookup(&self, session_id: &str) -> Option<SharedSession> {
        lock(&self.sessions).get(session_id).cloned()
    }

    /// The caller's session ID, checked against the one its command names.
    fn current_session(
        &self,
        conn: ConnectionId,
        claimed: Option<&str>,
    ) -> Result<SessionId, CoordinatorError> {
        let current = self
            .session_of(conn)
            .ok_or(CoordinatorError::SessionNotFound { session_id: None })?;
        if let Some(claimed) = claimed
            && claimed != current
        {
            debug!(%current, claimed, "Command names a session the caller is not in");
            return Err(CoordinatorError::PlayerNotInSession);
        }
        Ok(current)
    }

    /// Finds the caller's live session through its association.
    fn resolve(
        &self,
        conn: ConnectionId,
        claimed: Option<&str>,
    ) -> Result<SharedSession, CoordinatorError> {
        let current = self.current_session(conn, claimed)?;
        self.lookup(&current)
            .ok_or(CoordinatorError::SessionNotFound { session_id: None })
    }

    fn leave_current(&self, conn: ConnectionId) {
        if let Some(current) = self.session_of(conn) {
            self.depart(conn, &current);
        }
    }

    /// Removes `conn` from `session_id` and clears its association.
    fn depart(&self, conn: ConnectionId, session_id: &str) {
        {
            let mut connections = lock(&self.connections);
            if connections.get(&conn).map(String::as_str) == Some(session_id) {
                connections.remove(&conn);
            }
        }

        let Some(shared) = self.lookup(session_id) else {
            return;
        };
        let mut session = lock(&shared);
        if !session.leave(conn) {
            return;
        }

        if *session.closed() {
            let mut sessions = lock(&self.sessions);
            if sessions
                .get(session_id)
                .is_some_and(|s| Arc::ptr_eq(s, &shared))
            {
                sessions.remove(session_id);
            }
            info!(session_id, "Session closed and removed");
        } else {
            for remaining in session.participants() {
                self.outbox.deliver(
                    *remaining,
                    Notification::OpponentLeft {
                        session_id: session_id.to_string(),
                    },
                );
            }
            info!(
                session_id,
                remaining = session.participants().len(),
                "Client left session"
            );
        }
    }

    /// Sends the session's state to every participant.
    fn broadcast(&self, session: &Session) {
        let snapshot = session.snapshot();
        debug!(
            session_id = %session.id(),
            status = snapshot.game_status.label(),
            recipients = session.participants().len(),
            "Broadcasting game state"
        );
        for participant in session.participants() {
            self.outbox
                .deliver(*participant, Notification::GameStateUpdate(snapshot.clone()));
        }
    }
}
