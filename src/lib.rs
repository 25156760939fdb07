//! Tic-tac-toe duel server.
//!
//! Clients connect over WebSockets, pair up in sessions and play
//! tic-tac-toe against each other. The server is the only authority on
//! board state: it validates every move and broadcasts the result to both
//! players.
//!
//! # Architecture
//!
//! - **Games**: pure tic-tac-toe rules (`evaluate` a board for win/draw)
//! - **Session**: one match, its board, turn, status and running scores
//! - **Coordinator**: session registry, pairing and command handling
//! - **Hub / Server**: WebSocket transport feeding the coordinator
//!
//! # Example
//!
//! ```no_run
//! use tictactoe_duel::{GameServer, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let server = GameServer::new(ServerConfig::default());
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod coordinator;
mod error;
mod games;
mod hub;
mod protocol;
mod server;
mod session;

// Crate-level exports - Configuration
pub use config::ServerConfig;

// Crate-level exports - Errors
pub use error::{ConfigError, CoordinatorError, MoveRejection};

// Crate-level exports - Coordinator
pub use coordinator::{Coordinator, DEFAULT_SESSION_ID_LENGTH, Outbox, SESSION_ID_LENGTH_RANGE};

// Crate-level exports - Transport
pub use hub::ConnectionHub;
pub use server::{AppState, GameServer};

// Crate-level exports - Wire protocol
pub use protocol::{Command, GameSnapshot, Notification, SessionSummary, cell_index};

// Crate-level exports - Session state
pub use session::{ConnectionId, GameStatus, Scores, Session, SessionId};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::rules::{LINES, check_winner, is_full};
pub use games::tictactoe::{Board, CELL_COUNT, Mark, Outcome, Square, evaluate};
