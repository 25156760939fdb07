//! HTTP and WebSocket front end.
//!
//! Each WebSocket is one connection: inbound text frames go to the
//! coordinator, outbound notifications come back through the
//! [`ConnectionHub`] and a per-socket writer task.

use crate::config::ServerConfig;
use crate::coordinator::Coordinator;
use crate::hub::ConnectionHub;
use crate::protocol::SessionSummary;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use derive_new::new;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Shared handles available to every request.
#[derive(Debug, Clone, new)]
pub struct AppState {
    coordinator: Arc<Coordinator>,
    hub: Arc<ConnectionHub>,
}

/// The game server: coordinator, connection hub and HTTP routes.
#[derive(Debug, Clone)]
pub struct GameServer {
    config: ServerConfig,
    state: AppState,
}

impl GameServer {
    /// Creates a server with a fresh coordinator wired to a fresh hub.
    #[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
    pub fn new(config: ServerConfig) -> Self {
        let hub = Arc::new(ConnectionHub::new());
        let coordinator = Arc::new(Coordinator::with_session_id_length(
            hub.clone(),
            *config.session_id_length(),
        ));
        info!("Creating game server");
        Self {
            config,
            state: AppState::new(coordinator, hub),
        }
    }

    /// The coordinator behind this server.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.state.coordinator
    }

    /// Builds the axum router.
    ///
    /// - `GET /` and `GET /ws`: WebSocket upgrade
    /// - `GET /health`: liveness probe
    /// - `GET /sessions`: JSON list of live sessions
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(ws_handler))
            .route("/ws", get(ws_handler))
            .route("/health", get(health))
            .route("/sessions", get(list_sessions))
            .with_state(self.state.clone())
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host().as_str(), *self.config.port()))
                .await?;
        info!(
            "Server ready at ws://{}:{}/",
            self.config.host(),
            self.config.port()
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn health() -> &'static str {
    "ok"
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSummary>> {
    Json(state.coordinator.sessions())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one client connection until the socket closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn = state.coordinator.connect();
    let mut outbound = state.hub.register(conn);
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(notification) = outbound.recv().await {
            let text = match notification.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(connection = %conn, error = %e, "Failed to encode notification");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                debug!(connection = %conn, "Socket closed while sending");
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                debug!(connection = %conn, message = %text.as_str(), "Received message");
                state.coordinator.handle_text(conn, text.as_str());
            }
            Ok(Message::Binary(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                state.coordinator.handle_text(conn, &text);
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                debug!(connection = %conn, error = %e, "Socket error");
                break;
            }
        }
    }

    state.coordinator.disconnect(conn);
    state.hub.unregister(conn);
    writer.abort();
}
