//! End-to-end tests over real WebSocket connections.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use tictactoe_duel::{GameServer, ServerConfig};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves a fresh game server on an ephemeral port and returns its socket URL.
async fn spawn_server() -> (GameServer, String) {
    let server = GameServer::new(ServerConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = server.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (server, format!("ws://{addr}/ws"))
}

async fn connect(url: &str) -> Client {
    let (client, _) = connect_async(url).await.expect("Connect failed");
    client
}

async fn send(client: &mut Client, message: Value) {
    client
        .send(Message::Text(message.to_string().into()))
        .await
        .expect("Send failed");
}

/// Next text frame as JSON, skipping control frames.
async fn recv(client: &mut Client) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Stream ended")
            .expect("Socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("Server sent invalid JSON");
        }
    }
}

/// Creates a session on `x` and joins it from `o`, draining the join sequence.
async fn pair(x: &mut Client, o: &mut Client) -> String {
    send(x, json!({ "action": "createSession" })).await;
    let created = recv(x).await;
    assert_eq!(created["action"], "sessionCreated");
    let session_id = created["sessionId"].as_str().unwrap().to_string();

    send(o, json!({ "action": "joinSession", "sessionId": session_id })).await;
    assert_eq!(
        recv(o).await,
        json!({ "action": "sessionJoined", "sessionId": session_id })
    );
    assert_eq!(
        recv(x).await,
        json!({ "action": "opponentJoined", "sessionId": session_id })
    );
    assert_eq!(
        recv(x).await,
        json!({ "action": "gameStart", "playerType": "X", "currentPlayer": "X" })
    );
    assert_eq!(
        recv(o).await,
        json!({ "action": "gameStart", "playerType": "O", "currentPlayer": "X" })
    );
    for client in [x, o] {
        let state = recv(client).await;
        assert_eq!(state["action"], "gameStateUpdate");
        assert_eq!(state["gameStatus"], "active");
    }
    session_id
}

#[tokio::test]
async fn test_moves_are_broadcast_over_sockets() {
    let (_server, url) = spawn_server().await;
    let mut x = connect(&url).await;
    let mut o = connect(&url).await;
    pair(&mut x, &mut o).await;

    send(&mut x, json!({ "action": "makeMove", "cellIndex": 4 })).await;
    for client in [&mut x, &mut o] {
        let state = recv(client).await;
        assert_eq!(state["board"][4], "X");
        assert_eq!(state["currentPlayer"], "O");
    }

    send(&mut x, json!({ "action": "makeMove", "cellIndex": 0 })).await;
    assert_eq!(
        recv(&mut x).await,
        json!({ "action": "invalidMove", "message": "Not your turn. Current turn: Player O" })
    );

    send(&mut o, json!({ "action": "makeMove", "cellIndex": 0 })).await;
    assert_eq!(recv(&mut x).await["board"][0], "O");
}

#[tokio::test]
async fn test_garbage_frame_answered_with_error() {
    let (_server, url) = spawn_server().await;
    let mut client = connect(&url).await;

    client
        .send(Message::Text("{not json".into()))
        .await
        .unwrap();

    assert_eq!(
        recv(&mut client).await,
        json!({ "action": "error", "message": "Invalid message format" })
    );
}

#[tokio::test]
async fn test_socket_close_leaves_session() {
    let (server, url) = spawn_server().await;
    let mut x = connect(&url).await;
    let mut o = connect(&url).await;
    let session_id = pair(&mut x, &mut o).await;

    o.close(None).await.unwrap();
    assert_eq!(
        recv(&mut x).await,
        json!({ "action": "opponentLeft", "sessionId": session_id })
    );
    let sessions = server.coordinator().sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].players, 1);

    x.close(None).await.unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !server.coordinator().sessions().is_empty() {
        assert!(Instant::now() < deadline, "Session outlived its last socket");
        sleep(Duration::from_millis(20)).await;
    }
    assert!(server.coordinator().session(&session_id).is_none());
}
