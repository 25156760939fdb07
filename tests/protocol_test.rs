//! Tests for the JSON wire format.

use serde_json::{Value, json};
use tictactoe_duel::{Board, Command, GameSnapshot, GameStatus, Mark, Notification, Scores};

fn to_value(notification: &Notification) -> Value {
    serde_json::from_str(&notification.to_json().expect("Encode failed")).expect("Bad JSON")
}

#[test]
fn test_parse_commands() {
    assert_eq!(
        Command::parse(r#"{"action":"createSession"}"#).unwrap(),
        Command::CreateSession
    );
    assert_eq!(
        Command::parse(r#"{"action":"joinSession","sessionId":"abc123"}"#).unwrap(),
        Command::JoinSession {
            session_id: "abc123".to_string()
        }
    );
    assert_eq!(
        Command::parse(r#"{"action":"makeMove","sessionId":"abc123","cellIndex":4}"#).unwrap(),
        Command::MakeMove {
            session_id: Some("abc123".to_string()),
            cell_index: json!(4)
        }
    );
    assert_eq!(
        Command::parse(r#"{"action":"makeMove","cellIndex":"x"}"#).unwrap(),
        Command::MakeMove {
            session_id: None,
            cell_index: json!("x")
        }
    );
    assert_eq!(
        Command::parse(r#"{"action":"resetGame","sessionId":"abc123"}"#).unwrap(),
        Command::ResetGame {
            session_id: Some("abc123".to_string())
        }
    );
    assert_eq!(
        Command::parse(r#"{"action":"quitSession","sessionId":"abc123"}"#).unwrap(),
        Command::QuitSession {
            session_id: Some("abc123".to_string())
        }
    );
    assert_eq!(
        Command::parse(r#"{"action":"quitSession","sessionId":null}"#).unwrap(),
        Command::QuitSession { session_id: None }
    );
    assert_eq!(
        Command::parse(r#"{"action":"resetGame"}"#).unwrap(),
        Command::ResetGame { session_id: None }
    );
}

#[test]
fn test_parse_rejects_missing_action() {
    assert!(Command::parse(r#"{"sessionId":"abc123"}"#).is_err());
    assert!(Command::parse("[]").is_err());
}

#[test]
fn test_session_notifications_encoding() {
    assert_eq!(
        to_value(&Notification::SessionCreated {
            session_id: "s1".to_string()
        }),
        json!({ "action": "sessionCreated", "sessionId": "s1" })
    );
    assert_eq!(
        to_value(&Notification::SessionNotFound {
            session_id: "s1".to_string()
        }),
        json!({ "action": "sessionNotFound", "sessionId": "s1" })
    );
    assert_eq!(
        to_value(&Notification::GameStart {
            player_type: Mark::O,
            current_player: Mark::X
        }),
        json!({ "action": "gameStart", "playerType": "O", "currentPlayer": "X" })
    );
    assert_eq!(
        to_value(&Notification::InvalidMove {
            message: "Cell already taken".to_string()
        }),
        json!({ "action": "invalidMove", "message": "Cell already taken" })
    );
}

#[test]
fn test_game_state_update_encoding() {
    let mut board = Board::new();
    board.place(0, Mark::X);
    board.place(4, Mark::O);
    let snapshot = GameSnapshot {
        board,
        current_player: Mark::O,
        game_status: GameStatus::Won(Mark::X),
        winning_player: Some(Mark::X),
        scores: Scores {
            x: 2,
            o: 1,
            draws: 3,
        },
    };

    assert_eq!(
        to_value(&Notification::GameStateUpdate(snapshot)),
        json!({
            "action": "gameStateUpdate",
            "board": ["X", "", "", "", "O", "", "", "", ""],
            "currentPlayer": "O",
            "gameStatus": "won",
            "winningPlayer": "X",
            "scores": { "X": 2, "O": 1, "draws": 3 }
        })
    );
}

#[test]
fn test_active_update_omits_winner() {
    let snapshot = GameSnapshot {
        board: Board::new(),
        current_player: Mark::X,
        game_status: GameStatus::Active,
        winning_player: None,
        scores: Scores::default(),
    };

    let value = to_value(&Notification::GameStateUpdate(snapshot));
    assert_eq!(value["gameStatus"], "active");
    assert!(value.get("winningPlayer").is_none());
}
