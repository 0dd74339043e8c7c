use super::*;

use std::collections::HashMap;

use axum::Router;
use axum::extract::ws::{Message as AxumWsMessage, WebSocketUpgrade};
use axum::extract::{Path, Query};
use axum::response::Response;
use axum::routing::any;
use serde_json::json;

use crate::session::{MemoryStore, SessionStore, TOKEN_KEY, USER_ID_KEY};

// =============================================================================
// ws_url
// =============================================================================

#[test]
fn ws_url_swaps_scheme_and_drops_api_prefix() {
    let url = ws_url("http://localhost:8000/api", "c1", "u1", "tok").expect("url");
    assert_eq!(url, "ws://localhost:8000/ws/c1/u1?token=tok");
}

#[test]
fn ws_url_uses_wss_for_https() {
    let url = ws_url("https://chat.example.com/api", "c1", "u1", "tok").expect("url");
    assert_eq!(url, "wss://chat.example.com/ws/c1/u1?token=tok");
}

#[test]
fn ws_url_handles_base_without_api_suffix() {
    let url = ws_url("http://localhost:8000", "c1", "u1", "tok").expect("url");
    assert_eq!(url, "ws://localhost:8000/ws/c1/u1?token=tok");
}

#[test]
fn ws_url_keeps_empty_token_parameter() {
    let url = ws_url("http://localhost:8000/api", "c1", "u1", "").expect("url");
    assert_eq!(url, "ws://localhost:8000/ws/c1/u1?token=");
}

#[test]
fn ws_url_rejects_unknown_scheme() {
    let err = ws_url("ftp://localhost/api", "c1", "u1", "tok").expect_err("must fail");
    assert!(matches!(err, ClientError::InvalidBaseUrl(_)));
}

// =============================================================================
// decode_frame
// =============================================================================

#[test]
fn decode_frame_accepts_tagged_message() {
    let event = decode_frame(
        r#"{"type":"message","id":"m1","conversation_id":"c1","sender_id":"u1","content":"hi","created_at":"t"}"#,
    );
    let ChannelEvent::Message(message) = event else {
        panic!("expected message event");
    };
    assert_eq!(message.id, "m1");
}

#[test]
fn decode_frame_accepts_bare_message_without_type_tag() {
    let event = decode_frame(
        r#"{"id":"m1","conversation_id":"c1","sender_id":"u1","content":"hi","created_at":"t"}"#,
    );
    assert!(matches!(event, ChannelEvent::Message(_)));
}

#[test]
fn decode_frame_maps_user_disconnected_to_peer_event() {
    let event = decode_frame(r#"{"type":"user_disconnected","user_id":"u9"}"#);
    let ChannelEvent::PeerDisconnected { user_id } = event else {
        panic!("expected peer disconnect event");
    };
    assert_eq!(user_id, "u9");
}

#[test]
fn decode_frame_surfaces_unrecognized_payload_as_error() {
    assert!(matches!(decode_frame("not json"), ChannelEvent::Error(_)));
    assert!(matches!(
        decode_frame(r#"{"type":"typing","user_id":"u1"}"#),
        ChannelEvent::Error(_)
    ));
}

// =============================================================================
// connect — against an in-process WebSocket server
// =============================================================================

/// Stub realtime endpoint: echoes the path and query back as one message
/// frame, then closes.
async fn ws_echo_route(
    Path((conversation_id, user_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |mut socket| async move {
        let token = params.get("token").cloned().unwrap_or_default();
        let frame = json!({
            "type": "message",
            "id": "m1",
            "conversation_id": conversation_id,
            "sender_id": user_id,
            "content": token,
            "created_at": "2024-01-01T00:00:00"
        });
        let _ = socket
            .send(AxumWsMessage::Text(frame.to_string().into()))
            .await;
        let _ = socket.send(AxumWsMessage::Close(None)).await;
    })
}

async fn spawn_ws_server() -> String {
    let app = Router::new().route("/ws/{conversation_id}/{user_id}", any(ws_echo_route));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/api")
}

#[tokio::test]
async fn connect_embeds_ids_and_token_and_delivers_one_message() {
    let base = spawn_ws_server().await;
    let store = MemoryStore::default();
    store.set(TOKEN_KEY, "tok-3");
    store.set(USER_ID_KEY, "u7");
    let client = ChatClient::new(base, store);

    let mut channel = client.connect("c1").await.expect("connect");

    let first = channel.recv().await.expect("first event");
    let ChannelEvent::Message(message) = first else {
        panic!("expected message event, got {first:?}");
    };
    // The stub echoes the URL parts, proving what the client sent.
    assert_eq!(message.conversation_id, "c1");
    assert_eq!(message.sender_id, "u7");
    assert_eq!(message.content, "tok-3");

    let second = channel.recv().await.expect("second event");
    assert!(matches!(second, ChannelEvent::Closed));

    // Exactly one message: nothing after the close.
    assert!(channel.recv().await.is_none());
}

#[tokio::test]
async fn connect_without_stored_user_id_fails() {
    let client = ChatClient::new("http://localhost:8000/api", MemoryStore::default());
    let err = client.connect("c1").await.expect_err("must fail");
    assert!(matches!(err, ClientError::MissingUserId));
}

#[tokio::test]
async fn connect_with_invalid_base_url_fails() {
    let store = MemoryStore::default();
    store.set(USER_ID_KEY, "u1");
    let client = ChatClient::new("ftp://chat.example.com", store);

    let err = client.connect("c1").await.expect_err("must fail");
    assert!(matches!(err, ClientError::InvalidBaseUrl(_)));
}

#[tokio::test]
async fn connect_surfaces_handshake_failure() {
    let store = MemoryStore::default();
    store.set(USER_ID_KEY, "u1");
    // Port 9 is discard; nothing accepts WebSocket upgrades there.
    let client = ChatClient::new("http://127.0.0.1:9/api", store);

    let err = client.connect("c1").await.expect_err("must fail");
    assert!(matches!(err, ClientError::WsConnect(_)));
}
