//! Realtime channel for one conversation.
//!
//! [`ChatClient::connect`] opens the backend's per-conversation WebSocket
//! and returns a [`ChatChannel`] handle. Incoming frames surface as
//! [`ChannelEvent`]s on the handle, including decode and stream failures,
//! so callers can drive their own reconnect policy. There is no reconnect,
//! buffering, or dedup here.

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::client::ChatClient;
use crate::error::ClientError;
use crate::types::{Message, ServerEvent};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Events delivered by a [`ChatChannel`].
#[derive(Debug)]
pub enum ChannelEvent {
    /// A chat message broadcast into the conversation.
    Message(Message),
    /// Another member's connection dropped.
    PeerDisconnected { user_id: String },
    /// A frame failed to decode, or the stream reported an error.
    Error(String),
    /// The server closed the connection.
    Closed,
}

/// Live realtime connection. Dropping the handle tears the reader down.
#[derive(Debug)]
pub struct ChatChannel {
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    reader: JoinHandle<()>,
}

impl ChatChannel {
    /// Wait for the next event. Returns `None` once the reader has stopped
    /// and all buffered events are drained.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Tear the connection down.
    pub fn close(self) {
        self.reader.abort();
    }
}

impl Drop for ChatChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl ChatClient {
    /// Open the realtime channel for `conversation_id`.
    ///
    /// The URL embeds the stored user id and current token as the server
    /// expects: `ws://<host>/ws/{conversation_id}/{user_id}?token={token}`.
    /// The query token is empty when no token is held.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingUserId`] when no login has stored a user id,
    /// [`ClientError::InvalidBaseUrl`] for a non-http(s) base URL, and
    /// [`ClientError::WsConnect`] when the handshake fails.
    pub async fn connect(&self, conversation_id: &str) -> Result<ChatChannel, ClientError> {
        let user_id = self.session().user_id().ok_or(ClientError::MissingUserId)?;
        let token = self.session().token().unwrap_or_default();
        let url = ws_url(self.base_url(), conversation_id, &user_id, &token)?;

        let (stream, _) = connect_async(url)
            .await
            .map_err(|error| ClientError::WsConnect(Box::new(error)))?;

        let (tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(stream, tx));
        Ok(ChatChannel { events, reader })
    }
}

/// Derive the realtime endpoint from the HTTP base URL: scheme swapped to
/// ws(s), the `/api` prefix dropped back to the host root.
fn ws_url(
    base_url: &str,
    conversation_id: &str,
    user_id: &str,
    token: &str,
) -> Result<String, ClientError> {
    let (scheme, rest) = if let Some(rest) = base_url.strip_prefix("http://") {
        ("ws", rest)
    } else if let Some(rest) = base_url.strip_prefix("https://") {
        ("wss", rest)
    } else {
        return Err(ClientError::InvalidBaseUrl(base_url.to_owned()));
    };

    let host = rest.trim_end_matches('/');
    let host = host.strip_suffix("/api").unwrap_or(host);
    Ok(format!(
        "{scheme}://{host}/ws/{conversation_id}/{user_id}?token={token}"
    ))
}

async fn read_loop(mut stream: WsStream, tx: mpsc::UnboundedSender<ChannelEvent>) {
    while let Some(next) = stream.next().await {
        match next {
            Ok(WsMessage::Text(raw)) => {
                if tx.send(decode_frame(raw.as_str())).is_err() {
                    // Receiver dropped; nobody is listening.
                    return;
                }
            }
            Ok(WsMessage::Close(_)) => {
                let _ = tx.send(ChannelEvent::Closed);
                return;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "realtime channel stream error");
                let _ = tx.send(ChannelEvent::Error(error.to_string()));
                return;
            }
        }
    }
    let _ = tx.send(ChannelEvent::Closed);
}

/// Decode one text frame. Tagged [`ServerEvent`] frames are preferred;
/// bare [`Message`] objects (no `"type"` field) are accepted as message
/// events. Each frame yields exactly one event.
fn decode_frame(raw: &str) -> ChannelEvent {
    match serde_json::from_str::<ServerEvent>(raw) {
        Ok(ServerEvent::Message(message)) => ChannelEvent::Message(message),
        Ok(ServerEvent::UserDisconnected { user_id }) => ChannelEvent::PeerDisconnected { user_id },
        Err(_) => match serde_json::from_str::<Message>(raw) {
            Ok(message) => ChannelEvent::Message(message),
            Err(error) => {
                tracing::warn!(%error, "unrecognized realtime frame");
                ChannelEvent::Error(format!("unrecognized frame: {error}"))
            }
        },
    }
}
