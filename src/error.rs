//! Closed error set for every client operation.
//!
//! HTTP failures are classified by status so callers can discriminate
//! without string matching: 401/403 become [`ClientError::Auth`], 404
//! becomes [`ClientError::NotFound`], any other non-success status becomes
//! [`ClientError::UnexpectedStatus`]. [`ClientError::Transport`] is
//! reserved for network-level failures and [`ClientError::Decode`] for
//! response bodies that do not match the expected shape.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use reqwest::StatusCode;

/// Error returned by [`ChatClient`](crate::ChatClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server rejected the credentials (HTTP 401 or 403).
    #[error("{action}: unauthorized (HTTP {status})")]
    Auth { action: &'static str, status: u16 },
    /// The requested entity does not exist (HTTP 404).
    #[error("{action}: not found (HTTP {status})")]
    NotFound { action: &'static str, status: u16 },
    /// Any other non-success HTTP status.
    #[error("{action}: unexpected HTTP status {status}")]
    UnexpectedStatus { action: &'static str, status: u16 },
    /// DNS, connect, TLS, or body-read failure below the HTTP layer.
    #[error("{action}: transport failed: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not the expected JSON shape.
    #[error("{action}: invalid response body: {source}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The WebSocket handshake failed.
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    /// The configured base URL carries a scheme other than http/https.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// A realtime channel was requested before any login stored a user id.
    #[error("no stored user id; authenticate before opening a realtime channel")]
    MissingUserId,
}

impl ClientError {
    /// Classify a non-success HTTP status for the named action.
    pub(crate) fn from_status(action: &'static str, status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                action,
                status: status.as_u16(),
            },
            StatusCode::NOT_FOUND => Self::NotFound {
                action,
                status: status.as_u16(),
            },
            _ => Self::UnexpectedStatus {
                action,
                status: status.as_u16(),
            },
        }
    }

    /// Name of the operation that failed, when one applies.
    #[must_use]
    pub fn action(&self) -> Option<&'static str> {
        match self {
            Self::Auth { action, .. }
            | Self::NotFound { action, .. }
            | Self::UnexpectedStatus { action, .. }
            | Self::Transport { action, .. }
            | Self::Decode { action, .. } => Some(action),
            Self::WsConnect(_) | Self::InvalidBaseUrl(_) | Self::MissingUserId => None,
        }
    }

    /// HTTP status attached to the failure, when one applies.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::NotFound { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Decode { .. }
            | Self::WsConnect(_)
            | Self::InvalidBaseUrl(_)
            | Self::MissingUserId => None,
        }
    }
}
