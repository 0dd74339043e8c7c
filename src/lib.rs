//! Typed client for the chat backend's HTTP and realtime APIs.
//!
//! [`ChatClient`] wraps the auth, user, conversation, and message endpoints
//! plus the per-conversation WebSocket channel. Auth state lives in a
//! [`Session`] owned by the client and mirrored into a [`SessionStore`] so
//! it survives restarts. Every call is a one-shot request/response mapping;
//! there is no retry, caching, or ordering guarantee across in-flight calls.

pub mod client;
pub mod error;
pub mod session;
pub mod types;
pub mod ws;

pub use client::{ChatClient, DEFAULT_BASE_URL};
pub use error::ClientError;
pub use session::{FileStore, MemoryStore, Session, SessionStore};
pub use types::{AuthSession, Conversation, Message, ServerEvent, User};
pub use ws::{ChannelEvent, ChatChannel};
