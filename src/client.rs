//! HTTP operations against the chat backend.
//!
//! Every method funnels through one request helper that applies the header
//! policy (JSON content type always, bearer authorization only while a
//! token is held), classifies non-success statuses into the closed error
//! set, and decodes the body separately from the transfer so decoding
//! failures are distinguishable from transport failures.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::session::{Session, SessionStore};
use crate::types::{
    AuthSession, Conversation, CreateConversationRequest, LoginRequest, Message, RegisterRequest,
    SendMessageRequest, User,
};

/// Base URL of a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Typed client over the chat backend's HTTP API.
///
/// Cheap to clone; clones share the underlying connection pool and session.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl ChatClient {
    /// Build a client against `base_url` (including the `/api` prefix),
    /// restoring any session the store holds.
    pub fn new(base_url: impl Into<String>, store: impl SessionStore + 'static) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            session: Arc::new(Session::new(store)),
        }
    }

    /// Build a client against [`DEFAULT_BASE_URL`].
    pub fn with_defaults(store: impl SessionStore + 'static) -> Self {
        Self::new(DEFAULT_BASE_URL, store)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Create an account. On success the returned token and user id are
    /// persisted and used by every subsequent call.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnexpectedStatus`] when the email or username is
    /// taken, plus the usual transport/decode kinds.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError> {
        let body = RegisterRequest {
            username,
            email,
            password,
        };
        let auth: AuthSession = self
            .request("register", Method::POST, "/auth/register", Some(&body))
            .await?;
        self.session.authenticate(&auth.access_token, &auth.user_id);
        Ok(auth)
    }

    /// Authenticate with email and password. Same persistence contract as
    /// [`ChatClient::register`].
    ///
    /// # Errors
    ///
    /// [`ClientError::Auth`] on rejected credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let body = LoginRequest { email, password };
        let auth: AuthSession = self
            .request("login", Method::POST, "/auth/login", Some(&body))
            .await?;
        self.session.authenticate(&auth.access_token, &auth.user_id);
        Ok(auth)
    }

    /// Drop the session token from memory and storage. No network call,
    /// never fails.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Fetch the authenticated user's own record.
    ///
    /// # Errors
    ///
    /// See [`ClientError`] for the classification of failures.
    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.request("fetch current user", Method::GET, "/users/me", NO_BODY)
            .await
    }

    /// List every other registered user.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        self.request("fetch users", Method::GET, "/users/", NO_BODY)
            .await
    }

    /// List the conversations the authenticated user belongs to.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        self.request("fetch conversations", Method::GET, "/conversations", NO_BODY)
            .await
    }

    /// Fetch a single conversation.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] when `conversation_id` does not exist.
    pub async fn conversation(&self, conversation_id: &str) -> Result<Conversation, ClientError> {
        let path = format!("/conversations/{conversation_id}");
        self.request("fetch conversation", Method::GET, &path, NO_BODY)
            .await
    }

    /// Create a conversation with the given members. The server may return
    /// a skinny record (id and group flag only); missing fields default.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn create_conversation(
        &self,
        name: &str,
        is_group: bool,
        member_ids: &[String],
    ) -> Result<Conversation, ClientError> {
        let body = CreateConversationRequest {
            name,
            is_group,
            member_ids,
        };
        self.request(
            "create conversation",
            Method::POST,
            "/conversations",
            Some(&body),
        )
        .await
    }

    /// Add a member to an existing conversation.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn add_member(
        &self,
        conversation_id: &str,
        member_id: &str,
    ) -> Result<(), ClientError> {
        let path = format!("/conversations/{conversation_id}/members/{member_id}");
        let _: serde_json::Value = self.request("add member", Method::POST, &path, NO_BODY).await?;
        Ok(())
    }

    /// List the messages in a conversation, oldest first.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>, ClientError> {
        let path = format!("/conversations/{conversation_id}/messages");
        self.request("fetch messages", Method::GET, &path, NO_BODY)
            .await
    }

    /// Post a message into a conversation, returning the stored record.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<Message, ClientError> {
        let body = SendMessageRequest { content };
        let path = format!("/conversations/{conversation_id}/messages");
        self.request("send message", Method::POST, &path, Some(&body))
            .await
    }

    /// One-shot request helper shared by every operation.
    ///
    /// A missing token does not short-circuit: the request goes out without
    /// an authorization header and the server's rejection is classified
    /// like any other status.
    async fn request<T, B>(
        &self,
        action: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_status(action, status));
        }

        let raw = response
            .text()
            .await
            .map_err(|source| ClientError::Transport { action, source })?;
        serde_json::from_str(&raw).map_err(|source| ClientError::Decode { action, source })
    }
}

/// Marker for bodyless requests, fixing the helper's `B` parameter.
const NO_BODY: Option<&()> = None;
