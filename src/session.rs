//! Session state and its durable mirror.
//!
//! The token lives in memory on the [`Session`] and is mirrored into a
//! [`SessionStore`] under the `token` key; the authenticated user id is
//! mirrored under `user_id`. Clearing the session removes only the token
//! entry, so the user id survives logout.
//!
//! The store surface is infallible: implementations log write failures
//! instead of returning them, so a storage fault never fails an API call.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

/// Storage key for the session token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the authenticated user's id.
pub const USER_ID_KEY: &str = "user_id";

/// Durable key-value storage backing a [`Session`].
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// File-backed store: one JSON object, loaded at open and rewritten in
/// full on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading any existing entries. A missing
    /// or unreadable file starts empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        match serde_json::to_string_pretty(entries) {
            Ok(raw) => {
                if let Err(error) = std::fs::write(&self.path, raw) {
                    tracing::warn!(path = %self.path.display(), %error, "session store write failed");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "session store serialize failed");
            }
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        self.persist(&entries);
    }
}

/// Auth state for one client: the in-memory token plus its durable mirror.
///
/// Lifecycle: initialized from storage, set by [`Session::authenticate`]
/// after a successful login/register, cleared by [`Session::clear`] on
/// logout. Concurrent authentications race last-writer-wins.
pub struct Session {
    store: Box<dyn SessionStore>,
    token: RwLock<Option<String>>,
}

impl Session {
    /// Build a session over `store`, picking up any previously stored token.
    pub fn new(store: impl SessionStore + 'static) -> Self {
        let token = RwLock::new(store.get(TOKEN_KEY));
        Self {
            store: Box::new(store),
            token,
        }
    }

    /// The currently held token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The stored user id, if any login has recorded one.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.store.get(USER_ID_KEY)
    }

    /// Record a successful authentication: token in memory and storage,
    /// user id in storage.
    pub fn authenticate(&self, token: &str, user_id: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        self.store.set(TOKEN_KEY, token);
        self.store.set(USER_ID_KEY, user_id);
    }

    /// Drop the in-memory token and its storage entry. The user id entry
    /// is left in place. Never fails.
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.store.remove(TOKEN_KEY);
    }
}
