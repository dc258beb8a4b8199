//! Per-user chat history, kept in process memory.
//!
//! The store maps a user id to its own history behind an async lock. A
//! [`UserSession`] holds that lock for the duration of a request so two
//! requests for the same user cannot interleave their turns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ldm_core::types::{ChatTurn, LogicalDataModel};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::ChatError;

type SharedHistory = Arc<AsyncMutex<Vec<ChatTurn>>>;

/// In-memory history store keyed by user id.
#[derive(Default)]
pub struct HistoryStore {
    users: Mutex<HashMap<String, SharedHistory>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's history; empty if the user is unknown.
    ///
    /// Unknown users are not added to the store.
    pub async fn get(&self, user_id: &str) -> Result<Vec<ChatTurn>, ChatError> {
        let Some(entry) = self.lookup(user_id)? else {
            return Ok(Vec::new());
        };
        let turns = entry.lock().await;
        Ok(turns.clone())
    }

    /// Append a single turn.
    pub async fn append(&self, user_id: &str, turn: ChatTurn) -> Result<(), ChatError> {
        let entry = self.entry(user_id)?;
        entry.lock().await.push(turn);
        Ok(())
    }

    /// Append a user/assistant pair with no other turn between them.
    pub async fn append_exchange(
        &self,
        user_id: &str,
        user: ChatTurn,
        assistant: ChatTurn,
    ) -> Result<(), ChatError> {
        let mut session = self.session(user_id).await?;
        session.commit_exchange(user, assistant);
        Ok(())
    }

    /// Clear a user's history. Succeeds whether or not history exists.
    ///
    /// The user is forgotten entirely unless another request holds or is
    /// waiting on their session, in which case the history is cleared in
    /// place.
    pub async fn reset(&self, user_id: &str) -> Result<(), ChatError> {
        let in_use = {
            let mut users = self.lock_users()?;
            match users.get(user_id).map(|entry| Arc::strong_count(entry) == 1) {
                Some(true) => {
                    users.remove(user_id);
                    None
                }
                Some(false) => users.get(user_id).cloned(),
                None => None,
            }
        };
        if let Some(entry) = in_use {
            entry.lock().await.clear();
        }
        tracing::debug!(user_id, "History reset");
        Ok(())
    }

    /// Drop a user's entry if nobody holds it and it has no turns.
    pub fn release_if_empty(&self, user_id: &str) -> Result<(), ChatError> {
        let mut users = self.lock_users()?;
        let idle_and_empty = users.get(user_id).is_some_and(|entry| {
            Arc::strong_count(entry) == 1 && entry.try_lock().is_ok_and(|turns| turns.is_empty())
        });
        if idle_and_empty {
            users.remove(user_id);
        }
        Ok(())
    }

    /// Acquire exclusive access to one user's history.
    pub async fn session(&self, user_id: &str) -> Result<UserSession, ChatError> {
        let entry = self.entry(user_id)?;
        let guard = entry.lock_owned().await;
        Ok(UserSession {
            user_id: user_id.to_string(),
            turns: guard,
        })
    }

    /// Number of users currently holding history or an open session.
    pub fn known_users(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or(0)
    }

    fn lookup(&self, user_id: &str) -> Result<Option<SharedHistory>, ChatError> {
        Ok(self.lock_users()?.get(user_id).cloned())
    }

    fn entry(&self, user_id: &str) -> Result<SharedHistory, ChatError> {
        let mut users = self.lock_users()?;
        Ok(Arc::clone(users.entry(user_id.to_string()).or_default()))
    }

    fn lock_users(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, SharedHistory>>, ChatError> {
        self.users
            .lock()
            .map_err(|e| ChatError::StorageError(format!("history lock poisoned: {}", e)))
    }
}

/// Exclusive handle on one user's history.
pub struct UserSession {
    user_id: String,
    turns: OwnedMutexGuard<Vec<ChatTurn>>,
}

impl UserSession {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The most recent model an assistant turn carried, if any.
    pub fn latest_model(&self) -> Option<&LogicalDataModel> {
        self.turns.iter().rev().find_map(|t| t.content.as_model())
    }

    /// Record a completed user/assistant exchange.
    pub fn commit_exchange(&mut self, user: ChatTurn, assistant: ChatTurn) {
        self.turns.reserve(2);
        self.turns.push(user);
        self.turns.push(assistant);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
