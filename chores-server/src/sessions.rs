//! Login sessions for the board API.
//!
//! A successful login issues an opaque bearer token mapped to the user it
//! was issued for. Sessions are in-memory only and are lost on restart.

use std::collections::HashMap;

use chores::auth::UserInfo;
use tokio::sync::RwLock;

/// Maximum number of concurrent sessions.
const MAX_SESSIONS: usize = 1000;

/// In-memory token → user map.
///
/// Thread-safe via [`RwLock`].
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, UserInfo>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issues a new token for `user`.
    ///
    /// When the registry is full, every existing session of the same user
    /// is dropped first; if that frees nothing, an arbitrary session is
    /// evicted.
    pub async fn create(&self, user: UserInfo) -> String {
        let token = uuid::Uuid::now_v7().to_string();
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= MAX_SESSIONS {
            sessions.retain(|_, existing| existing.username != user.username);
        }
        if sessions.len() >= MAX_SESSIONS {
            let victim = sessions.keys().next().cloned();
            if let Some(victim) = victim {
                sessions.remove(&victim);
                tracing::warn!("session registry full, evicted a session");
            }
        }
        tracing::debug!(username = %user.username, "session created");
        sessions.insert(token.clone(), user);
        drop(sessions);
        token
    }

    /// Looks up the user a token belongs to.
    pub async fn get(&self, token: &str) -> Option<UserInfo> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Ends a session. Returns `true` if the token was live.
    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Ends every session of `username` except `keep`.
    pub async fn revoke_others(&self, username: &str, keep: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|token, user| token == keep || user.username != username);
        before - sessions.len()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether there are no live sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
