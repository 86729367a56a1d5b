//! Session Context
//!
//! The single owner of the current session. It is injected into the HTTP
//! client, the router and the session store instead of living in ambient
//! global state, so every component can be tested in isolation.

use super::storage::TokenStore;
use portal_core::{PortalResult, Role, Session, UserProfile};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub struct SessionContext {
    state: RwLock<Option<Session>>,
    storage: Arc<dyn TokenStore>,
}

impl SessionContext {
    /// Create an empty (logged out) context over the given durable store
    pub fn new(storage: Arc<dyn TokenStore>) -> Self {
        Self {
            state: RwLock::new(None),
            storage,
        }
    }

    /// Load the durable token into memory. Returns whether a token was found.
    pub async fn restore(&self) -> PortalResult<bool> {
        let token = self.storage.load().await?;
        let mut state = self.state.write().await;
        *state = token.map(|token| Session { token, user: None });
        debug!(restored = state.is_some(), "Session restored from durable storage");
        Ok(state.is_some())
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.as_ref().and_then(|s| s.user.clone())
    }

    pub async fn role(&self) -> Option<Role> {
        self.state
            .read()
            .await
            .as_ref()
            .and_then(|s| s.user.as_ref())
            .and_then(UserProfile::role)
    }

    pub async fn snapshot(&self) -> Option<Session> {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Install a new session. The durable copy is written first; if that
    /// fails the in-memory session is left untouched.
    pub async fn establish(&self, token: String, user: UserProfile) -> PortalResult<()> {
        self.storage.save(&token).await?;

        let mut state = self.state.write().await;
        info!(user_id = user.user_id, username = %user.username, "Session established");
        *state = Some(Session {
            token,
            user: Some(user),
        });
        Ok(())
    }

    /// Replace the stored profile. Ignored when no session exists.
    pub async fn set_user(&self, user: UserProfile) -> bool {
        let mut state = self.state.write().await;
        match state.as_mut() {
            Some(session) => {
                session.user = Some(user);
                true
            }
            None => false,
        }
    }

    /// Drop the session from memory and wipe the durable copy. Memory is
    /// always cleared; the returned error only reports the durable side.
    pub async fn clear(&self) -> PortalResult<()> {
        let had_session = self.state.write().await.take().is_some();
        debug!(had_session, "Session cleared");
        self.storage.remove().await
    }
}
