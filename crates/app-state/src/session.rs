//! Session state
//!
//! [`SessionStore`] owns the signed-in user. The user record is persisted as
//! JSON under the `@user` key so the session survives restarts; its absence
//! means signed out. Observers receive a [`SessionSnapshot`] on every change.

use api_client::ApiError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, KeyValueStore, KeyValueStoreExt};
use tokio::sync::watch;

use crate::auth::{AuthError, Authenticator, Credentials};

/// Signed-in user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// User id
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Signed-in user, if any
    pub user: Option<UserSession>,
    /// True until the persisted session has been read
    pub is_loading: bool,
}

impl SessionSnapshot {
    /// Check if a user is signed in
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self { user: None, is_loading: true }
    }
}

/// Owner of the current session
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    authenticator: Arc<dyn Authenticator>,
    state: Mutex<SessionSnapshot>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Create a store in the loading state
    pub fn new(store: Arc<dyn KeyValueStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::default());
        Self { store, authenticator, state: Mutex::new(SessionSnapshot::default()), tx }
    }

    /// Read the persisted session
    ///
    /// Absent, malformed or unreadable records load as signed out.
    pub async fn load(&self) -> Option<UserSession> {
        let stored: storage::Result<Option<UserSession>> = self.store.get_json(keys::USER).await;
        let user = match stored {
            Ok(user) => user,
            Err(storage::KvError::Serialization(e)) => {
                tracing::warn!("Ignoring malformed stored session: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("Failed to load session: {}", e);
                None
            }
        };

        if let Some(user) = &user {
            tracing::info!(user_id = %user.id, "restored session");
        }

        self.update(|state| {
            state.user = user.clone();
            state.is_loading = false;
        });

        user
    }

    /// Validate credentials and establish a session
    ///
    /// On failure the current session is left untouched. A failed write to
    /// the store is logged and the session is still established in memory.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserSession, AuthError> {
        let credentials = Credentials::new(email, password);

        let user = match self.authenticator.authenticate(&credentials).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(email, "Sign-in failed: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = self.store.set_json(keys::USER, &user).await {
            tracing::error!("Failed to persist session: {}", e);
        }

        self.update(|state| state.user = Some(user.clone()));
        tracing::info!(user_id = %user.id, "signed in");

        Ok(user)
    }

    /// End the session
    ///
    /// Always succeeds for the caller. The persisted record is removed before
    /// the in-memory session is cleared.
    pub async fn sign_out(&self) {
        if let Err(e) = self.store.remove(keys::USER).await {
            tracing::error!("Failed to remove persisted session, signing out anyway: {}", e);
        }

        if let Err(e) = self.authenticator.sign_out().await {
            tracing::warn!("Authenticator sign-out failed: {}", e);
        }

        self.update(|state| state.user = None);
        tracing::info!("signed out");
    }

    /// Sign out when an API call reports the token as expired or refused
    ///
    /// Returns whether the session was ended.
    pub async fn handle_api_error(&self, err: &ApiError) -> bool {
        if !err.requires_sign_out() {
            return false;
        }

        tracing::warn!(status = ?err.status(), "Forcing sign-out: {}", err);
        self.sign_out().await;
        true
    }

    /// True until [`load`](Self::load) completes
    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    /// Signed-in user, if any
    pub fn current_user(&self) -> Option<UserSession> {
        self.state.lock().user.clone()
    }

    /// Check if a user is signed in
    pub fn is_signed_in(&self) -> bool {
        self.state.lock().is_signed_in()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().clone()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        let mut state = self.state.lock();
        f(&mut state);
        self.tx.send_replace(state.clone());
    }
}
