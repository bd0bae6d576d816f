//! Signed-in user context
//!
//! Identity is owned outside the orchestrator. The orchestrator only takes a
//! snapshot of the current user when a generation is triggered.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// A signed-in user as reported by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Full name, then name, then email, then id
    pub fn display_name(&self) -> &str {
        [&self.full_name, &self.name, &self.email]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(self.id.as_str())
    }
}

/// Source of the current identity and its changes
pub trait IdentityProvider: Send + Sync {
    /// Current user, `None` when signed out
    fn current_user(&self) -> Option<User>;

    /// Receiver that observes every sign-in and sign-out
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

/// In-process identity holder backed by a watch channel
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Option<User>>>,
}

impl SessionHandle {
    pub fn new(user: Option<User>) -> Self {
        let (tx, _rx) = watch::channel(user);
        Self { tx: Arc::new(tx) }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, user: User) {
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl IdentityProvider for SessionHandle {
    fn current_user(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }
}
