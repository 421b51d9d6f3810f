//! Signed-in user state, injectable and observable.

use crate::error::Result;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub const USER_TOKEN_KEY: &str = "userToken";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: Option<String>,
}

impl AuthUser {
    /// Public name attached to reviews: the email's local part, else "user".
    pub fn display_name(&self) -> String {
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("user")
            .to_string()
    }
}

pub struct SessionContext {
    tx: watch::Sender<Option<AuthUser>>,
    store: Arc<dyn KeyValueStore>,
}

/// Receives every sign-in state change. Dropping it unsubscribes.
pub struct Subscription {
    rx: watch::Receiver<Option<AuthUser>>,
}

impl Subscription {
    /// Waits for the next change. `None` once the session context is gone.
    pub async fn changed(&mut self) -> Option<Option<AuthUser>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.rx.borrow().clone()
    }

    pub fn unsubscribe(self) {}
}

impl SessionContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx, store }
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn id_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|u| u.id_token.clone())
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Persists (or clears) the id token, then notifies subscribers.
    pub async fn set_user(&self, user: Option<AuthUser>) -> Result<()> {
        match &user {
            Some(u) => {
                self.store.set(USER_TOKEN_KEY, &u.id_token).await?;
                info!("Signed in as {}", u.uid);
            }
            None => {
                self.store.remove(USER_TOKEN_KEY).await?;
                info!("Signed out");
            }
        }
        self.tx.send_replace(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn user(email: Option<&str>) -> AuthUser {
        AuthUser {
            uid: "uid-1".to_string(),
            email: email.map(|e| e.to_string()),
            id_token: "token-1".to_string(),
            refresh_token: None,
        }
    }

    #[test]
    fn display_name_from_email() {
        assert_eq!(user(Some("ana@example.com")).display_name(), "ana");
        assert_eq!(user(None).display_name(), "user");
        assert_eq!(user(Some("@example.com")).display_name(), "user");
    }

    #[tokio::test]
    async fn notifies_subscribers_and_persists_token() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionContext::new(store.clone());
        let mut sub = session.subscribe();
        assert_eq!(session.subscriber_count(), 1);

        session.set_user(Some(user(Some("ana@example.com")))).await.unwrap();
        assert_eq!(sub.changed().await.unwrap().map(|u| u.uid), Some("uid-1".to_string()));
        assert_eq!(
            store.get(USER_TOKEN_KEY).await.unwrap().as_deref(),
            Some("token-1")
        );

        session.set_user(None).await.unwrap();
        assert_eq!(sub.changed().await, Some(None));
        assert_eq!(store.get(USER_TOKEN_KEY).await.unwrap(), None);
        assert!(!session.is_signed_in());

        sub.unsubscribe();
        assert_eq!(session.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn set_user_without_subscribers_still_updates() {
        let session = SessionContext::new(Arc::new(MemoryStore::new()));
        session.set_user(Some(user(None))).await.unwrap();
        assert_eq!(session.id_token().as_deref(), Some("token-1"));
    }
}
