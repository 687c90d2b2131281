//! Session ownership.
//!
//! [`SessionManager`] is the single owner of the access/refresh tokens and the
//! cached user profile. It reads and writes them through a durable
//! [`KeyValueStore`] under fixed keys and announces lifecycle changes on a
//! broadcast channel.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use botdesk_models::{AuthTokens, User};
use botdesk_persistence::{KeyValueStore, REFRESH_TOKEN_KEY, TOKEN_KEY, USER_KEY};

use crate::error::Result;

/// Capacity of the session event channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new session was stored (login, registration, OAuth, verification).
    Established,
    /// Tokens were replaced by a refresh.
    Refreshed,
    /// The user logged out.
    Cleared,
    /// The session could not be recovered; the user must log in again.
    LoginRequired {
        /// Login entry point to send the user to.
        redirect_to: String,
    },
}

/// Snapshot of the stored session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Option<User>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Owns the session tokens in durable storage.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl SessionManager {
    /// Creates a manager over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// The underlying store, shared with other client-side state.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.store.get(TOKEN_KEY)?)
    }

    /// Current refresh token, if any.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.store.get(REFRESH_TOKEN_KEY)?)
    }

    /// Cached user profile. A corrupt entry reads as absent.
    pub fn user(&self) -> Result<Option<User>> {
        let Some(raw) = self.store.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cached user profile");
                Ok(None)
            }
        }
    }

    /// Returns true if an access token is stored.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token()?.is_some())
    }

    /// Full session snapshot, if both tokens are stored.
    pub fn current(&self) -> Result<Option<Session>> {
        let (Some(access_token), Some(refresh_token)) =
            (self.access_token()?, self.refresh_token()?)
        else {
            return Ok(None);
        };
        Ok(Some(Session {
            access_token,
            refresh_token,
            user: self.user()?,
        }))
    }

    /// Stores a fresh session, replacing whatever was there.
    pub fn establish(&self, tokens: &AuthTokens, user: Option<&User>) -> Result<()> {
        self.write_tokens(tokens)?;
        match user {
            Some(user) => self.set_user(user)?,
            None => self.store.remove(USER_KEY)?,
        }
        info!(user_id = ?user.map(|u| u.id), "session established");
        self.emit(SessionEvent::Established);
        Ok(())
    }

    /// Replaces both tokens after a refresh, keeping the cached profile.
    pub fn replace_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        self.write_tokens(tokens)?;
        debug!("session tokens replaced");
        self.emit(SessionEvent::Refreshed);
        Ok(())
    }

    /// Caches the user profile.
    pub fn set_user(&self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &raw)?;
        Ok(())
    }

    /// Logs out: removes tokens and profile.
    pub fn clear(&self) -> Result<()> {
        self.remove_all()?;
        info!("session cleared");
        self.emit(SessionEvent::Cleared);
        Ok(())
    }

    /// Ends a session that could not be refreshed and asks for a new login.
    ///
    /// Storage failures are logged; the login request is emitted regardless.
    pub fn expire(&self, redirect_to: &str) {
        if let Err(e) = self.remove_all() {
            warn!(error = %e, "failed to clear stored session");
        }
        info!(redirect_to, "session expired, login required");
        self.emit(SessionEvent::LoginRequired {
            redirect_to: redirect_to.to_string(),
        });
    }

    fn write_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        self.store.set(TOKEN_KEY, &tokens.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token)?;
        Ok(())
    }

    fn remove_all(&self) -> Result<()> {
        self.store
            .remove_many(&[TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])?;
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botdesk_models::UserId;
    use botdesk_persistence::MemoryStore;

    fn manager() -> (SessionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionManager::new(store.clone()), store)
    }

    fn user() -> User {
        User {
            id: UserId::new(1),
            email: "owner@example.com".into(),
            full_name: "Owner".into(),
            is_verified: true,
        }
    }

    #[test]
    fn test_establish_writes_fixed_keys() {
        let (session, store) = manager();
        let mut events = session.subscribe();

        session
            .establish(&AuthTokens::new("A1", "R1"), Some(&user()))
            .unwrap();

        assert_eq!(store.get("token").unwrap().as_deref(), Some("A1"));
        assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("R1"));
        assert_eq!(session.user().unwrap(), Some(user()));
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Established);
    }

    #[test]
    fn test_replace_tokens_keeps_user() {
        let (session, _) = manager();
        session
            .establish(&AuthTokens::new("A1", "R1"), Some(&user()))
            .unwrap();

        session.replace_tokens(&AuthTokens::new("A2", "R2")).unwrap();

        let current = session.current().unwrap().unwrap();
        assert_eq!(current.access_token, "A2");
        assert_eq!(current.refresh_token, "R2");
        assert_eq!(current.user, Some(user()));
    }

    #[test]
    fn test_expire_clears_everything_and_requests_login() {
        let (session, store) = manager();
        session
            .establish(&AuthTokens::new("A1", "R1"), Some(&user()))
            .unwrap();
        let mut events = session.subscribe();

        session.expire("/login");

        assert!(store.get("token").unwrap().is_none());
        assert!(store.get("refreshToken").unwrap().is_none());
        assert!(store.get("user").unwrap().is_none());
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::LoginRequired {
                redirect_to: "/login".into()
            }
        );
    }

    #[test]
    fn test_corrupt_user_reads_as_none() {
        let store = Arc::new(MemoryStore::with_entries([("user", "{broken")]));
        let session = SessionManager::new(store);
        assert!(session.user().unwrap().is_none());
    }

    #[test]
    fn test_current_requires_both_tokens() {
        let store = Arc::new(MemoryStore::with_entries([("token", "A1")]));
        let session = SessionManager::new(store);
        assert!(session.is_authenticated().unwrap());
        assert!(session.current().unwrap().is_none());
    }

    #[test]
    fn test_session_debug_is_redacted() {
        let session = Session {
            access_token: "secret-a".into(),
            refresh_token: "secret-r".into(),
            user: None,
        };
        assert!(!format!("{:?}", session).contains("secret"));
    }
}
