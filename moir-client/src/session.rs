//! Session context
//!
//! Holds the current authenticated identity and resolves it into a
//! renderable [`User`]. The context is an explicit object with a defined
//! lifecycle: construct it with the two backends, call
//! [`SessionContext::initialize`] on app start, and tear it down with
//! [`SessionContext::logout`]. Screens receive it by reference instead of
//! reaching for ambient global state.
//!
//! Profile resolution falls back in order so a UI can always render:
//! stored profile document, then the auth record's display name, then the
//! email local-part. While resolution is pending, dependents observe the
//! loading flag and must not redirect into the authenticated area.

use crate::{
    config::CollectionNames,
    errors::{MoirError, Result},
    store::{AuthEvent, AuthIdentity, AuthStore, DocumentStore, server_timestamp},
    types::{Fields, User, UserPatch},
};
use futures::stream::{Stream, StreamExt};
use serde_json::{Value, json};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

/// Resolution state of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup resolution still pending
    Loading,
    /// No identity signed in
    SignedOut,
    /// Resolved, renderable user
    SignedIn(User),
}

/// Notification emitted on every session change.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A user signed in and was resolved
    SignedIn(User),
    /// The current user signed out
    SignedOut,
    /// The signed-in user's profile changed
    ProfileUpdated(User),
}

/// The current authenticated identity and its profile.
pub struct SessionContext {
    auth: Arc<dyn AuthStore>,
    store: Arc<dyn DocumentStore>,
    collections: CollectionNames,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    /// Create a new context. The state starts as loading until
    /// [`initialize`](Self::initialize) has resolved the startup identity.
    pub fn new(
        auth: Arc<dyn AuthStore>,
        store: Arc<dyn DocumentStore>,
        collections: CollectionNames,
    ) -> Self {
        let (events, _rx) = broadcast::channel(16);
        Self {
            auth,
            store,
            collections,
            state: Mutex::new(SessionState::Loading),
            events,
        }
    }

    /// Resolve the identity the auth backend already holds, clearing the
    /// loading flag. Call once on app start.
    pub async fn initialize(&self) -> Result<()> {
        match self.auth.current_identity().await {
            Some(identity) => {
                let user = self.resolve_profile(&identity).await;
                self.transition(SessionState::SignedIn(user.clone()), SessionEvent::SignedIn(user))
                    .await;
            }
            None => {
                *self.state.lock().await = SessionState::SignedOut;
            }
        }
        Ok(())
    }

    /// Whether startup resolution is still pending.
    pub async fn is_loading(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Loading)
    }

    /// The resolved current user, if signed in.
    pub async fn current_user(&self) -> Option<User> {
        match &*self.state.lock().await {
            SessionState::SignedIn(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// Sign in with an email/password credential and resolve the profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let identity = self.auth.sign_in(email, password).await?;
        let user = self.resolve_profile(&identity).await;
        info!(uid = %identity.uid, "signed in");
        self.transition(SessionState::SignedIn(user.clone()), SessionEvent::SignedIn(user.clone()))
            .await;
        Ok(user)
    }

    /// Register a new identity and create its profile document.
    ///
    /// The two writes are one logical operation but not atomic: when the
    /// profile write fails the identity still exists, and later sign-ins
    /// fall back to a minimal profile.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let identity = self.auth.sign_up(email, password).await?;

        let mut fields = Fields::new();
        fields.insert("username".into(), json!(username));
        fields.insert("email".into(), json!(email));
        fields.insert("createdAt".into(), server_timestamp());
        if let Err(err) = self
            .store
            .set(&self.collections.users, &identity.uid, fields)
            .await
        {
            warn!(uid = %identity.uid, %err, "profile document creation failed after sign-up");
        }

        let user = User {
            id: identity.uid.clone(),
            username: username.to_string(),
            email: email.to_string(),
            first_name: None,
            occupation: None,
            avatar: None,
        };
        info!(uid = %identity.uid, "registered");
        self.transition(SessionState::SignedIn(user.clone()), SessionEvent::SignedIn(user.clone()))
            .await;
        Ok(user)
    }

    /// Sign out and clear the session.
    pub async fn logout(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.transition(SessionState::SignedOut, SessionEvent::SignedOut)
            .await;
        Ok(())
    }

    /// Apply a profile patch, persisting it to the profile document.
    pub async fn update_user(&self, patch: &UserPatch) -> Result<User> {
        let mut user = self.current_user().await.ok_or(MoirError::NotSignedIn)?;
        patch.apply(&mut user);

        self.store
            .set(
                &self.collections.users,
                &user.id,
                profile_fields(&user),
            )
            .await?;

        self.transition(
            SessionState::SignedIn(user.clone()),
            SessionEvent::ProfileUpdated(user.clone()),
        )
        .await;
        Ok(user)
    }

    /// Session-change notifications as a stream.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = SessionEvent> + Send + 'static>> {
        let rx = self.events.subscribe();
        Box::pin(
            tokio_stream::wrappers::BroadcastStream::new(rx)
                .filter_map(|result| async move { result.ok() }),
        )
    }

    /// Spawn a task mirroring the auth backend's own identity changes
    /// (token expiry, sign-in from another tab) into this context.
    pub fn spawn_auth_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let context = Arc::clone(self);
        let mut rx = context.auth.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                match event {
                    AuthEvent::SignedIn(identity) => {
                        let user = context.resolve_profile(&identity).await;
                        context
                            .transition(
                                SessionState::SignedIn(user.clone()),
                                SessionEvent::SignedIn(user),
                            )
                            .await;
                    }
                    AuthEvent::SignedOut => {
                        context
                            .transition(SessionState::SignedOut, SessionEvent::SignedOut)
                            .await;
                    }
                }
            }
        })
    }

    async fn transition(&self, state: SessionState, event: SessionEvent) {
        *self.state.lock().await = state;
        let _ = self.events.send(event);
    }

    /// Resolve an auth identity into a renderable user, degrading through
    /// the fallback chain instead of failing.
    async fn resolve_profile(&self, identity: &AuthIdentity) -> User {
        match self.store.get(&self.collections.users, &identity.uid).await {
            Ok(Some(doc)) => match serde_json::from_value::<User>(doc.into_value()) {
                Ok(user) => user,
                Err(err) => {
                    warn!(uid = %identity.uid, %err, "malformed profile document, using minimal identity");
                    minimal_user(identity)
                }
            },
            Ok(None) => {
                debug!(uid = %identity.uid, "no profile document yet");
                minimal_user(identity)
            }
            Err(err) => {
                warn!(uid = %identity.uid, %err, "profile fetch failed, using minimal identity");
                minimal_user(identity)
            }
        }
    }
}

/// Serialize a profile for its store document, dropping the id (the
/// document is keyed by it).
fn profile_fields(user: &User) -> Fields {
    match serde_json::to_value(user) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            fields
        }
        _ => Fields::new(),
    }
}

/// Minimal identity derived from the auth record alone: display name if
/// the backend has one, otherwise the email local-part.
fn minimal_user(identity: &AuthIdentity) -> User {
    let username = identity
        .display_name
        .clone()
        .or_else(|| {
            identity
                .email
                .split('@')
                .next()
                .filter(|part| !part.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "User".to_string());
    User {
        id: identity.uid.clone(),
        username,
        email: identity.email.clone(),
        first_name: None,
        occupation: None,
        avatar: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn context() -> (Arc<MemoryStore>, SessionContext) {
        let store = Arc::new(MemoryStore::new());
        let session = SessionContext::new(
            store.clone(),
            store.clone(),
            CollectionNames::default(),
        );
        (store, session)
    }

    #[tokio::test]
    async fn test_loading_until_initialized() {
        let (_store, session) = context();
        assert!(session.is_loading().await);
        session.initialize().await.unwrap();
        assert!(!session.is_loading().await);
        assert!(session.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_register_creates_profile_document() {
        let (store, session) = context();
        let user = session
            .register("ada", "ada@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(user.username, "ada");

        let doc = store.get("users", &user.id).await.unwrap().unwrap();
        assert_eq!(doc.fields["username"], json!("ada"));
        assert!(doc.fields["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_login_resolves_stored_profile() {
        let (_store, session) = context();
        session
            .register("ada", "ada@example.com", "hunter2")
            .await
            .unwrap();
        session.logout().await.unwrap();

        let user = session.login("ada@example.com", "hunter2").await.unwrap();
        assert_eq!(user.username, "ada");
    }

    #[tokio::test]
    async fn test_fallback_to_email_local_part() {
        let (store, session) = context();
        // Identity exists but the profile document was never written.
        store.sign_up("grace@example.com", "pw").await.unwrap();
        store.sign_out().await.unwrap();

        let user = session.login("grace@example.com", "pw").await.unwrap();
        assert_eq!(user.username, "grace");
    }

    #[tokio::test]
    async fn test_fallback_when_profile_fetch_fails() {
        let (store, session) = context();
        session
            .register("ada", "ada@example.com", "hunter2")
            .await
            .unwrap();
        session.logout().await.unwrap();

        store.fail_next_fetch();
        let user = session.login("ada@example.com", "hunter2").await.unwrap();
        // Degraded but renderable.
        assert_eq!(user.username, "ada");
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_update_user_persists_patch() {
        let (store, session) = context();
        let user = session
            .register("ada", "ada@example.com", "hunter2")
            .await
            .unwrap();

        let patch = UserPatch {
            occupation: Some("Engineer".into()),
            ..Default::default()
        };
        let updated = session.update_user(&patch).await.unwrap();
        assert_eq!(updated.occupation.as_deref(), Some("Engineer"));

        let doc = store.get("users", &user.id).await.unwrap().unwrap();
        assert_eq!(doc.fields["occupation"], json!("Engineer"));
    }

    #[tokio::test]
    async fn test_update_user_requires_session() {
        let (_store, session) = context();
        session.initialize().await.unwrap();
        let err = session.update_user(&UserPatch::default()).await.unwrap_err();
        assert!(matches!(err, MoirError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_events_stream() {
        let (_store, session) = context();
        let mut events = session.events();
        session
            .register("ada", "ada@example.com", "hunter2")
            .await
            .unwrap();
        session.logout().await.unwrap();

        assert!(matches!(
            events.next().await.unwrap(),
            SessionEvent::SignedIn(_)
        ));
        assert!(matches!(events.next().await.unwrap(), SessionEvent::SignedOut));
    }
}
