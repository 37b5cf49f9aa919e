//! Session state shared by every request
//!
//! Holds the current credential and identity behind one lock and mirrors
//! them into the persistent store under fixed keys, so other contexts (and
//! later runs) see the same session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use jigsaw_domain::constants::{ACCESS_TOKEN_KEY, USER_KEY};
use jigsaw_domain::{AuthSession, User};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::AuthEvents;
use super::types::{AuthEvent, LogoutReason, Session};
use crate::storage::{KeyValueStore, StorageChange, StorageResult};

/// Current session plus its persistent mirror
///
/// Every sign-in and sign-out starts a new generation. Renewals capture the
/// generation before their exchange and only land if it is still current.
pub struct SessionStore {
    state: RwLock<Session>,
    generation: AtomicU64,
    storage: Arc<dyn KeyValueStore>,
    events: AuthEvents,
}

impl SessionStore {
    /// Empty session over `storage`; call [`SessionStore::restore`] to load
    /// whatever a previous run left behind
    pub fn new(storage: Arc<dyn KeyValueStore>, events: AuthEvents) -> Self {
        Self {
            state: RwLock::new(Session::default()),
            generation: AtomicU64::new(0),
            storage,
            events,
        }
    }

    /// Load credential and identity from the store
    ///
    /// An unreadable identity record is dropped with a warning; the
    /// credential alone is still a usable session.
    pub async fn restore(&self) -> StorageResult<Session> {
        let access_token = self.storage.get(ACCESS_TOKEN_KEY).await?;
        let user = match self.storage.get(USER_KEY).await? {
            Some(raw) => parse_user(&raw),
            None => None,
        };

        let session = Session { access_token, user };
        debug!(authenticated = session.is_authenticated(), "restored session");
        self.reset(session.clone());
        Ok(session)
    }

    /// Persist and publish a freshly issued session
    ///
    /// The store is written first; memory only changes once both keys are
    /// persisted, so a storage failure leaves the previous session in place.
    pub async fn install(&self, session: AuthSession) -> StorageResult<()> {
        let user_json = serde_json::to_string(&session.user)?;
        self.storage.set(ACCESS_TOKEN_KEY, &session.access_token).await?;
        self.storage.set(USER_KEY, &user_json).await?;

        self.reset(Session {
            access_token: Some(session.access_token),
            user: Some(session.user.clone()),
        });

        info!(user = session.user.display_name().unwrap_or("<unknown>"), "session started");
        self.events.emit(AuthEvent::SessionStarted { user: session.user });
        Ok(())
    }

    /// Current session generation, captured before a renewal starts
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Swap in a renewed credential, keeping the identity
    ///
    /// Returns `false` and drops the credential when the session was ended
    /// or replaced after `generation` was read. Memory is updated before the
    /// store so requests replayed after the renewal use the new credential
    /// even if persisting it fails.
    pub async fn replace_token(&self, generation: u64, access_token: String) -> bool {
        {
            let mut state = self.state.write();
            if self.generation() != generation || !state.is_authenticated() {
                debug!("session changed during renewal, discarding credential");
                return false;
            }
            state.access_token = Some(access_token.clone());
        }

        if let Err(err) = self.storage.set(ACCESS_TOKEN_KEY, &access_token).await {
            warn!(error = %err, "failed to persist renewed credential");
        }
        // A logout that ran while the write was pending must not be undone
        if self.generation() != generation && !self.is_authenticated() {
            if let Err(err) = self.storage.remove(ACCESS_TOKEN_KEY).await {
                warn!(error = %err, "failed to clear persisted session");
            }
            return false;
        }

        info!("access token refreshed");
        self.events.emit(AuthEvent::TokenRefreshed);
        true
    }

    /// Clear the session everywhere and announce why
    pub async fn end(&self, reason: LogoutReason) {
        self.reset(Session::default());

        for key in [ACCESS_TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key).await {
                warn!(key, error = %err, "failed to clear persisted session");
            }
        }

        info!(%reason, "session ended");
        self.events.emit(AuthEvent::LoggedOut { reason });
    }

    /// End the session after a failed renewal
    ///
    /// Does nothing if the session already moved past `generation`, so a
    /// renewal that fails after a logout does not announce a second one.
    pub async fn expire(&self, generation: u64) -> bool {
        if self.generation() != generation {
            debug!("session changed during renewal, not expiring");
            return false;
        }
        self.end(LogoutReason::RefreshFailed).await;
        true
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Credential and identity read together under one lock
    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// Apply a write made by another context
    ///
    /// Returns the event emitted, if any. Unrelated keys are ignored.
    pub fn apply_external_change(&self, change: &StorageChange) -> Option<AuthEvent> {
        let event = match change.key.as_str() {
            ACCESS_TOKEN_KEY => self.sync_token(change.new_value.as_deref()),
            USER_KEY => {
                self.state.write().user = change.new_value.as_deref().and_then(parse_user);
                None
            }
            _ => None,
        }?;

        self.events.emit(event.clone());
        Some(event)
    }

    /// Follow writes from other contexts until this store is dropped
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.storage.subscribe();
        let session = Arc::downgrade(self);

        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                let Some(store) = Weak::upgrade(&session) else {
                    break;
                };
                debug!(key = %change.key, origin = %change.origin, "storage change from another context");
                store.apply_external_change(&change);
            }
        })
    }

    fn sync_token(&self, new_value: Option<&str>) -> Option<AuthEvent> {
        let mut state = self.state.write();
        match new_value {
            Some(token) if state.access_token.as_deref() != Some(token) => {
                state.access_token = Some(token.to_string());
                drop(state);
                info!("credential changed in another context");
                Some(AuthEvent::SessionSynced)
            }
            Some(_) => None,
            None if state.is_authenticated() => {
                *state = Session::default();
                self.generation.fetch_add(1, Ordering::AcqRel);
                drop(state);
                info!("credential removed in another context");
                Some(AuthEvent::LoggedOut { reason: LogoutReason::ExternalChange })
            }
            None => None,
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.is_authenticated())
            .field("user", &state.user.as_ref().and_then(User::display_name))
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Replace the whole session and start a new generation
    fn reset(&self, session: Session) {
        let mut state = self.state.write();
        *state = session;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

fn parse_user(raw: &str) -> Option<User> {
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(err) => {
            warn!(error = %err, "ignoring unreadable persisted identity");
            None
        }
    }
}
