//! Registry of open sessions
//!
//! Each session id maps to its own `SessionStateMachine`. Entries are only
//! touched through the map's per-key locking, so two sessions never see each
//! other's state. Every access refreshes the entry's last-seen time; sessions
//! that go quiet are reclaimed by `evict_idle`.

use super::{AcceptAll, Authenticator, Credentials, SessionStateMachine, SessionView, Transition};
use crate::error::{AqiError, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Sessions untouched for this long are considered abandoned
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    machine: SessionStateMachine,
    last_seen: Instant,
}

pub struct SessionStore {
    sessions: DashMap<Uuid, SessionEntry>,
    authenticator: Arc<dyn Authenticator>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Store whose logins always succeed
    pub fn new() -> Self {
        Self::with_authenticator(Arc::new(AcceptAll))
    }

    pub fn with_authenticator(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            sessions: DashMap::new(),
            authenticator,
        }
    }

    /// Open a new session in `LoggedOut`
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionEntry {
                machine: SessionStateMachine::new(),
                last_seen: Instant::now(),
            },
        );
        debug!(session_id = %id, "Session created");
        id
    }

    /// End a session. Returns false if it did not exist.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            debug!(session_id = %id, "Session ended");
        }
        removed
    }

    pub fn view(&self, id: &Uuid) -> Result<SessionView> {
        self.with_session(id, |session| Ok(session.view()))
    }

    pub fn user(&self, id: &Uuid) -> Result<Option<String>> {
        self.with_session(id, |session| Ok(session.user().map(str::to_string)))
    }

    pub fn login(&self, id: &Uuid, credentials: &Credentials) -> Result<Transition> {
        let authenticator = Arc::clone(&self.authenticator);
        self.with_session(id, |session| session.login(authenticator.as_ref(), credentials))
    }

    pub fn navigate(&self, id: &Uuid, to: SessionView) -> Result<Transition> {
        self.with_session(id, |session| session.navigate(to))
    }

    pub fn logout(&self, id: &Uuid) -> Result<Transition> {
        self.with_session(id, |session| session.logout())
    }

    /// Fails with `IllegalTransition` unless the session is logged in
    pub fn require_authenticated(&self, id: &Uuid, action: &str) -> Result<()> {
        self.with_session(id, |session| session.require_authenticated(action))
    }

    /// Run `f` with exclusive access to one session, marking it as active
    pub fn with_session<T>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut SessionStateMachine) -> Result<T>,
    ) -> Result<T> {
        let mut entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| AqiError::UnknownSession(id.to_string()))?;
        let entry = entry.value_mut();
        entry.last_seen = Instant::now();
        f(&mut entry.machine)
    }

    /// Drop sessions not touched within `max_idle`. Returns how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let keep = now.saturating_duration_since(entry.last_seen) < max_idle;
            if !keep {
                debug!(session_id = %id, "Session expired");
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
