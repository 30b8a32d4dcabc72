//! Shared session state and the single clear-session path.
//!
//! `SessionContext` is created once per process and shared (via `Arc`) by
//! the `SessionStore` and the `ApiClient`. Both the explicit logout and the
//! HTTP layer's reaction to a rejected token go through `clear_session`.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use super::session::{AuthState, Session, SessionData, User};
use crate::storage::{SessionStorage, TOKEN_KEY, USER_KEY};

/// Receives the "go to the login screen" signal after a forced logout.
pub trait Navigator: Send + Sync {
    fn navigate_to_login(&self);
}

/// Navigator for embedders that poll `SessionContext::snapshot` instead
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate_to_login(&self) {}
}

/// Bearer token captured for one outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    /// Session generation the token belongs to
    pub generation: u64,
}

struct Inner {
    session: Session,
    /// Bumped on every install or clear of a session
    generation: u64,
    bootstrapped: bool,
}

pub struct SessionContext {
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    inner: RwLock<Inner>,
}

impl SessionContext {
    pub fn new(storage: Arc<dyn SessionStorage>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            storage,
            navigator,
            inner: RwLock::new(Inner {
                session: Session::default(),
                generation: 0,
                bootstrapped: false,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Session {
        self.read().session.clone()
    }

    pub fn state(&self) -> AuthState {
        self.read().session.state()
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Token to attach to a request, if logged in
    pub fn credential(&self) -> Option<Credential> {
        let inner = self.read();
        inner.session.token().map(|token| Credential {
            token: token.to_string(),
            generation: inner.generation,
        })
    }

    /// Restore the session from storage. Only the first call reads storage.
    pub(crate) fn bootstrap(&self) -> AuthState {
        let mut inner = self.write();
        if inner.bootstrapped {
            return inner.session.state();
        }
        inner.bootstrapped = true;
        inner.session.loading = false;

        if inner.session.data.is_some() {
            // A login completed before bootstrap ran; it already persisted itself
            return AuthState::Authenticated;
        }

        match self.read_persisted() {
            Some(data) => {
                info!(user_id = data.user.id, "Restored persisted session");
                inner.session.data = Some(data);
                inner.generation += 1;
            }
            None => debug!("No persisted session"),
        }
        inner.session.state()
    }

    /// Load `{token, user}` from storage, discarding malformed records.
    ///
    /// A failed read leaves storage alone; the record may be fine next run.
    fn read_persisted(&self) -> Option<SessionData> {
        let stored = self
            .storage
            .get(TOKEN_KEY)
            .and_then(|token| Ok((token, self.storage.get(USER_KEY)?)));

        let (token, user_raw) = match stored {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                return None;
            }
        };

        let token = token.filter(|t| !t.is_empty());
        let user_raw = user_raw.filter(|u| !u.is_empty());
        match (token, user_raw) {
            (Some(token), Some(user_raw)) => match serde_json::from_str::<User>(&user_raw) {
                Ok(user) => Some(SessionData { token, user }),
                Err(e) => {
                    warn!(error = %e, "Persisted user record is malformed, discarding");
                    self.remove_persisted();
                    None
                }
            },
            (None, None) => None,
            _ => {
                warn!("Incomplete persisted session, discarding");
                self.remove_persisted();
                None
            }
        }
    }

    fn write_persisted(&self, data: &SessionData) {
        let result = serde_json::to_string(&data.user)
            .map_err(anyhow::Error::from)
            .and_then(|user| {
                self.storage.set(TOKEN_KEY, &data.token)?;
                self.storage.set(USER_KEY, &user)
            });
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove persisted session key");
            }
        }
    }

    /// Make `data` the current session, in memory and in storage.
    ///
    /// Also ends the bootstrapping state, so a login that beats `bootstrap`
    /// is reported as authenticated.
    pub(crate) fn install(&self, data: SessionData) -> u64 {
        let mut inner = self.write();
        self.write_persisted(&data);
        inner.session.loading = false;
        info!(user_id = data.user.id, "Session established");
        inner.session.data = Some(data);
        inner.generation += 1;
        inner.generation
    }

    /// Swap in a refreshed identity, keeping the token. Ignored if the session
    /// changed since `generation`.
    pub(crate) fn replace_user(&self, generation: u64, user: User) -> bool {
        let mut inner = self.write();
        if inner.generation != generation {
            return false;
        }
        let Some(data) = inner.session.data.as_mut() else {
            return false;
        };
        data.user = user;
        let data = data.clone();
        self.write_persisted(&data);
        true
    }

    /// Drop the session from memory and storage. Safe to call repeatedly.
    ///
    /// Returns true if a session was present.
    pub fn clear_session(&self) -> bool {
        let mut inner = self.write();
        self.clear_locked(&mut inner)
    }

    fn clear_locked(&self, inner: &mut Inner) -> bool {
        self.remove_persisted();
        let had_session = inner.session.data.take().is_some();
        if had_session {
            inner.generation += 1;
            info!("Session cleared");
        }
        had_session
    }

    /// React to a rejected token: clear the session and send the user to the
    /// login screen.
    ///
    /// Only acts when `generation` is still current, so a burst of 401s fires
    /// the navigator once and a late 401 from an older session cannot log out
    /// a newer one. Returns true if this call performed the logout.
    pub fn force_logout(&self, generation: u64) -> bool {
        {
            let mut inner = self.write();
            if inner.generation != generation || inner.session.data.is_none() {
                debug!(
                    generation,
                    current = inner.generation,
                    "Ignoring stale authentication failure"
                );
                return false;
            }
            self.clear_locked(&mut inner);
        }
        warn!("Token expired or invalid, forcing logout");
        self.navigator.navigate_to_login();
        true
    }
}
