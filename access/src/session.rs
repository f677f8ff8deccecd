//! Auth session manager for the current client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Dashboards read `user`/`is_logged_in`/`loading` to decide what to render,
//! login forms hand a freshly issued session to [`AuthSession::login`], and
//! the sign-out button calls [`AuthSession::logout`]. The value is owned by
//! whoever drives the UI and passed explicitly; there is no global session.
//!
//! ERROR HANDLING
//! ==============
//! Restore never fails: unreadable or corrupt storage degrades to signed-out.
//! Logout never fails locally: storage errors are logged, and the remote
//! invalidation runs as a background task whose outcome is reported through
//! [`LogoutTask`] and the log, never to the caller's control flow.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, SessionBackend};
use crate::store::{StoreError, TokenStore, User};

/// In-memory view of the signed-in session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub role: Option<String>,
}

/// Handle to the background remote-logout call.
///
/// Dropping it detaches the task; awaiting [`LogoutTask::finish`] observes
/// the outcome.
#[derive(Debug)]
pub struct LogoutTask {
    inner: LogoutOutcome,
}

#[derive(Debug)]
enum LogoutOutcome {
    Skipped,
    Spawned(JoinHandle<Result<(), BackendError>>),
    NotStarted(BackendError),
}

impl LogoutTask {
    fn skipped() -> Self {
        Self { inner: LogoutOutcome::Skipped }
    }

    /// Whether a remote call was issued.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.inner, LogoutOutcome::Spawned(_))
    }

    /// Wait for the remote call. Resolves to `Ok(())` when no call was needed.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or [`BackendError::Task`] if the task
    /// could not be started, panicked, or was cancelled.
    pub async fn finish(self) -> Result<(), BackendError> {
        match self.inner {
            LogoutOutcome::Spawned(handle) => handle.await.map_err(|e| BackendError::Task(e.to_string()))?,
            LogoutOutcome::NotStarted(e) => Err(e),
            LogoutOutcome::Skipped => Ok(()),
        }
    }
}

/// Explicit session-state object: current user, persistence, remote logout.
pub struct AuthSession {
    store: TokenStore,
    backend: Arc<dyn SessionBackend>,
    state: SessionState,
    loading: bool,
}

impl AuthSession {
    /// Create an unrestored session. `loading()` is `true` until [`Self::restore`].
    #[must_use]
    pub fn new(store: TokenStore, backend: Arc<dyn SessionBackend>) -> Self {
        Self { store, backend, state: SessionState::default(), loading: true }
    }

    /// Create a session and immediately restore it from storage.
    #[must_use]
    pub fn restored(store: TokenStore, backend: Arc<dyn SessionBackend>) -> Self {
        let mut session = Self::new(store, backend);
        session.restore();
        session
    }

    /// Load `{token, user}` from storage. Corrupt user data clears all keys.
    /// Always leaves `loading()` false.
    pub fn restore(&mut self) {
        self.state = match self.store.load() {
            Ok(Some(stored)) => {
                debug!(user = %stored.user.id, "session restored from storage");
                SessionState { user: Some(stored.user), token: Some(stored.token), role: stored.role }
            }
            Ok(None) => SessionState::default(),
            Err(StoreError::CorruptUser(e)) => {
                warn!(error = %e, "stored user is corrupt; clearing session");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "failed to clear corrupt session");
                }
                SessionState::default()
            }
            Err(e) => {
                warn!(error = %e, "session storage unreadable; starting signed out");
                SessionState::default()
            }
        };
        self.loading = false;
    }

    /// Replace the current session and persist it. The token is not inspected.
    ///
    /// # Errors
    ///
    /// Returns the storage error if persisting fails. The in-memory session is
    /// already replaced when this happens.
    pub fn login(&mut self, user: User, token: impl Into<String>, role: impl Into<String>) -> Result<(), StoreError> {
        let token = token.into();
        let role = role.into();
        let persisted = self.store.save(&token, &role, &user);
        info!(user = %user.id, role = %role, "signed in");
        self.state = SessionState { user: Some(user), token: Some(token), role: Some(role) };
        self.loading = false;
        persisted
    }

    /// Sign out locally and start remote invalidation in the background.
    ///
    /// Without a Tokio runtime the remote call is not attempted and the
    /// returned task resolves to [`BackendError::Task`].
    pub fn logout(&mut self) -> LogoutTask {
        let previous = std::mem::take(&mut self.state);
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear stored session on logout");
        }
        info!("signed out");

        let Some(token) = previous.token else {
            return LogoutTask::skipped();
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; skipping remote logout");
            return LogoutTask { inner: LogoutOutcome::NotStarted(BackendError::Task("no async runtime".into())) };
        };
        let backend = Arc::clone(&self.backend);
        let handle = runtime.spawn(async move {
            let result = backend.logout(&token).await;
            if let Err(e) = &result {
                warn!(error = %e, "remote logout failed");
            }
            result
        });
        LogoutTask { inner: LogoutOutcome::Spawned(handle) }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.state.role.as_deref()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.user.is_some()
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }
}
