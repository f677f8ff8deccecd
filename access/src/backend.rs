//! Remote session invalidation.
//!
//! The session manager calls [`SessionBackend::logout`] from a background
//! task after the local logout has already completed, so an implementation
//! may be slow or fail without affecting the caller.

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::time::Duration;

use reqwest::header::COOKIE;

use crate::SESSION_COOKIE;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("logout request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend could not be reached at all.
    #[error("logout backend unavailable: {0}")]
    Unavailable(String),
    #[error("logout task did not complete: {0}")]
    Task(String),
}

/// Server-side session invalidation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait SessionBackend: Send + Sync {
    /// Invalidate the server-side session for `token`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the request could not be delivered.
    async fn logout(&self, token: &str) -> Result<(), BackendError>;
}

/// `POST <base_url>/auth/logout` with the session cookie attached.
#[derive(Clone, Debug)]
pub struct HttpSessionBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionBackend {
    /// Build a backend client for `base_url` (for example `http://host/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS).min(request_timeout))
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn logout_url(&self) -> String {
        format!("{}/auth/logout", self.base_url)
    }
}

#[async_trait::async_trait]
impl SessionBackend for HttpSessionBackend {
    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .post(self.logout_url())
            .header(COOKIE, session_cookie_header(token))
            .send()
            .await
            .map_err(|e| if e.is_connect() { BackendError::Unavailable(e.to_string()) } else { BackendError::Http(e) })?;
        // The response body and status carry nothing the client acts on.
        tracing::debug!(status = %resp.status(), "logout response");
        Ok(())
    }
}

fn session_cookie_header(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}")
}
