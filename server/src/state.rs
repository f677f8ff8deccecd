//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and the guard middleware via the
//! `State` extractor. The route guard is immutable after startup, so it is
//! shared behind an `Arc` with no locking.

use std::sync::Arc;

use access::RouteGuard;

use crate::config::ServerConfig;

/// Shared application state. Clone is required by Axum; all fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<RouteGuard>,
    /// Whether cookies written by the server carry the `Secure` attribute.
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            guard: Arc::new(RouteGuard::new(config.policy.clone(), config.token_format)),
            cookie_secure: config.cookie_secure,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use access::{AccessPolicy, Role, SessionClaims, TokenFormat};

    use super::*;

    /// State with the default policy and compact tokens.
    #[must_use]
    pub fn test_app_state() -> AppState {
        test_app_state_with(TokenFormat::Compact)
    }

    #[must_use]
    pub fn test_app_state_with(format: TokenFormat) -> AppState {
        AppState { guard: Arc::new(RouteGuard::new(AccessPolicy::default(), format)), cookie_secure: false }
    }

    /// Unsigned token for `role` expiring `ttl_secs` from now (negative for past).
    #[must_use]
    pub fn token_for(role: Role, ttl_secs: i64, format: TokenFormat) -> String {
        SessionClaims::new(role, access::unix_now() + ttl_secs).encode_unsigned(format)
    }
}
