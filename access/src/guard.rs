//! Route guard: the per-navigation allow/redirect decision.
//!
//! DESIGN
//! ======
//! [`RouteGuard::check`] is a pure function of (path, cookie token, now).
//! It keeps no state between calls, so one guard can be shared behind an
//! `Arc` by every request handler. The [`AccessPolicy`] it consults is fixed
//! at construction and never mutated.
//!
//! DECISION ORDER
//! ==============
//! 1. exempt asset/API paths are skipped entirely;
//! 2. anything not under a protected prefix is allowed;
//! 3. no token → login;
//! 4. undecodable token → login, cookie cleared;
//! 5. expired token → login with the expiry marker, cookie cleared;
//! 6. superuser → allow;
//! 7. role prefix match → allow, otherwise unauthorized.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use url::form_urlencoded;

use crate::role::Role;
use crate::token::{SessionClaims, TokenError, TokenFormat};

/// Path prefixes (after the leading `/`) the guard never inspects.
pub const EXEMPT_PREFIXES: [&str; 4] = ["api", "_next/static", "_next/image", "favicon.ico"];

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

// =============================================================================
// POLICY
// =============================================================================

/// Where a path sits in the access policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    /// Skipped by the guard (assets, API routes).
    Exempt,
    /// Requires a session whose role may enter the path.
    Protected,
    /// Explicitly public (login, landing pages).
    Public,
    /// Neither listed as public nor protected; allowed.
    Unlisted,
}

/// Static table of protected and public routes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPolicy {
    protected: Vec<String>,
    public: Vec<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            protected: Role::ALL.iter().map(|role| role.home_prefix().to_owned()).collect(),
            public: vec!["/".into(), LOGIN_PATH.into(), "/register".into(), UNAUTHORIZED_PATH.into()],
        }
    }
}

impl AccessPolicy {
    /// Build a policy from explicit route lists. Routes are normalized to a
    /// single leading `/` and no trailing `/`.
    #[must_use]
    pub fn new<P, Q>(protected: P, public: Q) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        Q: IntoIterator,
        Q::Item: AsRef<str>,
    {
        Self {
            protected: protected.into_iter().filter_map(|r| normalize_route(r.as_ref())).collect(),
            public: public.into_iter().filter_map(|r| normalize_route(r.as_ref())).collect(),
        }
    }

    #[must_use]
    pub fn protected_routes(&self) -> &[String] {
        &self.protected
    }

    #[must_use]
    pub fn public_routes(&self) -> &[String] {
        &self.public
    }

    /// Classify a request path.
    ///
    /// Routes match whole segments, not raw string prefixes: `/admin` covers
    /// `/admin` and `/admin/voters` but not `/administrator`, which falls
    /// through to [`RouteClass::Unlisted`] unless listed itself. Exempt
    /// prefixes are the exception and match as plain text.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if is_exempt(path) {
            return RouteClass::Exempt;
        }
        if self.protected.iter().any(|route| route_matches(route, path)) {
            return RouteClass::Protected;
        }
        if self.public.iter().any(|route| route_matches(route, path)) {
            return RouteClass::Public;
        }
        RouteClass::Unlisted
    }
}

fn normalize_route(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let inner = trimmed.trim_matches('/');
    Some(format!("/{inner}"))
}

/// Whether the guard skips `path` entirely.
#[must_use]
pub fn is_exempt(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);
    EXEMPT_PREFIXES.iter().any(|prefix| rest.starts_with(prefix))
}

/// Segment-aware prefix match. `/` only matches the root itself.
fn route_matches(route: &str, path: &str) -> bool {
    if route == "/" {
        return path == "/" || path.is_empty();
    }
    match path.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

// =============================================================================
// DECISION
// =============================================================================

/// Why the guard sent a request to the login page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginReason {
    MissingToken,
    MalformedToken,
    Expired,
}

/// Outcome of guarding one navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Path is outside the guard's reach.
    Exempt,
    /// Request proceeds. Carries the session role when one was checked.
    Allow { role: Option<Role> },
    /// Redirect to the login page, returning to `redirect` afterwards.
    Login { redirect: String, reason: LoginReason },
    /// Authenticated, but the role may not enter this path.
    Unauthorized { role: Role },
}

impl GuardDecision {
    /// Whether the request should reach its handler.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Exempt | Self::Allow { .. })
    }

    /// Whether the response must delete the session cookie.
    #[must_use]
    pub fn clears_cookie(&self) -> bool {
        matches!(self, Self::Login { reason: LoginReason::MalformedToken | LoginReason::Expired, .. })
    }

    /// Redirect target, or `None` when the request is allowed.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Exempt | Self::Allow { .. } => None,
            Self::Login { redirect, reason } => {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.append_pair("redirect", redirect);
                if *reason == LoginReason::Expired {
                    query.append_pair("expired", "true");
                }
                Some(format!("{LOGIN_PATH}?{}", query.finish()))
            }
            Self::Unauthorized { .. } => Some(UNAUTHORIZED_PATH.to_owned()),
        }
    }
}

// =============================================================================
// GUARD
// =============================================================================

/// Stateless authorization filter over an [`AccessPolicy`].
#[derive(Clone, Debug, Default)]
pub struct RouteGuard {
    policy: AccessPolicy,
    format: TokenFormat,
}

impl RouteGuard {
    #[must_use]
    pub fn new(policy: AccessPolicy, format: TokenFormat) -> Self {
        Self { policy, format }
    }

    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    #[must_use]
    pub fn format(&self) -> TokenFormat {
        self.format
    }

    /// Decide whether a navigation to `path` carrying `token` may proceed at `now`
    /// (seconds since the Unix epoch).
    #[must_use]
    pub fn check(&self, path: &str, token: Option<&str>, now: i64) -> GuardDecision {
        match self.policy.classify(path) {
            RouteClass::Exempt => return GuardDecision::Exempt,
            RouteClass::Public | RouteClass::Unlisted => return GuardDecision::Allow { role: None },
            RouteClass::Protected => {}
        }

        let login = |reason| GuardDecision::Login { redirect: path.to_owned(), reason };

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return login(LoginReason::MissingToken);
        };

        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(%path, error = %e, "session token rejected");
                return login(LoginReason::MalformedToken);
            }
        };

        if claims.is_expired(now) {
            return login(LoginReason::Expired);
        }

        let role = claims.role();
        if role.may_enter(path) {
            GuardDecision::Allow { role: Some(role) }
        } else {
            GuardDecision::Unauthorized { role }
        }
    }

    /// Decode a token with this guard's configured layout.
    ///
    /// # Errors
    ///
    /// Propagates the [`TokenError`] from [`SessionClaims::parse`].
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        SessionClaims::parse(token, self.format)
    }
}
