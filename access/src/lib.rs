//! Role-based authentication and route authorization shared by `server` and `cli`.
//!
//! ARCHITECTURE
//! ============
//! Leaves first:
//! - [`role`]: the fixed permission tiers and their path prefixes.
//! - [`token`]: strict decoding of the session token's claims segment.
//! - [`guard`]: the stateless allow/redirect decision for a navigation.
//! - [`store`]: persistent key-value storage for the client-side session.
//! - [`backend`]: the remote logout call.
//! - [`session`]: the auth session manager tying store and backend together.
//!
//! Nothing in this crate holds global state. Callers construct the pieces
//! they need and pass them around explicitly.

pub mod backend;
pub mod guard;
pub mod role;
pub mod session;
pub mod store;
pub mod token;

pub use backend::{BackendError, HttpSessionBackend, SessionBackend};
pub use guard::{AccessPolicy, GuardDecision, LoginReason, RouteClass, RouteGuard};
pub use role::{Role, UnknownRole};
pub use session::{AuthSession, LogoutTask, SessionState};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, StoredSession, TokenStore, User, UserId};
pub use token::{SessionClaims, TokenError, TokenFormat};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "auth_token";

/// Current Unix time in whole seconds. Clock errors collapse to `0`.
#[must_use]
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
