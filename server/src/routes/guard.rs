//! Route-guard middleware.
//!
//! SYSTEM CONTEXT
//! ==============
//! Installed around the whole router, so every navigable request passes
//! through [`route_guard`] before reaching a page handler. The decision itself
//! lives in `access::RouteGuard`; this layer only translates it into HTTP:
//! a 307 redirect, an optional cookie removal, or passing the request on with
//! the session role attached as an extension.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use access::{GuardDecision, Role, SESSION_COOKIE};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::auth::removal_cookie;
use crate::state::AppState;

/// Role of the session that passed the guard, available to page handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionRole(pub Role);

/// Guard every request against the configured access policy.
pub async fn route_guard(State(state): State<AppState>, jar: CookieJar, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let token = jar.get(SESSION_COOKIE).map(Cookie::value);
    let decision = state.guard.check(&path, token, access::unix_now());

    let Some(location) = decision.location() else {
        if let GuardDecision::Allow { role: Some(role) } = decision {
            request.extensions_mut().insert(SessionRole(role));
        }
        return next.run(request).await;
    };

    tracing::info!(%path, ?decision, %location, "route guard redirect");
    let redirect = Redirect::temporary(&location);
    if decision.clears_cookie() {
        let jar = CookieJar::new().add(removal_cookie(state.cookie_secure));
        (jar, redirect).into_response()
    } else {
        redirect.into_response()
    }
}
