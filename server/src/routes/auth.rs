//! Auth routes: cookie removal on logout and session introspection.

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use access::{SESSION_COOKIE, SessionClaims};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::state::AppState;

/// Cookie that deletes `auth_token` on the client.
pub(crate) fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// `POST /api/auth/logout` — clear the session cookie. Idempotent.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let had_session = jar.get(SESSION_COOKIE).is_some_and(|c| !c.value().is_empty());
    tracing::info!(had_session, "logout");

    let jar = CookieJar::new().add(removal_cookie(state.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

/// `GET /api/auth/session` — decoded claims of the current session cookie.
pub async fn session(State(state): State<AppState>, jar: CookieJar) -> Result<Json<SessionClaims>, StatusCode> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(Cookie::value)
        .filter(|t| !t.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.guard.decode(token).map_err(|e| {
        tracing::debug!(error = %e, "session introspection rejected token");
        StatusCode::UNAUTHORIZED
    })?;

    if claims.is_expired(access::unix_now()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(claims))
}
