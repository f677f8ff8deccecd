//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every route, including the fallback, sits behind the route-guard
//! middleware. API routes under `/api` and static asset paths are exempted by
//! the guard itself, not by router layout, so the exemption list stays in one
//! place.

pub mod auth;
pub mod guard;
pub mod pages;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with the guard installed.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/register", get(pages::register))
        .route("/unauthorized", get(pages::unauthorized))
        .route("/admin", get(pages::dashboard))
        .route("/admin/{*rest}", get(pages::dashboard))
        .route("/observer", get(pages::dashboard))
        .route("/observer/{*rest}", get(pages::dashboard))
        .route("/field-staff", get(pages::dashboard))
        .route("/field-staff/{*rest}", get(pages::dashboard))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), guard::route_guard))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Serve the app on an ephemeral local port and return its base URL.
    pub async fn spawn_app(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// HTTP client that reports redirects instead of following them.
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    /// All `Set-Cookie` header values on a response.
    pub fn set_cookies(resp: &reqwest::Response) -> Vec<String> {
        resp.headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_owned))
            .collect()
    }
}
