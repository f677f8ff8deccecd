//! Page handlers behind the route guard.
//!
//! Rendering is deliberately bare: the dashboards themselves are served by a
//! separate front end. These pages give the guard's redirect targets and the
//! role dashboards a concrete landing spot.

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;

use std::fmt::Write;

use axum::extract::{Query, Request};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use serde::Deserialize;

use super::guard::SessionRole;

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    redirect: Option<String>,
    expired: Option<String>,
}

impl LoginQuery {
    fn is_expired(&self) -> bool {
        self.expired.as_deref() == Some("true")
    }
}

/// `GET /`
pub async fn home() -> Html<String> {
    page("Election administration", "<p><a href=\"/login\">Sign in</a></p>")
}

/// `GET /login` — sign-in landing; shows an expiry notice after a forced sign-out.
pub async fn login(Query(query): Query<LoginQuery>) -> Html<String> {
    let mut body = String::new();
    if query.is_expired() {
        body.push_str("<p class=\"notice\">Your session has expired. Please sign in again.</p>");
    }
    if let Some(target) = query.redirect.as_deref().filter(|t| t.starts_with('/')) {
        let _ = write!(body, "<p>After signing in you will return to <code>{}</code>.</p>", escape_html(target));
    }
    page("Sign in", &body)
}

/// `GET /register`
pub async fn register() -> Html<String> {
    page("Register", "<p>Accounts are provisioned by an administrator.</p>")
}

/// `GET /unauthorized` — the signed-in role may not open the requested page.
pub async fn unauthorized() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        page("Not authorized", "<p>Your role does not have access to that page.</p>"),
    )
}

/// Role dashboards under `/admin`, `/observer` and `/field-staff`.
pub async fn dashboard(request: Request) -> Html<String> {
    let path = request.uri().path();
    let title = dashboard_title(path);
    let role = request
        .extensions()
        .get::<SessionRole>()
        .map_or("unknown", |SessionRole(role)| role.as_str());
    let body = format!("<p>Signed in as <strong>{role}</strong>.</p><p>Viewing <code>{}</code>.</p>", escape_html(path));
    page(title, &body)
}

fn dashboard_title(path: &str) -> &'static str {
    match path.trim_start_matches('/').split('/').next().unwrap_or_default() {
        "admin" => "Administration dashboard",
        "observer" => "Observer dashboard",
        "field-staff" => "Field staff dashboard",
        _ => "Dashboard",
    }
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1>{body}</body></html>"
    ))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
