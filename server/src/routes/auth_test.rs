use access::{Role, TokenFormat};
use reqwest::header::COOKIE;

use super::*;
use crate::routes::test_helpers::{client, set_cookies, spawn_app};
use crate::state::test_helpers::{test_app_state, token_for};

#[test]
fn removal_cookie_expires_immediately() {
    let cookie = removal_cookie(true);
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.http_only(), Some(true));
}

#[tokio::test]
async fn logout_clears_cookie_with_or_without_session() {
    let base = spawn_app(test_app_state()).await;
    let token = token_for(Role::Observer, 600, TokenFormat::Compact);

    for cookie in [Some(format!("{SESSION_COOKIE}={token}")), None] {
        let mut req = client().post(format!("{base}/api/auth/logout"));
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
        let cookies = set_cookies(&resp);
        assert!(cookies.iter().any(|c| c.starts_with("auth_token=;") && c.contains("Max-Age=0")), "{cookies:?}");
    }
}

#[tokio::test]
async fn session_returns_decoded_claims() {
    let base = spawn_app(test_app_state()).await;
    let token = token_for(Role::FieldStaff, 600, TokenFormat::Compact);
    let resp = client()
        .get(format!("{base}/api/auth/session"))
        .header(COOKIE, format!("{SESSION_COOKIE}={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["role"], "field_staff");
    assert_eq!(body["role_id"], 3);
    assert!(body["exp"].as_i64().unwrap() > access::unix_now());
}

#[tokio::test]
async fn session_rejects_missing_malformed_and_expired_tokens() {
    let base = spawn_app(test_app_state()).await;
    let expired = token_for(Role::Admin, -5, TokenFormat::Compact);
    for cookie in [None, Some("garbage".to_owned()), Some(expired)] {
        let mut req = client().get(format!("{base}/api/auth/session"));
        if let Some(token) = cookie {
            req = req.header(COOKIE, format!("{SESSION_COOKIE}={token}"));
        }
        assert_eq!(req.send().await.unwrap().status(), reqwest::StatusCode::UNAUTHORIZED);
    }
}
