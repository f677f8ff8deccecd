use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;

/// Accept one connection, capture the request head, reply with `status_line`.
async fn one_shot_server(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let reply = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        socket.write_all(reply.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&buf).to_ascii_lowercase()
    });
    (format!("http://{addr}/api"), handle)
}

#[test]
fn logout_url_trims_trailing_slash() {
    let backend = HttpSessionBackend::new("http://localhost:3000/api/", Duration::from_secs(1)).unwrap();
    assert_eq!(backend.logout_url(), "http://localhost:3000/api/auth/logout");
}

#[test]
fn session_cookie_header_names_auth_token() {
    assert_eq!(session_cookie_header("abc.def"), "auth_token=abc.def");
}

#[tokio::test]
async fn logout_posts_with_session_cookie() {
    let (base_url, server) = one_shot_server("HTTP/1.1 204 No Content").await;
    let backend = HttpSessionBackend::new(&base_url, Duration::from_secs(5)).unwrap();
    backend.logout("tok.sig").await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("post /api/auth/logout http/1.1"), "{request}");
    assert!(request.contains("cookie: auth_token=tok.sig"), "{request}");
}

#[tokio::test]
async fn logout_ignores_error_status() {
    let (base_url, server) = one_shot_server("HTTP/1.1 500 Internal Server Error").await;
    let backend = HttpSessionBackend::new(&base_url, Duration::from_secs(5)).unwrap();
    assert!(backend.logout("tok").await.is_ok());
    server.await.unwrap();
}

#[tokio::test]
async fn logout_reports_unreachable_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpSessionBackend::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = backend.logout("tok").await.unwrap_err();
    assert!(matches!(err, BackendError::Unavailable(_)), "{err:?}");
}
