//! Session transitions pushed to open pages.

#![allow(clippy::expect_used)]

use std::time::Duration;

use reqwest::StatusCode;

use skillswap_integration_tests::TestServer;

#[tokio::test]
async fn test_logout_is_pushed_to_open_stream() {
    let server = TestServer::start().await;
    let browser = server.browser();
    server.sign_up(&browser, "Maya", "maya@example.com").await;
    server.get(&browser, "/").await;

    let mut stream = server.get(&browser, "/session/events").await;
    assert_eq!(stream.status(), StatusCode::OK);
    assert_eq!(stream.headers()["content-type"], "text/event-stream");

    // Same cookie jar: the logout is this client's transition
    server.post(&browser, "/logout", &[]).await;

    let chunk = tokio::time::timeout(Duration::from_secs(5), stream.chunk())
        .await
        .expect("no event within 5s")
        .expect("stream error")
        .expect("stream ended");
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event: session"), "{text}");
    assert!(text.contains(r#"data: {"signed_in":false}"#), "{text}");
}

#[tokio::test]
async fn test_other_clients_are_not_notified() {
    let server = TestServer::start().await;
    let watcher = server.browser();
    server.get(&watcher, "/").await;
    let mut stream = server.get(&watcher, "/session/events").await;

    let other = server.browser();
    server.sign_up(&other, "Maya", "maya@example.com").await;

    let waited = tokio::time::timeout(Duration::from_millis(300), stream.chunk()).await;
    assert!(waited.is_err(), "unexpected event for another client");
}
