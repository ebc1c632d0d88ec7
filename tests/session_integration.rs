//! Integration tests for session bootstrap against a mock catalog.

mod support;

use gogdl_core::auth::{CookieRecord, Session, SessionError};
use gogdl_core::http::{BROWSER_USER_AGENT, HttpTimeouts};
use support::socket_guard::start_mock_server_or_skip;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn host_cookie(name: &str, value: &str) -> CookieRecord {
    CookieRecord::new(
        "127.0.0.1".to_string(),
        true,
        "/".to_string(),
        false,
        0,
        name.to_string(),
        value.to_string(),
    )
}

#[tokio::test]
async fn test_validate_returns_username_and_sends_site_headers() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/userData.json"))
        .and(header("user-agent", BROWSER_USER_AGENT))
        .and(header("origin", mock_server.uri().as_str()))
        .and(header("referer", format!("{}/", mock_server.uri()).as_str()))
        .and(header("cookie", "gog-al=secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "isLoggedIn": true,
            "username": "archivist",
            "country": "PL"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::from_cookies(
        &[host_cookie("gog-al", "secret-token")],
        &mock_server.uri(),
        HttpTimeouts::default(),
    )
    .unwrap();

    let username = session.validate().await.unwrap();
    assert_eq!(username, "archivist");
}

#[tokio::test]
async fn test_validate_rejects_logged_out_session() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/userData.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"isLoggedIn": false})),
        )
        .mount(&mock_server)
        .await;

    let session =
        Session::from_cookies(&[], &mock_server.uri(), HttpTimeouts::default()).unwrap();
    let err = session.validate().await.unwrap_err();
    assert!(matches!(err, SessionError::NotLoggedIn), "got {err:?}");
}

#[tokio::test]
async fn test_user_data_maps_status_and_body_errors() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/userData.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userData.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&mock_server)
        .await;

    let session =
        Session::from_cookies(&[], &mock_server.uri(), HttpTimeouts::default()).unwrap();

    let err = session.user_data().await.unwrap_err();
    assert!(
        matches!(err, SessionError::HttpStatus { status: 503, .. }),
        "got {err:?}"
    );

    let err = session.user_data().await.unwrap_err();
    assert!(matches!(err, SessionError::Protocol { .. }), "got {err:?}");
}
