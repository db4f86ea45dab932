use portweaver_core::client::{ClientProcess, QbittorrentSession, TorrentClient};
use portweaver_core::error::ClientError;
use portweaver_core::types::{Credentials, ListenPort};
use std::path::PathBuf;
use std::time::Duration;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn session(uri: &str) -> QbittorrentSession {
    QbittorrentSession::new(uri, credentials(), process()).unwrap()
}

fn credentials() -> Credentials {
    Credentials::new("admin".to_string(), "s3cret pass".to_string())
}

fn process() -> ClientProcess {
    ClientProcess::new(
        "pw-absent-cli".to_string(),
        PathBuf::from("/nonexistent/qbittorrent"),
    )
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "SID=abc123; HttpOnly; path=/")
                .set_body_string("Ok."),
        )
        .mount(server)
        .await;
}

async fn mount_preferences(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v2/app/preferences"))
        .and(header("cookie", "SID=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

/// Login posts the configured credentials as a form
#[tokio::test]
async fn test_authenticate_posts_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("password=s3cret+pass"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ok."))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(session(&mock_server.uri()).authenticate().await.is_ok());
}

/// Any non-2xx login answer is an authentication failure
#[tokio::test]
async fn test_authenticate_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&mock_server)
        .await;

    let result = session(&mock_server.uri()).authenticate().await;
    assert!(matches!(
        result,
        Err(ClientError::AuthenticationFailed { status: 403 })
    ));
}

/// listen_port encoded as a JSON number
#[tokio::test]
async fn test_get_port_number() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_preferences(&mock_server, r#"{"dht": true, "listen_port": 51413}"#).await;

    let port = session(&mock_server.uri()).get_port().await.unwrap();
    assert_eq!(port.get(), 51413);
}

/// listen_port encoded as a numeric string
#[tokio::test]
async fn test_get_port_string() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_preferences(&mock_server, r#"{"listen_port": "51413"}"#).await;

    let port = session(&mock_server.uri()).get_port().await.unwrap();
    assert_eq!(port.get(), 51413);
}

#[tokio::test]
async fn test_get_port_non_numeric_keeps_body() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_preferences(&mock_server, r#"{"listen_port": "abc"}"#).await;

    match session(&mock_server.uri()).get_port().await {
        Err(ClientError::InvalidPreferences { body }) => assert!(body.contains("abc")),
        other => panic!("expected InvalidPreferences, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_port_missing_field() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;
    mount_preferences(&mock_server, r#"{"dht": true}"#).await;

    let result = session(&mock_server.uri()).get_port().await;
    assert!(matches!(result, Err(ClientError::InvalidPreferences { .. })));
}

/// A rejected login never reaches the preferences endpoint
#[tokio::test]
async fn test_get_port_stops_after_failed_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/app/preferences"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"listen_port": 1}"#))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = session(&mock_server.uri()).get_port().await;
    assert!(matches!(
        result,
        Err(ClientError::AuthenticationFailed { .. })
    ));
}

/// Every read logs in again, even on a reused session
#[tokio::test]
async fn test_get_port_reauthenticates_each_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "SID=abc123; path=/"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_preferences(&mock_server, r#"{"listen_port": 6881}"#).await;

    let session = session(&mock_server.uri());
    assert_eq!(session.get_port().await.unwrap().get(), 6881);
    assert_eq!(session.get_port().await.unwrap().get(), 6881);
}

#[tokio::test]
async fn test_get_port_server_error() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/app/preferences"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let result = session(&mock_server.uri()).get_port().await;
    assert!(matches!(
        result,
        Err(ClientError::UnexpectedStatus { status: 500, .. })
    ));
}

/// The new port is sent as the `json` form field
#[tokio::test]
async fn test_set_port_posts_json_form_field() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/v2/app/setPreferences"))
        .and(header("cookie", "SID=abc123"))
        .and(body_string_contains("json="))
        .and(body_string_contains("listen_port"))
        .and(body_string_contains("60000"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let port = ListenPort::new(60000).unwrap();
    assert!(session(&mock_server.uri()).set_port(port).await.is_ok());
}

#[tokio::test]
async fn test_set_port_rejected() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/v2/app/setPreferences"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    let port = ListenPort::new(60000).unwrap();
    let result = session(&mock_server.uri()).set_port(port).await;
    assert!(matches!(
        result,
        Err(ClientError::UnexpectedStatus { status: 400, .. })
    ));
}

/// Requests are bounded by the session timeout
#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let session = QbittorrentSession::with_timeout(
        &mock_server.uri(),
        credentials(),
        process(),
        Duration::from_millis(200),
    )
    .unwrap();

    match session.authenticate().await {
        Err(ClientError::Transport { reason }) => {
            assert!(reason.to_lowercase().contains("timeout"))
        }
        other => panic!("expected a transport timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Nothing listens on the discard port
    let session = session("http://127.0.0.1:9");
    let result = session.get_port().await;
    assert!(matches!(result, Err(ClientError::Transport { .. })));
}

#[tokio::test]
async fn test_is_running_false_for_absent_process() {
    let session = session("http://127.0.0.1:8080");
    assert!(!session.is_running().await);
}
