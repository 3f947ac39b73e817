use pretty_assertions::assert_eq;
use raddar_login::AuthError;
use raddar_login::Config;
use raddar_login::FreeboxClient;
use raddar_login::TrackId;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::common::config_for;
use super::common::discovered_client;

#[tokio::test]
async fn register_posts_identity_to_major_version_path() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v8/login/authorize/"))
        .and(body_json(json!({
            "app_id": "raddar",
            "app_name": "Raddar",
            "app_version": env!("CARGO_PKG_VERSION"),
            "device_name": "Raddar CLI",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {
                "app_token": "dyNYgfK0Ya6FWGqq83sBHa7TwzWo+pg4fDFUJHShcjVYzTfaRrZzm93p7OTAfH/0",
                "track_id": 42
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = client.register().await.unwrap();

    assert_eq!(request.track_id, TrackId::new("42"));
    assert!(request.app_token.starts_with("dyNYgfK0"));
    // Not usable until granted.
    assert_eq!(client.app_token(), None);
}

#[tokio::test]
async fn register_rejected_by_router_is_protocol_error() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v8/login/authorize/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "msg": "Cette application est déjà enregistrée",
            "error_code": "already_registered"
        })))
        .mount(&server)
        .await;

    let err = client.register().await.unwrap_err();
    assert!(matches!(err, AuthError::Protocol(_)), "got {err:?}");
    assert!(err.to_string().contains("already_registered"));
}

#[tokio::test]
async fn register_error_envelope_with_http_403_is_protocol_error() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v8/login/authorize/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "msg": "Accès refusé",
            "error_code": "denied_from_external_ip"
        })))
        .mount(&server)
        .await;

    let err = client.register().await.unwrap_err();
    assert!(matches!(err, AuthError::Protocol(_)), "got {err:?}");
    assert!(err.to_string().contains("denied_from_external_ip"));
}

#[tokio::test]
async fn register_with_missing_fields_is_protocol_error() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v8/login/authorize/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": { "track_id": 3 }
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        client.register().await,
        Err(AuthError::Protocol(_))
    ));
}

#[tokio::test]
async fn register_before_discovery_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = FreeboxClient::new(&config_for(&server)).unwrap();
    let err = client.register().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "protocol error: API version not available"
    );
}

#[test]
fn register_uses_default_config_identity() {
    let config = Config::default();
    let client = FreeboxClient::new(&config).unwrap();
    assert_eq!(client.identity(), &config.identity);
}
