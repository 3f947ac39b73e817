use std::time::Duration;

use pretty_assertions::assert_eq;
use raddar_login::AuthorizationApi;
use raddar_login::AuthorizationOutcome;
use raddar_login::AuthorizationStatus;
use raddar_login::PollOptions;
use raddar_login::TrackId;
use raddar_login::wait_for_authorization;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::common::discovered_client;
use super::common::status_reply;

const STATUS_PATH: &str = "/api/v8/login/authorize/42";

fn fast_options() -> PollOptions {
    PollOptions {
        interval: Duration::from_millis(50),
        timeout: Duration::from_secs(5),
    }
}

async fn status_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == STATUS_PATH)
        .count()
}

#[tokio::test]
async fn status_endpoint_reports_router_state() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status_reply("pending"))
        .mount(&server)
        .await;

    let state = client
        .authorization_status(&TrackId::new("42"))
        .await
        .unwrap();
    assert_eq!(state.status, AuthorizationStatus::Pending);
}

#[tokio::test]
async fn polls_until_granted_on_third_request() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status_reply("pending"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status_reply("granted"))
        .expect(1)
        .mount(&server)
        .await;

    let mut progress = Vec::new();
    let outcome = wait_for_authorization(
        &client,
        &TrackId::new("42"),
        fast_options(),
        &CancellationToken::new(),
        |p| progress.push(p.status),
    )
    .await;

    assert_eq!(
        outcome,
        AuthorizationOutcome::Granted {
            challenge: Some("Bj6xMqoe+DCHD44KqBljJ579seOXNWr2".to_string())
        }
    );
    assert_eq!(progress, vec![AuthorizationStatus::Pending; 2]);
    assert_eq!(status_requests(&server).await, 3);
}

#[tokio::test]
async fn failed_status_requests_are_retried() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
        })))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status_reply("granted"))
        .mount(&server)
        .await;

    let mut progress = Vec::new();
    let outcome = wait_for_authorization(
        &client,
        &TrackId::new("42"),
        fast_options(),
        &CancellationToken::new(),
        |p| progress.push(p.status),
    )
    .await;

    assert!(outcome.is_granted());
    assert_eq!(progress, vec![AuthorizationStatus::Unknown; 2]);
    assert_eq!(status_requests(&server).await, 3);
}

#[tokio::test]
async fn denied_on_router_stops_polling() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status_reply("denied"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = wait_for_authorization(
        &client,
        &TrackId::new("42"),
        fast_options(),
        &CancellationToken::new(),
        |_| {},
    )
    .await;

    assert_eq!(outcome, AuthorizationOutcome::Denied);
}

#[tokio::test]
async fn pending_forever_times_out_on_client_deadline() {
    let server = MockServer::start().await;
    let client = discovered_client(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(status_reply("pending"))
        .mount(&server)
        .await;

    let options = PollOptions {
        interval: Duration::from_millis(100),
        timeout: Duration::from_millis(600),
    };
    let started = std::time::Instant::now();
    let outcome = wait_for_authorization(
        &client,
        &TrackId::new("42"),
        options,
        &CancellationToken::new(),
        |_| {},
    )
    .await;

    assert_eq!(
        outcome,
        AuthorizationOutcome::TimedOut { by_server: false }
    );
    let bound = options.timeout + options.interval + Duration::from_secs(1);
    assert!(started.elapsed() < bound);
    assert!(status_requests(&server).await >= 2);
}
