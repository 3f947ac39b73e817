use std::time::Duration;

use raddar_login::Config;
use raddar_login::FreeboxClient;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

pub fn config_for(server: &MockServer) -> Config {
    Config::default()
        .with_api_url(&format!("{}/api", server.uri()))
        .expect("mock server URL is valid")
        .with_poll_interval(Duration::from_millis(50))
        .with_auth_timeout(Duration::from_secs(5))
}

pub async fn mount_api_version(server: &MockServer, version: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/api_version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": "23b86ec8091013d668829fe12791fdab",
            "device_name": "Freebox Server",
            "api_version": version,
            "api_base_url": "/api/",
            "device_type": "FreeboxServer7,1",
            "box_model_name": "Freebox v7 (r1)",
        })))
        .mount(server)
        .await;
}

/// Client that already went through discovery against `server`.
pub async fn discovered_client(server: &MockServer) -> FreeboxClient {
    mount_api_version(server, "8.4").await;
    let mut client = FreeboxClient::new(&config_for(server)).expect("client");
    client.discover().await.expect("discovery");
    client
}

/// Successful status envelope carrying `status`.
pub fn status_reply(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "result": { "status": status, "challenge": "Bj6xMqoe+DCHD44KqBljJ579seOXNWr2" }
    }))
}
