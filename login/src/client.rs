//! HTTP client for the Freebox login API.
//!
//! Freebox OS flow:
//! 1. GET `{base}/v1/api_version` to learn the API version (and remote domain)
//! 2. POST identity to `{base}/v{major}/login/authorize/` -> app_token + track_id
//! 3. Poll `{base}/v{major}/login/authorize/{track_id}` until the user answers
//!    on the LCD
//! 4. Persist app_token once granted

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::authorize::AuthorizationApi;
use crate::authorize::AuthorizationRequest;
use crate::authorize::AuthorizationState;
use crate::authorize::TrackId;
use crate::config::Config;
use crate::endpoint::ApiEndpoint;
use crate::endpoint::ApiVersionInfo;
use crate::error::AuthError;
use crate::identity::AppIdentity;
use crate::storage::LoadedCredentials;
use crate::storage::StoredCredentials;

const API_VERSION_PATH: &str = "v1/api_version";
const AUTHORIZE_PATH: &str = "login/authorize/";

/// Standard `{success, result, msg, error_code}` envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

impl<T> ApiResponse<T> {
    fn failure_message(&self) -> String {
        match (self.msg.as_deref(), self.error_code.as_deref()) {
            (Some(msg), Some(code)) => format!("{msg} ({code})"),
            (Some(msg), None) => msg.to_string(),
            (None, Some(code)) => code.to_string(),
            (None, None) => "request was not successful".to_string(),
        }
    }

    fn into_result(self, what: &str) -> Result<T, AuthError> {
        if !self.success {
            return Err(AuthError::Protocol(format!(
                "{what} rejected: {}",
                self.failure_message()
            )));
        }
        self.result
            .ok_or_else(|| AuthError::Protocol(format!("{what}: response has no result")))
    }
}

/// Stateful client for one registration run.
pub struct FreeboxClient {
    http: reqwest::Client,
    identity: AppIdentity,
    endpoint: ApiEndpoint,
    app_token: Option<String>,
}

impl fmt::Debug for FreeboxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeboxClient")
            .field("identity", &self.identity)
            .field("endpoint", &self.endpoint)
            .field("app_token", &self.app_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl FreeboxClient {
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let identity = &config.identity;
        // The LAN certificate is signed by the Freebox's own CA.
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(true)
            .user_agent(format!("{}/{}", identity.app_id, identity.app_version))
            .build()
            .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            identity: identity.clone(),
            endpoint: ApiEndpoint::from_url(&config.api_url)?,
            app_token: None,
        })
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    pub fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    pub fn host(&self) -> &str {
        &self.endpoint.host
    }

    pub fn api_version(&self) -> Option<&str> {
        self.endpoint.version.as_deref()
    }

    /// Token from a granted authorization or from a loaded credentials file.
    pub fn app_token(&self) -> Option<&str> {
        self.app_token.as_deref()
    }

    /// Fetch the API version and switch to the advertised endpoint.
    pub async fn discover(&mut self) -> Result<ApiVersionInfo, AuthError> {
        let url = self.endpoint.url(API_VERSION_PATH);
        tracing::debug!(%url, "discovering Freebox API");

        let info: ApiVersionInfo = self.send(self.http.get(&url), &url).await?;
        self.endpoint = self.endpoint.resolve(&info)?;

        tracing::info!(
            api_version = self.api_version().unwrap_or_default(),
            base_url = %self.endpoint.base_url(),
            "Freebox API discovered"
        );
        Ok(info)
    }

    /// Submit our identity; the router starts prompting on its display.
    pub async fn register(&self) -> Result<AuthorizationRequest, AuthError> {
        let url = self.endpoint.versioned_url(AUTHORIZE_PATH)?;
        tracing::debug!(%url, app_id = %self.identity.app_id, "registering application");

        let response: ApiResponse<AuthorizationRequest> = self
            .send(self.http.post(&url).json(&self.identity), &url)
            .await?;
        let request = response.into_result("registration")?;
        if request.app_token.trim().is_empty() {
            return Err(AuthError::Protocol(
                "registration returned an empty app_token".to_string(),
            ));
        }

        tracing::info!(track_id = %request.track_id, "application registered, awaiting approval");
        Ok(request)
    }

    /// Turn a granted request into the credentials to persist. Only call
    /// this after the poller reported `Granted`.
    pub fn accept_granted(&mut self, request: AuthorizationRequest) -> StoredCredentials {
        self.app_token = Some(request.app_token.clone());
        StoredCredentials {
            app_id: self.identity.app_id.clone(),
            app_name: self.identity.app_name.clone(),
            app_version: self.identity.app_version.clone(),
            app_token: request.app_token,
            host: self.endpoint.host.clone(),
            api_version: self.api_version().unwrap_or_default().to_string(),
        }
    }

    /// Adopt credentials read from disk. Identity stays as compiled in.
    pub fn apply_loaded(&mut self, loaded: LoadedCredentials) {
        self.app_token = Some(loaded.app_token);
        self.endpoint.version = Some(loaded.api_version);
        self.endpoint.host = loaded.host;
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, AuthError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
                && !envelope.success
            {
                return Err(AuthError::Protocol(format!(
                    "HTTP {status} from {url}: {}",
                    envelope.failure_message()
                )));
            }
            return Err(AuthError::Connection(format!(
                "HTTP {status} from {url}: {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| AuthError::Protocol(format!("unexpected response from {url}: {e}")))
    }
}

#[async_trait]
impl AuthorizationApi for FreeboxClient {
    async fn authorization_status(
        &self,
        track_id: &TrackId,
    ) -> Result<AuthorizationState, AuthError> {
        let url = self
            .endpoint
            .versioned_url(&format!("{AUTHORIZE_PATH}{track_id}"))?;
        let response: ApiResponse<AuthorizationState> =
            self.send(self.http.get(&url), &url).await?;
        response.into_result("authorization status")
    }
}
