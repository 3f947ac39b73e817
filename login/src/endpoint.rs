//! API endpoint resolution.
//!
//! The router answers `GET {base}/v1/api_version` without authentication.
//! The response tells us the API version (used to build every later URL) and,
//! when remote access is configured, a domain + HTTPS port that should be
//! preferred over the LAN hostname.

use serde::Deserialize;
use url::Url;

use crate::error::AuthError;

const DEFAULT_HTTPS_PORT: u16 = 443;
const DEFAULT_API_BASE_URL: &str = "/api/";

/// Body of `GET {base}/v1/api_version`.
///
/// Unlike the other endpoints this one has no `success` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiVersionInfo {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub box_model_name: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub api_domain: Option<String>,
    #[serde(default)]
    pub https_available: Option<bool>,
    #[serde(default)]
    pub https_port: Option<u16>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl ApiVersionInfo {
    /// The advertised API domain, ignoring blanks.
    pub fn domain(&self) -> Option<&str> {
        self.api_domain
            .as_deref()
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
    }
}

/// Where API calls go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    /// Path prefix without trailing slash, e.g. `/api`.
    pub base_path: String,
    /// Full API version string (`"8.4"`), known after discovery.
    pub version: Option<String>,
}

impl ApiEndpoint {
    /// Endpoint used for discovery, before the router has told us anything.
    pub fn from_url(url: &Url) -> Result<Self, AuthError> {
        let host = url
            .host_str()
            .ok_or_else(|| AuthError::Config(format!("API URL {url} has no host")))?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port: url.port(),
            base_path: url.path().trim_end_matches('/').to_string(),
            version: None,
        })
    }

    /// Apply a discovery response.
    ///
    /// Fails when the response carries no usable `api_version`. When an
    /// `api_domain` is advertised the endpoint switches to it over HTTPS,
    /// unless the router explicitly reports HTTPS as unavailable.
    pub fn resolve(&self, info: &ApiVersionInfo) -> Result<Self, AuthError> {
        let version = info
            .api_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AuthError::Protocol("api_version missing from discovery response".to_string())
            })?;

        let mut resolved = self.clone();
        resolved.version = Some(version.to_string());

        if let Some(domain) = info.domain()
            && info.https_available != Some(false)
        {
            resolved.scheme = "https".to_string();
            resolved.host = domain.to_string();
            resolved.port = Some(info.https_port.unwrap_or(DEFAULT_HTTPS_PORT));
            resolved.base_path = info
                .api_base_url
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL)
                .trim_end_matches('/')
                .to_string();
        }

        Ok(resolved)
    }

    /// `scheme://host[:port]/base`, no trailing slash.
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}{}", self.scheme, self.host, self.base_path),
            None => format!("{}://{}{}", self.scheme, self.host, self.base_path),
        }
    }

    /// Unversioned URL, used for discovery itself.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// `{base}/v{major}/{path}`.
    pub fn versioned_url(&self, path: &str) -> Result<String, AuthError> {
        let version = self
            .version
            .as_deref()
            .ok_or_else(|| AuthError::Protocol("API version not available".to_string()))?;
        Ok(format!(
            "{}/v{}/{}",
            self.base_url(),
            major_version(version),
            path.trim_start_matches('/')
        ))
    }
}

/// Major segment of an API version: everything before the first `.`.
pub fn major_version(version: &str) -> &str {
    match version.split_once('.') {
        Some((major, _)) => major,
        None => version,
    }
}
