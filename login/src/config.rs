//! Runtime configuration.
//!
//! Every value has a hardcoded default. `Config::from_env` layers the
//! optional `RADDAR_*` environment overrides on top; tests and embedders
//! use the `with_*` setters instead.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::AuthError;
use crate::identity::AppIdentity;

/// Local API base URL, reachable from inside the router's LAN.
pub const DEFAULT_API_URL: &str = "http://mafreebox.freebox.fr/api";
pub const DEFAULT_CREDENTIALS_FILE: &str = "freebox_credentials.json";
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const API_URL_ENV_VAR: &str = "RADDAR_FREEBOX_URL";
pub const CREDENTIALS_FILE_ENV_VAR: &str = "RADDAR_CREDENTIALS_FILE";
pub const AUTH_TIMEOUT_ENV_VAR: &str = "RADDAR_AUTH_TIMEOUT_SECS";
pub const POLL_INTERVAL_ENV_VAR: &str = "RADDAR_POLL_INTERVAL_SECS";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where discovery starts. Replaced by the advertised `api_domain`
    /// once discovery succeeds.
    pub api_url: Url,
    pub credentials_path: PathBuf,
    /// Client-side deadline for the user to answer on the router.
    pub auth_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub identity: AppIdentity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: REQUEST_TIMEOUT,
            identity: AppIdentity::default(),
        }
    }
}

impl Config {
    /// Defaults plus whatever `RADDAR_*` variables are set in the process
    /// environment.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(API_URL_ENV_VAR) {
            config.api_url = parse_api_url(&raw)?;
        }
        if let Some(path) = lookup(CREDENTIALS_FILE_ENV_VAR)
            && !path.trim().is_empty()
        {
            config.credentials_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(AUTH_TIMEOUT_ENV_VAR) {
            config.auth_timeout = parse_secs(AUTH_TIMEOUT_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(POLL_INTERVAL_ENV_VAR) {
            config.poll_interval = parse_secs(POLL_INTERVAL_ENV_VAR, &raw)?;
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, raw: &str) -> Result<Self, AuthError> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[allow(clippy::expect_used)]
fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

fn parse_api_url(raw: &str) -> Result<Url, AuthError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AuthError::Config(format!("invalid API URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AuthError::Config(format!(
                "unsupported scheme {other:?} in API URL {raw:?}"
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(AuthError::Config(format!("API URL {raw:?} has no host")));
    }
    Ok(url)
}

fn parse_secs(var: &str, raw: &str) -> Result<Duration, AuthError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AuthError::Config(format!(
            "{var} must be a positive number of seconds, got {raw:?}"
        ))),
    }
}
