//! Authorization handshake.
//!
//! After `login/authorize/` accepted our application, the router shows a
//! prompt on its LCD and the request sits in `pending` until someone presses
//! a button. This module polls the tracking endpoint until the request
//! reaches a terminal state:
//!
//! ```text
//!            +---------+  granted  +---------+
//!  start --> | pending | --------> | granted |
//!            +---------+           +---------+
//!              |  ^  |  denied     +---------+
//!   unknown    |  |  +-----------> | denied  |
//!   (retry)    +--+  |             +---------+
//!                    |  timeout    +---------+
//!                    +-----------> | timeout |  (server or client deadline)
//!                                  +---------+
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::config::DEFAULT_AUTH_TIMEOUT;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::AuthError;

/// Status reported by `GET login/authorize/{track_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Pending,
    Granted,
    Denied,
    Timeout,
    /// Anything we could not interpret, including transport errors while
    /// polling.
    #[serde(other)]
    Unknown,
}

impl AuthorizationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Granted | Self::Denied | Self::Timeout)
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque id correlating a registration with its approval status.
///
/// The router sends it as a JSON number; strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Self(n.to_string())),
            Repr::Text(s) if !s.trim().is_empty() => Ok(Self(s)),
            Repr::Text(_) => Err(serde::de::Error::custom("empty track_id")),
        }
    }
}

/// A registration waiting for approval.
///
/// `app_token` is not usable until the poller reports `Granted`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizationRequest {
    pub app_token: String,
    pub track_id: TrackId,
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("app_token", &"<redacted>")
            .field("track_id", &self.track_id)
            .finish()
    }
}

/// One answer from the tracking endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizationState {
    pub status: AuthorizationStatus,
    /// Only meaningful once granted; used by the session login step.
    #[serde(default)]
    pub challenge: Option<String>,
}

impl AuthorizationState {
    pub fn unknown() -> Self {
        Self {
            status: AuthorizationStatus::Unknown,
            challenge: None,
        }
    }
}

/// Source of authorization status updates.
///
/// Implemented by [`crate::FreeboxClient`]; tests script it directly.
#[async_trait]
pub trait AuthorizationApi: Send + Sync {
    /// Query the current status of a pending authorization.
    async fn authorization_status(
        &self,
        track_id: &TrackId,
    ) -> Result<AuthorizationState, AuthError>;
}

/// How the poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Granted {
        challenge: Option<String>,
    },
    Denied,
    /// `by_server` is false when our own deadline ran out first.
    TimedOut { by_server: bool },
    Cancelled,
}

impl AuthorizationOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Map a non-granted outcome onto the error taxonomy.
    pub fn into_result(self) -> Result<Option<String>, AuthError> {
        match self {
            Self::Granted { challenge } => Ok(challenge),
            Self::Denied => Err(AuthError::AuthorizationDenied),
            Self::TimedOut { .. } => Err(AuthError::AuthorizationTimeout),
            Self::Cancelled => Err(AuthError::Cancelled),
        }
    }
}

/// Emitted after every non-terminal poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProgress {
    pub attempt: u32,
    pub status: AuthorizationStatus,
    pub remaining: Duration,
}

impl PollProgress {
    pub fn remaining_secs(&self) -> u64 {
        self.remaining.as_secs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }
}

impl From<&Config> for PollOptions {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            timeout: config.auth_timeout,
        }
    }
}

/// Poll `api` until the request identified by `track_id` is granted, denied,
/// timed out, or `cancel` fires.
///
/// Status requests are raced against the deadline and sleeps are clipped to
/// it, so this returns no later than `options.timeout` after the first poll.
/// Errors from `api` count as `Unknown` and are retried on the next interval.
pub async fn wait_for_authorization<A, F>(
    api: &A,
    track_id: &TrackId,
    options: PollOptions,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> AuthorizationOutcome
where
    A: AuthorizationApi + ?Sized,
    F: FnMut(&PollProgress),
{
    let deadline = Instant::now() + options.timeout;
    let mut attempt: u32 = 0;

    loop {
        if Instant::now() >= deadline {
            tracing::info!(%track_id, attempt, "client-side authorization deadline reached");
            return AuthorizationOutcome::TimedOut { by_server: false };
        }

        attempt += 1;
        let state = tokio::select! {
            _ = cancel.cancelled() => return AuthorizationOutcome::Cancelled,
            reply = tokio::time::timeout_at(deadline, api.authorization_status(track_id)) => {
                match reply {
                    Ok(Ok(state)) => state,
                    Ok(Err(err)) => {
                        tracing::warn!(%track_id, attempt, "status check failed: {err}");
                        AuthorizationState::unknown()
                    }
                    Err(_) => {
                        tracing::info!(%track_id, attempt, "deadline hit during status check");
                        return AuthorizationOutcome::TimedOut { by_server: false };
                    }
                }
            }
        };
        tracing::debug!(%track_id, attempt, status = %state.status, "authorization status");

        match state.status {
            AuthorizationStatus::Granted => {
                return AuthorizationOutcome::Granted {
                    challenge: state.challenge,
                };
            }
            AuthorizationStatus::Denied => return AuthorizationOutcome::Denied,
            AuthorizationStatus::Timeout => {
                return AuthorizationOutcome::TimedOut { by_server: true };
            }
            AuthorizationStatus::Pending | AuthorizationStatus::Unknown => {
                let now = Instant::now();
                on_progress(&PollProgress {
                    attempt,
                    status: state.status,
                    remaining: deadline.saturating_duration_since(now),
                });

                let wake = (now + options.interval).min(deadline);
                tokio::select! {
                    _ = cancel.cancelled() => return AuthorizationOutcome::Cancelled,
                    _ = tokio::time::sleep_until(wake) => {}
                }
            }
        }
    }
}
