//! Freebox application authorization.
//!
//! Registers an application with the Freebox OS local API and waits for the
//! user to approve it on the router's display, yielding a long-lived
//! `app_token`.

pub mod authorize;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod storage;

pub use authorize::{
    AuthorizationApi, AuthorizationOutcome, AuthorizationRequest, AuthorizationState,
    AuthorizationStatus, PollOptions, PollProgress, TrackId, wait_for_authorization,
};
pub use client::FreeboxClient;
pub use config::Config;
pub use endpoint::{ApiEndpoint, ApiVersionInfo, major_version};
pub use error::{AuthError, StorageError};
pub use identity::AppIdentity;
pub use storage::{CredentialStore, LoadOutcome, LoadedCredentials, StoredCredentials};
