//! `raddar-authorize`: obtain a Freebox app token for Raddar.
//!
//! Discovery -> existing credentials check -> registration -> approval on
//! the router display -> credentials file.

pub mod console;
pub mod prompt;

use anyhow::Context;
use anyhow::Result;
use raddar_login::AuthError;
use raddar_login::Config;
use raddar_login::CredentialStore;
use raddar_login::FreeboxClient;
use raddar_login::LoadOutcome;
use raddar_login::PollOptions;
use raddar_login::StoredCredentials;
use raddar_login::wait_for_authorization;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;

use crate::prompt::ReuseDecision;

/// Successful ends of a run. Both exit 0.
#[derive(Debug)]
pub enum RunOutcome {
    /// A new token was granted and saved.
    Authorized(StoredCredentials),
    /// The user kept the credentials already on disk; the client carries
    /// them.
    KeptExisting(FreeboxClient),
}

/// Run the whole registration sequence.
///
/// `input` answers the reuse prompt. `cancel` aborts the approval wait;
/// callers should also race the returned future against it so the other
/// steps stop promptly.
pub async fn run<R>(
    config: Config,
    input: &mut R,
    cancel: &CancellationToken,
) -> Result<RunOutcome>
where
    R: AsyncBufRead + Unpin,
{
    console::banner();

    console::step("Connecting to the Freebox...");
    let mut client = FreeboxClient::new(&config)?;
    let info = client
        .discover()
        .await
        .context("unable to connect to the Freebox")?;
    console::discovered(&client, &info);

    let store = CredentialStore::with_path(&config.credentials_path);
    let path = store.path().display();
    match store.load() {
        Ok(LoadOutcome::Found(loaded)) => {
            console::existing_credentials(&client.identity().app_id, &loaded, store.path());
            match prompt::ask_reauthorize(input).await? {
                ReuseDecision::Reuse => {
                    console::ok("Using existing credentials");
                    client.apply_loaded(loaded);
                    return Ok(RunOutcome::KeptExisting(client));
                }
                ReuseDecision::Reauthorize => {
                    tracing::info!("user asked for a new authorization");
                }
            }
        }
        Ok(LoadOutcome::NotFound) => {
            console::warn(format!("No credentials file at {path}"));
        }
        Err(err) => {
            console::fail(format!("Could not read {path}: {err}"));
            tracing::warn!(%path, "ignoring unreadable credentials file: {err}");
        }
    }

    console::step(format!(
        "Registering application '{}'...",
        client.identity().app_name
    ));
    let request = client
        .register()
        .await
        .context("application registration failed")?;
    console::registered(&client.identity().app_id, &request);

    console::approval_required(&client.identity().app_name);
    let outcome = wait_for_authorization(
        &client,
        &request.track_id,
        PollOptions::from(&config),
        cancel,
        console::progress,
    )
    .await;
    console::outcome(&outcome);
    outcome
        .into_result()
        .context("application authorization failed")?;

    let credentials = client.accept_granted(request);
    store
        .save(&credentials)
        .map_err(AuthError::from)
        .with_context(|| {
            format!("application authorized but saving credentials to {path} failed")
        })?;
    console::summary(&credentials, store.path());

    Ok(RunOutcome::Authorized(credentials))
}

/// True when `err` comes from an interrupt rather than a failure.
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<AuthError>(), Some(AuthError::Cancelled))
}
