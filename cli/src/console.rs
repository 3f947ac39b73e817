//! User-facing console output.

use std::io;
use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream;
use raddar_login::ApiVersionInfo;
use raddar_login::AuthorizationOutcome;
use raddar_login::AuthorizationRequest;
use raddar_login::AuthorizationStatus;
use raddar_login::FreeboxClient;
use raddar_login::LoadedCredentials;
use raddar_login::PollProgress;
use raddar_login::StoredCredentials;

const RULE_WIDTH: usize = 60;

fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn ok(message: impl AsRef<str>) {
    println!(
        "{} {}",
        "✓".if_supports_color(Stream::Stdout, |m| m.green()),
        message.as_ref()
    );
}

pub fn fail(message: impl AsRef<str>) {
    println!(
        "{} {}",
        "✗".if_supports_color(Stream::Stdout, |m| m.red()),
        message.as_ref()
    );
}

pub fn warn(message: impl AsRef<str>) {
    println!(
        "{} {}",
        "⚠".if_supports_color(Stream::Stdout, |m| m.yellow()),
        message.as_ref()
    );
}

pub fn banner() {
    println!("Raddar application registration for Freebox");
    println!("{}", rule(RULE_WIDTH));
}

pub fn step(message: impl AsRef<str>) {
    let message = message.as_ref();
    println!(
        "\n{}",
        message.if_supports_color(Stream::Stdout, |m| m.bold())
    );
}

pub fn discovered(client: &FreeboxClient, info: &ApiVersionInfo) {
    ok(format!(
        "Freebox API version: {}",
        client.api_version().unwrap_or_default()
    ));
    ok(format!(
        "Freebox model: {}",
        info.box_model_name.as_deref().unwrap_or("unknown")
    ));
    ok(format!(
        "API domain: {}",
        info.domain().unwrap_or(client.host())
    ));
}

pub fn existing_credentials(app_id: &str, loaded: &LoadedCredentials, path: &Path) {
    let path = path.display();
    ok(format!("Existing credentials found in {path}"));
    println!("  - App ID: {app_id}");
    println!("  - App Token: {}", loaded.app_token);
}

pub fn registered(app_id: &str, request: &AuthorizationRequest) {
    ok("Application registered");
    println!("  - App Token: {}", request.app_token);
    println!("  - Track ID: {}", request.track_id);
    println!("  - App ID: {app_id}");
}

pub fn approval_required(app_name: &str) {
    println!("\n{}", rule(RULE_WIDTH));
    println!(
        "{}",
        "APPROVAL REQUIRED ON THE FREEBOX"
            .if_supports_color(Stream::Stdout, |m| m.bold())
    );
    println!("{}", rule(RULE_WIDTH));
    println!("Go to your Freebox LCD screen and accept the");
    println!("authorization request for the application '{app_name}'.");
    println!("{}", rule(RULE_WIDTH));
}

/// Progress line, rewritten in place while the request stays pending.
pub fn progress(progress: &PollProgress) {
    match progress.status {
        AuthorizationStatus::Pending => {
            print!(
                "\r⏳ Waiting for approval... ({}s remaining)   ",
                progress.remaining_secs()
            );
            let _ = io::stdout().flush();
        }
        status => {
            println!();
            warn(format!(
                "Unexpected status '{status}' ({}s remaining)",
                progress.remaining_secs()
            ));
        }
    }
}

pub fn outcome(outcome: &AuthorizationOutcome) {
    println!();
    match outcome {
        AuthorizationOutcome::Granted { challenge } => {
            ok("Authorization granted");
            if let Some(challenge) = challenge {
                tracing::debug!(%challenge, "challenge received with grant");
            }
        }
        AuthorizationOutcome::Denied => fail("Authorization denied on the Freebox"),
        AuthorizationOutcome::TimedOut { by_server: true } => {
            fail("The Freebox expired the authorization request")
        }
        AuthorizationOutcome::TimedOut { by_server: false } => {
            fail("No answer on the Freebox before the timeout")
        }
        AuthorizationOutcome::Cancelled => {}
    }
}

pub fn summary(credentials: &StoredCredentials, path: &Path) {
    ok(format!("Credentials saved to {}", path.display()));
    println!("\nAPPLICATION SUMMARY");
    println!("{}", rule(40));
    println!("App ID: {}", credentials.app_id);
    println!("App Name: {}", credentials.app_name);
    println!("App Token: {}", credentials.app_token);
    println!("Freebox host: {}", credentials.host);
    println!("API Version: {}", credentials.api_version);
    println!("{}", rule(40));
    println!("The application is ready to use.");
}
