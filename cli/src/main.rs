use std::process::ExitCode;

use clap::Parser;
use raddar_cli::console;
use raddar_login::AuthError;
use raddar_login::Config;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Register Raddar with the Freebox and store the granted app token.
///
/// Environment overrides: RADDAR_FREEBOX_URL, RADDAR_CREDENTIALS_FILE,
/// RADDAR_AUTH_TIMEOUT_SECS, RADDAR_POLL_INTERVAL_SECS. Logs go to stderr
/// and follow RUST_LOG (default: warn).
#[derive(Debug, Parser)]
#[command(name = "raddar-authorize", version, about)]
struct Cli {}

fn main() -> ExitCode {
    let _cli = Cli::parse();
    init_logging();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run_main());
    // A pending stdin read must not keep the process alive after Ctrl-C.
    runtime.shutdown_background();
    code
}

async fn run_main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            console::fail(err.to_string());
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = tokio::select! {
        result = raddar_cli::run(config, &mut stdin, &cancel) => result,
        _ = cancel.cancelled() => Err(AuthError::Cancelled.into()),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) if raddar_cli::is_cancelled(&err) => {
            println!();
            console::warn("Interrupted by user");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{err:?}");
            console::fail(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
