//! Patchwatch — Binary Entrypoint
//! Runs one update check against the configured release feed, or loops on an
//! interval when WATCH_INTERVAL_SECS is set.

use std::process::ExitCode;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use patchwatch::config;
use patchwatch::runner::{run_once_from_env, RunStatus};
use patchwatch::watch;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("patchwatch=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    match config::watch_interval_from_env() {
        Ok(Some(secs)) => {
            watch::run(secs).await;
            unreachable!("watch loop never returns");
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, "invalid watch interval");
            return ExitCode::from(2);
        }
    }

    let result = run_once_from_env().await;
    tracing::info!(code = result.status.code(), body = %result.body, "run finished");

    match result.status {
        RunStatus::Success => ExitCode::SUCCESS,
        RunStatus::Failure => ExitCode::from(1),
    }
}
