//! Optional in-process scheduler: re-run the check on a fixed interval.

use metrics::counter;
use tokio::time;

use crate::runner::{run_once_from_env, RunStatus};

/// Tick forever, one full check per tick. Each tick re-validates the
/// environment and re-reads persisted state, so a tick behaves exactly like
/// a standalone invocation.
pub async fn run(interval_secs: u64) {
    tracing::info!(interval_secs, "starting watch loop");
    let mut ticker = time::interval(time::Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;
        let result = run_once_from_env().await;
        counter!("watch_ticks_total").increment(1);

        match result.status {
            RunStatus::Success => {
                tracing::info!(code = result.status.code(), body = %result.body, "check tick finished");
            }
            RunStatus::Failure => {
                tracing::warn!(code = result.status.code(), body = %result.body, "check tick failed");
            }
        }
    }
}
