//! State reconciliation: the one place that encodes the store's quirks.
//!
//! Each run re-reads the blob from the store — nothing is cached across
//! invocations, so every decision is based on the latest committed state.
//! Write-back is last-writer-wins; the deployment guarantees a single
//! invocation at a time (see DESIGN.md).

use metrics::counter;

use crate::error::WatchError;
use crate::notify::{NotificationEvent, Notifier};
use crate::patch::Patch;
use crate::store::StateStore;

/// Outcome of reconciling a candidate patch against persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Persisted value ≥ candidate: nothing written, nothing notified.
    NoNewBuild { current: i64 },
    /// Persisted value < candidate: notified, then blob overwritten.
    Updated { previous: i64, latest: Patch },
    /// No blob existed: blob created, distinguished notification sent.
    Bootstrapped { latest: Patch },
}

pub async fn reconcile(
    latest: &Patch,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
) -> Result<Reconciliation, WatchError> {
    tracing::info!(location = %store.location(), "reading persisted build id");
    let blob = store.read().await.map_err(WatchError::Store)?;

    let Some(blob) = blob else {
        return bootstrap(latest, store, notifier).await;
    };

    let previous = parse_state(&blob)?;
    tracing::info!(previous, candidate = latest.build_id, "comparing build ids");

    if previous >= latest.build_id {
        tracing::info!("no new build");
        counter!("check_noop_total").increment(1);
        return Ok(Reconciliation::NoNewBuild { current: previous });
    }

    // Notify before write-back: a lost write re-alerts on the next run,
    // a lost notification would never be sent.
    notifier
        .publish(&NotificationEvent::update(previous, latest))
        .await
        .map_err(WatchError::Notify)?;
    store
        .write(&latest.build_id.to_string())
        .await
        .map_err(WatchError::Store)?;

    tracing::info!(previous, new = latest.build_id, "notified and updated state blob");
    counter!("check_updates_total").increment(1);
    Ok(Reconciliation::Updated {
        previous,
        latest: latest.clone(),
    })
}

async fn bootstrap(
    latest: &Patch,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
) -> Result<Reconciliation, WatchError> {
    tracing::warn!(
        location = %store.location(),
        build_id = latest.build_id,
        "no state blob found, creating one"
    );
    store
        .write(&latest.build_id.to_string())
        .await
        .map_err(WatchError::Store)?;
    notifier
        .publish(&NotificationEvent::bootstrap(latest, &store.location()))
        .await
        .map_err(WatchError::Notify)?;

    counter!("check_bootstraps_total").increment(1);
    Ok(Reconciliation::Bootstrapped {
        latest: latest.clone(),
    })
}

/// The blob's first line must be the decimal string of a build id. Anything
/// else is corrupt state: refuse to guess, refuse to overwrite.
fn parse_state(blob: &str) -> Result<i64, WatchError> {
    let line = blob.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err(WatchError::StateCorrupt("state blob is empty".into()));
    }
    line.parse::<i64>().map_err(|_| {
        WatchError::StateCorrupt(format!("state blob holds a non-numeric value {line:?}"))
    })
}
