//! One invocation of the update check, end to end, plus the single error
//! funnel that turns every terminal condition into a notification and a
//! failure-status result.

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::config::Config;
use crate::error::WatchError;
use crate::feed::{HttpFeed, ReleaseFeed};
use crate::notify::{NotificationEvent, Notifier, NotifierMux};
use crate::patch::find_latest_patch;
use crate::reconcile::{reconcile, Reconciliation};
use crate::store::{FsStateStore, StateStore};

pub const SUCCESS_CODE: u16 = 200;
pub const FAILURE_CODE: u16 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn code(self) -> u16 {
        match self {
            RunStatus::Success => SUCCESS_CODE,
            RunStatus::Failure => FAILURE_CODE,
        }
    }
}

/// The sole observable result of one invocation.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: RunStatus,
    pub body: String,
}

impl RunResult {
    fn success(body: String) -> Self {
        Self {
            status: RunStatus::Success,
            body,
        }
    }

    fn failure(body: String) -> Self {
        Self {
            status: RunStatus::Failure,
            body,
        }
    }
}

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Entries parsed from the release feed.");
        describe_counter!(
            "feed_entries_skipped_total",
            "Entries without a parsable build id."
        );
        describe_counter!("feed_fetch_errors_total", "Feed fetch failures.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("check_runs_total", "Update-check invocations.");
        describe_counter!("check_noop_total", "Runs that found no new build.");
        describe_counter!("check_updates_total", "Runs that detected a new build.");
        describe_counter!("check_bootstraps_total", "Runs that created the state blob.");
        describe_counter!("check_errors_total", "Runs that ended in a reported error.");
    });
}

/// Run the whole check against the given collaborators.
pub async fn run_check(
    feed: &dyn ReleaseFeed,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
) -> RunResult {
    ensure_metrics_described();
    counter!("check_runs_total").increment(1);

    let entries = match feed.fetch_latest().await {
        Ok(entries) => entries,
        Err(e) => {
            let err = WatchError::Feed(format!("the release feed could not be read: {e:#}"));
            return report_error(notifier, &err.to_string()).await;
        }
    };
    if entries.is_empty() {
        let err = WatchError::Feed("the release feed was empty".into());
        return report_error(notifier, &err.to_string()).await;
    }

    let Some(latest) = find_latest_patch(&entries) else {
        let err = WatchError::Feed("no feed entry yielded a parsable build id".into());
        return report_error(notifier, &err.to_string()).await;
    };

    match reconcile(&latest, store, notifier).await {
        Ok(Reconciliation::NoNewBuild { current }) => RunResult::success(format!(
            "There wasn't a new build; current build id is {current}. Didn't need to notify"
        )),
        Ok(Reconciliation::Updated { previous, latest }) => RunResult::success(format!(
            "Notified about build {} (previous {previous}) and updated the state blob",
            latest.build_id
        )),
        // Deliberately a failure status: the work succeeded, but a first run
        // is indistinguishable from state loss and needs human review.
        Ok(Reconciliation::Bootstrapped { latest }) => RunResult::failure(format!(
            "There wasn't a build id blob at \"{}\", so created a new one. It's possible a \
             new version was released. Latest build ID: {}. Latest build date: {}",
            store.location(),
            latest.build_id,
            latest.released_at
        )),
        Err(e) => report_error(notifier, &e.to_string()).await,
    }
}

/// The single error funnel: log, notify the operator, fail the run. A failed
/// publish of the report itself is only logged — it never recurses.
pub async fn report_error(notifier: &dyn Notifier, message: &str) -> RunResult {
    tracing::error!("{message}");
    counter!("check_errors_total").increment(1);

    if let Err(e) = notifier.publish(&NotificationEvent::error(message)).await {
        tracing::warn!(error = ?e, "failed to publish the error report itself");
    }
    RunResult::failure(message.to_string())
}

/// Wire the production collaborators from the environment and run once.
/// Configuration problems go through the same error funnel, before any feed
/// or store access, using whatever notifier the environment still allows.
pub async fn run_once_from_env() -> RunResult {
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            let err = WatchError::Config(e);
            return match NotifierMux::from_env() {
                Some(mux) => report_error(&mux, &err.to_string()).await,
                None => {
                    tracing::error!(%err, "configuration error and no notifier available");
                    RunResult::failure(err.to_string())
                }
            };
        }
    };

    let feed = HttpFeed::new(cfg.feed_url.clone());
    let store = FsStateStore::new(&cfg.state_root, &cfg.state_bucket, &cfg.state_key);
    let notifier = NotifierMux::from_config(&cfg);

    run_check(&feed, &store, &notifier).await
}
