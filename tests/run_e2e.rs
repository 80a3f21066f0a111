//! Full-run scenarios: fixture feed → reconciliation against a real
//! filesystem store → recorded notifications → RunResult.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use patchwatch::feed::FixtureFeed;
use patchwatch::notify::{NotificationEvent, Notifier};
use patchwatch::runner::{run_check, RunStatus, FAILURE_CODE, SUCCESS_CODE};
use patchwatch::store::{FsStateStore, StateStore};

const PATCH_XML: &str = include_str!("fixtures/patch_rss.xml");

const BAD_GUID_XML: &str = r#"<rss><channel>
    <item><guid>noseparator</guid><pubDate>d0</pubDate></item>
</channel></rss>"#;

const EMPTY_XML: &str = r#"<rss><channel><title>nothing yet</title></channel></rss>"#;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<NotificationEvent>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent(&self) -> Vec<NotificationEvent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, ev: &NotificationEvent) -> Result<()> {
        if self.fail {
            return Err(anyhow!("webhook request failed"));
        }
        self.sent.lock().unwrap().push(ev.clone());
        Ok(())
    }
}

fn store_in(tmp: &tempfile::TempDir) -> FsStateStore {
    FsStateStore::new(tmp.path(), "patchwatch-state", "last_build_id.txt")
}

#[tokio::test]
async fn first_run_bootstraps_then_second_run_is_a_noop() {
    let tmp = tempfile::tempdir().unwrap();
    let store = store_in(&tmp);
    let feed = FixtureFeed::from_fixture(PATCH_XML);
    let notifier = RecordingNotifier::default();

    // first run: no blob yet → bootstrap, flagged as failure for review
    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(result.status.code(), FAILURE_CODE);
    assert!(result.body.contains("16294548"));
    assert_eq!(store.read().await.unwrap().as_deref(), Some("16294548"));
    assert_eq!(notifier.sent().len(), 1);

    // second run over the same feed: nothing new, nothing sent
    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.status.code(), SUCCESS_CODE);
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(store.read().await.unwrap().as_deref(), Some("16294548"));
}

#[tokio::test]
async fn stale_state_triggers_update_notification_and_rewrite() {
    let tmp = tempfile::tempdir().unwrap();
    let store = store_in(&tmp);
    store.write("16281932").await.unwrap();

    let feed = FixtureFeed::from_fixture(PATCH_XML);
    let notifier = RecordingNotifier::default();

    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Success);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Update has been released"));
    assert!(sent[0].body.contains("(old): 16281932"));
    assert!(sent[0].body.contains("(new): 16294548"));
    assert_eq!(store.read().await.unwrap().as_deref(), Some("16294548"));
}

#[tokio::test]
async fn corrupt_state_fails_without_touching_the_blob() {
    let tmp = tempfile::tempdir().unwrap();
    let store = store_in(&tmp);
    store.write("").await.unwrap();

    let feed = FixtureFeed::from_fixture(PATCH_XML);
    let notifier = RecordingNotifier::default();

    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Failure);
    assert!(result.body.contains("corrupt"));
    assert_eq!(store.read().await.unwrap().as_deref(), Some(""));

    // the one notification is the error report, not an update
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("had an error"));
}

#[tokio::test]
async fn feed_without_parsable_ids_is_a_reported_feed_error() {
    let tmp = tempfile::tempdir().unwrap();
    let store = store_in(&tmp);
    let feed = FixtureFeed::from_fixture(BAD_GUID_XML);
    let notifier = RecordingNotifier::default();

    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Failure);
    assert!(result.body.contains("feed error"));
    // no state was ever created
    assert_eq!(store.read().await.unwrap(), None);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("had an error"));
}

#[tokio::test]
async fn empty_feed_is_a_reported_feed_error() {
    let tmp = tempfile::tempdir().unwrap();
    let store = store_in(&tmp);
    let feed = FixtureFeed::from_fixture(EMPTY_XML);
    let notifier = RecordingNotifier::default();

    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Failure);
    assert!(result.body.contains("empty"));
    assert_eq!(store.read().await.unwrap(), None);
}

#[tokio::test]
async fn failed_error_report_does_not_recurse_or_panic() {
    let tmp = tempfile::tempdir().unwrap();
    let store = store_in(&tmp);
    let feed = FixtureFeed::from_fixture(EMPTY_XML);
    let notifier = RecordingNotifier::failing();

    // the error report itself can't be published; the run still returns
    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Failure);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn update_notify_failure_keeps_old_state_for_retry() {
    let tmp = tempfile::tempdir().unwrap();
    let store = store_in(&tmp);
    store.write("16281932").await.unwrap();

    let feed = FixtureFeed::from_fixture(PATCH_XML);
    let notifier = RecordingNotifier::failing();

    let result = run_check(&feed, &store, &notifier).await;
    assert_eq!(result.status, RunStatus::Failure);
    assert!(result.body.contains("notification error"));
    // next run will re-detect the same update
    assert_eq!(store.read().await.unwrap().as_deref(), Some("16281932"));
}
