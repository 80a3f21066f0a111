// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod config;
pub mod error;
pub mod feed;
pub mod notify;
pub mod patch;
pub mod reconcile;
pub mod runner;
pub mod store;
pub mod watch;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::error::{ConfigError, WatchError};
pub use crate::feed::{FeedEntry, FixtureFeed, HttpFeed, ReleaseFeed};
pub use crate::notify::{NotificationEvent, Notifier, NotifierMux};
pub use crate::patch::{find_latest_patch, Patch};
pub use crate::reconcile::{reconcile, Reconciliation};
pub use crate::runner::{run_check, RunResult, RunStatus};
pub use crate::store::{FsStateStore, StateStore};
