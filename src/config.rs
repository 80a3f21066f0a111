//! Runtime configuration, read once from the environment at process start.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const ENV_FEED_URL: &str = "PATCH_FEED_URL";
pub const ENV_STATE_BUCKET: &str = "STATE_BUCKET";
pub const ENV_STATE_KEY: &str = "STATE_KEY";
pub const ENV_NOTIFY_WEBHOOK_URL: &str = "NOTIFY_WEBHOOK_URL";
pub const ENV_STATE_ROOT: &str = "STATE_ROOT";
pub const ENV_WATCH_INTERVAL_SECS: &str = "WATCH_INTERVAL_SECS";

const DEFAULT_STATE_ROOT: &str = "state";

/// Everything one check run needs to know. Built via [`Config::from_env`]
/// and passed by reference into the run; the core never reads the
/// environment itself.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the release RSS feed.
    pub feed_url: String,
    /// Bucket (directory) holding the persisted-state blob.
    pub state_bucket: String,
    /// Key (file name) of the persisted-state blob inside the bucket.
    pub state_key: String,
    /// Webhook URL that update/bootstrap/error notifications are published to.
    pub notify_webhook_url: String,
    /// Root under which buckets live. Defaults to `state/`.
    pub state_root: PathBuf,
}

impl Config {
    /// Validates the four required settings up front; a missing one is a
    /// terminal configuration error before any feed or store access.
    pub fn from_env() -> Result<Self, ConfigError> {
        let feed_url = required("Patch feed URL", ENV_FEED_URL)?;
        let state_bucket = required("State bucket name", ENV_STATE_BUCKET)?;
        let state_key = required("State blob key", ENV_STATE_KEY)?;
        let notify_webhook_url = required("Notification webhook URL", ENV_NOTIFY_WEBHOOK_URL)?;

        let state_root = std::env::var(ENV_STATE_ROOT)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_ROOT));

        Ok(Self {
            feed_url,
            state_bucket,
            state_key,
            notify_webhook_url,
            state_root,
        })
    }
}

/// Optional watch-mode interval. `None` means run once and exit.
pub fn watch_interval_from_env() -> Result<Option<u64>, ConfigError> {
    match std::env::var(ENV_WATCH_INTERVAL_SECS) {
        Err(_) => Ok(None),
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: ENV_WATCH_INTERVAL_SECS,
                reason: format!("expected a number of seconds, got {raw:?}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: ENV_WATCH_INTERVAL_SECS,
                    reason: "interval must be at least 1 second".into(),
                });
            }
            Ok(Some(secs))
        }
    }
}

fn required(what: &'static str, var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { what, var })
}
