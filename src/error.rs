use thiserror::Error;

/// A required setting was missing at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{what} was not provided. Please provide one in the env variable \"{var}\"")]
    Missing { what: &'static str, var: &'static str },
    #[error("env variable \"{var}\" holds an invalid value: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Terminal conditions of one update-check run.
///
/// "Blob not found" is deliberately not part of this taxonomy: the store
/// surfaces it as `Ok(None)` and reconciliation turns it into a bootstrap,
/// not an error.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("state store error: {0:#}")]
    Store(anyhow::Error),

    #[error("persisted state is corrupt: {0}")]
    StateCorrupt(String),

    #[error("notification error: {0:#}")]
    Notify(anyhow::Error),
}
