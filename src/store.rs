//! Durable blob store for the last-notified build id.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

/// A single named blob with an explicit not-found signal.
///
/// `read` returns `Ok(None)` when the blob has never been written; every
/// other failure is an error. Reconciliation depends on that distinction —
/// not-found triggers bootstrap, anything else aborts the run.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn read(&self) -> Result<Option<String>>;
    async fn write(&self, contents: &str) -> Result<()>;
    /// Human-readable blob location for logs and notification bodies.
    fn location(&self) -> String;
}

/// Filesystem-backed store, laid out as `<root>/<bucket>/<key>`. The root is
/// whatever durable directory the deployment mounts.
pub struct FsStateStore {
    bucket: String,
    key: String,
    path: PathBuf,
}

impl FsStateStore {
    pub fn new(root: impl Into<PathBuf>, bucket: &str, key: &str) -> Self {
        let path = root.into().join(bucket).join(key);
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            path,
        }
    }
}

#[async_trait]
impl StateStore for FsStateStore {
    async fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("reading state blob {}", self.path.display()))
            }
        }
    }

    async fn write(&self, contents: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        fs::write(&self.path, contents)
            .await
            .with_context(|| format!("writing state blob {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), contents, "wrote state blob");
        Ok(())
    }

    fn location(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}
