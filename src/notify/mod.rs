//! One-way operator notifications: a subject + body published to a channel.

pub mod email;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::patch::Patch;

pub const SUBJECT_PREFIX: &str = "Patchwatch";

/// Ephemeral message dispatched at most once per detected state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub subject: String,
    pub body: String,
}

impl NotificationEvent {
    /// A new build shipped; carries both the old and the new identifier.
    pub fn update(previous: i64, latest: &Patch) -> Self {
        Self {
            subject: format!("{SUBJECT_PREFIX} - Update has been released"),
            body: format!(
                "Last known build ID (old): {previous}\nFeed build ID (new): {}\n",
                latest.build_id
            ),
        }
    }

    /// First-ever run: the state blob didn't exist and was just created.
    /// Flagged to the operator because this may hide an unobserved update.
    pub fn bootstrap(latest: &Patch, location: &str) -> Self {
        Self {
            subject: format!("{SUBJECT_PREFIX} - Created new build id blob"),
            body: format!(
                "There was no build id blob at \"{location}\", so created a new one. \
                 It's possible a new version was released. \
                 Latest build ID: {}. Latest build date: {}",
                latest.build_id, latest.released_at
            ),
        }
    }

    /// The check itself failed; the body is the error text.
    pub fn error(message: &str) -> Self {
        Self {
            subject: format!("{SUBJECT_PREFIX} - update check had an error"),
            body: message.to_string(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire-and-forget publish. No delivery confirmation exists; an `Err`
    /// only means the handoff to the channel failed.
    async fn publish(&self, ev: &NotificationEvent) -> Result<()>;
}

/// Fans one event out to every configured channel. The topic webhook is
/// authoritative — its failure is the run's failure. Secondary channels are
/// best-effort and only logged.
pub struct NotifierMux {
    primary: Box<dyn Notifier>,
    secondary: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(primary: Box<dyn Notifier>) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
        }
    }

    pub fn with_secondary(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.secondary.push(notifier);
        self
    }

    /// Webhook from the validated config; email attached when its env vars
    /// are present and well-formed.
    pub fn from_config(cfg: &Config) -> Self {
        let mut mux = Self::new(Box::new(webhook::WebhookNotifier::new(
            cfg.notify_webhook_url.clone(),
        )));
        match email::EmailNotifier::from_env() {
            Ok(Some(mailer)) => mux = mux.with_secondary(Box::new(mailer)),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = ?e, "email notifier misconfigured, skipping"),
        }
        mux
    }

    /// Best-effort mux for reporting errors that occur before the config is
    /// validated. `None` when not even a webhook URL is available.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var(crate::config::ENV_NOTIFY_WEBHOOK_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(Self::new(Box::new(webhook::WebhookNotifier::new(url))))
    }
}

#[async_trait]
impl Notifier for NotifierMux {
    async fn publish(&self, ev: &NotificationEvent) -> Result<()> {
        for n in &self.secondary {
            if let Err(e) = n.publish(ev).await {
                tracing::warn!(error = ?e, subject = %ev.subject, "secondary notifier failed");
            }
        }
        self.primary.publish(ev).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(build_id: i64, released_at: &str) -> Patch {
        Patch {
            build_id,
            released_at: released_at.to_string(),
        }
    }

    #[test]
    fn update_event_carries_both_ids() {
        let ev = NotificationEvent::update(7, &patch(10, "d1"));
        assert!(ev.subject.starts_with(SUBJECT_PREFIX));
        assert!(ev.body.contains("(old): 7"));
        assert!(ev.body.contains("(new): 10"));
    }

    #[test]
    fn bootstrap_event_names_blob_and_build() {
        let ev = NotificationEvent::bootstrap(&patch(42, "Thu, 12 Jun 2025"), "bucket/key");
        assert!(ev.body.contains("bucket/key"));
        assert!(ev.body.contains("42"));
        assert!(ev.body.contains("Thu, 12 Jun 2025"));
    }

    #[test]
    fn error_event_uses_distinct_subject() {
        let ev = NotificationEvent::error("feed error: the release feed was empty");
        assert!(ev.subject.contains("had an error"));
        assert_eq!(ev.body, "feed error: the release feed was empty");
    }
}
