//! Release-feed client: fetches the RSS document and reduces it to entries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

// SteamDB-style feeds carry an isPermaLink attribute on <guid>; only the
// text content matters here.
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: String,
}

/// One item of the release feed, reduced to the fields the core consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Unique identifier string, format `prefix#digits`.
    pub guid: String,
    /// Publication timestamp as reported by the feed, kept opaque.
    pub published: String,
}

#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &'static str;
}

/// Production feed client: HTTP GET + RSS parse.
pub struct HttpFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReleaseFeed for HttpFeed {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>> {
        tracing::info!(url = %self.url, "retrieving release feed");
        let body = match self.client.get(&self.url).send().await {
            Ok(resp) => resp
                .error_for_status()
                .context("feed http status")?
                .text()
                .await
                .context("feed http .text()")?,
            Err(e) => {
                tracing::warn!(error = ?e, url = %self.url, "feed http error");
                counter!("feed_fetch_errors_total").increment(1);
                return Err(e).context("feed http get()");
            }
        };
        parse_entries_from_str(&body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Fixture-backed feed for tests and offline tooling.
pub struct FixtureFeed {
    xml: String,
}

impl FixtureFeed {
    pub fn from_fixture(s: &str) -> Self {
        Self { xml: s.to_string() }
    }
}

#[async_trait]
impl ReleaseFeed for FixtureFeed {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>> {
        parse_entries_from_str(&self.xml)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn parse_entries_from_str(s: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let rss: Rss = from_str(s).context("parsing release rss xml")?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let Some(guid) = it.guid else {
            tracing::debug!("feed item without guid, dropping");
            continue;
        };
        out.push(FeedEntry {
            guid: guid.value,
            published: it.pub_date.unwrap_or_default(),
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_total").increment(out.len() as u64);
    Ok(out)
}
