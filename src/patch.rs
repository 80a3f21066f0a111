//! Build-identifier extraction and max-selection over feed entries.

use metrics::counter;

use crate::feed::FeedEntry;

/// One release entry reduced to what comparison needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Globally increasing id uniquely naming a released build.
    pub build_id: i64,
    /// The feed's reported release date. Informational only; never compared.
    pub released_at: String,
}

/// Pull the numeric build id out of a feed identifier of the form
/// `<prefix>#<digits>`, e.g. `"build#16294548"`. `None` when the separator
/// is absent or the suffix is not a base-10 integer.
pub fn extract_build_id(guid: &str) -> Option<i64> {
    let sep = guid.find('#')?;
    guid[sep + 1..].parse::<i64>().ok()
}

/// Scan all entries for the one with the numerically largest build id.
///
/// The feed usually arrives newest-first, so the first entry tends to win,
/// but the scan is exhaustive to tolerate a re-ordered feed. Entries that
/// don't yield an id are skipped, never defaulted. Ties keep the first-seen
/// entry's date. An empty or fully-unparsable sequence yields `None` — there
/// is no such thing as "build 0".
pub fn find_latest_patch(entries: &[FeedEntry]) -> Option<Patch> {
    let mut latest: Option<Patch> = None;

    for entry in entries {
        let Some(build_id) = extract_build_id(&entry.guid) else {
            tracing::warn!(guid = %entry.guid, "no parsable build id in feed entry, skipping");
            counter!("feed_entries_skipped_total").increment(1);
            continue;
        };
        tracing::debug!(build_id, published = %entry.published, "processed feed entry");

        match &mut latest {
            None => {
                latest = Some(Patch {
                    build_id,
                    released_at: entry.published.clone(),
                });
            }
            Some(cur) if build_id > cur.build_id => {
                tracing::debug!(new = build_id, old = cur.build_id, "found larger build id");
                cur.build_id = build_id;
                cur.released_at = entry.published.clone();
            }
            Some(_) => {}
        }
    }

    if let Some(p) = &latest {
        tracing::info!(build_id = p.build_id, released_at = %p.released_at, "largest build id in feed");
    }
    latest
}
