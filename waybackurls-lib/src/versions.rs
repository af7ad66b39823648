//! Crawl-version listing for a single URL.
//!
//! Every capture of the URL is looked up in the Wayback CDX index. Captures
//! with identical content share a digest; only the first of each is kept and
//! turned into a raw (`if_`) snapshot URL.

use crate::error::WaybackError;
use crate::sources::wayback::{DIGEST_COLUMN, ORIGINAL_COLUMN, TIMESTAMP_COLUMN};
use crate::sources::{HttpSettings, WaybackSource};
use crate::types::FetchConfig;
use std::collections::HashSet;

/// Host used in the synthesized snapshot URLs.
pub const SNAPSHOT_HOST: &str = "web.archive.org";

/// Lists distinct archived versions of URLs.
#[derive(Clone, Debug)]
pub struct VersionLister {
    wayback: WaybackSource,
}

impl VersionLister {
    /// Build a lister from the run configuration.
    ///
    /// Independent of the source selection: only the Wayback endpoint and
    /// the timeout are used.
    pub fn with_config(config: &FetchConfig) -> Result<Self, WaybackError> {
        let http = HttpSettings::new(config.timeout)?;
        Ok(Self {
            wayback: WaybackSource::new(http, &config.endpoints.wayback)?,
        })
    }

    /// Snapshot URLs of every distinct capture of `url`, oldest first as
    /// the index returns them.
    pub async fn list_versions(&self, url: &str) -> Result<Vec<String>, WaybackError> {
        let rows = self.wayback.fetch_captures(url).await?;
        let versions = snapshot_urls(&rows);
        tracing::debug!(
            url = url,
            captures = rows.len(),
            versions = versions.len(),
            "listed versions"
        );
        Ok(versions)
    }
}

/// Keep the first capture per digest and build its snapshot URL.
///
/// `rows` must already be stripped of the header row. Rows without a digest
/// column are skipped.
pub fn snapshot_urls(rows: &[Vec<String>]) -> Vec<String> {
    let mut seen_digests = HashSet::new();

    rows.iter()
        .filter_map(|row| {
            let digest = row.get(DIGEST_COLUMN)?;
            if !seen_digests.insert(digest.as_str()) {
                return None;
            }
            Some(snapshot_url(
                &row[TIMESTAMP_COLUMN],
                &row[ORIGINAL_COLUMN],
            ))
        })
        .collect()
}

/// `https://web.archive.org/web/<timestamp>if_/<original>`
pub fn snapshot_url(timestamp: &str, original: &str) -> String {
    format!("https://{}/web/{}if_/{}", SNAPSHOT_HOST, timestamp, original)
}
