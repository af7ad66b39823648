//! Common Crawl URL index.
//!
//! The index server answers `output=json` queries with one JSON object per
//! line. Lines that do not decode are skipped rather than failing the source.

use super::{endpoint_url, wildcard_target, HttpSettings, SourceAdapter};
use crate::error::WaybackError;
use crate::types::{Record, SourceKind};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IndexLine {
    url: String,
    #[serde(default)]
    timestamp: String,
}

/// Adapter for one Common Crawl index.
#[derive(Clone, Debug)]
pub struct CommonCrawlSource {
    http: HttpSettings,
    index_url: url::Url,
}

impl CommonCrawlSource {
    /// `index_url` names the crawl, e.g. `http://index.commoncrawl.org/CC-MAIN-2018-22-index`.
    pub fn new(http: HttpSettings, index_url: &str) -> Result<Self, WaybackError> {
        Ok(Self {
            http,
            index_url: endpoint_url(index_url, "")?,
        })
    }

    fn query(&self, target: &str, exclude_subdomains: bool) -> url::Url {
        let mut url = self.index_url.clone();
        url.query_pairs_mut()
            .append_pair(
                "url",
                &format!("{}/*", wildcard_target(target, exclude_subdomains)),
            )
            .append_pair("output", "json");
        url
    }
}

#[async_trait]
impl SourceAdapter for CommonCrawlSource {
    fn kind(&self) -> SourceKind {
        SourceKind::CommonCrawl
    }

    async fn fetch(
        &self,
        target: &str,
        exclude_subdomains: bool,
    ) -> Result<Vec<Record>, WaybackError> {
        let body = self
            .http
            .get_text(
                SourceKind::CommonCrawl,
                self.query(target, exclude_subdomains),
            )
            .await?;

        Ok(parse_lines(&body))
    }
}

/// Decode newline-delimited index entries, keeping the ones that parse.
pub fn parse_lines(body: &str) -> Vec<Record> {
    body.lines()
        .filter_map(|line| serde_json::from_str::<IndexLine>(line).ok())
        .filter(|entry| !entry.url.is_empty())
        .map(|entry| Record::new(entry.timestamp, entry.url))
        .collect()
}
