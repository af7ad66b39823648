//! Wayback Machine CDX index.
//!
//! With `output=json` the CDX server answers with an array of string rows
//! whose first row names the columns. The column layout is fixed:
//! `urlkey, timestamp, original, mimetype, statuscode, digest, length`.

use super::{endpoint_url, wildcard_target, HttpSettings, SourceAdapter};
use crate::error::WaybackError;
use crate::types::{Record, SourceKind};
use async_trait::async_trait;

const CDX_PATH: &str = "cdx/search/cdx";

/// Column holding the 14-digit capture timestamp.
pub const TIMESTAMP_COLUMN: usize = 1;

/// Column holding the captured URL.
pub const ORIGINAL_COLUMN: usize = 2;

/// Column holding the content digest of the capture.
pub const DIGEST_COLUMN: usize = 5;

/// Adapter for the Wayback Machine CDX server.
#[derive(Clone, Debug)]
pub struct WaybackSource {
    http: HttpSettings,
    cdx_url: url::Url,
}

impl WaybackSource {
    pub fn new(http: HttpSettings, base_url: &str) -> Result<Self, WaybackError> {
        Ok(Self {
            http,
            cdx_url: endpoint_url(base_url, CDX_PATH)?,
        })
    }

    /// All URLs under `target`, one row per distinct URL key.
    fn domain_query(&self, target: &str, exclude_subdomains: bool) -> url::Url {
        let mut url = self.cdx_url.clone();
        url.query_pairs_mut()
            .append_pair(
                "url",
                &format!("{}/*", wildcard_target(target, exclude_subdomains)),
            )
            .append_pair("output", "json")
            .append_pair("collapse", "urlkey");
        url
    }

    /// Every capture of exactly `page_url`.
    fn capture_query(&self, page_url: &str) -> url::Url {
        let mut url = self.cdx_url.clone();
        url.query_pairs_mut()
            .append_pair("url", page_url)
            .append_pair("output", "json");
        url
    }

    /// Fetch the raw capture rows for one URL, header row removed.
    pub async fn fetch_captures(&self, page_url: &str) -> Result<Vec<Vec<String>>, WaybackError> {
        let body = self
            .http
            .get_text(SourceKind::Wayback, self.capture_query(page_url))
            .await?;
        decode_rows(&body)
    }
}

#[async_trait]
impl SourceAdapter for WaybackSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Wayback
    }

    async fn fetch(
        &self,
        target: &str,
        exclude_subdomains: bool,
    ) -> Result<Vec<Record>, WaybackError> {
        let body = self
            .http
            .get_text(
                SourceKind::Wayback,
                self.domain_query(target, exclude_subdomains),
            )
            .await?;

        Ok(parse_records(&decode_rows(&body)?))
    }
}

/// Decode a CDX JSON body and drop the header row.
///
/// The first row is discarded without looking at it. An empty body is how
/// the CDX server says "no captures".
pub fn decode_rows(body: &str) -> Result<Vec<Vec<String>>, WaybackError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<String>> = serde_json::from_str(body).map_err(|e| {
        WaybackError::source(SourceKind::Wayback.name(), format!("invalid CDX JSON: {}", e))
    })?;

    Ok(rows.into_iter().skip(1).collect())
}

/// Map header-less CDX rows onto records, skipping rows that are too short.
pub fn parse_records(rows: &[Vec<String>]) -> Vec<Record> {
    rows.iter()
        .filter_map(|row| {
            let timestamp = row.get(TIMESTAMP_COLUMN)?;
            let url = row.get(ORIGINAL_COLUMN)?;
            if url.is_empty() {
                return None;
            }
            Some(Record::new(timestamp.as_str(), url.as_str()))
        })
        .collect()
}
