//! VirusTotal domain report (v2 API).
//!
//! Only `detected_urls` is used. The report carries scan dates in a
//! different format from the archives, so records come out undated.

use super::{endpoint_url, HttpSettings, SourceAdapter};
use crate::error::WaybackError;
use crate::types::{Record, SourceKind};
use async_trait::async_trait;
use serde::Deserialize;

const REPORT_PATH: &str = "vtapi/v2/domain/report";

#[derive(Debug, Default, Deserialize)]
struct DomainReport {
    #[serde(default)]
    detected_urls: Vec<DetectedUrl>,
}

#[derive(Debug, Deserialize)]
struct DetectedUrl {
    #[serde(default)]
    url: String,
}

/// Adapter for the VirusTotal domain report.
///
/// Without an API key the source is disabled: it answers every fetch with
/// no records and never touches the network.
#[derive(Clone)]
pub struct VirusTotalSource {
    http: HttpSettings,
    report_url: url::Url,
    api_key: Option<String>,
}

impl VirusTotalSource {
    pub fn new(
        http: HttpSettings,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, WaybackError> {
        Ok(Self {
            http,
            report_url: endpoint_url(base_url, REPORT_PATH)?,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

// Keeps the API key out of debug output.
impl std::fmt::Debug for VirusTotalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirusTotalSource")
            .field("report_url", &self.report_url.as_str())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[async_trait]
impl SourceAdapter for VirusTotalSource {
    fn kind(&self) -> SourceKind {
        SourceKind::VirusTotal
    }

    /// The domain report has no wildcard form, so `exclude_subdomains` does
    /// not change the query.
    async fn fetch(
        &self,
        target: &str,
        _exclude_subdomains: bool,
    ) -> Result<Vec<Record>, WaybackError> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!(domain = target, "virustotal disabled, no API key");
            return Ok(Vec::new());
        };

        let mut url = self.report_url.clone();
        url.query_pairs_mut()
            .append_pair("apikey", api_key)
            .append_pair("domain", target);

        let body = self.http.get_text(SourceKind::VirusTotal, url).await?;
        parse_report(&body)
    }
}

/// Decode a domain report into undated records.
pub fn parse_report(body: &str) -> Result<Vec<Record>, WaybackError> {
    let report: DomainReport = serde_json::from_str(body).map_err(|e| {
        WaybackError::source(
            SourceKind::VirusTotal.name(),
            format!("invalid domain report: {}", e),
        )
    })?;

    Ok(report
        .detected_urls
        .into_iter()
        .filter(|detected| !detected.url.is_empty())
        .map(|detected| Record::undated(detected.url))
        .collect())
}
