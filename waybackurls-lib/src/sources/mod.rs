//! Archive source adapters.
//!
//! Every source turns `(target, exclude_subdomains)` into one HTTP request
//! and decodes the answer into [`Record`]s. The wire formats differ per
//! source; the output contract does not.

use crate::error::WaybackError;
use crate::types::{FetchConfig, Record, SourceKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Wayback Machine CDX index
pub mod wayback;

/// Common Crawl URL index
pub mod commoncrawl;

/// VirusTotal domain report
pub mod virustotal;

pub use commoncrawl::CommonCrawlSource;
pub use virustotal::VirusTotalSource;
pub use wayback::WaybackSource;

/// A single archive service.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which catalog entry this adapter implements.
    fn kind(&self) -> SourceKind;

    /// Query the source once for `target`.
    ///
    /// When `exclude_subdomains` is false, sources that support it are asked
    /// for `*.target` as well. Malformed individual entries are skipped; a
    /// failed request or undecodable body is an error.
    async fn fetch(&self, target: &str, exclude_subdomains: bool)
        -> Result<Vec<Record>, WaybackError>;
}

/// The HTTP client shared by every source of a run.
///
/// Built once from the configured timeout and cloned into each adapter;
/// clones share one connection pool.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSettings {
    /// Build the shared client.
    pub fn new(timeout: Duration) -> Result<Self, WaybackError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("waybackurls/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                WaybackError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue one GET and hand back the body of a successful response.
    ///
    /// Non-2xx answers are reported as errors of `source`.
    pub(crate) async fn get_text(
        &self,
        source: SourceKind,
        url: url::Url,
    ) -> Result<String, WaybackError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                WaybackError::timeout(format!("{} request", source), Some(self.timeout))
            } else {
                WaybackError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WaybackError::source_with_status(
                source.name(),
                format!("unexpected response status {}", status),
                status.as_u16(),
            ));
        }

        Ok(response.text().await?)
    }
}

/// Prefix the subdomain wildcard unless subdomains are excluded.
pub(crate) fn wildcard_target(target: &str, exclude_subdomains: bool) -> String {
    if exclude_subdomains {
        target.to_string()
    } else {
        format!("*.{}", target)
    }
}

/// Join a path onto a configured base URL, tolerating a trailing slash on either side.
pub(crate) fn endpoint_url(base: &str, path: &str) -> Result<url::Url, WaybackError> {
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };
    Ok(url::Url::parse(&joined)?)
}

/// Instantiate the adapters for the configured sources, in configured order.
pub fn build_sources(
    config: &FetchConfig,
    http: &HttpSettings,
) -> Result<Vec<Arc<dyn SourceAdapter>>, WaybackError> {
    let mut sources: Vec<Arc<dyn SourceAdapter>> = Vec::with_capacity(config.sources.len());

    for kind in &config.sources {
        let source: Arc<dyn SourceAdapter> = match kind {
            SourceKind::Wayback => Arc::new(WaybackSource::new(
                http.clone(),
                &config.endpoints.wayback,
            )?),
            SourceKind::CommonCrawl => Arc::new(CommonCrawlSource::new(
                http.clone(),
                &config.endpoints.commoncrawl,
            )?),
            SourceKind::VirusTotal => Arc::new(VirusTotalSource::new(
                http.clone(),
                &config.endpoints.virustotal,
                config.virustotal_api_key.clone(),
            )?),
        };
        sources.push(source);
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_target() {
        assert_eq!(wildcard_target("example.com", false), "*.example.com");
        assert_eq!(wildcard_target("example.com", true), "example.com");
    }

    #[test]
    fn test_endpoint_url_joins_paths() {
        let url = endpoint_url("http://web.archive.org/", "/cdx/search/cdx").unwrap();
        assert_eq!(url.as_str(), "http://web.archive.org/cdx/search/cdx");

        let url = endpoint_url("http://index.commoncrawl.org/CC-MAIN-2018-22-index", "").unwrap();
        assert_eq!(
            url.as_str(),
            "http://index.commoncrawl.org/CC-MAIN-2018-22-index"
        );
    }

    #[test]
    fn test_endpoint_url_rejects_garbage() {
        let err = endpoint_url("not a url", "").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_build_sources_follows_config_order() {
        let config = FetchConfig::default()
            .with_sources(vec![SourceKind::VirusTotal, SourceKind::Wayback]);
        let http = HttpSettings::new(Duration::from_secs(1)).unwrap();

        let sources = build_sources(&config, &http).unwrap();
        let kinds: Vec<SourceKind> = sources.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![SourceKind::VirusTotal, SourceKind::Wayback]);
    }
}
