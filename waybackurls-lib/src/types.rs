//! Core data types shared by the sources, the dispatcher and the output stage.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Wayback Machine host.
pub const DEFAULT_WAYBACK_ENDPOINT: &str = "http://web.archive.org";

/// Default Common Crawl index. The index name pins one crawl.
pub const DEFAULT_COMMONCRAWL_ENDPOINT: &str = "http://index.commoncrawl.org/CC-MAIN-2018-22-index";

/// Default VirusTotal API host.
pub const DEFAULT_VIRUSTOTAL_ENDPOINT: &str = "https://www.virustotal.com";

/// One URL known to an archive source.
///
/// `timestamp` is whatever the source reported, usually a 14-digit
/// `YYYYMMDDHHMMSS` archive timestamp, and empty for sources without dates.
/// Two records are the same URL for dedup purposes regardless of timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: String,
    pub url: String,
}

impl Record {
    pub fn new<T: Into<String>, U: Into<String>>(timestamp: T, url: U) -> Self {
        Self {
            timestamp: timestamp.into(),
            url: url.into(),
        }
    }

    /// A record from a source that does not report capture dates.
    pub fn undated<U: Into<String>>(url: U) -> Self {
        Self::new(String::new(), url)
    }
}

/// The fixed catalog of archive sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Wayback Machine CDX index
    #[serde(rename = "wayback")]
    Wayback,

    /// Common Crawl URL index
    #[serde(rename = "commoncrawl")]
    CommonCrawl,

    /// VirusTotal domain report (needs an API key)
    #[serde(rename = "virustotal")]
    VirusTotal,
}

impl SourceKind {
    /// Every source, in the order they are queried by default.
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Wayback,
        SourceKind::CommonCrawl,
        SourceKind::VirusTotal,
    ];

    /// Canonical name, as accepted by `--sources`.
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Wayback => "wayback",
            SourceKind::CommonCrawl => "commoncrawl",
            SourceKind::VirusTotal => "virustotal",
        }
    }

    /// Look up a source by canonical name or by its generic alias.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    pub fn from_name(name: &str) -> Option<SourceKind> {
        match name.trim().to_lowercase().as_str() {
            "wayback" | "archive" => Some(SourceKind::Wayback),
            "commoncrawl" | "crawl-index" => Some(SourceKind::CommonCrawl),
            "virustotal" | "reputation-index" => Some(SourceKind::VirusTotal),
            _ => None,
        }
    }

    /// Resolve a list of source names against the catalog.
    ///
    /// Unknown names are skipped with a warning and repeated names collapse
    /// onto their first mention. The result may be empty; callers decide
    /// whether that is an error.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Vec<SourceKind> {
        let mut resolved = Vec::new();
        for name in names {
            let name = name.as_ref();
            if name.trim().is_empty() {
                continue;
            }
            match SourceKind::from_name(name) {
                Some(kind) if !resolved.contains(&kind) => resolved.push(kind),
                Some(_) => {}
                None => tracing::warn!(source = name.trim(), "ignoring unknown source"),
            }
        }
        resolved
    }

    /// Resolve a comma-separated list such as `"wayback,commoncrawl"`.
    pub fn parse_list(list: &str) -> Vec<SourceKind> {
        let names: Vec<&str> = list.split(',').collect();
        Self::resolve(&names)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How surviving records are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One bare URL per line
    #[default]
    Plain,

    /// `<RFC 3339 timestamp> <url>` per line
    Dated,
}

/// Base URLs of the archive services.
///
/// Overridable so the tool can be pointed at mirrors or local test servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub wayback: String,
    pub commoncrawl: String,
    pub virustotal: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            wayback: DEFAULT_WAYBACK_ENDPOINT.to_string(),
            commoncrawl: DEFAULT_COMMONCRAWL_ENDPOINT.to_string(),
            virustotal: DEFAULT_VIRUSTOTAL_ENDPOINT.to_string(),
        }
    }
}

/// Configuration for one run of the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum number of source requests in flight at once
    /// Default: 5, Range: 1-100
    pub concurrency: usize,

    /// Timeout applied to every outbound request
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Which sources to query
    /// Default: all of them
    pub sources: Vec<SourceKind>,

    /// Only keep URLs whose host is exactly the target
    /// Default: false
    pub exclude_subdomains: bool,

    /// Plain URLs or dated lines
    pub output_format: OutputFormat,

    /// Credential for the VirusTotal source; without it that source stays silent
    pub virustotal_api_key: Option<String>,

    /// Where each source lives
    pub endpoints: Endpoints,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout: Duration::from_secs(10),
            sources: SourceKind::ALL.to_vec(),
            exclude_subdomains: false,
            output_format: OutputFormat::Plain,
            virustotal_api_key: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl FetchConfig {
    /// Set the concurrency budget, capped at 100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Select the sources to query.
    pub fn with_sources(mut self, sources: Vec<SourceKind>) -> Self {
        self.sources = sources;
        self
    }

    /// Drop records whose host is not exactly the target.
    pub fn with_exclude_subdomains(mut self, exclude: bool) -> Self {
        self.exclude_subdomains = exclude;
        self
    }

    /// Choose between plain and dated output.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Provide the VirusTotal API key.
    pub fn with_virustotal_api_key<K: Into<String>>(mut self, key: K) -> Self {
        self.virustotal_api_key = Some(key.into());
        self
    }

    /// Point the sources at other hosts.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_names_and_aliases() {
        assert_eq!(SourceKind::from_name("wayback"), Some(SourceKind::Wayback));
        assert_eq!(SourceKind::from_name(" Archive "), Some(SourceKind::Wayback));
        assert_eq!(
            SourceKind::from_name("crawl-index"),
            Some(SourceKind::CommonCrawl)
        );
        assert_eq!(
            SourceKind::from_name("VIRUSTOTAL"),
            Some(SourceKind::VirusTotal)
        );
        assert_eq!(SourceKind::from_name("shodan"), None);
    }

    #[test]
    fn test_parse_list_ignores_unknown_and_duplicates() {
        let sources = SourceKind::parse_list("commoncrawl, bogus,wayback,,archive");
        assert_eq!(sources, vec![SourceKind::CommonCrawl, SourceKind::Wayback]);
    }

    #[test]
    fn test_parse_list_can_resolve_to_nothing() {
        assert!(SourceKind::parse_list("bogus,other").is_empty());
        assert!(SourceKind::parse_list("").is_empty());
    }

    #[test]
    fn test_default_config_uses_every_source() {
        let config = FetchConfig::default();
        assert_eq!(config.sources, SourceKind::ALL.to_vec());
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.output_format, OutputFormat::Plain);
        assert!(config.virustotal_api_key.is_none());
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(FetchConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(FetchConfig::default().with_concurrency(500).concurrency, 100);
    }
}
