//! Main URL collector.
//!
//! `UrlCollector` wires the configured sources to a dispatcher and drives
//! one target at a time from fan-out to written output.

use crate::dispatcher::{Dispatcher, RecordStream};
use crate::error::WaybackError;
use crate::output::{drain_target, TargetSummary};
use crate::sources::{build_sources, HttpSettings};
use crate::types::FetchConfig;
use std::io::Write;

/// Collects historical URLs for targets from every configured source.
///
/// # Example
///
/// ```rust,no_run
/// use waybackurls_lib::{FetchConfig, SourceKind, UrlCollector};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = FetchConfig::default()
///         .with_sources(vec![SourceKind::Wayback])
///         .with_exclude_subdomains(true);
///     let collector = UrlCollector::with_config(config)?;
///
///     let mut stdout = std::io::stdout();
///     let mut stderr = std::io::stderr();
///     collector.write_target("example.com", &mut stdout, &mut stderr).await?;
///     Ok(())
/// }
/// ```
pub struct UrlCollector {
    config: FetchConfig,
    dispatcher: Dispatcher,
}

impl UrlCollector {
    /// Build the shared HTTP client and the configured sources.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no source is selected, the
    /// concurrency is zero, or an endpoint is not a valid URL. Nothing has
    /// touched the network at that point.
    pub fn with_config(config: FetchConfig) -> Result<Self, WaybackError> {
        if config.sources.is_empty() {
            return Err(WaybackError::config(
                "no valid sources specified. Please choose from: wayback, commoncrawl, virustotal",
            ));
        }

        let http = HttpSettings::new(config.timeout)?;
        let sources = build_sources(&config, &http)?;
        let dispatcher = Dispatcher::new(sources, config.concurrency, config.exclude_subdomains)?;

        Ok(Self { config, dispatcher })
    }

    /// Merged, not yet deduplicated, records for `target`.
    pub fn stream_target(&self, target: &str) -> RecordStream {
        self.dispatcher.run(target)
    }

    /// Fetch `target` from every source and write each distinct URL once.
    ///
    /// Source failures only shrink the result. The returned error is for
    /// failing writes to `out` or `diag`.
    pub async fn write_target<W, E>(
        &self,
        target: &str,
        out: &mut W,
        diag: &mut E,
    ) -> Result<TargetSummary, WaybackError>
    where
        W: Write + ?Sized,
        E: Write + ?Sized,
    {
        let summary = drain_target(
            self.stream_target(target),
            out,
            diag,
            self.config.output_format,
        )
        .await?;

        tracing::info!(
            domain = target,
            emitted = summary.emitted,
            duplicates = summary.duplicates,
            "target done"
        );
        Ok(summary)
    }

    /// Get the configuration this collector was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn source_count(&self) -> usize {
        self.dispatcher.source_count()
    }
}
