//! Fan-out of one target over every configured source.
//!
//! Each source runs in its own task. A process-wide semaphore bounds how many
//! source requests are in flight; a permit is held for the network call only.
//! Records are funnelled through one bounded channel, which closes once the
//! last source task has dropped its sender.

use crate::error::WaybackError;
use crate::sources::SourceAdapter;
use crate::types::Record;
use futures_util::stream::{self, Stream};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

const RECORD_CHANNEL_CAPACITY: usize = 256;

/// Merged records of every source for one target, in arrival order.
pub type RecordStream = Pin<Box<dyn Stream<Item = Record> + Send>>;

/// Runs the configured sources against targets under a shared concurrency budget.
pub struct Dispatcher {
    sources: Vec<Arc<dyn SourceAdapter>>,
    budget: Arc<Semaphore>,
    exclude_subdomains: bool,
}

impl Dispatcher {
    /// Create a dispatcher over `sources`.
    ///
    /// # Errors
    ///
    /// A configuration error when no source is configured or the budget is
    /// zero; neither can make progress.
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        concurrency: usize,
        exclude_subdomains: bool,
    ) -> Result<Self, WaybackError> {
        if sources.is_empty() {
            return Err(WaybackError::config(
                "no valid sources specified. Please choose from: wayback, commoncrawl, virustotal",
            ));
        }
        if concurrency == 0 {
            return Err(WaybackError::config("Concurrency must be at least 1"));
        }

        Ok(Self {
            sources,
            budget: Arc::new(Semaphore::new(concurrency)),
            exclude_subdomains,
        })
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Query every source for `target` and stream back what they find.
    ///
    /// Must be called from within a tokio runtime. A source that fails
    /// contributes nothing and does not affect the others. The stream ends
    /// after all sources have finished.
    pub fn run(&self, target: &str) -> RecordStream {
        let (tx, rx) = mpsc::channel(RECORD_CHANNEL_CAPACITY);

        for source in &self.sources {
            let source = Arc::clone(source);
            let budget = Arc::clone(&self.budget);
            let tx = tx.clone();
            let target = target.to_string();
            let exclude_subdomains = self.exclude_subdomains;

            tokio::spawn(async move {
                let result = {
                    let _permit = match budget.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return,
                    };
                    source.fetch(&target, exclude_subdomains).await
                };

                let records = match result {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::debug!(
                            source = %source.kind(),
                            domain = %target,
                            error = %e,
                            "source failed, skipping"
                        );
                        return;
                    }
                };

                tracing::debug!(
                    source = %source.kind(),
                    domain = %target,
                    records = records.len(),
                    "source finished"
                );

                for record in records {
                    if exclude_subdomains && is_foreign_host(&record.url, &target) {
                        continue;
                    }
                    if tx.send(record).await.is_err() {
                        // Consumer went away.
                        break;
                    }
                }
            });
        }

        // Only the tasks hold senders now.
        drop(tx);

        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|record| (record, rx))
        }))
    }
}

/// Whether `raw_url` points at a host other than `target`.
///
/// URLs that do not parse, or have no host, are never foreign: when in
/// doubt the record is kept.
pub fn is_foreign_host(raw_url: &str, target: &str) -> bool {
    let Ok(parsed) = url::Url::parse(raw_url) else {
        return false;
    };
    let host = match parsed.host() {
        // IPv6 hosts are compared without their brackets.
        Some(url::Host::Ipv6(addr)) => addr.to_string(),
        Some(host) => host.to_string(),
        None => return false,
    };
    !host.eq_ignore_ascii_case(target.trim())
}
