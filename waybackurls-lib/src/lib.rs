//! # waybackurls Library
//!
//! Collects every URL public archives know about for a domain, or every
//! archived version of a single URL.
//!
//! Three sources are queried concurrently under a shared request budget:
//! the Wayback Machine CDX index, the Common Crawl index and (with an API
//! key) VirusTotal. Their answers are merged into one stream, deduplicated by
//! URL and written out as they arrive. A source that fails is skipped for
//! that target; it never fails the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waybackurls_lib::{FetchConfig, UrlCollector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collector = UrlCollector::with_config(FetchConfig::default())?;
//!     let summary = collector
//!         .write_target("example.com", &mut std::io::stdout(), &mut std::io::stderr())
//!         .await?;
//!
//!     eprintln!("{} URLs", summary.emitted);
//!     Ok(())
//! }
//! ```

// Re-export main public API types and functions
// This makes them available as waybackurls_lib::TypeName
pub use collector::UrlCollector;
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, ConfigManager, EnvConfig,
    FileConfig, VIRUSTOTAL_API_KEY_ENV,
};
pub use dispatcher::{is_foreign_host, Dispatcher, RecordStream};
pub use error::WaybackError;
pub use output::{
    archive_timestamp_to_rfc3339, drain_target, format_record, Deduplicator, FormattedRecord,
    TargetSummary, UNKNOWN_DATE_PLACEHOLDER,
};
pub use sources::{HttpSettings, SourceAdapter};
pub use types::{Endpoints, FetchConfig, OutputFormat, Record, SourceKind};
pub use utils::read_targets;
pub use versions::{snapshot_url, VersionLister};

// Public modules
pub mod sources;

// Internal modules - these are not part of the public API
mod collector;
mod config;
mod dispatcher;
mod error;
mod output;
mod types;
mod utils;
mod versions;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WaybackError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
