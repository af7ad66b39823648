//! Deduplication and rendering of the merged record stream.
//!
//! The first record seen for a URL wins, timestamp included. Output lines go
//! to one sink, date parsing diagnostics to another, so the URL list stays
//! clean when stdout is piped.

use crate::types::{OutputFormat, Record};
use chrono::{NaiveDateTime, SecondsFormat};
use futures_util::{Stream, StreamExt};
use std::collections::HashSet;
use std::io::{self, Write};

/// Layout of archive timestamps.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Written in place of a date that could not be parsed.
pub const UNKNOWN_DATE_PLACEHOLDER: &str = "0001-01-01T00:00:00Z";

/// URLs already emitted for the current target.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `url` is offered, false afterwards.
    pub fn first_sighting(&mut self, url: &str) -> bool {
        if self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string())
    }
}

/// A rendered output line, plus the diagnostic to report alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedRecord {
    pub line: String,
    pub date_warning: Option<String>,
}

/// Parse a 14-digit archive timestamp into RFC 3339 (UTC, whole seconds).
pub fn archive_timestamp_to_rfc3339(timestamp: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(timestamp, ARCHIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|parsed| parsed.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Render one record. Dated lines are produced even when the date is bad.
pub fn format_record(record: &Record, format: OutputFormat) -> FormattedRecord {
    match format {
        OutputFormat::Plain => FormattedRecord {
            line: record.url.clone(),
            date_warning: None,
        },
        OutputFormat::Dated => match archive_timestamp_to_rfc3339(&record.timestamp) {
            Some(date) => FormattedRecord {
                line: format!("{} {}", date, record.url),
                date_warning: None,
            },
            None => FormattedRecord {
                line: format!("{} {}", UNKNOWN_DATE_PLACEHOLDER, record.url),
                date_warning: Some(format!(
                    "failed to parse date [{}] for URL [{}]",
                    record.timestamp, record.url
                )),
            },
        },
    }
}

/// What happened while draining one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSummary {
    /// Lines written to the output
    pub emitted: usize,
    /// Records dropped because their URL was already written
    pub duplicates: usize,
    /// Dated lines written with the placeholder date
    pub unparsed_dates: usize,
}

/// Drain `records` into `out`, dropping repeated URLs.
///
/// Consumes the stream until it ends. Date diagnostics go to `diag`. Only a
/// failing sink is an error; nothing about the records themselves is.
pub async fn drain_target<S, W, E>(
    mut records: S,
    out: &mut W,
    diag: &mut E,
    format: OutputFormat,
) -> io::Result<TargetSummary>
where
    S: Stream<Item = Record> + Unpin,
    W: Write + ?Sized,
    E: Write + ?Sized,
{
    let mut dedup = Deduplicator::new();
    let mut summary = TargetSummary::default();

    while let Some(record) = records.next().await {
        if !dedup.first_sighting(&record.url) {
            summary.duplicates += 1;
            continue;
        }

        let formatted = format_record(&record, format);
        if let Some(warning) = &formatted.date_warning {
            writeln!(diag, "{}", warning)?;
            summary.unparsed_dates += 1;
        }
        writeln!(out, "{}", formatted.line)?;
        summary.emitted += 1;
    }

    out.flush()?;
    Ok(summary)
}
