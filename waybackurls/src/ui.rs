//! Stderr display logic for the waybackurls CLI.
//!
//! Stdout carries only result lines, so everything here goes to stderr:
//! the fatal error line and the `--verbose` run header and per-target
//! summaries. Uses only the `console` crate.

use console::{style, Term};
use waybackurls_lib::{FetchConfig, OutputFormat, TargetSummary};

// ── Errors ───────────────────────────────────────────────────────────────────

/// Print a fatal error as `Error: <message>`.
pub fn print_error(message: &str) {
    let term = Term::stderr();
    let _ = term.write_line(&format!(
        "{} {}",
        style("Error:").red().bold().for_stderr(),
        message
    ));
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a dim header describing the run.
pub fn print_run_header(config: &FetchConfig, target_count: usize, versions_mode: bool) {
    let term = Term::stderr();
    let noun = if versions_mode { "URL" } else { "domain" };

    let _ = term.write_line(&format!(
        "{} {} {}",
        style("waybackurls").bold().for_stderr(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim().for_stderr(),
        style(format!(
            "- {} {}{}",
            target_count,
            noun,
            if target_count == 1 { "" } else { "s" }
        ))
        .dim()
        .for_stderr(),
    ));

    let _ = term.write_line(&style(header_meta(config, versions_mode)).dim().for_stderr().to_string());
}

fn header_meta(config: &FetchConfig, versions_mode: bool) -> String {
    let mut meta_parts: Vec<String> = Vec::new();

    if versions_mode {
        meta_parts.push("Mode: versions".to_string());
    } else {
        let sources: Vec<&str> = config.sources.iter().map(|s| s.name()).collect();
        meta_parts.push(format!("Sources: {}", sources.join(", ")));
        if config.exclude_subdomains {
            meta_parts.push("No subdomains".to_string());
        }
        if config.output_format == OutputFormat::Dated {
            meta_parts.push("Dated".to_string());
        }
    }
    meta_parts.push(format!("Concurrency: {}", config.concurrency));
    meta_parts.push(format!("Timeout: {}s", config.timeout.as_secs()));

    meta_parts.join(" | ")
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print one line summing up a finished target.
pub fn print_target_summary(target: &str, summary: &TargetSummary) {
    let term = Term::stderr();
    let _ = term.write_line(&format!(
        "  {} {}",
        style(target).bold().for_stderr(),
        style(summary_line(summary)).dim().for_stderr(),
    ));
}

fn summary_line(summary: &TargetSummary) -> String {
    let mut line = format!(
        "{} URL{}, {} duplicate{}",
        summary.emitted,
        if summary.emitted == 1 { "" } else { "s" },
        summary.duplicates,
        if summary.duplicates == 1 { "" } else { "s" },
    );
    if summary.unparsed_dates > 0 {
        line.push_str(&format!(", {} unparsed date(s)", summary.unparsed_dates));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use waybackurls_lib::SourceKind;

    #[test]
    fn test_header_meta_lists_sources() {
        let config = FetchConfig::default()
            .with_sources(vec![SourceKind::Wayback, SourceKind::CommonCrawl])
            .with_exclude_subdomains(true);
        let meta = header_meta(&config, false);

        assert!(meta.starts_with("Sources: wayback, commoncrawl"));
        assert!(meta.contains("No subdomains"));
        assert!(meta.contains("Concurrency: 5"));
        assert!(meta.contains("Timeout: 10s"));
    }

    #[test]
    fn test_header_meta_versions_mode_omits_sources() {
        let meta = header_meta(&FetchConfig::default(), true);
        assert!(meta.starts_with("Mode: versions"));
        assert!(!meta.contains("Sources"));
    }

    #[test]
    fn test_summary_line_pluralization() {
        let one = TargetSummary {
            emitted: 1,
            duplicates: 1,
            unparsed_dates: 0,
        };
        assert_eq!(summary_line(&one), "1 URL, 1 duplicate");

        let many = TargetSummary {
            emitted: 3,
            duplicates: 0,
            unparsed_dates: 2,
        };
        assert_eq!(
            summary_line(&many),
            "3 URLs, 0 duplicates, 2 unparsed date(s)"
        );
    }
}
