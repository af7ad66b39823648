// waybackurls-lib/tests/integration.rs

//! End-to-end tests of the collector against local archive servers.

use mockito::{Matcher, Server};
use waybackurls_lib::{
    Endpoints, FetchConfig, OutputFormat, SourceKind, TargetSummary, UrlCollector, WaybackError,
};

fn config_for(server: &Server, sources: Vec<SourceKind>) -> FetchConfig {
    let base = server.url();
    FetchConfig::default()
        .with_sources(sources)
        .with_endpoints(Endpoints {
            wayback: base.clone(),
            commoncrawl: format!("{}/CC-MAIN-2018-22-index", base),
            virustotal: base,
        })
}

async fn run(collector: &UrlCollector, target: &str) -> (String, String, TargetSummary) {
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let summary = collector
        .write_target(target, &mut out, &mut diag)
        .await
        .unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(diag).unwrap(),
        summary,
    )
}

#[tokio::test]
async fn test_duplicate_archive_rows_collapse_to_one_line() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/cdx/search/cdx")
        .match_query(Matcher::Any)
        .with_body(
            r#"[["original","timestamp","url"],["_","20200101000000","http://example.com/a"],["_","20200101000000","http://example.com/a"]]"#,
        )
        .create_async()
        .await;

    let collector =
        UrlCollector::with_config(config_for(&server, vec![SourceKind::Wayback])).unwrap();
    let (out, diag, summary) = run(&collector, "example.com").await;

    assert_eq!(out, "http://example.com/a\n");
    assert!(diag.is_empty());
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.duplicates, 1);
}

#[tokio::test]
async fn test_sources_are_merged_and_deduplicated() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/cdx/search/cdx")
        .match_query(Matcher::Any)
        .with_body(
            r#"[["urlkey","timestamp","original"],["a","20200101000000","http://example.com/a"],["b","20200101000000","http://example.com/b"]]"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/CC-MAIN-2018-22-index")
        .match_query(Matcher::Any)
        .with_body(concat!(
            r#"{"timestamp":"20180521000000","url":"http://example.com/b"}"#,
            "\n",
            r#"{"timestamp":"20180521000000","url":"http://example.com/c"}"#,
            "\n",
        ))
        .create_async()
        .await;

    let collector = UrlCollector::with_config(config_for(
        &server,
        vec![SourceKind::Wayback, SourceKind::CommonCrawl],
    ))
    .unwrap();
    let (out, _, summary) = run(&collector, "example.com").await;

    let mut lines: Vec<&str> = out.lines().collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "http://example.com/a",
            "http://example.com/b",
            "http://example.com/c"
        ]
    );
    assert_eq!(summary.duplicates, 1);
}

#[tokio::test]
async fn test_failing_source_is_skipped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/cdx/search/cdx")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;
    server
        .mock("GET", "/CC-MAIN-2018-22-index")
        .match_query(Matcher::Any)
        .with_body(r#"{"timestamp":"20180521000000","url":"http://example.com/ok"}"#)
        .create_async()
        .await;

    let collector = UrlCollector::with_config(config_for(
        &server,
        vec![SourceKind::Wayback, SourceKind::CommonCrawl],
    ))
    .unwrap();
    let (out, _, _) = run(&collector, "example.com").await;

    assert_eq!(out, "http://example.com/ok\n");
}

#[tokio::test]
async fn test_virustotal_without_key_contributes_nothing() {
    let mut server = Server::new_async().await;
    let vt = server
        .mock("GET", "/vtapi/v2/domain/report")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let collector =
        UrlCollector::with_config(config_for(&server, vec![SourceKind::VirusTotal])).unwrap();
    let (out, diag, summary) = run(&collector, "example.com").await;

    vt.assert_async().await;
    assert!(out.is_empty());
    assert!(diag.is_empty());
    assert_eq!(summary, TargetSummary::default());
}

#[tokio::test]
async fn test_dated_output_with_undated_source() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/cdx/search/cdx")
        .match_query(Matcher::Any)
        .with_body(r#"[["urlkey","timestamp","original"],["x","20200101000000","http://x.test/"]]"#)
        .create_async()
        .await;
    server
        .mock("GET", "/vtapi/v2/domain/report")
        .match_query(Matcher::UrlEncoded("apikey".into(), "key".into()))
        .with_body(r#"{"detected_urls":[{"url":"http://x.test/malware"}]}"#)
        .create_async()
        .await;

    let config = config_for(&server, vec![SourceKind::Wayback, SourceKind::VirusTotal])
        .with_output_format(OutputFormat::Dated)
        .with_virustotal_api_key("key");
    let collector = UrlCollector::with_config(config).unwrap();
    let (out, diag, summary) = run(&collector, "x.test").await;

    let mut lines: Vec<&str> = out.lines().collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "0001-01-01T00:00:00Z http://x.test/malware",
            "2020-01-01T00:00:00Z http://x.test/",
        ]
    );
    assert_eq!(
        diag,
        "failed to parse date [] for URL [http://x.test/malware]\n"
    );
    assert_eq!(summary.unparsed_dates, 1);
}

#[tokio::test]
async fn test_exclude_subdomains_filters_foreign_hosts() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/cdx/search/cdx")
        .match_query(Matcher::UrlEncoded("url".into(), "example.com/*".into()))
        .with_body(
            r#"[["urlkey","timestamp","original"],
                ["a","20200101000000","http://sub.example.com/a"],
                ["b","20200101000000","http://EXAMPLE.com/b"]]"#,
        )
        .create_async()
        .await;

    let config =
        config_for(&server, vec![SourceKind::Wayback]).with_exclude_subdomains(true);
    let collector = UrlCollector::with_config(config).unwrap();
    let (out, _, _) = run(&collector, "example.com").await;

    mock.assert_async().await;
    assert_eq!(out, "http://EXAMPLE.com/b\n");
}

#[tokio::test]
async fn test_dedup_state_is_per_target() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/cdx/search/cdx")
        .match_query(Matcher::Any)
        .with_body(r#"[["urlkey","timestamp","original"],["a","20200101000000","http://shared.test/"]]"#)
        .expect(2)
        .create_async()
        .await;

    let collector =
        UrlCollector::with_config(config_for(&server, vec![SourceKind::Wayback])).unwrap();
    let (first, _, _) = run(&collector, "one.test").await;
    let (second, _, _) = run(&collector, "two.test").await;

    assert_eq!(first, "http://shared.test/\n");
    assert_eq!(second, "http://shared.test/\n");
}

#[test]
fn test_no_sources_fails_before_any_request() {
    let config = FetchConfig::default().with_sources(SourceKind::parse_list("bogus"));
    let err = UrlCollector::with_config(config).err().unwrap();
    assert!(matches!(err, WaybackError::ConfigError { .. }));
}
