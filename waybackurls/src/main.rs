//! waybackurls CLI Application
//!
//! Fetches every URL the Wayback Machine, Common Crawl and VirusTotal know
//! about for a domain, or lists the archived versions of a URL. This binary
//! is a thin layer over waybackurls-lib: flags, configuration precedence,
//! target input and the output destination.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use waybackurls_lib::{load_env_config, ConfigManager, EnvConfig, FileConfig};
use waybackurls_lib::{
    read_targets, FetchConfig, OutputFormat, SourceKind, UrlCollector, VersionLister,
    WaybackError,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for waybackurls
#[derive(Parser, Debug)]
#[command(name = "waybackurls")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch all the URLs that public archives know about for a domain")]
#[command(
    long_about = "Fetch all the URLs that the Wayback Machine, Common Crawl and VirusTotal know about for a domain.\n\nTargets are read from stdin, one per line, unless one is given as an argument. Set VT_API_KEY to enable the VirusTotal source."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain to look up (or URL with --get-versions); read from stdin when omitted
    #[arg(value_name = "TARGET", help_heading = "Input")]
    pub target: Option<String>,

    /// List URLs for crawled versions of the input URL(s)
    #[arg(long = "get-versions", help_heading = "Input")]
    pub get_versions: bool,

    /// Comma-separated list of sources to query: wayback, commoncrawl, virustotal
    #[arg(long = "sources", value_name = "LIST", help_heading = "Sources")]
    pub sources: Option<String>,

    /// Don't include subdomains of the target domain
    #[arg(long = "no-subs", help_heading = "Sources")]
    pub no_subs: bool,

    /// Show date of fetch in the first column
    #[arg(long = "dates", help_heading = "Output")]
    pub dates: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Output")]
    pub output: Option<PathBuf>,

    /// Number of concurrent requests (default: 5, max: 100)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// HTTP request timeout in seconds (default: 10)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Performance"
    )]
    pub timeout: Option<u64>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging on stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(args.verbose);

    if let Err(e) = validate_args(&args) {
        ui::print_error(&e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        ui::print_error(&e.to_string());
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,waybackurls=debug,waybackurls_lib=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if args.timeout == Some(0) {
        return Err("Timeout must be at least 1 second".to_string());
    }

    if let Some(target) = &args.target {
        if target.trim().is_empty() {
            return Err("Target must not be empty".to_string());
        }
    }

    Ok(())
}

/// What the run does with each target.
enum Mode {
    Urls(UrlCollector),
    Versions(VersionLister),
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;

    // Configuration problems surface before any input is read or request made.
    let mode = if args.get_versions {
        Mode::Versions(VersionLister::with_config(&config)?)
    } else {
        Mode::Urls(UrlCollector::with_config(config.clone())?)
    };

    let mut out = open_output(args.output.as_deref())?;
    let targets = collect_targets(&args);

    if args.verbose {
        ui::print_run_header(&config, targets.len(), args.get_versions);
    }

    let mut diag = io::stderr();
    match mode {
        Mode::Urls(collector) => {
            for target in &targets {
                let summary = collector.write_target(target, &mut out, &mut diag).await?;
                if args.verbose {
                    ui::print_target_summary(target, &summary);
                }
            }
        }
        Mode::Versions(lister) => {
            for url in &targets {
                write_versions(&lister, url, &mut out).await?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// List and write the versions of one URL; a failed lookup skips the URL.
async fn write_versions<W: Write + ?Sized>(
    lister: &VersionLister,
    url: &str,
    out: &mut W,
) -> io::Result<()> {
    let versions = match lister.list_versions(url).await {
        Ok(versions) => versions,
        Err(e) => {
            tracing::debug!(url = url, error = %e, "skipping URL");
            return Ok(());
        }
    };

    // All lines of one URL are written together.
    for version in &versions {
        writeln!(out, "{}", version)?;
    }
    out.flush()
}

/// Build FetchConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (WAYBACKURLS_*, VT_API_KEY)
/// 3. Local config file (./waybackurls.toml)
/// 4. Global config file (~/.waybackurls.toml)
/// 5. XDG config file (~/.config/waybackurls/config.toml)
/// 6. Built-in defaults
fn build_config(args: &Args) -> Result<FetchConfig, WaybackError> {
    let env_config = load_env_config();
    let config_manager = ConfigManager::new();

    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(explicit_path) => {
            tracing::debug!(path = %explicit_path, "using explicit config file");
            config_manager.load_file(explicit_path)?
        }
        None => config_manager.discover_and_load()?,
    };

    Ok(layer_config(
        FetchConfig::default(),
        &file_config,
        &env_config,
        args,
    ))
}

/// Apply file, environment and CLI settings in increasing precedence.
fn layer_config(
    config: FetchConfig,
    file_config: &FileConfig,
    env_config: &EnvConfig,
    args: &Args,
) -> FetchConfig {
    let config = file_config.apply_to(config);
    let config = env_config.apply_to(config);
    apply_cli_args_to_config(config, args)
}

/// Apply CLI arguments to config (highest precedence).
///
/// Boolean flags can only switch features on; leaving one off keeps
/// whatever the environment or config file chose.
fn apply_cli_args_to_config(mut config: FetchConfig, args: &Args) -> FetchConfig {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = Duration::from_secs(timeout);
    }
    if let Some(sources) = &args.sources {
        config.sources = SourceKind::parse_list(sources);
    }
    if args.no_subs {
        config.exclude_subdomains = true;
    }
    if args.dates {
        config.output_format = OutputFormat::Dated;
    }
    config
}

/// Open the output destination: the given file (created or truncated) or stdout.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, WaybackError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                WaybackError::file_error(
                    path.to_string_lossy(),
                    format!("failed to create output file: {}", e),
                )
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(line_sink(io::stdout()))),
    }
}

/// Terminal and pipe output is flushed line by line so results show up as
/// they arrive.
fn line_sink<W: Write>(inner: W) -> LineWriter<W> {
    LineWriter::new(inner)
}

/// The single target argument, or every non-blank line of stdin.
fn collect_targets(args: &Args) -> Vec<String> {
    if let Some(target) = &args.target {
        return vec![target.trim().to_string()];
    }

    let (targets, err) = read_targets(io::stdin().lock());
    if let Some(e) = err {
        tracing::warn!(error = %e, "failed to read input");
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper function with all required fields
    fn create_test_args() -> Args {
        Args {
            target: Some("example.com".to_string()),
            get_versions: false,
            sources: None,
            no_subs: false,
            dates: false,
            output: None,
            concurrency: None,
            timeout: None,
            config: None,
            verbose: false,
        }
    }

    #[test]
    fn test_validate_args_accepts_defaults() {
        assert!(validate_args(&create_test_args()).is_ok());
    }

    #[test]
    fn test_validate_args_concurrency_bounds() {
        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(101);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(100);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_zero_timeout_rejected() {
        let mut args = create_test_args();
        args.timeout = Some(0);
        let err = validate_args(&args).unwrap_err();
        assert!(err.contains("Timeout"));
    }

    #[test]
    fn test_validate_args_blank_target_rejected() {
        let mut args = create_test_args();
        args.target = Some("   ".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_cli_args_override_config() {
        let mut args = create_test_args();
        args.concurrency = Some(42);
        args.timeout = Some(3);
        args.sources = Some("commoncrawl".to_string());
        args.dates = true;
        args.no_subs = true;

        let config = apply_cli_args_to_config(FetchConfig::default().with_concurrency(7), &args);
        assert_eq!(config.concurrency, 42);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.sources, vec![SourceKind::CommonCrawl]);
        assert_eq!(config.output_format, OutputFormat::Dated);
        assert!(config.exclude_subdomains);
    }

    #[test]
    fn test_unset_flags_keep_lower_layers() {
        let args = create_test_args();
        let lower = FetchConfig::default()
            .with_concurrency(9)
            .with_exclude_subdomains(true)
            .with_output_format(OutputFormat::Dated);

        let config = apply_cli_args_to_config(lower, &args);
        assert_eq!(config.concurrency, 9);
        assert!(config.exclude_subdomains);
        assert_eq!(config.output_format, OutputFormat::Dated);
    }

    #[test]
    fn test_unknown_cli_sources_resolve_to_nothing() {
        let mut args = create_test_args();
        args.sources = Some("bogus".to_string());

        let config = apply_cli_args_to_config(FetchConfig::default(), &args);
        assert!(config.sources.is_empty());
        assert!(UrlCollector::with_config(config).is_err());
    }

    #[test]
    fn test_layer_precedence() {
        let file_config: FileConfig = toml_file_config("[defaults]\nconcurrency = 3\ntimeout = \"20s\"\nno_subs = true\n");
        let env_config = EnvConfig {
            concurrency: Some(8),
            ..Default::default()
        };
        let mut args = create_test_args();
        args.timeout = Some(4);

        let config = layer_config(FetchConfig::default(), &file_config, &env_config, &args);
        assert_eq!(config.concurrency, 8); // env over file
        assert_eq!(config.timeout, Duration::from_secs(4)); // CLI over file
        assert!(config.exclude_subdomains); // file over default
    }

    fn toml_file_config(content: &str) -> FileConfig {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        ConfigManager::new().load_file(file.path()).unwrap()
    }

    #[test]
    fn test_line_sink_flushes_each_line() {
        let mut sink = line_sink(Vec::new());
        write!(sink, "http://example.com/a\nhttp://exam").unwrap();
        assert_eq!(sink.get_ref().as_slice(), b"http://example.com/a\n");

        writeln!(sink, "ple.com/b").unwrap();
        assert_eq!(
            sink.get_ref().as_slice(),
            b"http://example.com/a\nhttp://example.com/b\n"
        );
    }

    #[test]
    fn test_open_output_reports_file_error() {
        let err = open_output(Some(Path::new("/nonexistent-dir/out.txt")))
            .err()
            .unwrap();
        assert!(matches!(err, WaybackError::FileError { .. }));
        assert!(err.is_fatal());
    }
}
