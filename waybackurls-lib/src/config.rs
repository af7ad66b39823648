//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and the
//! `WAYBACKURLS_*` environment, and merging them with proper precedence.

use crate::error::WaybackError;
use crate::types::{Endpoints, FetchConfig, OutputFormat, SourceKind};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the VirusTotal API key.
pub const VIRUSTOTAL_API_KEY_ENV: &str = "VT_API_KEY";

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Alternative hosts for the archive services
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<EndpointsConfig>,

    /// VirusTotal credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virustotal: Option<VirusTotalConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default timeout (as string, e.g., "10s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Sources to query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,

    /// Prefix each URL with its capture date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<bool>,

    /// Leave out subdomains of the target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_subs: Option<bool>,
}

/// Endpoint overrides, one per source.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndpointsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wayback: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commoncrawl: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub virustotal: Option<String>,
}

/// VirusTotal section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VirusTotalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WaybackError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WaybackError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WaybackError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            WaybackError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is read first, then the home directory, then the current
    /// directory; later files override earlier ones field by field.
    pub fn discover_and_load(&self) -> Result<FileConfig, WaybackError> {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => merged_config = self.merge_configs(merged_config, config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping config file")
                }
            }
        }

        Ok(merged_config)
    }

    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./waybackurls.toml", "./.waybackurls.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".waybackurls.toml", "waybackurls.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("waybackurls").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    sources: higher_defaults.sources.or(lower_defaults.sources),
                    dates: higher_defaults.dates.or(lower_defaults.dates),
                    no_subs: higher_defaults.no_subs.or(lower_defaults.no_subs),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            endpoints: match (lower.endpoints, higher.endpoints) {
                (Some(lower_endpoints), Some(higher_endpoints)) => Some(EndpointsConfig {
                    wayback: higher_endpoints.wayback.or(lower_endpoints.wayback),
                    commoncrawl: higher_endpoints.commoncrawl.or(lower_endpoints.commoncrawl),
                    virustotal: higher_endpoints.virustotal.or(lower_endpoints.virustotal),
                }),
                (lower_endpoints, higher_endpoints) => higher_endpoints.or(lower_endpoints),
            },
            virustotal: match (lower.virustotal, higher.virustotal) {
                (Some(lower_vt), Some(higher_vt)) => Some(VirusTotalConfig {
                    api_key: higher_vt.api_key.or(lower_vt.api_key),
                }),
                (lower_vt, higher_vt) => higher_vt.or(lower_vt),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), WaybackError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(WaybackError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(WaybackError::config(format!(
                        "Invalid timeout format '{}'. Use format like '10', '30s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(sources) = &defaults.sources {
                if SourceKind::resolve(sources).is_empty() {
                    return Err(WaybackError::config(
                        "'sources' names no known source. Please choose from: wayback, commoncrawl, virustotal",
                    ));
                }
            }
        }

        if let Some(endpoints) = &config.endpoints {
            let all = [
                &endpoints.wayback,
                &endpoints.commoncrawl,
                &endpoints.virustotal,
            ];
            for endpoint in all.into_iter().flatten() {
                url::Url::parse(endpoint).map_err(|e| {
                    WaybackError::config(format!("Invalid endpoint '{}': {}", endpoint, e))
                })?;
            }
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FileConfig {
    /// Apply this file's settings on top of `config`.
    pub fn apply_to(&self, mut config: FetchConfig) -> FetchConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(concurrency) = defaults.concurrency {
                config.concurrency = concurrency;
            }
            if let Some(seconds) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config.timeout = Duration::from_secs(seconds);
            }
            if let Some(sources) = &defaults.sources {
                config.sources = SourceKind::resolve(sources);
            }
            if let Some(dates) = defaults.dates {
                config.output_format = output_format(dates);
            }
            if let Some(no_subs) = defaults.no_subs {
                config.exclude_subdomains = no_subs;
            }
        }

        if let Some(endpoints) = &self.endpoints {
            let Endpoints {
                wayback,
                commoncrawl,
                virustotal,
            } = &mut config.endpoints;
            if let Some(url) = &endpoints.wayback {
                *wayback = url.clone();
            }
            if let Some(url) = &endpoints.commoncrawl {
                *commoncrawl = url.clone();
            }
            if let Some(url) = &endpoints.virustotal {
                *virustotal = url.clone();
            }
        }

        if let Some(key) = self.virustotal.as_ref().and_then(|vt| vt.api_key.clone()) {
            config.virustotal_api_key = Some(key);
        }

        config
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub sources: Option<String>,
    pub dates: Option<bool>,
    pub no_subs: Option<bool>,
    pub config: Option<String>,
    pub virustotal_api_key: Option<String>,
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|name| env::var(name).ok())
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // WAYBACKURLS_CONCURRENCY - concurrent source requests
    if let Some(val) = lookup("WAYBACKURLS_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= 100 => {
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!(
                value = %val,
                "ignoring invalid WAYBACKURLS_CONCURRENCY, must be 1-100"
            ),
        }
    }

    // WAYBACKURLS_TIMEOUT - request timeout
    if let Some(timeout_str) = lookup("WAYBACKURLS_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            env_config.timeout = Some(timeout_str);
        } else {
            tracing::warn!(
                value = %timeout_str,
                "ignoring invalid WAYBACKURLS_TIMEOUT, use format like '10', '30s', '2m'"
            );
        }
    }

    // WAYBACKURLS_SOURCES - comma-separated source names
    if let Some(sources) = lookup("WAYBACKURLS_SOURCES") {
        if !sources.trim().is_empty() {
            env_config.sources = Some(sources);
        }
    }

    env_config.dates = lookup_bool(&lookup, "WAYBACKURLS_DATES");
    env_config.no_subs = lookup_bool(&lookup, "WAYBACKURLS_NO_SUBS");

    // WAYBACKURLS_CONFIG - explicit config file
    if let Some(config_path) = lookup("WAYBACKURLS_CONFIG") {
        if !config_path.trim().is_empty() {
            env_config.config = Some(config_path);
        }
    }

    if let Some(key) = lookup(VIRUSTOTAL_API_KEY_ENV) {
        if !key.trim().is_empty() {
            env_config.virustotal_api_key = Some(key);
        }
    }

    env_config
}

fn lookup_bool<F>(lookup: &F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(name)?;
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(variable = name, value = %val, "ignoring invalid boolean, use true/false");
            None
        }
    }
}

impl EnvConfig {
    /// Apply the environment on top of `config`.
    pub fn apply_to(&self, mut config: FetchConfig) -> FetchConfig {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(seconds) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config.timeout = Duration::from_secs(seconds);
        }
        if let Some(sources) = &self.sources {
            config.sources = SourceKind::parse_list(sources);
        }
        if let Some(dates) = self.dates {
            config.output_format = output_format(dates);
        }
        if let Some(no_subs) = self.no_subs {
            config.exclude_subdomains = no_subs;
        }
        if let Some(key) = &self.virustotal_api_key {
            config.virustotal_api_key = Some(key.clone());
        }
        config
    }
}

fn output_format(dates: bool) -> OutputFormat {
    if dates {
        OutputFormat::Dated
    } else {
        OutputFormat::Plain
    }
}

/// Parse a timeout string like "10", "30s", "2m" into seconds.
///
/// Zero is rejected: a zero timeout would fail every request.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let seconds = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    };

    seconds.filter(|&s| s > 0)
}
