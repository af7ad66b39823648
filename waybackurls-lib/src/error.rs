//! Error handling for archive fetching operations.
//!
//! Only configuration errors are fatal to a run. Everything a single source
//! can go wrong with is reported through the same type but recovered by the
//! dispatcher, which drops that source for the current target.

use std::fmt;
use std::time::Duration;

/// Main error type for the library.
#[derive(Debug, Clone)]
pub enum WaybackError {
    /// Network-related errors (connection refused, DNS, TLS, ...)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// A source answered, but not with something we can use
    SourceError {
        source: String,
        message: String,
        status_code: Option<u16>,
    },

    /// JSON decoding errors for source responses
    ParseError { message: String },

    /// Configuration errors (no sources selected, bad concurrency, ...)
    ConfigError { message: String },

    /// File I/O errors for config files and output destinations
    FileError { path: String, message: String },

    /// A request took longer than the configured timeout
    Timeout {
        operation: String,
        duration: Option<Duration>,
    },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl WaybackError {
    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new source error.
    pub fn source<S: Into<String>, M: Into<String>>(source: S, message: M) -> Self {
        Self::SourceError {
            source: source.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new source error carrying the HTTP status the source answered with.
    pub fn source_with_status<S: Into<String>, M: Into<String>>(
        source: S,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::SourceError {
            source: source.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Option<Duration>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// Everything else is scoped to one source for one target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigError { .. } | Self::FileError { .. })
    }
}

impl fmt::Display for WaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::SourceError {
                source,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "{} error (HTTP {}): {}", source, code, message)
                } else {
                    write!(f, "{} error: {}", source, message)
                }
            }
            Self::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => match duration {
                Some(duration) => write!(f, "Timeout after {:?} during: {}", duration, operation),
                None => write!(f, "Timeout during: {}", operation),
            },
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for WaybackError {}

impl From<reqwest::Error> for WaybackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", None)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::parse(format!("Response body could not be decoded: {}", err))
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for WaybackError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON parsing failed: {}", err))
    }
}

impl From<std::io::Error> for WaybackError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<url::ParseError> for WaybackError {
    fn from(err: url::ParseError) -> Self {
        Self::config(format!("Invalid endpoint URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_and_file_errors_are_fatal() {
        assert!(WaybackError::config("no sources").is_fatal());
        assert!(WaybackError::file_error("out.txt", "permission denied").is_fatal());

        assert!(!WaybackError::network("refused").is_fatal());
        assert!(!WaybackError::source("wayback", "bad gateway").is_fatal());
        assert!(!WaybackError::parse("unexpected EOF").is_fatal());
        assert!(!WaybackError::timeout("HTTP request", None).is_fatal());
    }

    #[test]
    fn test_display_includes_status_code() {
        let err = WaybackError::source_with_status("commoncrawl", "index unavailable", 503);
        assert_eq!(
            err.to_string(),
            "commoncrawl error (HTTP 503): index unavailable"
        );
    }

    #[test]
    fn test_json_errors_become_parse_errors() {
        let err: WaybackError = serde_json::from_str::<Vec<String>>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, WaybackError::ParseError { .. }));
    }
}
