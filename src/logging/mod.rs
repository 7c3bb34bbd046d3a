//! Logging initialization.
//!
//! Production defaults to structured JSON for log shipping; everything else
//! gets human-readable output. `LOG_FORMAT` overrides the default.

use crate::config::{get_environment, get_log_format};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with file and line
    Json,
    /// Multi-line, colored
    Pretty,
    /// Single-line, colored
    Compact,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log format '{0}' (expected json, pretty or compact)")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        };
        f.write_str(name)
    }
}

impl LogFormat {
    pub fn for_environment(environment: &str) -> Self {
        match environment {
            "production" | "prod" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging settings for one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    /// `LOG_FORMAT` value that could not be parsed, reported once logging is up
    pub rejected_format: Option<String>,
}

impl LoggingConfig {
    /// An explicit, valid format wins over the environment default.
    pub fn resolve(explicit: Option<&str>, environment: &str) -> Self {
        let parsed = explicit.map(LogFormat::from_str);
        let (format, rejected_format) = match parsed {
            Some(Ok(format)) => (format, None),
            Some(Err(UnknownLogFormat(raw))) => (LogFormat::for_environment(environment), Some(raw)),
            None => (LogFormat::for_environment(environment), None),
        };
        Self {
            format,
            default_filter: "info".to_string(),
            rejected_format,
        }
    }

    pub fn from_env() -> Self {
        Self::resolve(get_log_format().as_deref(), &get_environment())
    }
}

/// Install the global subscriber.
///
/// Returns false when a subscriber was already installed (for example by an
/// earlier test), in which case the existing one is kept.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    let initialized = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stdout),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .try_init(),
    };

    if let Some(raw) = &config.rejected_format {
        tracing::warn!(log_format = %raw, fallback = %config.format, "Ignoring unknown LOG_FORMAT");
    }
    initialized.is_ok()
}
