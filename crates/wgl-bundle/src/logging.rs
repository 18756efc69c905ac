//! Logging setup.
//!
//! Events go to stderr so bundled code on stdout stays clean. The
//! `WGL_BUNDLE_LOG` environment variable takes a full filter directive and
//! wins over `--log-level`.

use std::sync::OnceLock;

use clap::ValueEnum;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "WGL_BUNDLE_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors (default)
    #[default]
    Warn,
    /// Progress information
    Info,
    /// Per-module and per-import events
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// The filter directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Builds the event filter from `WGL_BUNDLE_LOG`, falling back to `level`.
pub fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(level: LogLevel, format: LogFormat) {
    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let builder = fmt::fmt()
            .with_env_filter(filter(level))
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        let _ = match format {
            LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
            LogFormat::Text => tracing::subscriber::set_global_default(
                builder.compact().without_time().finish(),
            ),
        };
    });
}
