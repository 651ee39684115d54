//! Logging setup and verbosity.
//!
//! Verbosity is a plain value handed to whoever needs it (the subscriber
//! filter here, the pipeline step logging in `updater`), so tests can run
//! fully silent or fully verbose without touching process-wide state.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Name of the rolling log file inside the log directory.
pub const LOG_FILE_NAME: &str = "steamkeeper.log";

/// How much the pipeline reports about its progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    /// Outcomes and errors.
    #[default]
    Normal,
    /// Every step.
    Verbose,
}

impl Verbosity {
    /// Default verbosity for a build branch: release builds are not verbose.
    pub fn for_branch(branch: &str) -> Self {
        if branch.eq_ignore_ascii_case("release") {
            Self::Normal
        } else {
            Self::Verbose
        }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "steamkeeper=debug,steamkeeper_cli=debug,info",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Normal => "normal",
            Self::Verbose => "verbose",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Verbosity {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            other => Err(LoggingError::InvalidVerbosity(other.to_string())),
        }
    }
}

/// Errors raised while configuring logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid verbosity '{0}' (expected quiet, normal or verbose)")]
    InvalidVerbosity(String),

    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Keeps the background file writer alive; logs are flushed on drop.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global tracing subscriber.
///
/// Console output always goes to stdout. With `log_dir`, a daily rolling
/// plain-text file is written there as well. `RUST_LOG` overrides the
/// verbosity-derived filter.
pub fn init(verbosity: Verbosity, log_dir: Option<&Path>) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(verbosity.default_filter()))
        .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;

    let console = tracing_subscriber::fmt::layer()
        .with_target(verbosity.is_verbose())
        .with_timer(LocalTime::rfc_3339());

    let (file_layer, file_writer) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| LoggingError::CreateDir {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(LocalTime::rfc_3339())
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbosity() {
        assert_eq!("quiet".parse::<Verbosity>().unwrap(), Verbosity::Quiet);
        assert_eq!(" Verbose ".parse::<Verbosity>().unwrap(), Verbosity::Verbose);
        assert!(matches!(
            "loud".parse::<Verbosity>(),
            Err(LoggingError::InvalidVerbosity(v)) if v == "loud"
        ));
    }

    #[test]
    fn test_branch_default() {
        assert_eq!(Verbosity::for_branch("Release"), Verbosity::Normal);
        assert_eq!(Verbosity::for_branch("nightly"), Verbosity::Verbose);
    }

    #[test]
    fn test_default_filters_parse() {
        for v in [Verbosity::Quiet, Verbosity::Normal, Verbosity::Verbose] {
            assert!(EnvFilter::try_new(v.default_filter()).is_ok(), "{}", v);
        }
    }

    #[test]
    fn test_ordering() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Normal < Verbosity::Verbose);
    }
}
