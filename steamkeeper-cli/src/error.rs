//! CLI error type and exit handling.

use std::fmt;

use console::style;
use steamkeeper::config::ConfigError;
use steamkeeper::logging::LoggingError;
use steamkeeper::updater::UpdaterError;

/// Errors surfaced to the operator by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is inconsistent.
    Config(String),
    /// The install or update pipeline failed.
    Updater(UpdaterError),
    /// Logging could not be initialized.
    Logging(LoggingError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Print the error to stderr and exit.
    pub fn exit(&self) -> ! {
        eprintln!("{} {}", style("Error:").red().bold(), self);
        std::process::exit(self.exit_code());
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Updater(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Updater(e) => Some(e),
            CliError::Logging(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<UpdaterError> for CliError {
    fn from(e: UpdaterError) -> Self {
        CliError::Updater(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}
