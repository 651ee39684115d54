//! Shared command setup: configuration, verbosity and logging.

use std::path::PathBuf;

use steamkeeper::config::ConfigFile;
use steamkeeper::logging::{self, LoggingGuard, Verbosity};
use tracing::info;

use crate::error::CliError;

/// Options that apply to every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub quiet: bool,
    pub log_dir: Option<PathBuf>,
}

/// Loaded configuration plus the live logging subscriber.
pub struct CliRunner {
    config: ConfigFile,
    verbosity: Verbosity,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load configuration and initialize logging.
    pub fn new(global: &GlobalArgs) -> Result<Self, CliError> {
        let config = load_config(global)?;
        let verbosity = resolve_verbosity(global, &config);
        let log_dir = global
            .log_dir
            .clone()
            .or_else(|| config.logging.log_dir.clone());
        let guard = logging::init(verbosity, log_dir.as_deref())?;

        Ok(Self {
            config,
            verbosity,
            _logging: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Log the command being run along with build information.
    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = %self.config.build.version,
            branch = %self.config.build.branch,
            verbosity = %self.verbosity,
            "Steamkeeper starting"
        );
    }
}

/// Load the `--config` file, or the default location when none is given.
///
/// An explicit path must exist; the default location may be missing.
pub fn load_config(global: &GlobalArgs) -> Result<ConfigFile, CliError> {
    let config = match &global.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// CLI flags win over the config file, which wins over the branch default.
pub fn resolve_verbosity(global: &GlobalArgs, config: &ConfigFile) -> Verbosity {
    if global.verbose {
        Verbosity::Verbose
    } else if global.quiet {
        Verbosity::Quiet
    } else {
        config.verbosity()
    }
}
