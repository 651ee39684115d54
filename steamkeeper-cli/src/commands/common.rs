//! Common helpers shared across CLI commands.

use std::path::PathBuf;

use steamkeeper::config::ConfigFile;
use steamkeeper::updater::{InstallTarget, Platform};

use crate::error::CliError;

/// Install target for the host, with config and CLI overrides applied.
///
/// CLI takes precedence, then config, then the platform default.
pub fn resolve_target(
    config: &ConfigFile,
    cli_install_dir: Option<PathBuf>,
) -> Result<InstallTarget, CliError> {
    let platform = Platform::detect()?;
    Ok(target_for(platform, config, cli_install_dir))
}

/// Same as [`resolve_target`] for an explicit platform.
pub fn target_for(
    platform: Platform,
    config: &ConfigFile,
    cli_install_dir: Option<PathBuf>,
) -> InstallTarget {
    let target = config.install_target(platform);
    match cli_install_dir {
        Some(dir) => target.with_install_dir(dir),
        None => target,
    }
}

/// Content directory from CLI or config. `None` means the working directory.
pub fn resolve_content_dir(config: &ConfigFile, cli_dir: Option<PathBuf>) -> Option<PathBuf> {
    cli_dir.or_else(|| config.updater.content_dir.clone())
}

/// App id from CLI or config.
pub fn resolve_app_id(config: &ConfigFile, cli_app_id: Option<u32>) -> u32 {
    cli_app_id.unwrap_or(config.updater.app_id)
}
