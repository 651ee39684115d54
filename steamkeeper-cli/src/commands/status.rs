//! Status command - show where the updater lives and whether it is installed.

use std::path::PathBuf;

use console::style;
use steamkeeper::updater::InstallationState;

use super::common::resolve_target;
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalArgs};

/// Run the status command.
pub fn run(global: &GlobalArgs, install_dir: Option<PathBuf>) -> Result<(), CliError> {
    let runner = CliRunner::new(global)?;
    runner.log_startup("status");
    let target = resolve_target(runner.config(), install_dir)?;

    let state = match target.state() {
        InstallationState::Present => style("installed").green(),
        InstallationState::Absent => style("not installed").yellow(),
    };

    println!("Platform:     {}", target.platform());
    println!("Install dir:  {}", target.install_dir().display());
    println!("State:        {}", state);
    println!("Updater:      {}", target.tool_path().display());
    println!("Download URL: {}", target.download_url());
    println!("Archive:      {}", target.format());
    Ok(())
}
