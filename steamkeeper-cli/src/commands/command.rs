//! Command command - print the update invocation without running it.

use std::path::PathBuf;

use steamkeeper::updater::UpdateCommand;

use super::common::{resolve_app_id, resolve_content_dir, resolve_target};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalArgs};

/// Arguments for the command command.
pub struct CommandArgs {
    pub install_dir: Option<PathBuf>,
    pub content_dir: Option<PathBuf>,
    pub app_id: Option<u32>,
}

/// Run the command command.
pub fn run(global: &GlobalArgs, args: CommandArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(global)?;
    let config = runner.config();
    let target = resolve_target(config, args.install_dir)?;

    let content_dir = match resolve_content_dir(config, args.content_dir) {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| CliError::Config(format!("cannot resolve working directory: {}", e)))?,
    };

    let command = UpdateCommand::new(&target, &content_dir, resolve_app_id(config, args.app_id));
    println!("{}", command);
    Ok(())
}
