//! Steamkeeper CLI - Command-line interface
//!
//! Keeps the SteamCMD updater installed and runs dedicated server updates.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{command, status, update};
use error::CliError;
use runner::GlobalArgs;

#[derive(Parser)]
#[command(name = "steamkeeper")]
#[command(version, about = "Install SteamCMD and update the dedicated server", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/steamkeeper/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every pipeline step
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also write a daily rolling log file to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install SteamCMD if missing, then update the server content
    Update {
        /// SteamCMD install directory
        #[arg(long)]
        install_dir: Option<PathBuf>,

        /// Server content directory passed to +force_install_dir
        #[arg(long)]
        content_dir: Option<PathBuf>,

        /// Steam app id to update
        #[arg(long)]
        app_id: Option<u32>,

        /// Download timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip installing Linux system libraries
        #[arg(long)]
        skip_deps: bool,
    },

    /// Show where SteamCMD is expected and whether it is installed
    Status {
        /// SteamCMD install directory
        #[arg(long)]
        install_dir: Option<PathBuf>,
    },

    /// Print the update command line without running it
    Command {
        /// SteamCMD install directory
        #[arg(long)]
        install_dir: Option<PathBuf>,

        /// Server content directory passed to +force_install_dir
        #[arg(long)]
        content_dir: Option<PathBuf>,

        /// Steam app id to update
        #[arg(long)]
        app_id: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        config: cli.config,
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_dir: cli.log_dir,
    };

    let result: Result<(), CliError> = match cli.command {
        Commands::Update {
            install_dir,
            content_dir,
            app_id,
            timeout,
            skip_deps,
        } => update::run(
            &global,
            update::UpdateArgs {
                install_dir,
                content_dir,
                app_id,
                timeout,
                skip_deps,
            },
        ),
        Commands::Status { install_dir } => status::run(&global, install_dir),
        Commands::Command {
            install_dir,
            content_dir,
            app_id,
        } => command::run(
            &global,
            command::CommandArgs {
                install_dir,
                content_dir,
                app_id,
            },
        ),
    };

    if let Err(e) = result {
        e.exit();
    }
}
