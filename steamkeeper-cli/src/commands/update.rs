//! Update command - install the updater if needed, then run it.

use std::path::PathBuf;
use std::time::Duration;

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use steamkeeper::notify::{report_outcome, LogNotifier};
use steamkeeper::updater::{
    AptPackages, InstallProgressCallback, InstallStage, ProcessRunner, ReqwestClient,
    UpdaterPipeline,
};

use super::common::{resolve_app_id, resolve_content_dir, resolve_target};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalArgs};

/// Arguments for the update command.
pub struct UpdateArgs {
    pub install_dir: Option<PathBuf>,
    pub content_dir: Option<PathBuf>,
    pub app_id: Option<u32>,
    pub timeout: Option<u64>,
    pub skip_deps: bool,
}

/// Run the update command.
pub fn run(global: &GlobalArgs, args: UpdateArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(global)?;
    runner.log_startup("update");
    let config = runner.config();

    let target = resolve_target(config, args.install_dir)?;
    let timeout_secs = args.timeout.unwrap_or(config.updater.timeout_secs);
    if timeout_secs == 0 {
        return Err(CliError::Config(
            "timeout must be at least one second".to_string(),
        ));
    }
    let client = ReqwestClient::with_timeout(Duration::from_secs(timeout_secs))?;

    let mut pipeline = UpdaterPipeline::with_components(
        target,
        client,
        AptPackages,
        ProcessRunner,
        runner.verbosity(),
    )
    .with_app_id(resolve_app_id(config, args.app_id))
    .with_dependency_install(config.updater.install_dependencies && !args.skip_deps);

    if let Some(dir) = resolve_content_dir(config, args.content_dir) {
        pipeline = pipeline.with_content_dir(dir);
    }

    let spinner = if !runner.verbosity().is_quiet() && Term::stderr().is_term() {
        let spinner = stage_spinner();
        pipeline = pipeline.with_progress(spinner_callback(spinner.clone()));
        Some(spinner)
    } else {
        None
    };

    let outcome = pipeline.run();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    report_outcome(&LogNotifier, &outcome);
    if outcome.is_success() && !runner.verbosity().is_quiet() {
        println!("{} {}", style("✓").green().bold(), outcome.summary());
    }

    outcome.into_result().map(|_| ()).map_err(CliError::from)
}

fn stage_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Mirror install stages onto the spinner. It clears once a terminal stage
/// is reached so the updater's own output is not interleaved with it.
fn spinner_callback(spinner: ProgressBar) -> InstallProgressCallback {
    Box::new(move |stage: InstallStage| {
        if stage.is_terminal() {
            spinner.finish_and_clear();
        } else {
            spinner.set_message(format!("SteamCMD: {}", stage.name()));
        }
    })
}
