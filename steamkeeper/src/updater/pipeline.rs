//! The install-and-update pipeline facade.
//!
//! Wires the install target, HTTP client, package manager and process runner
//! together, runs the installer, then hands over to the invoker.

use std::path::PathBuf;

use tracing::{error, info};

use super::acquire::{HttpClient, ReqwestClient};
use super::deps::{AptPackages, SystemPackages};
use super::error::{UpdaterError, UpdaterResult};
use super::installer::{InstallProgressCallback, InstallStatus, Installer};
use super::invoke::{ProcessRunner, ToolRunner, UpdateCommand, DEFAULT_APP_ID};
use super::platform::{InstallTarget, Platform};
use crate::logging::Verbosity;

/// Terminal outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Platform the run targeted.
    pub platform: Platform,
    /// Install step result.
    pub install: UpdaterResult<InstallStatus>,
    /// Invocation result; `None` when installation failed and the updater
    /// was never started.
    pub invocation: Option<UpdaterResult<()>>,
}

impl PipelineOutcome {
    /// Whether the updater was installed and ran successfully.
    pub fn is_success(&self) -> bool {
        self.install.is_ok() && matches!(self.invocation, Some(Ok(())))
    }

    /// The failure that ended the run, if any.
    pub fn error(&self) -> Option<&UpdaterError> {
        match (&self.install, &self.invocation) {
            (Err(e), _) => Some(e),
            (Ok(_), Some(Err(e))) => Some(e),
            _ => None,
        }
    }

    /// Collapse into the first failure, or the install status on success.
    pub fn into_result(self) -> UpdaterResult<InstallStatus> {
        let status = self.install?;
        match self.invocation {
            Some(Err(e)) => Err(e),
            _ => Ok(status),
        }
    }

    /// One-line plain-text status for operator notification channels.
    pub fn summary(&self) -> String {
        let install = match &self.install {
            Ok(InstallStatus::Installed { .. }) => "installed".to_string(),
            Ok(InstallStatus::AlreadyInstalled) => "already installed".to_string(),
            Err(e) => return format!("SteamCMD install failed on {}: {}", self.platform, e),
        };

        match &self.invocation {
            Some(Ok(())) => format!(
                "SteamCMD {} on {}; server update completed",
                install, self.platform
            ),
            Some(Err(e)) => format!(
                "SteamCMD {} on {}; server update failed: {}",
                install, self.platform, e
            ),
            None => format!("SteamCMD {} on {}; update not run", install, self.platform),
        }
    }
}

/// Ensures the updater tool is installed, then runs the server update.
pub struct UpdaterPipeline<C = ReqwestClient, P = AptPackages, R = ProcessRunner> {
    target: InstallTarget,
    client: C,
    packages: P,
    runner: R,
    verbosity: Verbosity,
    app_id: u32,
    content_dir: Option<PathBuf>,
    install_dependencies: bool,
    on_progress: Option<InstallProgressCallback>,
}

impl UpdaterPipeline {
    /// Create a pipeline with the real HTTP client, apt and process runner.
    pub fn new(target: InstallTarget, verbosity: Verbosity) -> UpdaterResult<Self> {
        Ok(Self::with_components(
            target,
            ReqwestClient::new()?,
            AptPackages,
            ProcessRunner,
            verbosity,
        ))
    }
}

impl<C: HttpClient, P: SystemPackages, R: ToolRunner> UpdaterPipeline<C, P, R> {
    /// Create a pipeline from explicit components.
    pub fn with_components(
        target: InstallTarget,
        client: C,
        packages: P,
        runner: R,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            target,
            client,
            packages,
            runner,
            verbosity,
            app_id: DEFAULT_APP_ID,
            content_dir: None,
            install_dependencies: true,
            on_progress: None,
        }
    }

    /// Replace the HTTP client (e.g. to change the download deadline).
    pub fn with_client<C2: HttpClient>(self, client: C2) -> UpdaterPipeline<C2, P, R> {
        UpdaterPipeline {
            target: self.target,
            client,
            packages: self.packages,
            runner: self.runner,
            verbosity: self.verbosity,
            app_id: self.app_id,
            content_dir: self.content_dir,
            install_dependencies: self.install_dependencies,
            on_progress: self.on_progress,
        }
    }

    /// Set the Steam app id to update.
    pub fn with_app_id(mut self, app_id: u32) -> Self {
        self.app_id = app_id;
        self
    }

    /// Set the game content directory. Defaults to the working directory.
    pub fn with_content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = Some(dir.into());
        self
    }

    /// Enable or disable the Linux system library step.
    pub fn with_dependency_install(mut self, enabled: bool) -> Self {
        self.install_dependencies = enabled;
        self
    }

    /// Report install stages to a callback.
    pub fn with_progress(mut self, on_progress: InstallProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn target(&self) -> &InstallTarget {
        &self.target
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn packages(&self) -> &P {
        &self.packages
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run only the install state machine.
    pub fn ensure_installed(&self) -> UpdaterResult<InstallStatus> {
        let packages: Option<&dyn SystemPackages> = if self.install_dependencies {
            Some(&self.packages)
        } else {
            None
        };

        Installer::new(&self.target, &self.client, packages, self.verbosity)
            .with_progress(self.on_progress.as_ref())
            .ensure_installed()
    }

    /// Build the update command for the configured content directory.
    pub fn update_command(&self) -> UpdaterResult<UpdateCommand> {
        let content_dir = match &self.content_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| UpdaterError::fs("resolve working directory", ".", e))?,
        };

        Ok(UpdateCommand::new(&self.target, &content_dir, self.app_id))
    }

    /// Install if needed, then run the updater.
    ///
    /// A failed invocation is terminal; it does not trigger reinstallation.
    pub fn run(&self) -> PipelineOutcome {
        let platform = self.target.platform();
        let install = self.ensure_installed();

        let invocation = match &install {
            Ok(_) => Some(self.invoke()),
            Err(_) => None,
        };

        PipelineOutcome {
            platform,
            install,
            invocation,
        }
    }

    fn invoke(&self) -> UpdaterResult<()> {
        let command = self.update_command()?;
        if !self.verbosity.is_quiet() {
            info!(command = %command, "Running updater");
        }

        match self.runner.run(&command) {
            Ok(()) => {
                if !self.verbosity.is_quiet() {
                    info!("Updater finished successfully");
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Updater run failed");
                Err(e)
            }
        }
    }
}
