//! Install state machine for the updater tool.
//!
//! This module orchestrates the full installation workflow:
//! 1. Check whether the install directory already exists
//! 2. Create it and (on Linux) install required system libraries
//! 3. Download the archive
//! 4. Extract it into the install directory
//! 5. Set executable permissions on entry points (Linux)
//! 6. Verify the updater binary is present
//!
//! Any failure after step 1 removes the install directory again, so a failed
//! attempt always leaves the target `Absent`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::acquire::{Acquirer, HttpClient};
use super::deps::{self, SystemPackages};
use super::error::UpdaterResult;
use super::extract::{ArchiveExtractor, ExtractSummary};
use super::platform::{InstallTarget, InstallationState};
use super::prepare;
use crate::logging::Verbosity;

/// Progress callback for installation stages.
pub type InstallProgressCallback = Box<dyn Fn(InstallStage) + Send + Sync>;

/// Installation stages for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    /// Install directory does not exist yet.
    Absent,
    /// Creating the directory and installing system libraries.
    Preparing,
    /// Downloading the archive.
    Acquiring,
    /// Unpacking the archive.
    Extracting,
    /// Setting executable bits on entry points.
    Permissioning,
    /// Checking the updater binary exists.
    Verifying,
    /// Installation complete.
    Installed,
    /// Install directory existed; nothing was done.
    AlreadyInstalled,
    /// A step failed and the install directory was removed.
    RolledBack,
}

impl InstallStage {
    /// Get a human-readable name for the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Absent => "Absent",
            Self::Preparing => "Preparing",
            Self::Acquiring => "Acquiring",
            Self::Extracting => "Extracting",
            Self::Permissioning => "Permissioning",
            Self::Verifying => "Verifying",
            Self::Installed => "Installed",
            Self::AlreadyInstalled => "Already installed",
            Self::RolledBack => "Rolled back",
        }
    }

    /// Whether the state machine stops at this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Installed | Self::AlreadyInstalled | Self::RolledBack
        )
    }
}

/// Result of a successful [`Installer::ensure_installed`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// The tool was downloaded and installed by this attempt.
    Installed {
        /// What the extraction produced.
        extracted: ExtractSummary,
        /// System libraries installed along the way.
        libraries: Vec<String>,
    },
    /// The install directory already existed and was trusted as-is.
    AlreadyInstalled,
}

/// Removes the install directory on drop unless committed.
///
/// Armed before the directory is created, so every exit path of an attempt
/// (early return, error, panic) is covered.
#[derive(Debug)]
pub struct RollbackGuard {
    dir: PathBuf,
    committed: bool,
}

impl RollbackGuard {
    pub fn arm(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            committed: false,
        }
    }

    /// Keep the directory.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        warn!(dir = %self.dir.display(), "Cleaning up after failed install");
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!(
                dir = %self.dir.display(),
                error = %e,
                "Failed to remove partially installed directory"
            ),
        }
    }
}

/// Drives one install attempt for a target.
pub struct Installer<'a, C: HttpClient> {
    target: &'a InstallTarget,
    client: &'a C,
    packages: Option<&'a dyn SystemPackages>,
    verbosity: Verbosity,
    on_progress: Option<&'a InstallProgressCallback>,
}

impl<'a, C: HttpClient> Installer<'a, C> {
    /// Create an installer.
    ///
    /// `packages` is consulted for system libraries on Linux; `None` skips
    /// that step.
    pub fn new(
        target: &'a InstallTarget,
        client: &'a C,
        packages: Option<&'a dyn SystemPackages>,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            target,
            client,
            packages,
            verbosity,
            on_progress: None,
        }
    }

    /// Report stage transitions to a callback.
    pub fn with_progress(mut self, on_progress: Option<&'a InstallProgressCallback>) -> Self {
        self.on_progress = on_progress;
        self
    }

    /// Make sure the updater tool is installed.
    ///
    /// An existing install directory is trusted without re-verification.
    pub fn ensure_installed(&self) -> UpdaterResult<InstallStatus> {
        let dir = self.target.install_dir();
        let platform = self.target.platform();

        if self.target.state() == InstallationState::Present {
            self.report(InstallStage::AlreadyInstalled);
            self.step(format_args!("{} updater already installed at {}", platform, dir.display()));
            return Ok(InstallStatus::AlreadyInstalled);
        }

        self.report(InstallStage::Absent);
        if !self.verbosity.is_quiet() {
            info!(platform = %platform, dir = %dir.display(), "Updater not found, installing");
        }

        let guard = RollbackGuard::arm(dir);
        match self.install_into(dir) {
            Ok(status) => {
                guard.commit();
                self.report(InstallStage::Installed);
                if !self.verbosity.is_quiet() {
                    info!(dir = %dir.display(), "Updater installed successfully");
                }
                Ok(status)
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Updater installation failed");
                drop(guard);
                self.report(InstallStage::RolledBack);
                Err(e)
            }
        }
    }

    fn install_into(&self, dir: &Path) -> UpdaterResult<InstallStatus> {
        let platform = self.target.platform();

        self.report(InstallStage::Preparing);
        prepare::create_install_dir(dir)?;
        self.step(format_args!("Created install directory {}", dir.display()));

        let libraries = match self.packages {
            Some(packages) => deps::install_required_libraries(platform, packages)?,
            None => Vec::new(),
        };

        self.report(InstallStage::Acquiring);
        let payload = Acquirer::new(self.client).fetch(self.target.download_url())?;
        self.step(format_args!(
            "Downloaded {} bytes from {}",
            payload.len(),
            self.target.download_url()
        ));

        self.report(InstallStage::Extracting);
        let extracted = self.target.format().extract(&payload, dir)?;
        drop(payload);
        self.step(format_args!(
            "Extracted {} entries ({} files, {} directories, {} symlinks)",
            extracted.total(),
            extracted.files,
            extracted.directories,
            extracted.symlinks
        ));

        if platform.needs_permissioning() {
            self.report(InstallStage::Permissioning);
            let updated = prepare::set_executable_permissions(dir, platform)?;
            self.step(format_args!("Set executable permissions on {} files", updated.len()));
        }

        self.report(InstallStage::Verifying);
        let binary = prepare::verify_binary_present(dir, platform)?;
        self.step(format_args!("Verified updater binary {}", binary.display()));

        Ok(InstallStatus::Installed {
            extracted,
            libraries,
        })
    }

    fn report(&self, stage: InstallStage) {
        debug!(stage = stage.name(), "Install stage");
        if let Some(cb) = self.on_progress {
            cb(stage);
        }
    }

    fn step(&self, message: std::fmt::Arguments<'_>) {
        match self.verbosity {
            Verbosity::Verbose => info!("{}", message),
            Verbosity::Normal => debug!("{}", message),
            Verbosity::Quiet => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::acquire::tests::MockHttpClient;
    use crate::updater::deps::tests::MockPackages;
    use crate::updater::error::UpdaterError;
    use crate::updater::platform::Platform;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn linux_target(temp: &TempDir) -> InstallTarget {
        InstallTarget::for_platform(Platform::Linux)
            .with_install_dir(temp.path().join("steamcmd"))
            .with_download_url("http://example.com/steamcmd_linux.tar.gz")
    }

    #[test]
    fn test_install_stage_name() {
        assert_eq!(InstallStage::Acquiring.name(), "Acquiring");
        assert_eq!(InstallStage::AlreadyInstalled.name(), "Already installed");
        assert_eq!(InstallStage::RolledBack.name(), "Rolled back");
    }

    #[test]
    fn test_terminal_stages() {
        assert!(InstallStage::Installed.is_terminal());
        assert!(InstallStage::RolledBack.is_terminal());
        assert!(InstallStage::AlreadyInstalled.is_terminal());
        assert!(!InstallStage::Extracting.is_terminal());
    }

    #[test]
    fn test_guard_removes_uncommitted_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("partial");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/file"), b"x").unwrap();

        drop(RollbackGuard::arm(&dir));

        assert!(!dir.exists());
    }

    #[test]
    fn test_guard_keeps_committed_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("done");
        fs::create_dir(&dir).unwrap();

        RollbackGuard::arm(&dir).commit();

        assert!(dir.exists());
    }

    #[test]
    fn test_guard_tolerates_missing_directory() {
        let temp = TempDir::new().unwrap();
        drop(RollbackGuard::arm(temp.path().join("never-created")));
    }

    #[test]
    fn test_existing_directory_short_circuits() {
        let temp = TempDir::new().unwrap();
        let target = linux_target(&temp);
        fs::create_dir(target.install_dir()).unwrap();
        let client = MockHttpClient::ok(Vec::new());

        let status = Installer::new(&target, &client, None, Verbosity::Quiet)
            .ensure_installed()
            .unwrap();

        assert_eq!(status, InstallStatus::AlreadyInstalled);
        assert_eq!(client.call_count(), 0);
        assert!(target.install_dir().exists());
    }

    #[test]
    fn test_http_failure_rolls_back_and_reports() {
        let temp = TempDir::new().unwrap();
        let target = linux_target(&temp);
        let client = MockHttpClient::status(500);
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();
        let callback: InstallProgressCallback =
            Box::new(move |stage| stages_clone.lock().unwrap().push(stage));

        let err = Installer::new(&target, &client, None, Verbosity::Quiet)
            .with_progress(Some(&callback))
            .ensure_installed()
            .unwrap_err();

        assert!(matches!(err, UpdaterError::HttpStatusFailure { status: 500, .. }));
        assert!(!target.install_dir().exists());
        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                InstallStage::Absent,
                InstallStage::Preparing,
                InstallStage::Acquiring,
                InstallStage::RolledBack
            ]
        );
    }

    #[test]
    fn test_dependency_failure_aborts_before_download() {
        let temp = TempDir::new().unwrap();
        let target = linux_target(&temp);
        let client = MockHttpClient::ok(Vec::new());
        let packages = MockPackages {
            fail_on: Some("lib32gcc-s1".to_string()),
            ..Default::default()
        };

        let err = Installer::new(&target, &client, Some(&packages), Verbosity::Quiet)
            .ensure_installed()
            .unwrap_err();

        assert!(matches!(err, UpdaterError::DependencyInstallFailure { .. }));
        assert_eq!(client.call_count(), 0);
        assert!(!target.install_dir().exists());
    }

    #[test]
    fn test_corrupt_archive_rolls_back() {
        let temp = TempDir::new().unwrap();
        let target = linux_target(&temp);
        let client = MockHttpClient::ok(b"<html>not a tarball</html>".to_vec());

        let err = Installer::new(&target, &client, None, Verbosity::Normal)
            .ensure_installed()
            .unwrap_err();

        assert!(matches!(err, UpdaterError::ArchiveFormatFailure { .. }));
        assert!(!target.install_dir().exists());
    }
}
