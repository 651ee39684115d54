//! System library installation for the 32-bit Linux updater binary.

use std::process::{Command, Stdio};

use super::error::{UpdaterError, UpdaterResult};
use super::platform::Platform;

/// Libraries the Linux updater binary links against.
pub const REQUIRED_LIBRARIES: &[&str] = &[
    "lib32gcc-s1",
    "lib32stdc++6",
    "libcurl4-gnutls-dev:i386",
];

/// Trait for querying and installing OS packages.
pub trait SystemPackages: Send + Sync {
    /// Whether the package is already installed.
    fn is_installed(&self, package: &str) -> bool;

    /// Install the package, streaming the package manager's output.
    fn install(&self, package: &str) -> UpdaterResult<()>;
}

/// Debian/Ubuntu package manager access through `dpkg` and `apt-get`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AptPackages;

impl SystemPackages for AptPackages {
    fn is_installed(&self, package: &str) -> bool {
        Command::new("dpkg")
            .args(["-s", package])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn install(&self, package: &str) -> UpdaterResult<()> {
        let status = Command::new("sudo")
            .args(["apt-get", "install", "-y", package])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| UpdaterError::DependencyInstallFailure {
                package: package.to_string(),
                reason: format!("failed to run apt-get: {}", e),
            })?;

        if !status.success() {
            return Err(UpdaterError::DependencyInstallFailure {
                package: package.to_string(),
                reason: match status.code() {
                    Some(code) => format!("apt-get exited with status {}", code),
                    None => "apt-get was terminated by a signal".to_string(),
                },
            });
        }

        Ok(())
    }
}

/// Install any missing required libraries.
///
/// No-op off Linux. Returns the packages that had to be installed; the first
/// failed installation aborts.
pub fn install_required_libraries(
    platform: Platform,
    packages: &dyn SystemPackages,
) -> UpdaterResult<Vec<String>> {
    if platform != Platform::Linux {
        return Ok(Vec::new());
    }

    let mut installed = Vec::new();
    for package in REQUIRED_LIBRARIES {
        if packages.is_installed(package) {
            tracing::debug!(package, "Library already installed");
            continue;
        }

        tracing::info!(package, "Installing library");
        packages.install(package)?;
        installed.push(package.to_string());
    }

    Ok(installed)
}
