//! Host platform detection and per-platform install targets.

use std::fmt;
use std::path::{Path, PathBuf};

use super::error::{UpdaterError, UpdaterResult};
use super::extract::ArchiveFormat;

/// Download location of the Linux tarball.
pub const LINUX_DOWNLOAD_URL: &str =
    "https://steamcdn-a.akamaihd.net/client/installer/steamcmd_linux.tar.gz";

/// Download location of the Windows zip.
pub const WINDOWS_DOWNLOAD_URL: &str =
    "https://steamcdn-a.akamaihd.net/client/installer/steamcmd.zip";

/// Default install directory on Linux, relative to the working directory.
pub const LINUX_INSTALL_DIR: &str = "./steamcmd";

/// Default install directory on Windows.
pub const WINDOWS_INSTALL_DIR: &str = "C:\\SteamCMD";

/// Files that need the executable bit after extracting the Linux tarball.
const LINUX_ENTRY_POINTS: &[&str] = &[
    "steamcmd.sh",
    "linux32/steamcmd",
    "linux32/steamerrorreporter",
];

/// Platforms the updater tool can be installed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Detect the host platform.
    pub fn detect() -> UpdaterResult<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> UpdaterResult<Self> {
        match os {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            other => Err(UpdaterError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Human-readable platform name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
        }
    }

    /// Extension of the updater launcher (`steamcmd<ext>`).
    pub fn tool_extension(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux => ".sh",
        }
    }

    /// Archive encoding the platform's distribution ships in.
    pub fn archive_format(&self) -> ArchiveFormat {
        match self {
            Self::Windows => ArchiveFormat::Zip,
            Self::Linux => ArchiveFormat::TarGz,
        }
    }

    /// Whether the platform relies on POSIX mode bits.
    ///
    /// Windows archives already carry the right attributes, so permissioning
    /// and system library installation only happen on Linux.
    pub fn needs_permissioning(&self) -> bool {
        matches!(self, Self::Linux)
    }

    /// Entry-point files relative to the install directory.
    pub fn entry_points(&self) -> &'static [&'static str] {
        match self {
            Self::Windows => &[],
            Self::Linux => LINUX_ENTRY_POINTS,
        }
    }

    /// The binary whose presence marks a successful extraction.
    pub fn expected_binary(&self) -> &'static str {
        match self {
            Self::Windows => "steamcmd.exe",
            Self::Linux => "linux32/steamcmd",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derived install state. Presence is defined by the directory alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    Absent,
    Present,
}

/// Where and how the updater tool is installed on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    platform: Platform,
    install_dir: PathBuf,
    download_url: String,
    format: ArchiveFormat,
}

impl InstallTarget {
    /// Create the default target for a platform.
    pub fn for_platform(platform: Platform) -> Self {
        let (install_dir, download_url) = match platform {
            Platform::Windows => (WINDOWS_INSTALL_DIR, WINDOWS_DOWNLOAD_URL),
            Platform::Linux => (LINUX_INSTALL_DIR, LINUX_DOWNLOAD_URL),
        };

        Self {
            platform,
            install_dir: PathBuf::from(install_dir),
            download_url: download_url.to_string(),
            format: platform.archive_format(),
        }
    }

    /// Create the default target for the host platform.
    pub fn detect() -> UpdaterResult<Self> {
        Platform::detect().map(Self::for_platform)
    }

    /// Override the install directory.
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    /// Override the download URL.
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Current install state as seen on disk.
    pub fn state(&self) -> InstallationState {
        if self.install_dir.exists() {
            InstallationState::Present
        } else {
            InstallationState::Absent
        }
    }

    /// Path to the launcher that runs updates.
    pub fn tool_path(&self) -> PathBuf {
        self.install_dir
            .join(format!("steamcmd{}", self.platform.tool_extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os() {
        assert_eq!(Platform::from_os("windows").unwrap(), Platform::Windows);
        assert_eq!(Platform::from_os("linux").unwrap(), Platform::Linux);
        assert!(matches!(
            Platform::from_os("macos"),
            Err(UpdaterError::UnsupportedPlatform(os)) if os == "macos"
        ));
    }

    #[test]
    fn test_windows_target() {
        let target = InstallTarget::for_platform(Platform::Windows);
        assert_eq!(target.install_dir(), Path::new("C:\\SteamCMD"));
        assert_eq!(target.download_url(), WINDOWS_DOWNLOAD_URL);
        assert_eq!(target.format(), ArchiveFormat::Zip);
        assert!(target
            .tool_path()
            .to_string_lossy()
            .ends_with("steamcmd.exe"));
    }

    #[test]
    fn test_linux_target() {
        let target = InstallTarget::for_platform(Platform::Linux);
        assert_eq!(target.install_dir(), Path::new("./steamcmd"));
        assert_eq!(target.download_url(), LINUX_DOWNLOAD_URL);
        assert_eq!(target.format(), ArchiveFormat::TarGz);
        assert_eq!(target.tool_path(), Path::new("./steamcmd/steamcmd.sh"));
    }

    #[test]
    fn test_permissioning_only_on_linux() {
        assert!(Platform::Linux.needs_permissioning());
        assert!(!Platform::Windows.needs_permissioning());
        assert!(Platform::Windows.entry_points().is_empty());
        assert_eq!(Platform::Linux.entry_points().len(), 3);
    }

    #[test]
    fn test_state_follows_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("steamcmd");
        let target = InstallTarget::for_platform(Platform::Linux).with_install_dir(&dir);
        assert_eq!(target.state(), InstallationState::Absent);

        std::fs::create_dir(&dir).unwrap();
        assert_eq!(target.state(), InstallationState::Present);
    }
}
