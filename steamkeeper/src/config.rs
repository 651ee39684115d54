//! INI configuration file.
//!
//! ```ini
//! [updater]
//! install_dir = ./steamcmd
//! download_url = https://steamcdn-a.akamaihd.net/client/installer/steamcmd_linux.tar.gz
//! content_dir = /srv/stationeers
//! app_id = 600760
//! timeout_secs = 30
//! install_dependencies = true
//!
//! [logging]
//! verbosity = normal
//! log_dir = /var/log/steamkeeper
//!
//! [build]
//! version = 4.1.0
//! branch = Release
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, ParseOption, Properties};
use thiserror::Error;

use crate::logging::Verbosity;
use crate::updater::acquire::DEFAULT_TIMEOUT_SECS;
use crate::updater::invoke::DEFAULT_APP_ID;
use crate::updater::platform::{InstallTarget, Platform};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// `[updater]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterSettings {
    /// Overrides the platform's install directory.
    pub install_dir: Option<PathBuf>,
    /// Overrides the platform's download URL.
    pub download_url: Option<String>,
    /// Where game content is installed. Defaults to the working directory.
    pub content_dir: Option<PathBuf>,
    pub app_id: u32,
    pub timeout_secs: u64,
    pub install_dependencies: bool,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            install_dir: None,
            download_url: None,
            content_dir: None,
            app_id: DEFAULT_APP_ID,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            install_dependencies: true,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Explicit verbosity; derived from the build branch when unset.
    pub verbosity: Option<Verbosity>,
    pub log_dir: Option<PathBuf>,
}

/// `[build]` section: version and branch of the companion build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub branch: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            branch: "Release".to_string(),
        }
    }
}

/// The parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub updater: UpdaterSettings,
    pub logging: LoggingSettings,
    pub build: BuildInfo,
}

impl ConfigFile {
    /// Default location: `<config dir>/steamkeeper/config.ini`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("steamkeeper").join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file_opt(path, parse_options()).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse configuration text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str_opt(contents, parse_options())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("updater")) {
            let updater = &mut config.updater;
            updater.install_dir = get_string(section, "install_dir").map(PathBuf::from);
            updater.download_url = get_string(section, "download_url");
            updater.content_dir = get_string(section, "content_dir").map(PathBuf::from);
            if let Some(app_id) = get_parsed::<u32>(section, "updater", "app_id")? {
                updater.app_id = app_id;
            }
            if let Some(timeout) = get_parsed::<u64>(section, "updater", "timeout_secs")? {
                if timeout == 0 {
                    return Err(ConfigError::InvalidValue {
                        section: "updater",
                        key: "timeout_secs",
                        value: "0".to_string(),
                        reason: "timeout must be at least one second".to_string(),
                    });
                }
                updater.timeout_secs = timeout;
            }
            if let Some(enabled) = get_bool(section, "updater", "install_dependencies")? {
                updater.install_dependencies = enabled;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(raw) = get_string(section, "verbosity") {
                let verbosity = raw.parse().map_err(|e: crate::logging::LoggingError| {
                    ConfigError::InvalidValue {
                        section: "logging",
                        key: "verbosity",
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?;
                config.logging.verbosity = Some(verbosity);
            }
            config.logging.log_dir = get_string(section, "log_dir").map(PathBuf::from);
        }

        if let Some(section) = ini.section(Some("build")) {
            if let Some(version) = get_string(section, "version") {
                config.build.version = version;
            }
            if let Some(branch) = get_string(section, "branch") {
                config.build.branch = branch;
            }
        }

        Ok(config)
    }

    /// Effective verbosity: explicit setting, else derived from the branch.
    pub fn verbosity(&self) -> Verbosity {
        self.logging
            .verbosity
            .unwrap_or_else(|| Verbosity::for_branch(&self.build.branch))
    }

    /// Install target for a platform with configured overrides applied.
    pub fn install_target(&self, platform: Platform) -> InstallTarget {
        let mut target = InstallTarget::for_platform(platform);
        if let Some(dir) = &self.updater.install_dir {
            target = target.with_install_dir(dir);
        }
        if let Some(url) = &self.updater.download_url {
            target = target.with_download_url(url);
        }
        target
    }
}

/// Backslash escapes stay off so Windows paths read verbatim.
fn parse_options() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..Default::default()
    }
}

fn get_string(section: &Properties, key: &str) -> Option<String> {
    section
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn get_parsed<T>(
    section: &Properties,
    section_name: &'static str,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_string(section, key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                section: section_name,
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn get_bool(
    section: &Properties,
    section_name: &'static str,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    match get_string(section, key).map(|v| v.to_lowercase()) {
        Some(v) => match v.as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                section: section_name,
                key,
                value: v,
                reason: "expected true or false".to_string(),
            }),
        },
        None => Ok(None),
    }
}
