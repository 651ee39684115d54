//! Error types for the updater pipeline.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for updater operations.
pub type UpdaterResult<T> = Result<T, UpdaterError>;

/// Errors that can occur while installing or running the updater tool.
#[derive(Debug)]
pub enum UpdaterError {
    /// The host operating system has no install target.
    UnsupportedPlatform(String),

    /// Download URL is not a well-formed absolute URL.
    InvalidUrl { url: String, reason: String },

    /// The download did not complete before the deadline.
    Timeout { url: String, timeout: Duration },

    /// Connection-level failure while issuing the request.
    NetworkFailure { url: String, reason: String },

    /// Server answered with something other than 200 OK.
    HttpStatusFailure { url: String, status: u16 },

    /// Failed to read the response body.
    ReadFailure { url: String, reason: String },

    /// Archive could not be decoded.
    ArchiveFormatFailure { reason: String },

    /// Archive entry would land outside the destination directory.
    PathTraversalFailure { entry: String },

    /// Tar entry of a type the extractor does not handle.
    UnknownEntryType { entry: String, kind: String },

    /// Filesystem operation (create, write, chmod, stat, remove) failed.
    FilesystemFailure {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// Expected updater binary is missing after extraction.
    BinaryNotFound(PathBuf),

    /// A required system library could not be installed.
    DependencyInstallFailure { package: String, reason: String },

    /// The updater process could not be started.
    ProcessSpawnFailure { program: PathBuf, source: io::Error },

    /// The updater process exited unsuccessfully.
    ProcessExitFailure { program: PathBuf, code: Option<i32> },
}

impl UpdaterError {
    /// Shorthand for a [`UpdaterError::FilesystemFailure`].
    pub(crate) fn fs(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FilesystemFailure {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether this failure must remove the install directory.
    ///
    /// Process failures happen after a completed install, so the install
    /// directory is kept.
    pub fn triggers_rollback(&self) -> bool {
        !matches!(
            self,
            Self::ProcessSpawnFailure { .. } | Self::ProcessExitFailure { .. }
        )
    }

    /// Whether this failure is a security-relevant abort.
    pub fn is_security_abort(&self) -> bool {
        matches!(self, Self::PathTraversalFailure { .. })
    }
}

impl std::fmt::Display for UpdaterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedPlatform(os) => {
                write!(f, "updater installation is not supported on {}", os)
            }
            Self::InvalidUrl { url, reason } => {
                write!(f, "invalid download URL {}: {}", url, reason)
            }
            Self::Timeout { url, timeout } => {
                write!(f, "download of {} timed out after {:?}", url, timeout)
            }
            Self::NetworkFailure { url, reason } => {
                write!(f, "failed to download {}: {}", url, reason)
            }
            Self::HttpStatusFailure { url, status } => {
                write!(f, "failed to download {}: HTTP status {}", url, status)
            }
            Self::ReadFailure { url, reason } => {
                write!(f, "failed to read response body from {}: {}", url, reason)
            }
            Self::ArchiveFormatFailure { reason } => {
                write!(f, "failed to decode archive: {}", reason)
            }
            Self::PathTraversalFailure { entry } => {
                write!(f, "archive entry escapes destination directory: {}", entry)
            }
            Self::UnknownEntryType { entry, kind } => {
                write!(f, "unknown entry type {} in {}", kind, entry)
            }
            Self::FilesystemFailure {
                operation,
                path,
                source,
            } => {
                write!(f, "failed to {} {}: {}", operation, path.display(), source)
            }
            Self::BinaryNotFound(path) => {
                write!(f, "updater binary not found: {}", path.display())
            }
            Self::DependencyInstallFailure { package, reason } => {
                write!(f, "failed to install library {}: {}", package, reason)
            }
            Self::ProcessSpawnFailure { program, source } => {
                write!(f, "failed to start {}: {}", program.display(), source)
            }
            Self::ProcessExitFailure { program, code } => match code {
                Some(code) => write!(f, "{} exited with status {}", program.display(), code),
                None => write!(f, "{} was terminated by a signal", program.display()),
            },
        }
    }
}

impl std::error::Error for UpdaterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FilesystemFailure { source, .. } => Some(source),
            Self::ProcessSpawnFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}
