//! Archive extraction for the updater tool distributions.
//!
//! Linux ships a gzip-compressed tarball and Windows ships a zip. Both
//! are unpacked from memory behind the [`ArchiveExtractor`] trait:
//!
//! ```text
//! ArchiveFormat (resolved once from the platform)
//!         │
//!         ├── TarGz ── TarGzExtractor
//!         └── Zip ──── ZipExtractor
//! ```
//!
//! Every entry path is resolved with [`contained_path`] before anything is
//! written. Any entry failure aborts the whole extraction; cleaning up what
//! was already written is the installer's job.

mod tarball;
mod zipfile;

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub use tarball::TarGzExtractor;
pub use zipfile::ZipExtractor;

use super::acquire::ArchivePayload;
use super::error::{UpdaterError, UpdaterResult};

/// Trait for unpacking an in-memory archive into a directory.
pub trait ArchiveExtractor {
    /// Extract every entry of `payload` under `dest_dir`.
    ///
    /// `dest_dir` is created if it does not exist.
    fn extract(&self, payload: &ArchivePayload, dest_dir: &Path) -> UpdaterResult<ExtractSummary>;
}

/// Counts of filesystem objects created by an extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
}

impl ExtractSummary {
    pub fn total(&self) -> usize {
        self.directories + self.files + self.symlinks
    }
}

/// The archive encodings the updater tool is distributed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// gzip-compressed tarball.
    TarGz,
    /// zip archive.
    Zip,
}

impl ArchiveFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ArchiveExtractor for ArchiveFormat {
    fn extract(&self, payload: &ArchivePayload, dest_dir: &Path) -> UpdaterResult<ExtractSummary> {
        match self {
            Self::TarGz => TarGzExtractor.extract(payload, dest_dir),
            Self::Zip => ZipExtractor.extract(payload, dest_dir),
        }
    }
}

/// Resolve an archive entry name to a path that stays inside `dest_dir`.
///
/// The check is lexical: absolute names, drive prefixes, and `..` segments
/// that climb above the root are rejected. Existing symlinks between
/// `dest_dir` and the entry (planted by earlier entries) are rejected too,
/// since writing through them could land outside the root.
pub fn contained_path(dest_dir: &Path, entry: &Path) -> UpdaterResult<PathBuf> {
    let traversal = || UpdaterError::PathTraversalFailure {
        entry: entry.display().to_string(),
    };

    let mut relative = PathBuf::new();
    for component in entry.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(traversal());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }

    let mut current = dest_dir.to_path_buf();
    for part in relative.iter() {
        current.push(part);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => return Err(traversal()),
            _ => {}
        }
    }

    Ok(current)
}

/// Create the destination directory before any entry is written.
fn ensure_dest_dir(dest_dir: &Path) -> UpdaterResult<()> {
    fs::create_dir_all(dest_dir)
        .map_err(|e| UpdaterError::fs("create directory", dest_dir, e))
}

/// Create the parent directories of an entry.
fn ensure_parent(path: &Path) -> UpdaterResult<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|e| UpdaterError::fs("create parent directory", parent, e)),
        None => Ok(()),
    }
}

/// Apply stored mode bits to an extracted file or directory.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> UpdaterResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| UpdaterError::fs("set permissions on", path, e))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> UpdaterResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_contained_path_simple() {
        let dest = Path::new("/srv/steamcmd");
        let path = contained_path(dest, Path::new("linux32/steamcmd")).unwrap();
        assert_eq!(path, Path::new("/srv/steamcmd/linux32/steamcmd"));
    }

    #[test]
    fn test_contained_path_inner_parent_segments() {
        let dest = Path::new("/srv/steamcmd");
        let path = contained_path(dest, Path::new("./a/../b/file.txt")).unwrap();
        assert_eq!(path, Path::new("/srv/steamcmd/b/file.txt"));
    }

    #[test]
    fn test_contained_path_rejects_escape() {
        let dest = Path::new("/srv/steamcmd");
        for entry in ["../../evil.txt", "a/../../evil.txt", "/etc/passwd"] {
            let err = contained_path(dest, Path::new(entry)).unwrap_err();
            assert!(
                matches!(err, UpdaterError::PathTraversalFailure { .. }),
                "{} should be rejected",
                entry
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_contained_path_rejects_symlinked_parent() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let err = contained_path(temp.path(), Path::new("link/evil.txt")).unwrap_err();
        assert!(err.is_security_abort());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ArchiveFormat::TarGz.to_string(), "tar.gz");
        assert_eq!(ArchiveFormat::Zip.to_string(), "zip");
    }

    #[test]
    fn test_garbage_payload_is_format_failure() {
        let temp = TempDir::new().unwrap();
        let payload = ArchivePayload::new(b"definitely not an archive".to_vec());

        for format in [ArchiveFormat::TarGz, ArchiveFormat::Zip] {
            let dest = temp.path().join(format.name());
            let err = format.extract(&payload, &dest).unwrap_err();
            assert!(
                matches!(err, UpdaterError::ArchiveFormatFailure { .. }),
                "{}: unexpected error {}",
                format,
                err
            );
        }
    }
}
