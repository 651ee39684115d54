//! Post-extraction filesystem preparation.
//!
//! Only the Linux branch needs these steps; Windows archives already carry
//! the attributes the tool needs.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{UpdaterError, UpdaterResult};
use super::platform::Platform;

/// Mode applied to entry-point files.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Create the install directory and any missing parents.
pub fn create_install_dir(dir: &Path) -> UpdaterResult<()> {
    fs::create_dir_all(dir).map_err(|e| UpdaterError::fs("create directory", dir, e))
}

/// Set mode 0755 on every entry-point file of the platform.
///
/// Stops at the first failure and reports the offending path. Returns the
/// paths that were updated.
pub fn set_executable_permissions(dir: &Path, platform: Platform) -> UpdaterResult<Vec<PathBuf>> {
    let mut updated = Vec::with_capacity(platform.entry_points().len());

    for relative in platform.entry_points() {
        let path = dir.join(relative);
        make_executable(&path)?;
        tracing::debug!(path = %path.display(), "Set executable permissions");
        updated.push(path);
    }

    Ok(updated)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> UpdaterResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
        .map_err(|e| UpdaterError::fs("set executable permissions on", path, e))
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> UpdaterResult<()> {
    // No mode bits to set; the file still has to exist.
    fs::metadata(path)
        .map(|_| ())
        .map_err(|e| UpdaterError::fs("set executable permissions on", path, e))
}

/// Check that the platform's expected updater binary exists.
pub fn verify_binary_present(dir: &Path, platform: Platform) -> UpdaterResult<PathBuf> {
    let binary = dir.join(platform.expected_binary());

    match fs::metadata(&binary) {
        Ok(meta) if meta.is_file() => Ok(binary),
        Ok(_) => Err(UpdaterError::BinaryNotFound(binary)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(UpdaterError::BinaryNotFound(binary))
        }
        Err(e) => Err(UpdaterError::fs("stat", binary, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate_linux_tree(dir: &Path) {
        fs::create_dir_all(dir.join("linux32")).unwrap();
        for relative in Platform::Linux.entry_points() {
            fs::write(dir.join(relative), b"bin").unwrap();
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_sets_mode_on_all_entry_points() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        populate_linux_tree(temp.path());

        let updated = set_executable_permissions(temp.path(), Platform::Linux).unwrap();

        assert_eq!(updated.len(), 3);
        for path in updated {
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755, "{}", path.display());
        }
    }

    #[test]
    fn test_missing_entry_point_reports_path() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("steamcmd.sh"), b"bin").unwrap();

        let err = set_executable_permissions(temp.path(), Platform::Linux).unwrap_err();
        match err {
            UpdaterError::FilesystemFailure { path, .. } => {
                assert_eq!(path, temp.path().join("linux32/steamcmd"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_windows_has_nothing_to_permission() {
        let temp = TempDir::new().unwrap();
        let updated = set_executable_permissions(temp.path(), Platform::Windows).unwrap();
        assert!(updated.is_empty());
    }

    #[test]
    fn test_verify_binary_present() {
        let temp = TempDir::new().unwrap();
        populate_linux_tree(temp.path());

        let binary = verify_binary_present(temp.path(), Platform::Linux).unwrap();
        assert_eq!(binary, temp.path().join("linux32/steamcmd"));
    }

    #[test]
    fn test_verify_binary_missing() {
        let temp = TempDir::new().unwrap();
        let err = verify_binary_present(temp.path(), Platform::Windows).unwrap_err();
        assert!(matches!(
            err,
            UpdaterError::BinaryNotFound(path) if path.ends_with("steamcmd.exe")
        ));
    }

    #[test]
    fn test_directory_in_place_of_binary_is_not_found() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("linux32/steamcmd")).unwrap();

        let err = verify_binary_present(temp.path(), Platform::Linux).unwrap_err();
        assert!(matches!(err, UpdaterError::BinaryNotFound(_)));
    }
}
