//! zip extraction.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use super::{apply_mode, contained_path, ensure_dest_dir, ensure_parent};
use super::{ArchiveExtractor, ExtractSummary};
use crate::updater::acquire::ArchivePayload;
use crate::updater::error::{UpdaterError, UpdaterResult};

/// Transfer buffer size for copying entry contents (32KB).
const COPY_BUFFER_SIZE: usize = 32 * 1024;

/// Mode used for directories that carry no Unix mode in the archive.
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Mode used for files that carry no Unix mode in the archive.
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Extracts `.zip` archives through the central directory index.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, payload: &ArchivePayload, dest_dir: &Path) -> UpdaterResult<ExtractSummary> {
        let mut archive = ZipArchive::new(payload.reader()).map_err(format_failure)?;
        tracing::trace!(entries = archive.len(), bytes = payload.len(), "Opened zip index");

        ensure_dest_dir(dest_dir)?;

        let mut summary = ExtractSummary::default();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(format_failure)?;
            let target = contained_path(dest_dir, Path::new(entry.name()))?;
            let stored_mode = entry.unix_mode();

            if entry.is_dir() {
                let mode = stored_mode.unwrap_or(DEFAULT_DIR_MODE);
                create_dir(&target, mode)?;
                apply_mode(&target, mode)?;
                summary.directories += 1;
                continue;
            }

            ensure_parent(&target)?;
            let mode = stored_mode.unwrap_or(DEFAULT_FILE_MODE);
            let mut file = create_file(&target, mode)?;
            copy_contents(&mut entry, &mut file, &target)?;
            drop(file);
            apply_mode(&target, mode)?;
            summary.files += 1;
        }

        Ok(summary)
    }
}

fn format_failure(err: ZipError) -> UpdaterError {
    UpdaterError::ArchiveFormatFailure {
        reason: err.to_string(),
    }
}

fn create_dir(path: &Path, mode: u32) -> UpdaterResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder
        .create(path)
        .map_err(|e| UpdaterError::fs("create directory", path, e))
}

fn create_file(path: &Path, mode: u32) -> UpdaterResult<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options
        .open(path)
        .map_err(|e| UpdaterError::fs("create file", path, e))
}

fn copy_contents(reader: &mut impl Read, writer: &mut File, path: &Path) -> UpdaterResult<u64> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            UpdaterError::ArchiveFormatFailure {
                reason: format!("failed to read {}: {}", path.display(), e),
            }
        })?;

        if bytes_read == 0 {
            break;
        }

        writer
            .write_all(&buffer[..bytes_read])
            .map_err(|e| UpdaterError::fs("write file", path, e))?;
        copied += bytes_read as u64;
    }

    Ok(copied)
}
