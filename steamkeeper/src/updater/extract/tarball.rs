//! gzip tarball extraction.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use super::{apply_mode, contained_path, ensure_dest_dir, ensure_parent};
use super::{ArchiveExtractor, ExtractSummary};
use crate::updater::acquire::ArchivePayload;
use crate::updater::error::{UpdaterError, UpdaterResult};

/// Extracts `.tar.gz` archives entry by entry, in archive order.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, payload: &ArchivePayload, dest_dir: &Path) -> UpdaterResult<ExtractSummary> {
        ensure_dest_dir(dest_dir)?;

        let mut archive = Archive::new(GzDecoder::new(payload.reader()));
        let entries = archive.entries().map_err(format_failure)?;

        let mut summary = ExtractSummary::default();
        for entry in entries {
            let mut entry = entry.map_err(format_failure)?;
            let name = entry.path().map_err(format_failure)?.into_owned();
            let target = contained_path(dest_dir, &name)?;
            let entry_type = entry.header().entry_type();

            if entry_type.is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| UpdaterError::fs("create directory", &target, e))?;
                summary.directories += 1;
            } else if entry_type.is_file() {
                let mode = entry.header().mode().map_err(format_failure)?;
                ensure_parent(&target)?;
                write_file(&mut entry, &target, mode)?;
                summary.files += 1;
            } else if entry_type.is_symlink() {
                let link = entry
                    .link_name()
                    .map_err(format_failure)?
                    .ok_or_else(|| UpdaterError::ArchiveFormatFailure {
                        reason: format!("symlink {} has no target", name.display()),
                    })?
                    .into_owned();
                ensure_parent(&target)?;
                create_symlink(&link, &target)?;
                summary.symlinks += 1;
            } else {
                return Err(UpdaterError::UnknownEntryType {
                    entry: name.display().to_string(),
                    kind: entry_type_name(entry_type),
                });
            }
        }

        Ok(summary)
    }
}

fn format_failure(err: io::Error) -> UpdaterError {
    UpdaterError::ArchiveFormatFailure {
        reason: err.to_string(),
    }
}

fn write_file(reader: &mut impl io::Read, target: &Path, mode: u32) -> UpdaterResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode & 0o7777);
    }

    let mut file = options
        .open(target)
        .map_err(|e| UpdaterError::fs("create file", target, e))?;
    io::copy(reader, &mut file).map_err(|e| UpdaterError::fs("write file", target, e))?;

    // Creation mode is filtered by the umask; set the recorded bits exactly.
    apply_mode(target, mode)
}

#[cfg(unix)]
fn create_symlink(link: &Path, target: &Path) -> UpdaterResult<()> {
    std::os::unix::fs::symlink(link, target)
        .map_err(|e| UpdaterError::fs("create symlink", target, e))
}

#[cfg(windows)]
fn create_symlink(link: &Path, target: &Path) -> UpdaterResult<()> {
    std::os::windows::fs::symlink_file(link, target)
        .map_err(|e| UpdaterError::fs("create symlink", target, e))
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_link: &Path, target: &Path) -> UpdaterResult<()> {
    Err(UpdaterError::fs(
        "create symlink",
        target,
        io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported"),
    ))
}

fn entry_type_name(entry_type: EntryType) -> String {
    match entry_type {
        EntryType::Link => "hard link".to_string(),
        EntryType::Char => "character device".to_string(),
        EntryType::Block => "block device".to_string(),
        EntryType::Fifo => "fifo".to_string(),
        EntryType::XGlobalHeader => "pax global header".to_string(),
        other => format!("{:?} ({:#04x})", other, other.as_byte()),
    }
}
