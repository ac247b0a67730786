//! Deterministic zip archive writing.
//!
//! Every member is written with the same fixed attributes regardless of
//! host, clock, or filesystem state: the 1980-01-01 zip epoch as timestamp,
//! deflate at a fixed level, Unix as the creating system, and
//! `(permissions | S_IFREG) << 16` as external attributes. Given the same
//! entries in the same order, the output is byte-identical.
//!
//! Entries are written exactly in the order supplied. Callers wanting a
//! stable member order sort before calling.

use crate::entry::FileEntry;
use crate::error::ArchiveError;
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Deflate level applied to every member.
const COMPRESSION_LEVEL: i64 = 6;

/// Mode of the published archive file itself.
#[cfg(unix)]
const ARCHIVE_FILE_MODE: u32 = 0o644;

/// Member options shared by every entry, varying only in permissions.
fn member_options(permissions: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
        .last_modified_time(DateTime::default())
        .unix_permissions(permissions)
}

/// Explain why `path` cannot name an archive member, if it cannot.
fn path_defect(path: &str) -> Option<&'static str> {
    if path.starts_with('/') {
        Some("absolute path")
    } else if path.contains('\\') {
        Some("backslash separator")
    } else if path.split('/').any(|segment| segment == "..") {
        Some("parent directory segment")
    } else if path.split('/').any(str::is_empty) {
        Some("empty segment")
    } else {
        None
    }
}

/// Reject entry lists with malformed paths or any path appearing twice.
fn validate_paths(entries: &[FileEntry]) -> Result<(), ArchiveError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if let Some(reason) = path_defect(entry.path()) {
            return Err(ArchiveError::InvalidPath {
                path: entry.path().to_owned(),
                reason,
            });
        }
        if !seen.insert(entry.path()) {
            return Err(ArchiveError::DuplicatePath {
                path: entry.path().to_owned(),
            });
        }
    }
    Ok(())
}

/// Write `entries` as a zip archive into `writer` and return the writer.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidPath`] before writing anything if a path
/// is absolute, uses `\`, or has a `..` or empty segment, and
/// [`ArchiveError::DuplicatePath`] if two entries share a path, or
/// [`ArchiveError::Zip`] / [`ArchiveError::Io`] if encoding fails.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::archive::write_archive_to;
/// use binary_wheel_builder::entry::FileEntry;
/// use std::io::Cursor;
///
/// let entries = [FileEntry::executable("tool/tool", "#!/bin/sh\n")];
/// let first = write_archive_to(Cursor::new(Vec::new()), &entries)?.into_inner();
/// let second = write_archive_to(Cursor::new(Vec::new()), &entries)?.into_inner();
/// assert_eq!(first, second);
/// # Ok::<(), binary_wheel_builder::error::ArchiveError>(())
/// ```
pub fn write_archive_to<W: Write + Seek>(
    writer: W,
    entries: &[FileEntry],
) -> Result<W, ArchiveError> {
    validate_paths(entries)?;
    let mut zip = ZipWriter::new(writer);
    for entry in entries {
        zip.start_file(entry.path(), member_options(entry.permissions()))?;
        zip.write_all(entry.content())?;
    }
    Ok(zip.finish()?)
}

/// Write `entries` as a zip archive at `path`.
///
/// The archive is assembled in a temporary file beside `path` and renamed
/// into place once complete, so `path` either holds a finished archive or
/// does not exist. The parent directory is created when missing.
///
/// # Errors
///
/// Returns [`ArchiveError::DuplicatePath`] without touching the filesystem
/// if two entries share a path, and [`ArchiveError::Io`] or
/// [`ArchiveError::Zip`] when the directory or file cannot be written.
pub fn write_archive(path: &Path, entries: &[FileEntry]) -> Result<(), ArchiveError> {
    validate_paths(entries)?;

    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut staging = tempfile::Builder::new()
        .prefix(".")
        .suffix(".part")
        .tempfile_in(parent)?;
    write_archive_to(staging.as_file_mut(), entries)?;
    staging.as_file().sync_all()?;
    set_archive_mode(staging.as_file())?;

    // Dropping `staging` on any earlier error removes the partial file.
    staging.persist(path).map_err(|e| ArchiveError::Io(e.error))?;
    debug!("wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Temporary files are created owner-only; published archives are not.
#[cfg(unix)]
fn set_archive_mode(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(ARCHIVE_FILE_MODE))
}

#[cfg(not(unix))]
fn set_archive_mode(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
