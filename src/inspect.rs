//! Reading built wheels back.
//!
//! Used to verify freshly built wheels: list members with their Unix modes,
//! parse `METADATA`, check every `RECORD` hash, and unpack a wheel with
//! path traversal protection.

use crate::checksum::record_hash;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Errors arising while inspecting a wheel.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// I/O error while reading or extracting.
    #[error("inspection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable zip archive.
    #[error("invalid wheel archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A member path would escape the destination directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending member path.
        path: String,
    },

    /// A required member is absent.
    #[error("wheel has no {what}")]
    Missing {
        /// Description of the missing member.
        what: String,
    },

    /// A text member is not valid UTF-8 or is malformed.
    #[error("malformed {path}: {reason}")]
    Malformed {
        /// The member that failed to parse.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A member does not match its `RECORD` line.
    #[error("RECORD mismatch for {path}: {reason}")]
    RecordMismatch {
        /// The member that failed verification.
        path: String,
        /// What did not match.
        reason: String,
    },
}

/// One member of a wheel, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelEntry {
    path: String,
    unix_mode: Option<u32>,
    content: Vec<u8>,
}

impl WheelEntry {
    /// Return the member path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return the stored Unix mode, including file type bits.
    #[must_use]
    pub fn unix_mode(&self) -> Option<u32> {
        self.unix_mode
    }

    /// Return the member bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Whether any execute bit is set.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.unix_mode.is_some_and(|mode| mode & 0o111 != 0)
    }
}

/// Read every file member of the wheel at `path`, in archive order.
///
/// # Errors
///
/// Returns [`InspectError::Io`] if the file cannot be opened and
/// [`InspectError::Zip`] if it is not a valid archive.
pub fn read_wheel(path: &Path) -> Result<Vec<WheelEntry>, InspectError> {
    read_wheel_from(fs::File::open(path)?)
}

/// Read every file member of a wheel from `reader`, in archive order.
///
/// # Errors
///
/// Returns [`InspectError::Zip`] if the data is not a valid archive.
pub fn read_wheel_from<R: Read + Seek>(reader: R) -> Result<Vec<WheelEntry>, InspectError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        if member.is_dir() {
            continue;
        }
        let mut content = Vec::new();
        member.read_to_end(&mut content)?;
        entries.push(WheelEntry {
            path: member.name().to_owned(),
            unix_mode: member.unix_mode(),
            content,
        });
    }
    Ok(entries)
}

/// Unpack the wheel at `wheel` into `dest_dir`, restoring Unix permissions.
///
/// Returns the relative paths written.
///
/// # Errors
///
/// Returns [`InspectError::PathTraversal`] if a member would land outside
/// `dest_dir`, and I/O or zip errors otherwise.
pub fn extract_wheel(wheel: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, InspectError> {
    let mut archive = ZipArchive::new(fs::File::open(wheel)?)?;
    let mut extracted = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        let relative = member
            .enclosed_name()
            .ok_or_else(|| InspectError::PathTraversal {
                path: member.name().to_owned(),
            })?;
        let dest = dest_dir.join(&relative);
        if member.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&dest)?;
        std::io::copy(&mut member, &mut file)?;
        if let Some(mode) = member.unix_mode() {
            restore_mode(&dest, mode)?;
        }
        extracted.push(relative);
    }
    Ok(extracted)
}

#[cfg(unix)]
fn restore_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
}

#[cfg(not(unix))]
fn restore_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Headers and body of a `METADATA` or `WHEEL` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMetadata {
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl ParsedMetadata {
    /// Return the first value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Return every value of `name`, in file order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Return all headers in file order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Return the body following the header block, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Parse an RFC 822 style header block with an optional body.
///
/// Continuation lines (leading space or tab) are joined to the previous
/// value with a newline.
///
/// # Errors
///
/// Returns [`InspectError::Malformed`] for non-UTF-8 input, a header line
/// without a colon, or a continuation line with no header before it.
pub fn parse_metadata(bytes: &[u8]) -> Result<ParsedMetadata, InspectError> {
    let malformed = |reason: String| InspectError::Malformed {
        path: "METADATA".to_owned(),
        reason,
    };
    let text = std::str::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;

    let mut parsed = ParsedMetadata::default();
    let mut rest = text;
    while !rest.is_empty() {
        let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
        rest = tail;
        if line.is_empty() {
            if !rest.is_empty() {
                parsed.body = Some(rest.to_owned());
            }
            break;
        }
        if line.starts_with([' ', '\t']) {
            let (_, value) = parsed
                .headers
                .last_mut()
                .ok_or_else(|| malformed("continuation before first header".to_owned()))?;
            value.push('\n');
            value.push_str(line.trim_start());
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| malformed(format!("header line without colon: {line}")))?;
        parsed
            .headers
            .push((name.to_owned(), value.trim_start().to_owned()));
    }
    Ok(parsed)
}

/// Find the `METADATA` member of a read wheel and parse it.
///
/// # Errors
///
/// Returns [`InspectError::Missing`] if there is no dist-info `METADATA`,
/// or [`InspectError::Malformed`] if it does not parse.
pub fn wheel_metadata(entries: &[WheelEntry]) -> Result<ParsedMetadata, InspectError> {
    let metadata = find_dist_info_member(entries, "METADATA")?;
    parse_metadata(metadata.content())
}

fn find_dist_info_member<'a>(
    entries: &'a [WheelEntry],
    file: &str,
) -> Result<&'a WheelEntry, InspectError> {
    entries
        .iter()
        .find(|entry| {
            entry
                .path()
                .rsplit_once('/')
                .is_some_and(|(dir, name)| dir.ends_with(".dist-info") && name == file)
        })
        .ok_or_else(|| InspectError::Missing {
            what: format!("dist-info {file}"),
        })
}

/// Check every member against the wheel's `RECORD`.
///
/// Every member other than `RECORD` itself must be listed with a matching
/// `sha256=` hash and size, and every listed path must exist.
///
/// # Errors
///
/// Returns [`InspectError::Missing`] when there is no `RECORD`,
/// [`InspectError::Malformed`] for unparseable lines, and
/// [`InspectError::RecordMismatch`] for the first member that fails.
pub fn verify_record(entries: &[WheelEntry]) -> Result<(), InspectError> {
    let record = find_dist_info_member(entries, "RECORD")?;
    let text = std::str::from_utf8(record.content()).map_err(|e| InspectError::Malformed {
        path: record.path().to_owned(),
        reason: e.to_string(),
    })?;

    let mut listed = Vec::new();
    for line in text.lines().filter(|line| !line.is_empty()) {
        let fields = parse_csv_line(line);
        let [path, hash, size] = fields.as_slice() else {
            return Err(InspectError::Malformed {
                path: record.path().to_owned(),
                reason: format!("expected 3 fields: {line}"),
            });
        };
        listed.push(path.clone());
        if path == record.path() {
            continue;
        }
        check_listed_member(entries, path, hash, size)?;
    }

    if let Some(unlisted) = entries
        .iter()
        .find(|entry| !listed.iter().any(|path| path == entry.path()))
    {
        return Err(InspectError::RecordMismatch {
            path: unlisted.path().to_owned(),
            reason: "not listed in RECORD".to_owned(),
        });
    }
    Ok(())
}

fn check_listed_member(
    entries: &[WheelEntry],
    path: &str,
    hash: &str,
    size: &str,
) -> Result<(), InspectError> {
    let mismatch = |reason: String| InspectError::RecordMismatch {
        path: path.to_owned(),
        reason,
    };
    let entry = entries
        .iter()
        .find(|entry| entry.path() == path)
        .ok_or_else(|| mismatch("listed but not present".to_owned()))?;

    let actual_hash = record_hash(entry.content());
    if actual_hash != hash {
        return Err(mismatch(format!("hash {hash} != {actual_hash}")));
    }
    let actual_size = entry.content().len().to_string();
    if actual_size != size {
        return Err(mismatch(format!("size {size} != {actual_size}")));
    }
    Ok(())
}

/// Split one CSV line, honouring double-quoted fields.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            (other, _) => field.push(other),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
