//! Prebuilt binaries already present on the local filesystem.

use super::{ContentSource, FetchError, SourceError};
use crate::entry::FileEntry;
use crate::platform::PlatformIdentifier;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Reads one binary per platform from disk.
///
/// # Examples
///
/// ```no_run
/// use binary_wheel_builder::platform::well_known;
/// use binary_wheel_builder::source::{ContentSource, LocalFileSource};
///
/// let source = LocalFileSource::new("mytool/mytool")
///     .with_file(well_known::linux_x86_64(), "target/release/mytool");
/// let files = source.generate_fileset(&well_known::linux_x86_64())?;
/// assert_eq!(files.len(), 1);
/// # Ok::<(), binary_wheel_builder::source::SourceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    binary_path: String,
    files: HashMap<PlatformIdentifier, PathBuf>,
}

impl LocalFileSource {
    /// Create a source that stores each binary at `binary_path` in the wheel.
    #[must_use]
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            files: HashMap::new(),
        }
    }

    /// Use the file at `path` as the binary for `platform`.
    #[must_use]
    pub fn with_file(mut self, platform: PlatformIdentifier, path: impl Into<PathBuf>) -> Self {
        self.files.insert(platform, path.into());
        self
    }
}

impl ContentSource for LocalFileSource {
    fn generate_fileset(
        &self,
        platform: &PlatformIdentifier,
    ) -> Result<Vec<FileEntry>, SourceError> {
        let path = self
            .files
            .get(platform)
            .ok_or_else(|| SourceError::PlatformNotSupported {
                platform: platform.clone(),
            })?;
        debug!("reading {} for {platform}", path.display());
        let content = fs::read(path).map_err(|source| FetchError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(vec![FileEntry::executable(self.binary_path.clone(), content)])
    }
}
