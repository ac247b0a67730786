//! In-memory payloads for synthetic wheels and tests.

use super::{ContentSource, SourceError};
use crate::entry::FileEntry;
use crate::platform::PlatformIdentifier;
use std::collections::HashMap;

/// Serves fixed entries per platform.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::entry::FileEntry;
/// use binary_wheel_builder::platform::PlatformIdentifier;
/// use binary_wheel_builder::source::{ContentSource, InMemorySource};
///
/// let linux = PlatformIdentifier::new("linux_x86_64");
/// let source = InMemorySource::new()
///     .with_files(linux.clone(), vec![FileEntry::executable("buf/buf", "#!")]);
/// assert_eq!(source.generate_fileset(&linux)?.len(), 1);
/// # Ok::<(), binary_wheel_builder::source::SourceError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    files: HashMap<PlatformIdentifier, Vec<FileEntry>>,
}

impl InMemorySource {
    /// Create an empty source that supports no platforms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entries` for `platform`, replacing any earlier mapping.
    #[must_use]
    pub fn with_files(mut self, platform: PlatformIdentifier, entries: Vec<FileEntry>) -> Self {
        self.files.insert(platform, entries);
        self
    }
}

impl ContentSource for InMemorySource {
    fn generate_fileset(
        &self,
        platform: &PlatformIdentifier,
    ) -> Result<Vec<FileEntry>, SourceError> {
        self.files
            .get(platform)
            .cloned()
            .ok_or_else(|| SourceError::PlatformNotSupported {
                platform: platform.clone(),
            })
    }
}
