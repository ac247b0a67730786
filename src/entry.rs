//! File entries destined for a wheel archive.

/// Permission bits for ordinary archive members.
pub const DEFAULT_PERMISSIONS: u32 = 0o644;

/// Permission bits for executables (`rwxr-xr-x`).
pub const EXECUTABLE_PERMISSIONS: u32 = 0o755;

/// One file inside an archive.
///
/// `path` is relative and uses forward slashes. Paths must be unique within
/// one archive; the archive writer rejects duplicates.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::entry::FileEntry;
///
/// let binary = FileEntry::executable("buf/buf", b"\x7fELF".to_vec());
/// assert_eq!(binary.permissions(), 0o755);
///
/// let readme = FileEntry::new("buf/README", "hello");
/// assert_eq!(readme.permissions(), 0o644);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: String,
    content: Vec<u8>,
    permissions: u32,
}

impl FileEntry {
    /// Create an entry with the default `0o644` permissions.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            permissions: DEFAULT_PERMISSIONS,
        }
    }

    /// Create an executable entry with `0o755` permissions.
    #[must_use]
    pub fn executable(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::new(path, content).with_permissions(EXECUTABLE_PERMISSIONS)
    }

    /// Replace the permission bits.
    #[must_use]
    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }

    /// Return the archive path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Return the file content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Return the permission bits.
    #[must_use]
    pub fn permissions(&self) -> u32 {
        self.permissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn accepts_text_and_bytes() {
        let text = FileEntry::new("a/readme", "hi");
        let bytes = FileEntry::new("a/readme", b"hi".to_vec());
        assert_eq!(text, bytes);
        assert_eq!(text.content(), b"hi");
    }

    #[rstest]
    #[case(DEFAULT_PERMISSIONS)]
    #[case(EXECUTABLE_PERMISSIONS)]
    #[case(0o700)]
    fn permissions_are_kept_verbatim(#[case] mode: u32) {
        let entry = FileEntry::new("tool/tool", "x").with_permissions(mode);
        assert_eq!(entry.permissions(), mode);
    }

    #[rstest]
    fn executable_differs_only_in_permissions() {
        let plain = FileEntry::new("tool/tool", "x");
        let exec = FileEntry::executable("tool/tool", "x");
        assert_ne!(plain, exec);
        assert_eq!(plain.with_permissions(EXECUTABLE_PERMISSIONS), exec);
    }
}
