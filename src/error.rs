//! Error types for wheel assembly.
//!
//! Archive writing, package specification validation, and per-platform
//! build failures each have their own type. [`BuildError`] wraps a
//! [`BuildFailure`] with the platform and package identity so callers can
//! report where a failure came from.

use crate::platform::PlatformIdentifier;
use crate::source::SourceError;
use thiserror::Error;

/// Errors arising while writing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Two entries share the same archive path.
    #[error("duplicate archive path: {path}")]
    DuplicatePath {
        /// The path that appeared more than once.
        path: String,
    },

    /// An entry path is not a relative, forward-slash path.
    #[error("invalid archive path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Which rule the path breaks.
        reason: &'static str,
    },

    /// An I/O operation failed (creating the directory, writing the file).
    #[error("I/O error writing archive: {0}")]
    Io(#[from] std::io::Error),

    /// The zip encoder rejected an entry or failed to finish.
    #[error("zip encoding error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Errors arising from an invalid package specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// No target platforms were requested.
    #[error("a package needs at least one target platform")]
    NoPlatforms,

    /// A required text field is empty or whitespace.
    #[error("package {field} must not be blank")]
    BlankField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The same platform was requested more than once.
    #[error("platform {tag} is listed more than once")]
    DuplicatePlatform {
        /// Tag of the repeated platform.
        tag: String,
    },
}

/// The cause of a single platform's build failure.
#[derive(Debug, Error)]
pub enum BuildFailure {
    /// The content source could not provide the payload.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The archive could not be written.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The finished archive could not be read back for hashing.
    #[error("failed to checksum archive: {0}")]
    Checksum(#[source] std::io::Error),
}

/// A build failure attributed to one platform of one package.
#[derive(Debug, Error)]
#[error("failed to build {name} {version} for {platform}: {failure}")]
pub struct BuildError {
    platform: PlatformIdentifier,
    name: String,
    version: String,
    #[source]
    failure: BuildFailure,
}

impl BuildError {
    /// Attach package and platform identity to a failure.
    #[must_use]
    pub fn new(
        platform: PlatformIdentifier,
        name: impl Into<String>,
        version: impl Into<String>,
        failure: BuildFailure,
    ) -> Self {
        Self {
            platform,
            name: name.into(),
            version: version.into(),
            failure,
        }
    }

    /// Return the platform whose build failed.
    #[must_use]
    pub fn platform(&self) -> &PlatformIdentifier {
        &self.platform
    }

    /// Return the package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the package version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the underlying failure.
    #[must_use]
    pub fn failure(&self) -> &BuildFailure {
        &self.failure
    }

    /// Whether the source rejected the platform as unsupported.
    #[must_use]
    pub fn is_platform_not_supported(&self) -> bool {
        matches!(
            self.failure,
            BuildFailure::Source(SourceError::PlatformNotSupported { .. })
        )
    }
}
