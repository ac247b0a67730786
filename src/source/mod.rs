//! Content sources supply the payload files for each platform.
//!
//! A [`ContentSource`] is asked once per platform for the files to place in
//! that platform's wheel. Sources differ by origin: a GitHub release
//! download, a binary already on disk, or an in-memory fixture.
//!
//! # Sub-modules
//!
//! - [`github`] — Downloads release assets over HTTP.
//! - [`local`] — Reads prebuilt binaries from the filesystem.
//! - [`memory`] — Serves preconstructed entries from memory.

pub mod github;
pub mod local;
pub mod memory;

pub use github::{AssetFetcher, GithubReleaseSource, HttpFetcher};
pub use local::LocalFileSource;
pub use memory::InMemorySource;

use crate::entry::FileEntry;
use crate::platform::PlatformIdentifier;
use std::path::PathBuf;

/// Produces the payload files for a platform.
///
/// Implementations must be safe to call repeatedly and from several threads,
/// and must not let one call's outcome depend on another's.
#[cfg_attr(test, mockall::automock)]
pub trait ContentSource: Send + Sync {
    /// Generate the files to add to the wheel for `platform`.
    ///
    /// Executables should use `0o755` permissions so they remain runnable
    /// after installation.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::PlatformNotSupported`] when the platform is
    /// outside the source's supported set, or [`SourceError::Fetch`] when
    /// retrieving the payload fails.
    fn generate_fileset(&self, platform: &PlatformIdentifier)
    -> Result<Vec<FileEntry>, SourceError>;
}

/// Errors returned by content sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source has no payload for this platform.
    #[error("platform {platform} is not supported by this source")]
    PlatformNotSupported {
        /// The rejected platform.
        platform: PlatformIdentifier,
    },

    /// Retrieving the payload failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors arising while retrieving payload bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested asset was not found (HTTP 404).
    #[error("asset not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// A local payload file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while receiving a response body.
    #[error("I/O error during download: {0}")]
    Io(#[from] std::io::Error),
}
