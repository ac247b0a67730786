//! GitHub release assets as wheel payloads.
//!
//! Each platform maps to one asset name on a tagged release. The asset is
//! downloaded and placed in the wheel as a single executable entry.

use super::{ContentSource, FetchError, SourceError};
use crate::entry::FileEntry;
use crate::platform::PlatformIdentifier;
use log::debug;
use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Base URL for release downloads.
const GITHUB_BASE_URL: &str = "https://github.com";

/// Tag prefix used when none is given (`v1.2.3`).
const DEFAULT_TAG_PREFIX: &str = "v";

/// Network timeout for a single asset download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Fetches raw bytes from a URL.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
#[cfg_attr(test, mockall::automock)]
pub trait AssetFetcher: Send + Sync {
    /// Download `url` and return the response body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] for a 404 response and
    /// [`FetchError::Http`] or [`FetchError::Io`] for other failures.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut body = Vec::new();
        response
            .into_body()
            .as_reader()
            .read_to_end(&mut body)?;
        Ok(body)
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// A binary published as per-platform assets of a GitHub release.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::platform::well_known;
/// use binary_wheel_builder::source::GithubReleaseSource;
///
/// let source = GithubReleaseSource::new("bufbuild/buf", "1.28.1", "buf/buf")
///     .with_asset(well_known::linux_x86_64(), "buf-Linux-x86_64");
/// assert_eq!(
///     source.asset_url("buf-Linux-x86_64"),
///     "https://github.com/bufbuild/buf/releases/download/v1.28.1/buf-Linux-x86_64"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct GithubReleaseSource<F = HttpFetcher> {
    project_slug: String,
    version: String,
    tag_prefix: String,
    binary_path: String,
    assets: HashMap<PlatformIdentifier, String>,
    fetcher: F,
}

impl GithubReleaseSource<HttpFetcher> {
    /// Create a source for `project_slug` (`owner/repo`) at `version`.
    ///
    /// The downloaded binary is stored in the wheel at `binary_path`.
    #[must_use]
    pub fn new(
        project_slug: impl Into<String>,
        version: impl Into<String>,
        binary_path: impl Into<String>,
    ) -> Self {
        Self {
            project_slug: project_slug.into(),
            version: version.into(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_owned(),
            binary_path: binary_path.into(),
            assets: HashMap::new(),
            fetcher: HttpFetcher,
        }
    }
}

impl<F> GithubReleaseSource<F> {
    /// Replace the release tag prefix (default `v`; use `""` for bare tags).
    #[must_use]
    pub fn with_tag_prefix(mut self, tag_prefix: impl Into<String>) -> Self {
        self.tag_prefix = tag_prefix.into();
        self
    }

    /// Map `platform` to a release asset name.
    #[must_use]
    pub fn with_asset(mut self, platform: PlatformIdentifier, asset: impl Into<String>) -> Self {
        self.assets.insert(platform, asset.into());
        self
    }

    /// Swap the fetcher, typically for a test double.
    #[must_use]
    pub fn with_fetcher<G>(self, fetcher: G) -> GithubReleaseSource<G> {
        GithubReleaseSource {
            project_slug: self.project_slug,
            version: self.version,
            tag_prefix: self.tag_prefix,
            binary_path: self.binary_path,
            assets: self.assets,
            fetcher,
        }
    }

    /// Construct the download URL for a release asset.
    #[must_use]
    pub fn asset_url(&self, asset: &str) -> String {
        format!(
            "{GITHUB_BASE_URL}/{}/releases/download/{}{}/{asset}",
            self.project_slug, self.tag_prefix, self.version
        )
    }

    /// Return the platforms this source can serve.
    pub fn platforms(&self) -> impl Iterator<Item = &PlatformIdentifier> {
        self.assets.keys()
    }
}

impl<F: AssetFetcher> ContentSource for GithubReleaseSource<F> {
    fn generate_fileset(
        &self,
        platform: &PlatformIdentifier,
    ) -> Result<Vec<FileEntry>, SourceError> {
        let asset = self
            .assets
            .get(platform)
            .ok_or_else(|| SourceError::PlatformNotSupported {
                platform: platform.clone(),
            })?;
        let url = self.asset_url(asset);
        debug!("fetching {url} for {platform}");
        let content = self.fetcher.fetch(&url)?;
        debug!("fetched {} bytes from {url}", content.len());
        Ok(vec![FileEntry::executable(self.binary_path.clone(), content)])
    }
}
