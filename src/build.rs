//! Per-platform build orchestration.
//!
//! [`build`] fans one [`PackageSpec`] out into one wheel per platform. The
//! returned [`Builds`] iterator is lazy: nothing is fetched or written until
//! it is advanced, and each item is yielded as soon as that platform's wheel
//! is on disk. Dropping the iterator abandons the remaining platforms.
//!
//! A failing platform yields an `Err` at its position and iteration moves
//! on to the next platform. Callers wanting fail-fast behaviour stop at the
//! first error, for example with `collect::<Result<Vec<_>, _>>()`.

use crate::archive::write_archive;
use crate::checksum::{Sha256Digest, compute_sha256};
use crate::entry::FileEntry;
use crate::error::{BuildError, BuildFailure};
use crate::metadata;
use crate::platform::PlatformIdentifier;
use crate::spec::PackageSpec;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::slice;

/// A wheel that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    /// Lowercase hex SHA-256 of the wheel file.
    pub checksum: Sha256Digest,
    /// Path of the wheel file.
    pub file_path: PathBuf,
    /// Platform the wheel was built for.
    pub platform: PlatformIdentifier,
}

/// Lazy sequence of per-platform build outcomes, in platform order.
#[derive(Debug)]
#[must_use = "builds are lazy and do nothing unless iterated"]
pub struct Builds<'a> {
    spec: &'a PackageSpec,
    output_dir: PathBuf,
    platforms: slice::Iter<'a, PlatformIdentifier>,
}

impl Iterator for Builds<'_> {
    type Item = Result<BuildResult, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        let platform = self.platforms.next()?;
        Some(build_platform(self.spec, platform, &self.output_dir))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.platforms.size_hint()
    }
}

impl ExactSizeIterator for Builds<'_> {}

impl FusedIterator for Builds<'_> {}

/// Build one wheel per platform of `spec` into `output_dir`.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::build::build;
/// use binary_wheel_builder::entry::FileEntry;
/// use binary_wheel_builder::platform::PlatformIdentifier;
/// use binary_wheel_builder::source::InMemorySource;
/// use binary_wheel_builder::spec::PackageSpec;
/// use std::sync::Arc;
///
/// let linux = PlatformIdentifier::new("linux_x86_64");
/// let source = InMemorySource::new()
///     .with_files(linux.clone(), vec![FileEntry::executable("buf/buf", "#!")]);
/// let spec = PackageSpec::builder("buf", "0.0.1", "buf", "buf", Arc::new(source))
///     .platform(linux)
///     .build()?;
///
/// let dir = tempfile::tempdir()?;
/// for outcome in build(&spec, dir.path()) {
///     let wheel = outcome?;
///     assert!(wheel.file_path.ends_with("buf-0.0.1-py3-none-linux_x86_64.whl"));
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn build<'a>(spec: &'a PackageSpec, output_dir: &Path) -> Builds<'a> {
    Builds {
        spec,
        output_dir: output_dir.to_path_buf(),
        platforms: spec.platforms().iter(),
    }
}

/// Build the wheel for a single platform.
///
/// # Errors
///
/// Returns a [`BuildError`] naming the platform and package when the source
/// fails, the archive cannot be written, or the written file cannot be
/// hashed. No wheel is left at the target path in any of these cases.
pub fn build_platform(
    spec: &PackageSpec,
    platform: &PlatformIdentifier,
    output_dir: &Path,
) -> Result<BuildResult, BuildError> {
    let attribute = |failure: BuildFailure| {
        let err = BuildError::new(platform.clone(), spec.name(), spec.version(), failure);
        debug!("{err}");
        err
    };

    debug!("building {} {} for {platform}", spec.name(), spec.version());
    let payload = spec
        .source()
        .generate_fileset(platform)
        .map_err(|e| attribute(e.into()))?;
    let entries = assemble_entries(spec, platform, payload);

    let file_path = output_dir.join(spec.wheel_name(platform).filename());
    write_archive(&file_path, &entries).map_err(|e| attribute(e.into()))?;

    let checksum = match compute_sha256(&file_path) {
        Ok(checksum) => checksum,
        Err(e) => {
            discard(&file_path);
            return Err(attribute(BuildFailure::Checksum(e)));
        }
    };

    info!("built {} ({checksum})", file_path.display());
    Ok(BuildResult {
        checksum,
        file_path,
        platform: platform.clone(),
    })
}

/// Remove a wheel that cannot be reported as complete.
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("failed to remove {}: {e}", path.display());
    }
}

/// Order `payload` and the generated files as they appear in the wheel.
///
/// Payload entries (plus the launcher module, when enabled) come first,
/// sorted by path. The dist-info files follow in fixed order: `METADATA`,
/// `WHEEL`, `entry_points.txt` when the executable is added to `PATH`, and
/// `RECORD` last when records are enabled.
#[must_use]
pub fn assemble_entries(
    spec: &PackageSpec,
    platform: &PlatformIdentifier,
    mut payload: Vec<FileEntry>,
) -> Vec<FileEntry> {
    if spec.launcher() {
        payload.push(metadata::launcher_file(spec));
    }
    payload.sort_by(|a, b| a.path().cmp(b.path()));

    let mut entries = payload;
    entries.push(metadata::metadata_file(spec));
    entries.push(metadata::wheel_file(spec, &platform.to_tag()));
    if spec.add_to_path() {
        entries.push(metadata::entry_points_file(spec));
    }
    if spec.write_record() {
        let record = metadata::record_file(&spec.dist_info_folder(), &entries);
        entries.push(record);
    }
    entries
}

/// Outcome of building every platform of a package.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Successful builds, in platform order.
    pub results: Vec<BuildResult>,
    /// Failed builds, in platform order.
    pub failures: Vec<BuildError>,
}

impl BuildReport {
    /// Whether every platform built.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build every platform, collecting successes and failures separately.
#[must_use]
pub fn build_all(spec: &PackageSpec, output_dir: &Path) -> BuildReport {
    build(spec, output_dir).fold(BuildReport::default(), |mut report, outcome| {
        match outcome {
            Ok(result) => report.results.push(result),
            Err(err) => report.failures.push(err),
        }
        report
    })
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
