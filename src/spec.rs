//! The complete description of a wheel to build.
//!
//! A [`PackageSpec`] names the distribution, the executable it wraps, the
//! metadata written into `METADATA`, the platforms to target, and the
//! [`ContentSource`] that supplies each platform's payload. Specs are
//! assembled through [`PackageSpecBuilder`], which validates them once so
//! the build orchestrator can rely on a non-empty platform list.

use crate::error::SpecError;
use crate::naming::{self, WheelName};
use crate::platform::PlatformIdentifier;
use crate::source::ContentSource;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Optional descriptive fields written to `METADATA`.
///
/// `project_urls` keeps insertion order; each pair becomes one
/// `Project-URL: {label}, {url}` header in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// One-line summary.
    pub summary: Option<String>,
    /// Long description, written as the message body.
    pub description: Option<String>,
    /// License name or SPDX expression.
    pub license: Option<String>,
    /// Trove classifiers, in output order.
    pub classifiers: Vec<String>,
    /// Labelled project links, in output order.
    pub project_urls: Vec<(String, String)>,
    /// Python version constraint, e.g. `>=3.9`.
    pub requires_python: Option<String>,
}

/// Everything needed to build one wheel per platform.
#[derive(Clone)]
pub struct PackageSpec {
    name: String,
    version: String,
    package_dir: String,
    executable: String,
    source: Arc<dyn ContentSource>,
    platforms: Vec<PlatformIdentifier>,
    metadata: PackageMetadata,
    add_to_path: bool,
    write_record: bool,
    launcher: bool,
}

impl PackageSpec {
    /// Start building a package definition.
    ///
    /// `package_dir` is the top-level folder inside the wheel that holds the
    /// payload; `executable` is the binary's path relative to it.
    ///
    /// # Examples
    ///
    /// ```
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
    ///     .summary("Protobuf tooling")
    ///     .build()?;
    /// assert_eq!(spec.dist_info_folder(), "buf-0.0.1.dist-info");
    /// # Ok::<(), binary_wheel_builder::error::SpecError>(())
    /// ```
    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        version: impl Into<String>,
        package_dir: impl Into<String>,
        executable: impl Into<String>,
        source: Arc<dyn ContentSource>,
    ) -> PackageSpecBuilder {
        PackageSpecBuilder {
            name: name.into(),
            version: version.into(),
            package_dir: package_dir.into(),
            executable: executable.into(),
            source,
            platforms: Vec::new(),
            metadata: PackageMetadata::default(),
            add_to_path: true,
            write_record: true,
            launcher: None,
        }
    }

    /// Return the distribution name as given.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the distribution version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the top-level package folder inside the wheel.
    #[must_use]
    pub fn package_dir(&self) -> &str {
        &self.package_dir
    }

    /// Return the executable path relative to [`Self::package_dir`].
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Return `{package_dir}/{executable}`.
    #[must_use]
    pub fn executable_path(&self) -> String {
        format!("{}/{}", self.package_dir, self.executable)
    }

    /// Return the payload source.
    #[must_use]
    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    /// Return the requested platforms in build order.
    #[must_use]
    pub fn platforms(&self) -> &[PlatformIdentifier] {
        &self.platforms
    }

    /// Return the descriptive metadata.
    #[must_use]
    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// Whether an `entry_points.txt` console script is generated.
    #[must_use]
    pub fn add_to_path(&self) -> bool {
        self.add_to_path
    }

    /// Whether a `RECORD` file is written.
    #[must_use]
    pub fn write_record(&self) -> bool {
        self.write_record
    }

    /// Whether a Python launcher module is generated.
    #[must_use]
    pub fn launcher(&self) -> bool {
        self.launcher
    }

    /// Return the name with dashes replaced by underscores.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        naming::normalize_name(&self.name)
    }

    /// Return `{normalized_name}-{version}.dist-info`.
    #[must_use]
    pub fn dist_info_folder(&self) -> String {
        naming::dist_info_folder(&self.name, &self.version)
    }

    /// Return the wheel filename for `platform`.
    #[must_use]
    pub fn wheel_name(&self, platform: &PlatformIdentifier) -> WheelName {
        WheelName::new(&self.name, self.version.clone(), platform)
    }
}

impl fmt::Debug for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageSpec")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("package_dir", &self.package_dir)
            .field("executable", &self.executable)
            .field("platforms", &self.platforms)
            .field("metadata", &self.metadata)
            .field("add_to_path", &self.add_to_path)
            .field("write_record", &self.write_record)
            .field("launcher", &self.launcher)
            .finish_non_exhaustive()
    }
}

/// Collects the parts of a [`PackageSpec`] before validation.
#[must_use = "call `build` to obtain a PackageSpec"]
pub struct PackageSpecBuilder {
    name: String,
    version: String,
    package_dir: String,
    executable: String,
    source: Arc<dyn ContentSource>,
    platforms: Vec<PlatformIdentifier>,
    metadata: PackageMetadata,
    add_to_path: bool,
    write_record: bool,
    launcher: Option<bool>,
}

impl PackageSpecBuilder {
    /// Append a target platform.
    pub fn platform(mut self, platform: PlatformIdentifier) -> Self {
        self.platforms.push(platform);
        self
    }

    /// Append several target platforms, keeping their order.
    pub fn platforms(mut self, platforms: impl IntoIterator<Item = PlatformIdentifier>) -> Self {
        self.platforms.extend(platforms);
        self
    }

    /// Replace all descriptive metadata at once.
    pub fn metadata(mut self, metadata: PackageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the one-line summary.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.metadata.summary = Some(summary.into());
        self
    }

    /// Set the long description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Set the license.
    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.metadata.license = Some(license.into());
        self
    }

    /// Append a classifier.
    pub fn classifier(mut self, classifier: impl Into<String>) -> Self {
        self.metadata.classifiers.push(classifier.into());
        self
    }

    /// Append a labelled project URL.
    pub fn project_url(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.metadata.project_urls.push((label.into(), url.into()));
        self
    }

    /// Set the Python version constraint.
    pub fn requires_python(mut self, requires_python: impl Into<String>) -> Self {
        self.metadata.requires_python = Some(requires_python.into());
        self
    }

    /// Toggle the `entry_points.txt` console script (default on).
    pub fn add_to_path(mut self, enabled: bool) -> Self {
        self.add_to_path = enabled;
        self
    }

    /// Toggle the `RECORD` file (default on).
    pub fn write_record(mut self, enabled: bool) -> Self {
        self.write_record = enabled;
        self
    }

    /// Toggle the generated launcher module.
    ///
    /// Defaults to the `add_to_path` setting, so the console script always
    /// has a `main` to call.
    pub fn launcher(mut self, enabled: bool) -> Self {
        self.launcher = Some(enabled);
        self
    }

    /// Validate the fields and produce a [`PackageSpec`].
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::BlankField`] if the name, version, package
    /// folder, or executable is blank, and [`SpecError::NoPlatforms`] if no
    /// platform was added. Returns [`SpecError::DuplicatePlatform`] if a
    /// platform is listed twice, since both would target the same wheel.
    pub fn build(self) -> Result<PackageSpec, SpecError> {
        for (field, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("package_dir", &self.package_dir),
            ("executable", &self.executable),
        ] {
            if value.trim().is_empty() {
                return Err(SpecError::BlankField { field });
            }
        }
        if self.platforms.is_empty() {
            return Err(SpecError::NoPlatforms);
        }
        if let Some(tag) = first_repeated_tag(&self.platforms) {
            return Err(SpecError::DuplicatePlatform { tag });
        }

        Ok(PackageSpec {
            name: self.name,
            version: self.version,
            package_dir: self.package_dir,
            executable: self.executable,
            source: self.source,
            platforms: self.platforms,
            metadata: self.metadata,
            add_to_path: self.add_to_path,
            write_record: self.write_record,
            launcher: self.launcher.unwrap_or(self.add_to_path),
        })
    }
}

fn first_repeated_tag(platforms: &[PlatformIdentifier]) -> Option<String> {
    let mut seen = HashSet::with_capacity(platforms.len());
    platforms
        .iter()
        .find(|platform| !seen.insert(*platform))
        .map(PlatformIdentifier::to_tag)
}
