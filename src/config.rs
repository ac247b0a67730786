//! TOML configuration for wheel builds.
//!
//! A configuration file describes one distribution: its name and version,
//! descriptive metadata, the platforms to build, and where each platform's
//! binary comes from. [`WheelConfig::to_package_spec`] turns the file into a
//! validated [`PackageSpec`] ready for [`crate::build::build`].
//!
//! ```toml
//! name = "buf"
//! version = "1.28.1"
//! package = "buf"
//! executable = "buf"
//! platforms = ["linux-x86_64", "macos-arm64"]
//!
//! [source.github]
//! project = "bufbuild/buf"
//!
//! [source.github.assets]
//! linux-x86_64 = "buf-Linux-x86_64"
//! macos-arm64 = "buf-Darwin-arm64"
//! ```

use crate::error::SpecError;
use crate::platform::{PlatformIdentifier, well_known};
use crate::source::{ContentSource, GithubReleaseSource, LocalFileSource};
use crate::spec::{PackageMetadata, PackageSpec};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Errors arising while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A platform short name is not in the catalogue.
    #[error("unknown platform '{name}' (known: {known})")]
    UnknownPlatform {
        /// The unrecognised name.
        name: String,
        /// Comma-separated catalogue names.
        known: String,
    },

    /// The resulting package specification is invalid.
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// One wheel configuration file.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WheelConfig {
    /// Distribution name as published.
    pub name: String,
    /// Distribution version.
    pub version: String,
    /// Top-level package folder inside the wheel.
    pub package: String,
    /// Executable path relative to the package folder.
    pub executable: String,
    /// One-line summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default)]
    pub description: Option<String>,
    /// License name.
    #[serde(default)]
    pub license: Option<String>,
    /// Trove classifiers.
    #[serde(default)]
    pub classifiers: Vec<String>,
    /// Labelled project URLs, in file order.
    #[serde(default, deserialize_with = "ordered_pairs")]
    pub project_urls: Vec<(String, String)>,
    /// Python version constraint.
    #[serde(default)]
    pub requires_python: Option<String>,
    /// Register a console script.
    #[serde(default = "enabled")]
    pub add_to_path: bool,
    /// Write a `RECORD` file.
    #[serde(default = "enabled")]
    pub write_record: bool,
    /// Generate a Python launcher module. Follows `add_to_path` when unset.
    #[serde(default)]
    pub launcher: Option<bool>,
    /// Platforms to build, in order.
    pub platforms: Vec<PlatformSelector>,
    /// Where binaries come from.
    pub source: SourceConfig,
}

const fn enabled() -> bool {
    true
}

/// A platform named from the catalogue or spelled out in full.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum PlatformSelector {
    /// A catalogue short name such as `linux-x86_64`.
    Named(String),
    /// An explicit `{ platform, python_tag, abi_tag }` table.
    Explicit(PlatformIdentifier),
}

impl PlatformSelector {
    /// Return the name used to look up this platform's asset or file.
    ///
    /// Named selectors use their short name; explicit ones their platform
    /// tag.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Explicit(platform) => platform.platform(),
        }
    }

    /// Resolve to a platform identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPlatform`] for a short name outside
    /// the catalogue.
    pub fn resolve(&self) -> Result<PlatformIdentifier, ConfigError> {
        match self {
            Self::Named(name) => well_known::by_name(name).ok_or_else(|| unknown_platform(name)),
            Self::Explicit(platform) => Ok(platform.clone()),
        }
    }
}

fn unknown_platform(name: &str) -> ConfigError {
    ConfigError::UnknownPlatform {
        name: name.to_owned(),
        known: well_known::names().collect::<Vec<_>>().join(", "),
    }
}

/// Binary origin.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
pub enum SourceConfig {
    /// Release assets on GitHub.
    Github(GithubSourceConfig),
    /// Files on the local filesystem.
    Local(LocalSourceConfig),
}

/// `[source.github]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GithubSourceConfig {
    /// `owner/repo` slug.
    pub project: String,
    /// Release version; defaults to the package version.
    #[serde(default)]
    pub version: Option<String>,
    /// Prefix before the version in the release tag.
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
    /// Path of the binary in the wheel; defaults to `{package}/{executable}`.
    #[serde(default)]
    pub binary_path: Option<String>,
    /// Asset name per platform key.
    pub assets: BTreeMap<String, String>,
}

fn default_tag_prefix() -> String {
    "v".to_owned()
}

/// `[source.local]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LocalSourceConfig {
    /// Path of the binary in the wheel; defaults to `{package}/{executable}`.
    #[serde(default)]
    pub binary_path: Option<String>,
    /// Binary file per platform key; relative paths resolve against the
    /// configuration file's directory.
    pub files: BTreeMap<String, Utf8PathBuf>,
}

/// Deserialize a table into pairs, keeping document order.
fn ordered_pairs<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of string values")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or_default());
            while let Some(pair) = map.next_entry::<String, String>()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}

impl WheelConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML or
    /// contains unknown or missing fields.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it does not parse.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        debug!("loading configuration from {path}");
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Build a [`PackageSpec`], resolving relative paths against `base_dir`.
    ///
    /// When `only` is non-empty, only platforms whose key matches one of its
    /// names are kept, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPlatform`] for catalogue names that do
    /// not exist or filter names that match no configured platform, and
    /// [`ConfigError::Spec`] if the resulting spec is invalid.
    pub fn to_package_spec(
        &self,
        base_dir: &Utf8Path,
        only: &[String],
    ) -> Result<PackageSpec, ConfigError> {
        if let Some(missing) = only
            .iter()
            .find(|name| !self.platforms.iter().any(|s| s.key() == name.as_str()))
        {
            return Err(unknown_platform(missing));
        }

        let selected = self
            .platforms
            .iter()
            .filter(|selector| only.is_empty() || only.iter().any(|name| name == selector.key()))
            .map(|selector| Ok((selector.key(), selector.resolve()?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let source = self.content_source(base_dir, &selected);
        let mut builder = PackageSpec::builder(
            self.name.clone(),
            self.version.clone(),
            self.package.clone(),
            self.executable.clone(),
            source,
        )
        .platforms(selected.into_iter().map(|(_, platform)| platform))
        .metadata(PackageMetadata {
            summary: self.summary.clone(),
            description: self.description.clone(),
            license: self.license.clone(),
            classifiers: self.classifiers.clone(),
            project_urls: self.project_urls.clone(),
            requires_python: self.requires_python.clone(),
        })
        .add_to_path(self.add_to_path)
        .write_record(self.write_record);
        if let Some(enabled) = self.launcher {
            builder = builder.launcher(enabled);
        }
        Ok(builder.build()?)
    }

    fn default_binary_path(&self) -> String {
        format!("{}/{}", self.package, self.executable)
    }

    fn content_source(
        &self,
        base_dir: &Utf8Path,
        selected: &[(&str, PlatformIdentifier)],
    ) -> Arc<dyn ContentSource> {
        match &self.source {
            SourceConfig::Github(github) => {
                let binary_path = github
                    .binary_path
                    .clone()
                    .unwrap_or_else(|| self.default_binary_path());
                let version = github.version.as_deref().unwrap_or(&self.version);
                let source = selected.iter().fold(
                    GithubReleaseSource::new(github.project.clone(), version, binary_path)
                        .with_tag_prefix(github.tag_prefix.clone()),
                    |source, (key, platform)| match github.assets.get(*key) {
                        Some(asset) => source.with_asset(platform.clone(), asset.clone()),
                        None => source,
                    },
                );
                Arc::new(source)
            }
            SourceConfig::Local(local) => {
                let binary_path = local
                    .binary_path
                    .clone()
                    .unwrap_or_else(|| self.default_binary_path());
                let source = selected.iter().fold(
                    LocalFileSource::new(binary_path),
                    |source, (key, platform)| match local.files.get(*key) {
                        Some(file) => source.with_file(platform.clone(), base_dir.join(file)),
                        None => source,
                    },
                );
                Arc::new(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const GITHUB_CONFIG: &str = r#"
name = "buf"
version = "1.28.1"
package = "buf"
executable = "buf"
summary = "Protobuf tooling"
classifiers = ["Environment :: Console", "Topic :: Utilities"]
platforms = [
    "linux-x86_64",
    "macos-arm64",
    { platform = "freebsd_14_amd64" },
]

[project_urls]
Source = "https://github.com/bufbuild/buf"
Documentation = "https://buf.build/docs"

[source.github]
project = "bufbuild/buf"

[source.github.assets]
linux-x86_64 = "buf-Linux-x86_64"
macos-arm64 = "buf-Darwin-arm64"
"#;

    fn parse(text: &str) -> WheelConfig {
        WheelConfig::parse(text).expect("expected configuration to parse successfully")
    }

    #[rstest]
    fn parses_github_configuration() {
        let config = parse(GITHUB_CONFIG);

        assert_eq!(config.name, "buf");
        assert!(config.add_to_path);
        assert!(config.write_record);
        assert_eq!(config.launcher, None);
        assert_eq!(config.platforms.len(), 3);
        let SourceConfig::Github(github) = &config.source else {
            panic!("expected a GitHub source");
        };
        assert_eq!(github.tag_prefix, "v");
        assert_eq!(github.version, None);
        assert_eq!(github.assets.len(), 2);
    }

    #[rstest]
    fn project_urls_keep_document_order() {
        let config = parse(GITHUB_CONFIG);
        let labels: Vec<&str> = config
            .project_urls
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        assert_eq!(labels, vec!["Source", "Documentation"]);
    }

    #[rstest]
    fn explicit_platforms_default_their_tags() {
        let config = parse(GITHUB_CONFIG);
        let explicit = config
            .platforms
            .last()
            .expect("three platforms")
            .resolve()
            .expect("explicit resolves");
        assert_eq!(explicit.to_tag(), "py3-none-freebsd_14_amd64");
    }

    #[rstest]
    fn builds_spec_with_resolved_platforms() {
        let spec = parse(GITHUB_CONFIG)
            .to_package_spec(Utf8Path::new("."), &[])
            .expect("valid spec");

        assert_eq!(
            spec.platforms(),
            &[
                well_known::linux_x86_64(),
                well_known::macos_arm64(),
                PlatformIdentifier::new("freebsd_14_amd64"),
            ]
        );
        assert_eq!(spec.metadata().summary.as_deref(), Some("Protobuf tooling"));
        assert_eq!(spec.metadata().project_urls.len(), 2);
    }

    #[rstest]
    #[case::default("", true)]
    #[case::off_the_path("add_to_path = false\n", false)]
    #[case::forced_off("launcher = false\n", false)]
    #[case::forced_on("add_to_path = false\nlauncher = true\n", true)]
    fn launcher_follows_add_to_path_unless_set(#[case] switches: &str, #[case] expected: bool) {
        let text = format!("{switches}{GITHUB_CONFIG}");
        let spec = parse(&text)
            .to_package_spec(Utf8Path::new("."), &[])
            .expect("valid spec");
        assert_eq!(spec.launcher(), expected);
    }

    #[rstest]
    fn repeated_platform_is_a_spec_error() {
        let text = GITHUB_CONFIG.replace("\"macos-arm64\",", "\"linux-x86_64\",");
        let err = parse(&text)
            .to_package_spec(Utf8Path::new("."), &[])
            .expect_err("repeated platform");
        assert!(matches!(
            err,
            ConfigError::Spec(SpecError::DuplicatePlatform { .. })
        ));
    }

    #[rstest]
    fn platform_without_asset_is_unsupported_at_build_time() {
        let spec = parse(GITHUB_CONFIG)
            .to_package_spec(Utf8Path::new("."), &[])
            .expect("valid spec");
        let err = spec
            .source()
            .generate_fileset(&PlatformIdentifier::new("freebsd_14_amd64"))
            .expect_err("no asset configured");
        assert!(matches!(
            err,
            crate::source::SourceError::PlatformNotSupported { .. }
        ));
    }

    #[rstest]
    fn filter_keeps_configuration_order() {
        let spec = parse(GITHUB_CONFIG)
            .to_package_spec(
                Utf8Path::new("."),
                &["macos-arm64".to_owned(), "linux-x86_64".to_owned()],
            )
            .expect("valid spec");
        assert_eq!(
            spec.platforms(),
            &[well_known::linux_x86_64(), well_known::macos_arm64()]
        );
    }

    #[rstest]
    fn filter_rejects_unconfigured_names() {
        let err = parse(GITHUB_CONFIG)
            .to_package_spec(Utf8Path::new("."), &["windows-x86_64".to_owned()])
            .expect_err("not configured");
        assert!(matches!(err, ConfigError::UnknownPlatform { ref name, .. } if name == "windows-x86_64"));
    }

    #[rstest]
    fn unknown_catalogue_name_is_rejected() {
        let text = GITHUB_CONFIG.replace("\"macos-arm64\",", "\"plan9-mips\",");
        let err = parse(&text)
            .to_package_spec(Utf8Path::new("."), &[])
            .expect_err("unknown platform");
        let ConfigError::UnknownPlatform { name, known } = err else {
            panic!("expected UnknownPlatform, got {err:?}");
        };
        assert_eq!(name, "plan9-mips");
        assert!(known.contains("linux-x86_64"));
    }

    #[rstest]
    fn empty_platform_list_is_a_spec_error() {
        let text = GITHUB_CONFIG.replace(
            "platforms = [\n    \"linux-x86_64\",\n    \"macos-arm64\",\n    { platform = \"freebsd_14_amd64\" },\n]",
            "platforms = []",
        );
        let err = parse(&text)
            .to_package_spec(Utf8Path::new("."), &[])
            .expect_err("no platforms");
        assert!(matches!(err, ConfigError::Spec(SpecError::NoPlatforms)));
    }

    #[rstest]
    #[case::unknown_top_level("colour = \"blue\"\n")]
    #[case::unknown_source("[source.ftp]\nhost = \"example\"\n")]
    fn rejects_unknown_fields(#[case] extra: &str) {
        let text = format!(
            "name = \"x\"\nversion = \"1\"\npackage = \"x\"\nexecutable = \"x\"\n\
             platforms = [\"linux-x86_64\"]\n{extra}\n[source.local]\nfiles = {{}}\n"
        );
        assert!(matches!(
            WheelConfig::parse(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[rstest]
    fn local_paths_resolve_against_base_dir() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let base = Utf8Path::from_path(temp_dir.path()).expect("utf-8 temp dir");
        std::fs::write(base.join("tool-linux"), b"linux binary").expect("write binary");

        let config = parse(
            r#"
name = "tool"
version = "1.0"
package = "tool"
executable = "tool"
platforms = ["linux-x86_64"]

[source.local.files]
linux-x86_64 = "tool-linux"
"#,
        );
        let spec = config.to_package_spec(base, &[]).expect("valid spec");
        let entries = spec
            .source()
            .generate_fileset(&well_known::linux_x86_64())
            .expect("file is read");

        let entry = entries.first().expect("one entry");
        assert_eq!(entry.path(), "tool/tool");
        assert_eq!(entry.content(), b"linux binary");
        assert_eq!(entry.permissions(), 0o755);
    }

    #[rstest]
    fn missing_file_is_a_read_error() {
        let err = WheelConfig::load(Utf8Path::new("/nonexistent/wheel.toml"))
            .expect_err("file is absent");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
