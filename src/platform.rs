//! Platform identifiers and the wheel compatibility tags they map to.
//!
//! A [`PlatformIdentifier`] names one build target. Its tag is the
//! `{python}-{abi}-{platform}` triple that installers match against the
//! running interpreter, and the identifier itself doubles as the lookup key
//! content sources use to choose per-platform assets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Python tag used when none is given.
pub const DEFAULT_PYTHON_TAG: &str = "py3";

/// ABI tag used when none is given.
pub const DEFAULT_ABI_TAG: &str = "none";

/// One target platform for a wheel build.
///
/// Equality and hashing are structural over all three fields, so two
/// identifiers built from the same strings are interchangeable as map keys.
/// No character validation is performed; callers supply tag-legal strings.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::platform::PlatformIdentifier;
///
/// let platform = PlatformIdentifier::new("linux_x86_64");
/// assert_eq!(platform.to_tag(), "py3-none-linux_x86_64");
///
/// let cpython = PlatformIdentifier::new("win_amd64")
///     .with_python_tag("cp312")
///     .with_abi_tag("abi3");
/// assert_eq!(cpython.to_tag(), "cp312-abi3-win_amd64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformIdentifier {
    platform: String,
    #[serde(default = "default_python_tag")]
    python_tag: String,
    #[serde(default = "default_abi_tag")]
    abi_tag: String,
}

fn default_python_tag() -> String {
    DEFAULT_PYTHON_TAG.to_owned()
}

fn default_abi_tag() -> String {
    DEFAULT_ABI_TAG.to_owned()
}

impl PlatformIdentifier {
    /// Create an identifier with the default `py3` and `none` tags.
    #[must_use]
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            python_tag: default_python_tag(),
            abi_tag: default_abi_tag(),
        }
    }

    /// Replace the Python tag.
    #[must_use]
    pub fn with_python_tag(mut self, python_tag: impl Into<String>) -> Self {
        self.python_tag = python_tag.into();
        self
    }

    /// Replace the ABI tag.
    #[must_use]
    pub fn with_abi_tag(mut self, abi_tag: impl Into<String>) -> Self {
        self.abi_tag = abi_tag.into();
        self
    }

    /// Return the platform component.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Return the Python tag component.
    #[must_use]
    pub fn python_tag(&self) -> &str {
        &self.python_tag
    }

    /// Return the ABI tag component.
    #[must_use]
    pub fn abi_tag(&self) -> &str {
        &self.abi_tag
    }

    /// Build the installation tag, `{python_tag}-{abi_tag}-{platform}`.
    #[must_use]
    pub fn to_tag(&self) -> String {
        [
            self.python_tag.as_str(),
            self.abi_tag.as_str(),
            self.platform.as_str(),
        ]
        .join("-")
    }
}

impl fmt::Display for PlatformIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tag())
    }
}

/// Catalogue of commonly targeted platforms.
///
/// Each platform uses the `py3`/`none` tags, so one wheel serves every
/// Python 3 interpreter on that operating system and architecture. The
/// Linux tags list both manylinux and musllinux compatibility so the same
/// static binary installs on glibc and musl distributions.
pub mod well_known {
    use super::PlatformIdentifier;

    /// Short names paired with their wheel platform tags.
    const CATALOGUE: &[(&str, &str)] = &[
        ("macos-arm64", "macosx_11_0_arm64"),
        ("macos-x86_64", "macosx_10_9_x86_64"),
        ("windows-x86_64", "win_amd64"),
        ("windows-arm64", "win_arm64"),
        (
            "linux-x86_64",
            "manylinux_2_12_x86_64.manylinux2010_x86_64.musllinux_1_1_x86_64",
        ),
        (
            "linux-aarch64",
            "manylinux_2_17_aarch64.manylinux2014_aarch64.musllinux_1_1_aarch64",
        ),
        (
            "linux-armv7l",
            "manylinux_2_17_armv7l.manylinux2014_armv7l.musllinux_1_1_armv7l",
        ),
    ];

    /// Apple silicon macOS.
    #[must_use]
    pub fn macos_arm64() -> PlatformIdentifier {
        PlatformIdentifier::new("macosx_11_0_arm64")
    }

    /// Intel macOS.
    #[must_use]
    pub fn macos_x86_64() -> PlatformIdentifier {
        PlatformIdentifier::new("macosx_10_9_x86_64")
    }

    /// 64-bit Windows on x86.
    #[must_use]
    pub fn windows_x86_64() -> PlatformIdentifier {
        PlatformIdentifier::new("win_amd64")
    }

    /// Windows on ARM.
    #[must_use]
    pub fn windows_arm64() -> PlatformIdentifier {
        PlatformIdentifier::new("win_arm64")
    }

    /// Generic 64-bit x86 Linux (glibc 2.12+ or musl 1.1+).
    #[must_use]
    pub fn linux_x86_64() -> PlatformIdentifier {
        PlatformIdentifier::new(
            "manylinux_2_12_x86_64.manylinux2010_x86_64.musllinux_1_1_x86_64",
        )
    }

    /// Generic 64-bit ARM Linux (glibc 2.17+ or musl 1.1+).
    #[must_use]
    pub fn linux_aarch64() -> PlatformIdentifier {
        PlatformIdentifier::new(
            "manylinux_2_17_aarch64.manylinux2014_aarch64.musllinux_1_1_aarch64",
        )
    }

    /// Generic 32-bit ARMv7 Linux (glibc 2.17+ or musl 1.1+).
    #[must_use]
    pub fn linux_armv7l() -> PlatformIdentifier {
        PlatformIdentifier::new("manylinux_2_17_armv7l.manylinux2014_armv7l.musllinux_1_1_armv7l")
    }

    /// Resolve a short name such as `linux-x86_64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use binary_wheel_builder::platform::well_known;
    ///
    /// assert_eq!(
    ///     well_known::by_name("windows-x86_64"),
    ///     Some(well_known::windows_x86_64())
    /// );
    /// assert!(well_known::by_name("plan9-mips").is_none());
    /// ```
    #[must_use]
    pub fn by_name(name: &str) -> Option<PlatformIdentifier> {
        CATALOGUE
            .iter()
            .find(|(short, _)| *short == name)
            .map(|(_, tag)| PlatformIdentifier::new(*tag))
    }

    /// Return every recognised short name.
    pub fn names() -> impl Iterator<Item = &'static str> {
        CATALOGUE.iter().map(|(short, _)| *short)
    }
}
