//! Wheel naming policy.
//!
//! Constructs deterministic wheel filenames in the form
//! `{normalized_name}-{version}-{tag}.whl` and the matching dist-info
//! folder `{normalized_name}-{version}.dist-info`.

use crate::platform::PlatformIdentifier;
use std::fmt;

/// The fixed file extension for wheel archives.
const WHEEL_EXTENSION: &str = ".whl";

/// The fixed suffix of the metadata folder inside a wheel.
const DIST_INFO_SUFFIX: &str = ".dist-info";

/// Normalize a distribution name for use in filenames.
///
/// Every dash becomes an underscore; no other character is touched.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::naming::normalize_name;
///
/// assert_eq!(normalize_name("deterministic-zip"), "deterministic_zip");
/// assert_eq!(normalize_name("buf"), "buf");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Return the dist-info folder name for a distribution.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::naming::dist_info_folder;
///
/// assert_eq!(dist_info_folder("my-tool", "1.0.0"), "my_tool-1.0.0.dist-info");
/// ```
#[must_use]
pub fn dist_info_folder(name: &str, version: &str) -> String {
    format!("{}-{version}{DIST_INFO_SUFFIX}", normalize_name(name))
}

/// A fully-qualified wheel filename.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::naming::WheelName;
/// use binary_wheel_builder::platform::PlatformIdentifier;
///
/// let name = WheelName::new("buf", "0.0.1", &PlatformIdentifier::new("linux_x86_64"));
/// assert_eq!(name.to_string(), "buf-0.0.1-py3-none-linux_x86_64.whl");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WheelName {
    normalized_name: String,
    version: String,
    tag: String,
}

impl WheelName {
    /// Create a wheel name for `name` at `version` built for `platform`.
    #[must_use]
    pub fn new(name: &str, version: impl Into<String>, platform: &PlatformIdentifier) -> Self {
        Self {
            normalized_name: normalize_name(name),
            version: version.into(),
            tag: platform.to_tag(),
        }
    }

    /// Return the normalized distribution name.
    #[must_use]
    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    /// Return the version component.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the compatibility tag component.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WheelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}{WHEEL_EXTENSION}",
            self.normalized_name, self.version, self.tag
        )
    }
}
