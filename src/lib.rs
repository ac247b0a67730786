//! Reproducible Python wheels that wrap prebuilt executables.
//!
//! Given a [`PackageSpec`](spec::PackageSpec) naming a distribution, its
//! metadata, and the platforms to target, [`build`](build::build) produces
//! one wheel per platform. Each wheel holds the platform's binary from a
//! [`ContentSource`](source::ContentSource) plus the generated dist-info
//! files, and is written deterministically: the same inputs give the same
//! bytes and the same SHA-256 on any host.
//!
//! ```
//! use binary_wheel_builder::build::build_all;
//! use binary_wheel_builder::entry::FileEntry;
//! use binary_wheel_builder::platform::well_known;
//! use binary_wheel_builder::source::InMemorySource;
//! use binary_wheel_builder::spec::PackageSpec;
//! use std::sync::Arc;
//!
//! let source = InMemorySource::new()
//!     .with_files(well_known::linux_x86_64(), vec![FileEntry::executable("hello/hello", "#!")])
//!     .with_files(well_known::macos_arm64(), vec![FileEntry::executable("hello/hello", "#!")]);
//! let spec = PackageSpec::builder("hello", "1.0.0", "hello", "hello", Arc::new(source))
//!     .platforms([well_known::linux_x86_64(), well_known::macos_arm64()])
//!     .build()?;
//!
//! let dir = tempfile::tempdir()?;
//! let report = build_all(&spec, dir.path());
//! assert!(report.is_success());
//! assert_eq!(report.results.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod build;
pub mod checksum;
pub mod config;
pub mod entry;
pub mod error;
pub mod inspect;
pub mod metadata;
pub mod naming;
pub mod platform;
pub mod source;
pub mod spec;

pub use build::{BuildReport, BuildResult, Builds, build, build_all};
pub use config::{ConfigError, WheelConfig};
pub use entry::FileEntry;
pub use error::{ArchiveError, BuildError, BuildFailure, SpecError};
pub use platform::PlatformIdentifier;
pub use source::{ContentSource, SourceError};
pub use spec::{PackageMetadata, PackageSpec};
