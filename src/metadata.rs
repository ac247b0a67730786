//! Generated dist-info files.
//!
//! Every function here is a pure function of its inputs: the same spec and
//! tag always yield byte-identical entries, which keeps whole archives
//! reproducible.
//!
//! Header files (`METADATA`, `WHEEL`) use the RFC 822 layout wheel
//! installers expect: `Field-Name: value` lines, a blank line, then an
//! optional body.

use crate::checksum::record_hash;
use crate::entry::FileEntry;
use crate::spec::PackageSpec;

/// Core metadata version written to `METADATA`.
const METADATA_VERSION: &str = "2.1";

/// Wheel format version written to `WHEEL`.
const WHEEL_VERSION: &str = "1.0";

/// Value of the `Generator` header in `WHEEL`.
const GENERATOR: &str = concat!("binary-wheel-builder ", env!("CARGO_PKG_VERSION"));

/// Continuation indent for folded header values.
const FOLD_INDENT: &str = "        ";

/// Ordered `Field-Name: value` lines with an optional body.
#[derive(Debug, Default)]
struct HeaderBlock {
    text: String,
}

impl HeaderBlock {
    fn field(mut self, name: &str, value: &str) -> Self {
        self.text.push_str(name);
        self.text.push_str(": ");
        push_folded(&mut self.text, value);
        self.text.push('\n');
        self
    }

    fn optional(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    fn repeated<'a>(self, name: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        values
            .into_iter()
            .fold(self, |block, value| block.field(name, value))
    }

    fn into_bytes(mut self, body: Option<&str>) -> Vec<u8> {
        self.text.push('\n');
        if let Some(body) = body {
            self.text.push_str(body);
        }
        self.text.into_bytes()
    }
}

/// Append `value`, indenting every line after the first.
fn push_folded(out: &mut String, value: &str) {
    let normalized = value.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = normalized.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(FOLD_INDENT);
        out.push_str(line);
    }
}

/// Build `{dist_info}/METADATA` for `spec`.
///
/// Headers appear in a fixed order: `Metadata-Version`, `Name`, `Version`,
/// `Summary`, `License`, each `Classifier`, each `Project-URL`, and
/// `Requires-Python`. The description, when present, follows a blank line.
#[must_use]
pub fn metadata_file(spec: &PackageSpec) -> FileEntry {
    let meta = spec.metadata();
    let urls: Vec<String> = meta
        .project_urls
        .iter()
        .map(|(label, url)| format!("{label}, {url}"))
        .collect();

    let content = HeaderBlock::default()
        .field("Metadata-Version", METADATA_VERSION)
        .field("Name", spec.name())
        .field("Version", spec.version())
        .optional("Summary", meta.summary.as_deref())
        .optional("License", meta.license.as_deref())
        .repeated("Classifier", meta.classifiers.iter().map(String::as_str))
        .repeated("Project-URL", urls.iter().map(String::as_str))
        .optional("Requires-Python", meta.requires_python.as_deref())
        .into_bytes(meta.description.as_deref());

    FileEntry::new(format!("{}/METADATA", spec.dist_info_folder()), content)
}

/// Build `{dist_info}/WHEEL` for `spec` built with compatibility `tag`.
#[must_use]
pub fn wheel_file(spec: &PackageSpec, tag: &str) -> FileEntry {
    let content = HeaderBlock::default()
        .field("Wheel-Version", WHEEL_VERSION)
        .field("Generator", GENERATOR)
        .field("Root-Is-Purelib", "false")
        .field("Tag", tag)
        .into_bytes(None);

    FileEntry::new(format!("{}/WHEEL", spec.dist_info_folder()), content)
}

/// Build `{dist_info}/entry_points.txt` registering the console script.
///
/// The script is named after the package folder and calls its `main`.
#[must_use]
pub fn entry_points_file(spec: &PackageSpec) -> FileEntry {
    let script = spec.package_dir();
    let content = format!("[console_scripts]\n{script} = {script}:main\n");
    FileEntry::new(
        format!("{}/entry_points.txt", spec.dist_info_folder()),
        content,
    )
}

/// Build `{package_dir}/__init__.py`, whose `main` runs the bundled binary.
///
/// On POSIX the interpreter is replaced by the binary; on Windows the binary
/// runs as a child and its exit code is propagated.
#[must_use]
pub fn launcher_file(spec: &PackageSpec) -> FileEntry {
    let segments = spec
        .executable()
        .split('/')
        .map(python_string)
        .collect::<Vec<_>>()
        .join(", ");
    let content = format!(
        r#"import os
import subprocess
import sys


def main():
    binary = os.path.join(os.path.dirname(os.path.abspath(__file__)), {segments})
    args = [binary, *sys.argv[1:]]
    if sys.platform == "win32":
        sys.exit(subprocess.call(args))
    os.execv(binary, args)
"#
    );
    FileEntry::new(format!("{}/__init__.py", spec.package_dir()), content)
}

/// Quote `value` as a double-quoted Python string literal.
fn python_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Build `{dist_info}/RECORD` listing every entry in `entries`.
///
/// Each line is `path,sha256=<digest>,size`; the RECORD file lists itself
/// last with empty hash and size.
#[must_use]
pub fn record_file(dist_info: &str, entries: &[FileEntry]) -> FileEntry {
    let record_path = format!("{dist_info}/RECORD");
    let mut content = String::new();
    for entry in entries {
        content.push_str(&csv_field(entry.path()));
        content.push(',');
        content.push_str(&record_hash(entry.content()));
        content.push(',');
        content.push_str(&entry.content().len().to_string());
        content.push('\n');
    }
    content.push_str(&csv_field(&record_path));
    content.push_str(",,\n");
    FileEntry::new(record_path, content)
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
