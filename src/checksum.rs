//! SHA-256 digests for built wheels and their `RECORD` entries.
//!
//! [`Sha256Digest`] is the lowercase hex form reported for every finished
//! archive. [`record_hash`] produces the `sha256=<urlsafe-base64>` form that
//! wheel `RECORD` files use for individual members.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Chunk size used when hashing files.
const READ_BUFFER_LEN: usize = 8192;

/// A lowercase hex SHA-256 digest.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::checksum::Sha256Digest;
///
/// let digest = Sha256Digest::of_bytes(b"");
/// assert_eq!(
///     digest.as_str(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Hash an in-memory buffer.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(data))
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 digest of a file on disk.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn compute_sha256(path: &Path) -> io::Result<Sha256Digest> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; READ_BUFFER_LEN];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha256Digest::from_hasher(hasher))
}

/// Hash `data` in the `RECORD` format, `sha256=<urlsafe base64, unpadded>`.
///
/// # Examples
///
/// ```
/// use binary_wheel_builder::checksum::record_hash;
///
/// assert_eq!(
///     record_hash(b""),
///     "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
/// );
/// ```
#[must_use]
pub fn record_hash(data: &[u8]) -> String {
    format!("sha256={}", URL_SAFE_NO_PAD.encode(Sha256::digest(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const EMPTY_SHA256: &str = concat!(
        "e3b0c44298fc1c149afbf4c8996fb924",
        "27ae41e4649b934ca495991b7852b855"
    );

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("temp dir creation succeeds")
    }

    #[rstest]
    fn compute_sha256_of_empty_file(temp_dir: TempDir) {
        let path = temp_dir.path().join("empty.bin");
        fs::write(&path, b"").expect("write");
        let digest = compute_sha256(&path).expect("sha256 succeeds");
        assert_eq!(digest.as_str(), EMPTY_SHA256);
    }

    #[rstest]
    fn file_and_buffer_digests_agree(temp_dir: TempDir) {
        // Larger than one read buffer so the chunk loop runs several times.
        let content: Vec<u8> = (0..20_000u32)
            .map(|i| u8::try_from(i % 251).expect("fits in a byte"))
            .collect();
        let path = temp_dir.path().join("payload.bin");
        fs::write(&path, &content).expect("write");

        let from_file = compute_sha256(&path).expect("sha256 succeeds");
        assert_eq!(from_file, Sha256Digest::of_bytes(&content));
    }

    #[rstest]
    fn compute_sha256_reports_missing_file(temp_dir: TempDir) {
        let result = compute_sha256(&temp_dir.path().join("absent.whl"));
        assert_eq!(
            result.expect_err("missing file").kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(Sha256Digest::of_bytes(b"").to_string(), EMPTY_SHA256);
    }

    #[test]
    fn record_hash_is_urlsafe_without_padding() {
        let hash = record_hash(b"hello world");
        assert_eq!(hash, "sha256=uU0nuZNNPgilLlLX2n2r-sSE7-N6U4DukIj3rOLvzek");
        assert!(!hash.ends_with('='));
    }
}
