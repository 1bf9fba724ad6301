// src/hash.rs

//! SHA-256 content hashing for file integrity.
//!
//! Checksums are lowercase hex strings. They identify file content in
//! manifests, select applicable deltas, and verify materialized files.
//! Comparison is case-insensitive so manifests produced by other tools
//! with uppercase hex still match.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Buffer size for streaming hashes (8 KiB)
const HASH_BUFFER_SIZE: usize = 8192;

/// Compute the SHA-256 hash of a byte slice as lowercase hex
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the SHA-256 hash of all data from a reader
///
/// Streams in fixed-size chunks, never buffering the whole input.
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 hash of a file's content
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {e}", path.display())))?;

    sha256_reader(&mut file)
        .map_err(|e| Error::IoError(format!("Failed to hash {}: {e}", path.display())))
}

/// Verify that bytes match an expected checksum
pub fn verify_bytes(data: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_bytes(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Verify that a file's content matches an expected checksum
pub fn verify_file(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_reader_matches_bytes() {
        let data = b"some longer content that spans a single buffer easily";
        let mut cursor = std::io::Cursor::new(&data[..]);

        let from_reader = sha256_reader(&mut cursor).unwrap();
        assert_eq!(from_reader, sha256_bytes(data));
    }

    #[test]
    fn test_sha256_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"file content").unwrap();

        assert_eq!(sha256_file(&path).unwrap(), sha256_bytes(b"file content"));
    }

    #[test]
    fn test_verify_bytes_case_insensitive() {
        let data = b"hello world";
        let upper = sha256_bytes(data).to_uppercase();

        assert!(verify_bytes(data, &upper).is_ok());
    }

    #[test]
    fn test_verify_mismatch_reports_both_sides() {
        let wrong = "0000000000000000000000000000000000000000000000000000000000000000";
        let err = verify_bytes(b"hello", wrong).unwrap_err();

        match err {
            Error::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, wrong);
                assert_eq!(actual, sha256_bytes(b"hello"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_verify_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(matches!(
            verify_file(&missing, "00"),
            Err(Error::IoError(_))
        ));
    }
}
