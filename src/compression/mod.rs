// src/compression/mod.rs

//! Gzip compression for downloaded payloads.
//!
//! Full-file downloads travel gzip-compressed; delta downloads are raw
//! patch blobs and never pass through here. Empty input is an explicit
//! no-op: an absent payload compresses and decompresses to an absent
//! payload without touching the codec.

use crate::error::{Error, Result};
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use std::io::Read;

/// Gzip-compress a byte buffer
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut encoder = GzEncoder::new(data, Compression::default());
    let mut output = Vec::new();
    encoder
        .read_to_end(&mut output)
        .map_err(|e| Error::IoError(format!("Failed to compress data: {e}")))?;
    Ok(output)
}

/// Decompress a gzip byte buffer
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut decoder = GzDecoder::new(data);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| Error::ParseError(format!("Failed to decompress data: {e}")))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data = b"some data to compress, repeated: some data to compress";
        let compressed = compress(data).unwrap();
        let restored = decompress(&compressed).unwrap();

        assert_eq!(restored, data);
    }

    #[test]
    fn test_compressed_output_is_gzip() {
        let compressed = compress(b"payload").unwrap();
        // Gzip magic: 1f 8b
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_empty_is_noop() {
        assert!(compress(b"").unwrap().is_empty());
        assert!(decompress(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decompress_garbage_fails() {
        let result = decompress(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(Error::ParseError(_))));
    }
}
