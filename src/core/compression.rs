//! Decompression of archive members
//!
//! Archives written by this crate are always stored. Archives written by
//! other tools may deflate their members; those are inflated here on read.
//!
//! **Design**:
//! - Methods: 0 (stored) and 8 (raw deflate, no zlib/gzip wrapper)
//! - The inflated length must equal the size recorded in the local header

use crate::error::{NpyError, Result};
use flate2::read::DeflateDecoder;
use std::io::Read;

/// Compression method field of an archive member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CompressionMethod {
    /// No compression
    Stored = 0,
    /// Raw deflate
    Deflate = 8,
}

impl CompressionMethod {
    /// Convert from the on-disk field
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(CompressionMethod::Stored),
            8 => Some(CompressionMethod::Deflate),
            _ => None,
        }
    }
}

/// Upper bound on how far one deflate byte can expand
const MAX_DEFLATE_RATIO: usize = 1032;

/// Inflate a raw deflate stream into exactly `uncompressed_len` bytes
pub fn inflate(data: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
    let mut out =
        Vec::with_capacity(uncompressed_len.min(data.len().saturating_mul(MAX_DEFLATE_RATIO)));
    // One extra byte lets an over-long stream be told apart from an exact one.
    let mut decoder = DeflateDecoder::new(data).take(uncompressed_len as u64 + 1);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| NpyError::format(format!("deflate stream is corrupt: {}", e)))?;

    if out.len() > uncompressed_len {
        return Err(NpyError::format(format!(
            "deflate stream inflates past the recorded {} bytes",
            uncompressed_len
        )));
    }
    if out.len() < uncompressed_len {
        return Err(NpyError::format(format!(
            "deflate stream inflated to {} bytes, expected {}",
            out.len(),
            uncompressed_len
        )));
    }

    Ok(out)
}

/// Decode member bytes according to `method`
pub fn decompress(data: Vec<u8>, method: CompressionMethod, uncompressed_len: usize) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Stored => Ok(data),
        CompressionMethod::Deflate => inflate(&data, uncompressed_len),
    }
}
