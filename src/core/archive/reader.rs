//! Sequential member scanner
//!
//! Walks local headers from the start of the file and stops at the first
//! block that does not carry the local header tag, which is normally the
//! start of the central directory. The directory itself is not consulted.

use super::entry::{
    is_local_header, LocalFileHeader, FLAG_DATA_DESCRIPTOR, FLAG_ENCRYPTED, LOCAL_HEADER_LEN,
};
use crate::buffer::TypedBuffer;
use crate::compression::{decompress, CompressionMethod};
use crate::error::{NpyError, Result};
use crate::header::ArrayHeader;
use crate::validation::strip_member_suffix;
use std::io::{self, Read};
use tracing::{debug, warn};

/// A member whose local header has been read; the stream sits at its data
#[derive(Debug, Clone)]
pub struct LocalMember {
    /// Logical name, suffix stripped
    pub name: String,
    pub header: LocalFileHeader,
    method: CompressionMethod,
}

impl LocalMember {
    pub fn method(&self) -> CompressionMethod {
        self.method
    }
}

pub struct ArchiveReader<R> {
    reader: R,
    verify_checksums: bool,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R, verify_checksums: bool) -> Self {
        ArchiveReader {
            reader,
            verify_checksums,
        }
    }

    /// Read the next local header and name
    ///
    /// Returns `None` once the member sequence ends.
    pub fn next_member(&mut self) -> Result<Option<LocalMember>> {
        let mut block = [0u8; LOCAL_HEADER_LEN];
        let filled = read_up_to(&mut self.reader, &mut block)?;
        if !is_local_header(&block[..filled]) {
            return Ok(None);
        }
        if filled < LOCAL_HEADER_LEN {
            return Err(NpyError::unexpected_eof("local file header"));
        }

        let header = LocalFileHeader::from_bytes(&block)?;
        let mut raw_name = vec![0u8; header.name_len as usize];
        self.reader.read_exact(&mut raw_name)?;
        skip_bytes(&mut self.reader, header.extra_len as u64, "local header extra field")?;

        let file_name = String::from_utf8_lossy(&raw_name).into_owned();
        let (name, had_suffix) = strip_member_suffix(&file_name);
        if !had_suffix {
            warn!("Archive member {:?} has no .npy suffix", file_name);
        }

        if header.flags & FLAG_ENCRYPTED != 0 {
            return Err(NpyError::UnsupportedFeature(format!(
                "member '{}' is encrypted",
                name
            )));
        }
        if header.flags & FLAG_DATA_DESCRIPTOR != 0 {
            return Err(NpyError::UnsupportedFeature(format!(
                "member '{}' records its sizes in a trailing data descriptor",
                name
            )));
        }
        let method = CompressionMethod::from_u16(header.compression_method).ok_or_else(|| {
            NpyError::UnsupportedFeature(format!(
                "member '{}' uses compression method {}",
                name, header.compression_method
            ))
        })?;
        if method == CompressionMethod::Stored
            && header.compressed_size != header.uncompressed_size
        {
            return Err(NpyError::format(format!(
                "stored member '{}' has differing sizes ({} vs {})",
                name, header.compressed_size, header.uncompressed_size
            )));
        }

        debug!(
            "Found member '{}' ({:?}, {} -> {} bytes)",
            name, method, header.compressed_size, header.uncompressed_size
        );

        Ok(Some(LocalMember {
            name: name.to_string(),
            header,
            method,
        }))
    }

    /// Read and decode the data of the member just returned
    pub fn read_array(&mut self, member: &LocalMember) -> Result<TypedBuffer> {
        let mut raw = Vec::new();
        (&mut self.reader)
            .take(member.header.compressed_size as u64)
            .read_to_end(&mut raw)?;
        if raw.len() < member.header.compressed_size as usize {
            return Err(NpyError::unexpected_eof(&format!("data of member '{}'", member.name)));
        }

        let bytes = decompress(raw, member.method, member.header.uncompressed_size as usize)?;
        if self.verify_checksums {
            let actual = crc32fast::hash(&bytes);
            if actual != member.header.crc32 {
                return Err(NpyError::ChecksumMismatch {
                    name: member.name.clone(),
                    expected: member.header.crc32,
                    actual,
                });
            }
        }

        decode_member_bytes(&member.name, &bytes, member.method)
    }

    /// Skip the data of the member just returned
    pub fn skip_data(&mut self, member: &LocalMember) -> Result<()> {
        skip_bytes(
            &mut self.reader,
            member.header.compressed_size as u64,
            &format!("data of member '{}'", member.name),
        )
    }
}

/// Decode an array file held in memory
///
/// Stored members carry the payload directly after the array header.
/// Inflated members are read from the tail of the buffer, the layout other
/// writers are known to produce.
fn decode_member_bytes(name: &str, bytes: &[u8], method: CompressionMethod) -> Result<TypedBuffer> {
    let (header, header_len) = ArrayHeader::from_bytes(bytes)?;
    let payload_len = header.payload_len()?;

    let start = match method {
        CompressionMethod::Stored => header_len,
        CompressionMethod::Deflate => bytes.len().checked_sub(payload_len).ok_or_else(|| {
            NpyError::unexpected_eof(&format!("payload of member '{}'", name))
        })?,
    };
    if start < header_len || start + payload_len > bytes.len() {
        return Err(NpyError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "member '{}' holds {} bytes, header needs {} + {}",
                name,
                bytes.len(),
                header_len,
                payload_len
            ),
        )));
    }

    TypedBuffer::new(
        header.dtype,
        header.shape,
        header.fortran_order,
        bytes[start..start + payload_len].to_vec(),
    )
}

/// Discard `len` bytes, reading through any buffer instead of seeking
fn skip_bytes<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(NpyError::unexpected_eof(what));
    }
    Ok(())
}

/// Fill as much of `buf` as the stream allows, returning the byte count
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
