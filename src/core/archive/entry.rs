//! Local file headers and central directory records
//!
//! ```text
//! Local file header (30 bytes + name + extra)
//!  0  "PK" 0x03 0x04
//!  4  u16 version needed to extract
//!  6  u16 general purpose flags
//!  8  u16 compression method
//! 10  u16 last mod time
//! 12  u16 last mod date
//! 14  u32 CRC-32
//! 18  u32 compressed size
//! 22  u32 uncompressed size
//! 26  u16 name length
//! 28  u16 extra field length
//!
//! Central directory record (46 bytes + name + extra + comment)
//!  0  "PK" 0x01 0x02
//!  4  u16 version made by
//!  6  bytes 4..30 of the local header
//! 32  u16 comment length
//! 34  u16 disk number start
//! 36  u16 internal attributes
//! 38  u32 external attributes
//! 42  u32 offset of local header
//! ```

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{NpyError, Result};
use crate::validation::{strip_member_suffix, MemberName};
use serde::{Deserialize, Serialize};

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;

/// Second half of the local header signature, after "PK"
pub const LOCAL_HEADER_TAG: u16 = 0x0403;
/// Second half of the central directory record signature, after "PK"
pub const CENTRAL_HEADER_TAG: u16 = 0x0201;

pub const VERSION_NEEDED: u16 = 20;
pub const VERSION_MADE_BY: u16 = 20;

/// Member is encrypted
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// Sizes and CRC follow the data in a trailing descriptor
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Whether a raw block starts with the local header signature tag
///
/// Only bytes 2 and 3 are compared; a mismatch marks the end of the
/// member sequence.
pub fn is_local_header(block: &[u8]) -> bool {
    block.len() >= 4 && block[2..4] == LOCAL_HEADER_TAG.to_le_bytes()
}

/// Fixed part of a local file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: u16,
    pub extra_len: u16,
}

impl LocalFileHeader {
    /// Header for an uncompressed member with zeroed timestamps
    pub fn stored(crc32: u32, size: u32, name_len: u16) -> Self {
        LocalFileHeader {
            version_needed: VERSION_NEEDED,
            flags: 0,
            compression_method: 0,
            mod_time: 0,
            mod_date: 0,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            name_len,
            extra_len: 0,
        }
    }

    /// Fields shared verbatim with the central directory record
    fn write_common(&self, out: &mut ByteWriter) {
        out.write_u16_le(self.version_needed);
        out.write_u16_le(self.flags);
        out.write_u16_le(self.compression_method);
        out.write_u16_le(self.mod_time);
        out.write_u16_le(self.mod_date);
        out.write_u32_le(self.crc32);
        out.write_u32_le(self.compressed_size);
        out.write_u32_le(self.uncompressed_size);
        out.write_u16_le(self.name_len);
        out.write_u16_le(self.extra_len);
    }

    fn read_common(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(LocalFileHeader {
            version_needed: reader.read_u16_le()?,
            flags: reader.read_u16_le()?,
            compression_method: reader.read_u16_le()?,
            mod_time: reader.read_u16_le()?,
            mod_date: reader.read_u16_le()?,
            crc32: reader.read_u32_le()?,
            compressed_size: reader.read_u32_le()?,
            uncompressed_size: reader.read_u32_le()?,
            name_len: reader.read_u16_le()?,
            extra_len: reader.read_u16_le()?,
        })
    }

    /// Serialize the 30-byte fixed header (name not included)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = ByteWriter::with_capacity(LOCAL_HEADER_LEN);
        out.write_ascii("PK");
        out.write_u16_le(LOCAL_HEADER_TAG);
        self.write_common(&mut out);
        out.into_inner()
    }

    /// Parse a 30-byte fixed header
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        if reader.read_bytes(2)? != b"PK" || reader.read_u16_le()? != LOCAL_HEADER_TAG {
            return Err(NpyError::format("bad local file header signature"));
        }
        Self::read_common(&mut reader)
    }
}

/// One central directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryRecord {
    pub header: LocalFileHeader,
    pub local_header_offset: u32,
    pub file_name: String,
}

impl CentralDirectoryRecord {
    /// Serialized record, name included
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = ByteWriter::with_capacity(CENTRAL_HEADER_LEN + self.file_name.len());
        out.write_ascii("PK");
        out.write_u16_le(CENTRAL_HEADER_TAG);
        out.write_u16_le(VERSION_MADE_BY);
        self.header.write_common(&mut out);
        out.write_u16_le(0); // comment length
        out.write_u16_le(0); // disk number start
        out.write_u16_le(0); // internal attributes
        out.write_u32_le(0); // external attributes
        out.write_u32_le(self.local_header_offset);
        out.write_bytes(self.file_name.as_bytes());
        out.into_inner()
    }

    /// Parse the next record, skipping its extra field and comment
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        if reader.read_bytes(2)? != b"PK" || reader.read_u16_le()? != CENTRAL_HEADER_TAG {
            return Err(NpyError::format(format!(
                "bad central directory record signature at offset {}",
                reader.position().saturating_sub(4)
            )));
        }
        let _version_made_by = reader.read_u16_le()?;
        let header = LocalFileHeader::read_common(reader)?;
        let comment_len = reader.read_u16_le()?;
        let _disk_start = reader.read_u16_le()?;
        let _internal_attrs = reader.read_u16_le()?;
        let _external_attrs = reader.read_u32_le()?;
        let local_header_offset = reader.read_u32_le()?;

        let name = reader.read_bytes(header.name_len as usize)?;
        reader.skip(header.extra_len as usize + comment_len as usize)?;

        Ok(CentralDirectoryRecord {
            header,
            local_header_offset,
            file_name: String::from_utf8_lossy(name).into_owned(),
        })
    }

    pub fn descriptor(&self) -> MemberDescriptor {
        MemberDescriptor {
            name: strip_member_suffix(&self.file_name).0.to_string(),
            compression_method: self.header.compression_method,
            compressed_size: self.header.compressed_size,
            uncompressed_size: self.header.uncompressed_size,
            crc32: self.header.crc32,
            local_header_offset: self.local_header_offset,
        }
    }
}

/// Summary of one archive member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    /// Logical name, suffix stripped
    pub name: String,
    /// 0 = stored, 8 = deflate
    pub compression_method: u16,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub crc32: u32,
    pub local_header_offset: u32,
}

/// A stored member ready to be written at a known offset
#[derive(Debug, Clone)]
pub struct MemberEntry {
    header: LocalFileHeader,
    file_name: String,
    local_header_offset: u32,
}

impl MemberEntry {
    /// Describe a stored member whose data is `array_header ++ payload`
    ///
    /// The CRC is computed over exactly those bytes.
    pub fn stored(
        name: &MemberName,
        array_header: &[u8],
        payload: &[u8],
        local_header_offset: u64,
    ) -> Result<Self> {
        let file_name = name.file_name();
        let name_len = u16::try_from(file_name.len()).map_err(|_| {
            NpyError::UnsupportedFeature(format!("member name {} is too long", name))
        })?;

        let size = u32::try_from(array_header.len() + payload.len()).map_err(|_| {
            NpyError::UnsupportedFeature(format!(
                "member '{}' is larger than 4 GiB (ZIP64 is not supported)",
                name
            ))
        })?;
        let local_header_offset = u32::try_from(local_header_offset).map_err(|_| {
            NpyError::UnsupportedFeature(
                "archive grows past 4 GiB (ZIP64 is not supported)".to_string(),
            )
        })?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(array_header);
        hasher.update(payload);

        Ok(MemberEntry {
            header: LocalFileHeader::stored(hasher.finalize(), size, name_len),
            file_name,
            local_header_offset,
        })
    }

    pub fn header(&self) -> &LocalFileHeader {
        &self.header
    }

    /// Local header followed by the stored name
    pub fn local_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes();
        out.extend_from_slice(self.file_name.as_bytes());
        out
    }

    pub fn central_record(&self) -> CentralDirectoryRecord {
        CentralDirectoryRecord {
            header: self.header,
            local_header_offset: self.local_header_offset,
            file_name: self.file_name.clone(),
        }
    }

    /// Bytes the member occupies on disk: header, name and data
    pub fn total_len(&self) -> u64 {
        (LOCAL_HEADER_LEN + self.file_name.len()) as u64 + self.header.compressed_size as u64
    }
}
