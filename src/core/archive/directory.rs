//! Central directory and end-of-central-directory trailer bookkeeping
//!
//! New members are written where the old directory started; the old
//! directory bytes are kept in memory and re-emitted after the new member,
//! followed by the new record and a fresh trailer:
//!
//! ```text
//! before:  [m0][m1][dir: r0 r1][trailer]
//! after:   [m0][m1][m2][dir: r0 r1 r2][trailer']
//!                   ^ old directory offset
//! ```

use super::entry::CentralDirectoryRecord;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{NpyError, Result};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

pub const TRAILER_LEN: usize = 22;
/// Second half of the trailer signature, after "PK"
pub const TRAILER_TAG: u16 = 0x0605;

/// End-of-central-directory trailer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_start: u16,
    pub entries_on_disk: u16,
    pub total_entries: u16,
    pub directory_size: u32,
    pub directory_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Trailer for a single-disk archive without comment
    pub fn new(entries: u16, directory_size: u32, directory_offset: u32) -> Self {
        EndOfCentralDirectory {
            disk_number: 0,
            disk_start: 0,
            entries_on_disk: entries,
            total_entries: entries,
            directory_size,
            directory_offset,
            comment_len: 0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = ByteWriter::with_capacity(TRAILER_LEN);
        out.write_ascii("PK");
        out.write_u16_le(TRAILER_TAG);
        out.write_u16_le(self.disk_number);
        out.write_u16_le(self.disk_start);
        out.write_u16_le(self.entries_on_disk);
        out.write_u16_le(self.total_entries);
        out.write_u32_le(self.directory_size);
        out.write_u32_le(self.directory_offset);
        out.write_u16_le(self.comment_len);
        out.into_inner()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        if reader.read_bytes(2)? != b"PK" || reader.read_u16_le()? != TRAILER_TAG {
            return Err(NpyError::format(
                "end of central directory signature not found",
            ));
        }

        Ok(EndOfCentralDirectory {
            disk_number: reader.read_u16_le()?,
            disk_start: reader.read_u16_le()?,
            entries_on_disk: reader.read_u16_le()?,
            total_entries: reader.read_u16_le()?,
            directory_size: reader.read_u32_le()?,
            directory_offset: reader.read_u32_le()?,
            comment_len: reader.read_u16_le()?,
        })
    }

    /// Reject spanned archives, archive comments and ZIP64 markers
    pub fn validate(&self) -> Result<()> {
        if self.disk_number != 0 || self.disk_start != 0 {
            return Err(NpyError::UnsupportedFeature(format!(
                "multi-disk archive (disk {}, directory starts on disk {})",
                self.disk_number, self.disk_start
            )));
        }
        if self.entries_on_disk != self.total_entries {
            return Err(NpyError::UnsupportedFeature(format!(
                "spanned archive ({} of {} entries on this disk)",
                self.entries_on_disk, self.total_entries
            )));
        }
        if self.comment_len != 0 {
            return Err(NpyError::UnsupportedFeature(format!(
                "archive comment of {} bytes",
                self.comment_len
            )));
        }
        if self.total_entries == u16::MAX
            || self.directory_size == u32::MAX
            || self.directory_offset == u32::MAX
        {
            return Err(NpyError::UnsupportedFeature("ZIP64 archive".to_string()));
        }
        Ok(())
    }
}

/// Running central directory of an archive being extended
#[derive(Debug, Clone, Default)]
pub struct CentralDirectory {
    entry_count: u16,
    records: Vec<u8>,
    offset: u64,
}

impl CentralDirectory {
    /// Directory of a new, empty archive
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the trailer and directory bytes of an existing archive
    ///
    /// Leaves the stream position unspecified; callers seek to
    /// [`offset`](Self::offset) before writing.
    pub fn read_from<F: Read + Seek>(file: &mut F) -> Result<Self> {
        let file_len = file.seek(SeekFrom::End(0))?;
        if file_len < TRAILER_LEN as u64 {
            return Err(NpyError::format(format!(
                "{} bytes is too short to hold an archive trailer",
                file_len
            )));
        }

        let trailer_start = file_len - TRAILER_LEN as u64;
        file.seek(SeekFrom::Start(trailer_start))?;
        let mut raw = [0u8; TRAILER_LEN];
        file.read_exact(&mut raw)?;
        let trailer = match EndOfCentralDirectory::from_bytes(&raw) {
            Ok(trailer) => trailer,
            Err(err) => return Err(Self::commented_trailer(file, file_len).unwrap_or(err)),
        };
        trailer.validate()?;

        let offset = trailer.directory_offset as u64;
        let size = trailer.directory_size as u64;
        if offset + size != trailer_start {
            return Err(NpyError::format(format!(
                "central directory ({} bytes at {}) does not end at the trailer ({})",
                size, offset, trailer_start
            )));
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut records = vec![0u8; size as usize];
        file.read_exact(&mut records)?;

        debug!(
            "Read central directory: {} entries, {} bytes at offset {}",
            trailer.total_entries, size, offset
        );

        Ok(CentralDirectory {
            entry_count: trailer.total_entries,
            records,
            offset,
        })
    }

    /// Error for a trailer that sits before a trailing comment, if one exists
    ///
    /// A comment is at most `u16::MAX` bytes, so only that much of the tail
    /// is searched.
    fn commented_trailer<F: Read + Seek>(file: &mut F, file_len: u64) -> Option<NpyError> {
        let window = file_len.min((u16::MAX as usize + TRAILER_LEN) as u64);
        file.seek(SeekFrom::Start(file_len - window)).ok()?;
        let mut tail = Vec::with_capacity(window as usize);
        file.by_ref().take(window).read_to_end(&mut tail).ok()?;

        let signature = [b'P', b'K', 0x05, 0x06];
        let last_start = tail.len().checked_sub(TRAILER_LEN)?;
        let found = tail[..last_start + signature.len()]
            .windows(signature.len())
            .rposition(|w| w == signature)?;
        let comment_len = tail.len() - found - TRAILER_LEN;
        debug!("Found archive trailer followed by {} comment bytes", comment_len);
        Some(NpyError::UnsupportedFeature(format!(
            "archive comment of {} bytes",
            comment_len
        )))
    }

    /// Offset where the directory starts, and where the next member goes
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn entry_count(&self) -> u16 {
        self.entry_count
    }

    /// Raw directory bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.records
    }

    /// Register a member just written at [`offset`](Self::offset)
    pub fn push(&mut self, record: &CentralDirectoryRecord, member_len: u64) -> Result<()> {
        let entry_count = self
            .entry_count
            .checked_add(1)
            .filter(|n| *n < u16::MAX)
            .ok_or_else(|| {
                NpyError::UnsupportedFeature(format!(
                    "more than {} archive entries (ZIP64 is not supported)",
                    u16::MAX - 1
                ))
            })?;

        let bytes = record.to_bytes();
        let offset = self.offset + member_len;
        let directory_end = offset + (self.records.len() + bytes.len()) as u64;
        if directory_end >= u32::MAX as u64 {
            return Err(NpyError::UnsupportedFeature(
                "archive grows past 4 GiB (ZIP64 is not supported)".to_string(),
            ));
        }

        self.records.extend_from_slice(&bytes);
        self.entry_count = entry_count;
        self.offset = offset;
        Ok(())
    }

    /// Trailer describing the current directory
    pub fn trailer(&self) -> EndOfCentralDirectory {
        // push() keeps offset and size below u32::MAX
        EndOfCentralDirectory::new(
            self.entry_count,
            self.records.len() as u32,
            self.offset as u32,
        )
    }

    /// Write directory bytes and trailer at the current stream position
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.records)?;
        out.write_all(&self.trailer().to_bytes())?;
        Ok(())
    }

    /// Parse every record in the directory
    pub fn records(&self) -> Result<Vec<CentralDirectoryRecord>> {
        let mut reader = ByteReader::new(&self.records);
        let mut records = Vec::with_capacity(self.entry_count as usize);
        for _ in 0..self.entry_count {
            records.push(CentralDirectoryRecord::read(&mut reader)?);
        }
        if reader.remaining() != 0 {
            return Err(NpyError::format(format!(
                "{} stray bytes after {} directory records",
                reader.remaining(),
                self.entry_count
            )));
        }
        Ok(records)
    }
}
