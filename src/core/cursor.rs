//! Byte-level readers and writers for the fixed binary structures
//!
//! All multi-byte integers in both the array preamble and the archive
//! records are little-endian, so every accessor here is explicitly `_le`.

use crate::error::{NpyError, Result};

/// Bounds-checked cursor over a borrowed byte slice
#[derive(Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, pos: 0 }
    }

    /// Current offset from the start of the slice
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Take the next `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(NpyError::unexpected_eof("field"));
        }
        let out = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a little-endian `u16`
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian `u32`
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Growable byte sink with typed little-endian writers
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append a `u16` in little-endian order
    pub fn write_u16_le(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a `u32` in little-endian order
    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append the bytes of an ASCII string (no terminator, no length prefix)
    pub fn write_ascii(&mut self, text: &str) {
        debug_assert!(text.is_ascii());
        self.buf.extend_from_slice(text.as_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_is_little_endian() {
        let mut w = ByteWriter::new();
        w.write_ascii("PK");
        w.write_u16_le(0x0403);
        w.write_u32_le(0x1234_5678);
        assert_eq!(
            w.into_inner(),
            vec![b'P', b'K', 0x03, 0x04, 0x78, 0x56, 0x34, 0x12]
        );
    }

    #[test]
    fn test_reader_sequence() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16_le().unwrap(), 0x0302);
        assert_eq!(r.read_u32_le().unwrap(), 0x0706_0504);
        assert_eq!(r.position(), 7);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_reader_short_read_is_io_error() {
        let bytes = [0xAA, 0xBB, 0xCC];
        let mut r = ByteReader::new(&bytes);
        r.skip(2).unwrap();
        let err = r.read_u16_le().unwrap_err();
        assert!(matches!(err, NpyError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
        // Failed reads do not advance
        assert_eq!(r.position(), 2);
    }
}
