//! Array file header codec
//!
//! Layout (version 1.0):
//!
//! ```text
//! offset 0   0x93 'N' 'U' 'M' 'P' 'Y'
//! offset 6   major version (1), minor version (0)
//! offset 8   u16 LE dictionary length
//! offset 10  ASCII dictionary, space padded, newline terminated,
//!            so that 10 + length is a multiple of 16
//! ```
//!
//! Versions 2.0 and 3.0 widen the length field to u32 (12-byte preamble)
//! and are accepted on read. Writes always produce 1.0.

use crate::buffer::payload_len;
use crate::cursor::{ByteReader, ByteWriter};
use crate::dtype::Dtype;
use crate::error::{NpyError, Result};
use std::io::Read;

pub const MAGIC: [u8; 6] = *b"\x93NUMPY";
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// Preamble length for version 1.0 (magic + version + u16 length)
pub const PREAMBLE_LEN: usize = 10;
/// Preamble length for versions 2.0 and 3.0
pub const PREAMBLE_LEN_V2: usize = 12;
/// Total header length is always a multiple of this
pub const HEADER_ALIGNMENT: usize = 16;

/// Decoded array header dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayHeader {
    pub dtype: Dtype,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl ArrayHeader {
    /// Header for C-ordered data
    pub fn new(dtype: Dtype, shape: Vec<usize>) -> Self {
        ArrayHeader {
            dtype,
            fortran_order: false,
            shape,
        }
    }

    /// Byte length of the payload this header describes
    pub fn payload_len(&self) -> Result<usize> {
        payload_len(&self.dtype, &self.shape)
    }

    fn dictionary(&self) -> String {
        let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
        let mut shape = dims.join(", ");
        if self.shape.len() == 1 {
            // one-element tuple
            shape.push(',');
        }

        format!(
            "{{'descr': '{}', 'fortran_order': {}, 'shape': ({}), }}",
            self.dtype.descr(),
            if self.fortran_order { "True" } else { "False" },
            shape
        )
    }

    /// Serialize as a version 1.0 header
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut dict = self.dictionary().into_bytes();
        let pad = HEADER_ALIGNMENT - (PREAMBLE_LEN + dict.len()) % HEADER_ALIGNMENT;
        dict.resize(dict.len() + pad, b' ');
        if let Some(last) = dict.last_mut() {
            *last = b'\n';
        }

        let dict_len = u16::try_from(dict.len()).map_err(|_| {
            NpyError::format(format!(
                "header dictionary of {} bytes does not fit a version 1.0 header",
                dict.len()
            ))
        })?;

        let mut out = ByteWriter::with_capacity(PREAMBLE_LEN + dict.len());
        out.write_bytes(&MAGIC);
        out.write_u8(VERSION_MAJOR);
        out.write_u8(VERSION_MINOR);
        out.write_u16_le(dict_len);
        out.write_bytes(&dict);
        Ok(out.into_inner())
    }

    /// Decode a header at the start of `bytes`
    ///
    /// Returns the header and its total encoded length, i.e. the offset of
    /// the payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut reader = ByteReader::new(bytes);
        let dict_len = read_preamble(&mut reader)?;
        let dict = reader.read_bytes(dict_len)?;
        let header = Self::parse_dictionary(dict)?;
        Ok((header, reader.position()))
    }

    /// Decode a header from a stream positioned at its first byte
    ///
    /// Consumes exactly the header; the stream is left at the payload.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let mut preamble = vec![0u8; PREAMBLE_LEN];
        reader.read_exact(&mut preamble)?;
        if preamble[..MAGIC.len()] != MAGIC {
            return Err(NpyError::InvalidMagic);
        }
        if preamble[6] == 2 || preamble[6] == 3 {
            let mut tail = [0u8; PREAMBLE_LEN_V2 - PREAMBLE_LEN];
            reader.read_exact(&mut tail)?;
            preamble.extend_from_slice(&tail);
        }

        let dict_len = read_preamble(&mut ByteReader::new(&preamble))?;
        // Version 2.0 lengths are untrusted u32s; only allocate what arrives
        let mut dict = Vec::new();
        reader.by_ref().take(dict_len as u64).read_to_end(&mut dict)?;
        if dict.len() < dict_len {
            return Err(NpyError::unexpected_eof("array header dictionary"));
        }
        let header = Self::parse_dictionary(&dict)?;
        Ok((header, preamble.len() + dict_len))
    }

    fn parse_dictionary(raw: &[u8]) -> Result<Self> {
        let dict = std::str::from_utf8(raw)
            .map_err(|_| NpyError::format("header dictionary is not valid UTF-8"))?;

        let fortran_order = {
            let value = value_after_key(dict, "fortran_order")?;
            if value.starts_with("True") {
                true
            } else if value.starts_with("False") {
                false
            } else {
                return Err(NpyError::format(format!(
                    "fortran_order is neither True nor False: {:?}",
                    value.chars().take(8).collect::<String>()
                )));
            }
        };

        let shape = {
            let value = value_after_key(dict, "shape")?;
            let open = value.find('(').ok_or(NpyError::MissingHeaderKey("shape"))?;
            let close = value[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or(NpyError::MissingHeaderKey("shape"))?;
            parse_dims(&value[open + 1..close])?
        };

        let dtype = {
            let value = value_after_key(dict, "descr")?;
            let quote = value
                .chars()
                .next()
                .filter(|c| *c == '\'' || *c == '"')
                .ok_or_else(|| NpyError::format("descr is not a quoted string"))?;
            let body = &value[1..];
            let end = body
                .find(quote)
                .ok_or_else(|| NpyError::format("unterminated descr string"))?;
            Dtype::parse(&body[..end])?
        };

        Ok(ArrayHeader {
            dtype,
            fortran_order,
            shape,
        })
    }
}

/// Validate magic and version, returning the dictionary length
fn read_preamble(reader: &mut ByteReader<'_>) -> Result<usize> {
    if reader.remaining() < PREAMBLE_LEN {
        return Err(NpyError::unexpected_eof("array header preamble"));
    }
    if reader.read_bytes(MAGIC.len())? != MAGIC {
        return Err(NpyError::InvalidMagic);
    }

    let major = reader.read_u8()?;
    let minor = reader.read_u8()?;
    match (major, minor) {
        (1, 0) => Ok(reader.read_u16_le()? as usize),
        (2, 0) | (3, 0) => Ok(reader.read_u32_le()? as usize),
        _ => Err(NpyError::UnsupportedVersion { major, minor }),
    }
}

/// Text following `key` and its `':` separator, left-trimmed
fn value_after_key<'a>(dict: &'a str, key: &'static str) -> Result<&'a str> {
    let start = dict.find(key).ok_or(NpyError::MissingHeaderKey(key))?;
    let rest = &dict[start + key.len()..];
    let colon = rest.find(':').ok_or(NpyError::MissingHeaderKey(key))?;
    Ok(rest[colon + 1..].trim_start())
}

/// Decimal integers between the shape parentheses, in order
fn parse_dims(inner: &str) -> Result<Vec<usize>> {
    let mut dims = Vec::new();
    let mut digits = String::new();
    for c in inner.chars().chain(std::iter::once(',')) {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            let dim = digits
                .parse::<usize>()
                .map_err(|_| NpyError::format(format!("shape dimension {} is too large", digits)))?;
            dims.push(dim);
            digits.clear();
        }
    }
    Ok(dims)
}
