//! Element type descriptors
//!
//! A descriptor is the `descr` string of an array header, e.g. `<f8`: a
//! byte-order marker, a one-character kind code and a byte width. Rust types
//! map onto descriptors through the [`Element`] trait, so the mapping is fixed
//! at compile time and never inferred from data.

use crate::error::{NpyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte-order marker of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `|`, used for single-byte types
    NotApplicable,
}

impl ByteOrder {
    pub fn as_char(self) -> char {
        match self {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
            ByteOrder::NotApplicable => '|',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(ByteOrder::Little),
            '>' => Some(ByteOrder::Big),
            '|' => Some(ByteOrder::NotApplicable),
            _ => None,
        }
    }
}

/// One-character kind code of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DtypeKind {
    Float,
    SignedInt,
    UnsignedInt,
    Bool,
    Complex,
    /// Any kind code this crate has no element type for
    Unknown,
}

impl DtypeKind {
    pub fn as_char(self) -> char {
        match self {
            DtypeKind::Float => 'f',
            DtypeKind::SignedInt => 'i',
            DtypeKind::UnsignedInt => 'u',
            DtypeKind::Bool => 'b',
            DtypeKind::Complex => 'c',
            DtypeKind::Unknown => '?',
        }
    }

    pub fn from_char(c: char) -> Self {
        match c {
            'f' => DtypeKind::Float,
            'i' => DtypeKind::SignedInt,
            'u' => DtypeKind::UnsignedInt,
            'b' => DtypeKind::Bool,
            'c' => DtypeKind::Complex,
            _ => DtypeKind::Unknown,
        }
    }
}

/// Parsed `descr` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dtype {
    pub byte_order: ByteOrder,
    pub kind: DtypeKind,
    pub word_size: usize,
}

impl Dtype {
    /// Descriptor for little-endian data of the given kind and width
    ///
    /// Single-byte types get the not-applicable marker.
    pub fn new(kind: DtypeKind, word_size: usize) -> Self {
        let byte_order = if word_size == 1 {
            ByteOrder::NotApplicable
        } else {
            ByteOrder::Little
        };
        Dtype {
            byte_order,
            kind,
            word_size,
        }
    }

    /// Descriptor of a Rust element type
    pub fn of<T: Element>() -> Self {
        Dtype::new(T::KIND, T::WORD_SIZE)
    }

    /// Render as a header `descr` string such as `<f8`
    pub fn descr(&self) -> String {
        format!(
            "{}{}{}",
            self.byte_order.as_char(),
            self.kind.as_char(),
            self.word_size
        )
    }

    /// Parse a `descr` string
    ///
    /// Only little-endian and not-applicable byte orders are accepted.
    pub fn parse(descr: &str) -> Result<Self> {
        let mut chars = descr.chars();
        let order_char = chars
            .next()
            .ok_or_else(|| NpyError::format("empty descr"))?;
        let byte_order = ByteOrder::from_char(order_char)
            .ok_or(NpyError::UnsupportedByteOrder(order_char))?;
        if byte_order == ByteOrder::Big {
            return Err(NpyError::UnsupportedByteOrder(order_char));
        }

        let kind_char = chars
            .next()
            .ok_or_else(|| NpyError::format(format!("descr '{}' has no type code", descr)))?;
        let kind = DtypeKind::from_char(kind_char);

        let width: String = chars.take_while(|c| c.is_ascii_digit()).collect();
        let word_size = width
            .parse::<usize>()
            .map_err(|_| NpyError::format(format!("descr '{}' has no byte width", descr)))?;
        if word_size == 0 {
            return Err(NpyError::format(format!("descr '{}' has zero width", descr)));
        }

        Ok(Dtype {
            byte_order,
            kind,
            word_size,
        })
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descr())
    }
}

/// A fixed-width value that can be stored in an array payload
///
/// Implementations encode to and decode from little-endian bytes
/// explicitly, so the payload layout does not depend on the host.
pub trait Element: Copy + 'static {
    const KIND: DtypeKind;
    const WORD_SIZE: usize;

    /// Append the little-endian encoding of `self`
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly `WORD_SIZE` little-endian bytes
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($kind:expr => $($ty:ty),+) => {
        $(
            impl Element for $ty {
                const KIND: DtypeKind = $kind;
                const WORD_SIZE: usize = std::mem::size_of::<$ty>();

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )+
    };
}

impl_element!(DtypeKind::UnsignedInt => u8, u16, u32, u64);
impl_element!(DtypeKind::SignedInt => i8, i16, i32, i64);
impl_element!(DtypeKind::Float => f32, f64);

impl Element for bool {
    const KIND: DtypeKind = DtypeKind::Bool;
    const WORD_SIZE: usize = 1;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

#[cfg(feature = "complex")]
macro_rules! impl_complex_element {
    ($($part:ty),+) => {
        $(
            impl Element for num_complex::Complex<$part> {
                const KIND: DtypeKind = DtypeKind::Complex;
                const WORD_SIZE: usize = 2 * std::mem::size_of::<$part>();

                fn write_le(self, out: &mut Vec<u8>) {
                    self.re.write_le(out);
                    self.im.write_le(out);
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let half = std::mem::size_of::<$part>();
                    num_complex::Complex::new(
                        <$part>::read_le(&bytes[..half]),
                        <$part>::read_le(&bytes[half..]),
                    )
                }
            }
        )+
    };
}

#[cfg(feature = "complex")]
impl_complex_element!(f32, f64);

/// Encode a slice of elements as a contiguous little-endian payload
pub fn encode_elements<T: Element>(elements: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(elements.len() * T::WORD_SIZE);
    for &value in elements {
        value.write_le(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_descriptors() {
        assert_eq!(Dtype::of::<f64>().descr(), "<f8");
        assert_eq!(Dtype::of::<f32>().descr(), "<f4");
        assert_eq!(Dtype::of::<i64>().descr(), "<i8");
        assert_eq!(Dtype::of::<i16>().descr(), "<i2");
        assert_eq!(Dtype::of::<u32>().descr(), "<u4");
        assert_eq!(Dtype::of::<u8>().descr(), "|u1");
        assert_eq!(Dtype::of::<i8>().descr(), "|i1");
        assert_eq!(Dtype::of::<bool>().descr(), "|b1");
    }

    #[cfg(feature = "complex")]
    #[test]
    fn test_complex_descriptors() {
        use num_complex::Complex;
        assert_eq!(Dtype::of::<Complex<f32>>().descr(), "<c8");
        assert_eq!(Dtype::of::<Complex<f64>>().descr(), "<c16");

        let mut out = Vec::new();
        Complex::new(1.5f64, -2.0).write_le(&mut out);
        assert_eq!(out.len(), 16);
        assert_eq!(Complex::<f64>::read_le(&out), Complex::new(1.5, -2.0));
    }

    #[test]
    fn test_parse_descr() {
        let dtype = Dtype::parse("<c16").unwrap();
        assert_eq!(dtype.kind, DtypeKind::Complex);
        assert_eq!(dtype.word_size, 16);
        assert_eq!(dtype.byte_order, ByteOrder::Little);

        let dtype = Dtype::parse("|b1").unwrap();
        assert_eq!(dtype.kind, DtypeKind::Bool);
        assert_eq!(dtype.byte_order, ByteOrder::NotApplicable);

        let dtype = Dtype::parse("<V12").unwrap();
        assert_eq!(dtype.kind, DtypeKind::Unknown);
        assert_eq!(dtype.word_size, 12);
    }

    #[test]
    fn test_parse_rejects_big_endian() {
        let err = Dtype::parse(">f8").unwrap_err();
        assert!(matches!(err, NpyError::UnsupportedByteOrder('>')));

        let err = Dtype::parse("=f8").unwrap_err();
        assert!(matches!(err, NpyError::UnsupportedByteOrder('=')));
    }

    #[test]
    fn test_parse_rejects_missing_width() {
        assert!(matches!(Dtype::parse("<f"), Err(NpyError::Format(_))));
        assert!(matches!(Dtype::parse("<f0"), Err(NpyError::Format(_))));
        assert!(matches!(Dtype::parse(""), Err(NpyError::Format(_))));
    }

    #[test]
    fn test_encode_is_little_endian() {
        let bytes = encode_elements(&[1u16, 0x0203]);
        assert_eq!(bytes, vec![0x01, 0x00, 0x03, 0x02]);

        let bytes = encode_elements(&[true, false, true]);
        assert_eq!(bytes, vec![1, 0, 1]);

        let bytes = encode_elements(&[-1.5f64]);
        assert_eq!(f64::read_le(&bytes), -1.5);
    }
}
