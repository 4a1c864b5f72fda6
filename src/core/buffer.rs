//! Owned, shaped array data

use crate::dtype::{encode_elements, Dtype, Element};
use crate::error::{NpyError, Result};
use std::sync::Arc;

/// Number of elements described by a shape
///
/// An empty shape is a 0-d array holding one element. Returns `None` on
/// overflow.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Raw element bytes plus the shape and descriptor needed to interpret them
///
/// Cloning shares the byte region; the bytes are never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBuffer {
    shape: Vec<usize>,
    dtype: Dtype,
    fortran_order: bool,
    data: Arc<[u8]>,
}

impl TypedBuffer {
    /// Wrap raw little-endian bytes
    ///
    /// # Errors
    ///
    /// `SizeMismatch` unless `data.len() == word_size * product(shape)`.
    pub fn new(dtype: Dtype, shape: Vec<usize>, fortran_order: bool, data: Vec<u8>) -> Result<Self> {
        let expected = payload_len(&dtype, &shape)?;
        if data.len() != expected {
            return Err(NpyError::SizeMismatch(format!(
                "shape {:?} of {} needs {} bytes, got {}",
                shape,
                dtype,
                expected,
                data.len()
            )));
        }

        Ok(TypedBuffer {
            shape,
            dtype,
            fortran_order,
            data: data.into(),
        })
    }

    /// Encode caller elements into a C-ordered buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use npy_archive::TypedBuffer;
    ///
    /// let buf = TypedBuffer::from_elements(&[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(buf.shape(), &[2, 3]);
    /// assert_eq!(buf.word_size(), 8);
    /// assert_eq!(buf.num_bytes(), 48);
    /// ```
    pub fn from_elements<T: Element>(elements: &[T], shape: &[usize]) -> Result<Self> {
        let count = element_count(shape)
            .ok_or_else(|| NpyError::SizeMismatch(format!("shape {:?} overflows", shape)))?;
        if count != elements.len() {
            return Err(NpyError::SizeMismatch(format!(
                "shape {:?} holds {} elements but {} were supplied",
                shape,
                count,
                elements.len()
            )));
        }

        Ok(TypedBuffer {
            shape: shape.to_vec(),
            dtype: Dtype::of::<T>(),
            fortran_order: false,
            data: encode_elements(elements).into(),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Bytes per element
    pub fn word_size(&self) -> usize {
        self.dtype.word_size
    }

    pub fn is_fortran_order(&self) -> bool {
        self.fortran_order
    }

    /// Number of elements
    pub fn num_vals(&self) -> usize {
        self.data.len() / self.dtype.word_size
    }

    pub fn num_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decode the payload into elements of type `T`
    ///
    /// Only the word size is checked against `T`; reading `<i8` data as
    /// `u8` is allowed and reinterprets the bits.
    pub fn as_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::WORD_SIZE != self.dtype.word_size {
            return Err(NpyError::SizeMismatch(format!(
                "buffer holds {}-byte elements, requested type has {} bytes",
                self.dtype.word_size,
                T::WORD_SIZE
            )));
        }

        Ok(self.data.chunks_exact(T::WORD_SIZE).map(T::read_le).collect())
    }
}

/// Payload byte length for a descriptor and shape
pub(crate) fn payload_len(dtype: &Dtype, shape: &[usize]) -> Result<usize> {
    element_count(shape)
        .and_then(|count| count.checked_mul(dtype.word_size))
        .ok_or_else(|| NpyError::format(format!("shape {:?} of {} overflows", shape, dtype)))
}
