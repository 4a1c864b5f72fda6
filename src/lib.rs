//! # npy-archive - `.npy` array files and `.npz` array archives
//!
//! `npy-archive` reads and writes typed, shaped numeric arrays in the NumPy
//! `.npy` format, and bundles named arrays into `.npz` (ZIP) containers:
//!
//! - **Array files** with a padded textual header and raw little-endian payload
//! - **Append growth** along the leading dimension of an existing array file
//! - **Archives** built one member at a time, rewriting the central directory
//!   on each append
//! - **Compressed members** written by other tools are inflated on read
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use npy_archive::{load_array, save_array, Result, SaveMode};
//!
//! # fn main() -> Result<()> {
//! let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
//! save_array("data.npy", &data, &[2, 3], SaveMode::Create)?;
//!
//! // Grow the leading dimension: shape becomes [4, 3]
//! save_array("data.npy", &data, &[2, 3], SaveMode::Append)?;
//!
//! let loaded = load_array("data.npy")?;
//! assert_eq!(loaded.shape(), &[4, 3]);
//! let values: Vec<f64> = loaded.as_vec()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Archives
//!
//! ```rust,no_run
//! use npy_archive::{load_archive, load_archive_member, save_archive_member, Result, SaveMode};
//!
//! # fn main() -> Result<()> {
//! save_archive_member("out.npz", "weights", &[0.5f32, 0.25], &[2], SaveMode::Create)?;
//! save_archive_member("out.npz", "labels", &[1u8, 0, 1], &[3], SaveMode::Append)?;
//!
//! let everything = load_archive("out.npz")?;
//! let labels = load_archive_member("out.npz", "labels")?;
//! assert_eq!(everything["labels"], labels);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! The free functions use [`CodecConfig::default`]. Use [`CodecBuilder`] to
//! sync files on every save or to skip CRC verification on read:
//!
//! ```rust,no_run
//! use npy_archive::CodecBuilder;
//!
//! let codec = CodecBuilder::new().sync_on_write().build();
//! # let _ = codec;
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use crate::core::{
    archive, buffer, compression, config, cursor, dtype, error, header, io, validation,
};

pub use crate::core::{
    archive::{Archive, MemberDescriptor},
    buffer::TypedBuffer,
    config::{CodecConfig, SaveMode},
    dtype::{ByteOrder, Dtype, DtypeKind, Element},
    error::{ErrorKind, NpyError, Result},
    header::ArrayHeader,
    validation::MemberName,
};

use std::path::Path;
use tracing::debug;

/// Array and archive operations bound to one [`CodecConfig`]
///
/// Every call opens, uses and closes its own file handle; a `Codec` holds
/// no open files and can be shared freely. Concurrent writers to one path
/// are not coordinated.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Codec { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Write elements as an array file
    ///
    /// `elements.len()` must equal the product of `shape`. With
    /// [`SaveMode::Append`] and an existing file, the data is appended along
    /// the leading dimension; word size, rank and trailing dimensions must
    /// match the file.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use npy_archive::{Codec, SaveMode};
    /// let codec = Codec::default();
    /// codec.save_array("grid.npy", &[0i32; 12], &[3, 4], SaveMode::Create)?;
    /// # Ok::<(), npy_archive::NpyError>(())
    /// ```
    pub fn save_array<T: Element, P: AsRef<Path>>(
        &self,
        path: P,
        elements: &[T],
        shape: &[usize],
        mode: SaveMode,
    ) -> Result<()> {
        let buffer = TypedBuffer::from_elements(elements, shape)?;
        self.save_buffer(path, &buffer, mode)
    }

    /// Write an already-typed buffer as an array file
    pub fn save_buffer<P: AsRef<Path>>(
        &self,
        path: P,
        buffer: &TypedBuffer,
        mode: SaveMode,
    ) -> Result<()> {
        let path = path.as_ref();
        reject_fortran(buffer)?;
        debug!("Saving {:?} to {:?} ({:?})", buffer.shape(), path, mode);
        io::write_array(
            path,
            buffer.dtype(),
            buffer.shape(),
            buffer.as_bytes(),
            mode,
            &self.config,
        )
    }

    /// Read an array file
    pub fn load_array<P: AsRef<Path>>(&self, path: P) -> Result<TypedBuffer> {
        io::read_array(path)
    }

    /// Add elements to an archive as member `name`
    ///
    /// The member is stored as `<name>.npy`. Names are not checked for
    /// uniqueness; see [`load_archive_member`](Self::load_archive_member).
    pub fn save_archive_member<T: Element, P: AsRef<Path>>(
        &self,
        container: P,
        name: &str,
        elements: &[T],
        shape: &[usize],
        mode: SaveMode,
    ) -> Result<()> {
        let buffer = TypedBuffer::from_elements(elements, shape)?;
        self.save_archive_buffer(container, name, &buffer, mode)
    }

    /// Add an already-typed buffer to an archive as member `name`
    pub fn save_archive_buffer<P: AsRef<Path>>(
        &self,
        container: P,
        name: &str,
        buffer: &TypedBuffer,
        mode: SaveMode,
    ) -> Result<()> {
        let name = MemberName::new(name)?;
        reject_fortran(buffer)?;
        archive::write_member(
            container,
            &name,
            buffer.dtype(),
            buffer.shape(),
            buffer.as_bytes(),
            mode,
            &self.config,
        )
    }

    /// Load every member of an archive
    ///
    /// When several members share a name, the one stored last is kept.
    pub fn load_archive<P: AsRef<Path>>(&self, container: P) -> Result<Archive> {
        archive::read_archive(container, &self.config)
    }

    /// Load one member of an archive
    ///
    /// Returns the *first* member called `name`. A later duplicate is
    /// unreachable through this call, although [`load_archive`](Self::load_archive)
    /// returns it.
    ///
    /// # Errors
    ///
    /// `NotFound` if no member has that name.
    pub fn load_archive_member<P: AsRef<Path>>(
        &self,
        container: P,
        name: &str,
    ) -> Result<TypedBuffer> {
        archive::read_member(container, name, &self.config)
    }

    /// Describe the members listed in an archive's central directory
    pub fn list_archive<P: AsRef<Path>>(&self, container: P) -> Result<Vec<MemberDescriptor>> {
        archive::list_members(container)
    }
}

fn reject_fortran(buffer: &TypedBuffer) -> Result<()> {
    if buffer.is_fortran_order() {
        return Err(NpyError::UnsupportedFeature(
            "saving Fortran-ordered data".to_string(),
        ));
    }
    Ok(())
}

/// Builder for a [`Codec`]
///
/// # Examples
///
/// ```rust
/// use npy_archive::CodecBuilder;
///
/// let codec = CodecBuilder::new()
///     .sync_on_write()
///     .verify_checksums(false)
///     .build();
/// assert!(codec.config().sync_on_write);
/// assert!(!codec.config().verify_checksums);
/// ```
pub struct CodecBuilder {
    config: CodecConfig,
}

impl CodecBuilder {
    pub fn new() -> Self {
        CodecBuilder {
            config: CodecConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// `sync_all` each file before a save returns
    pub fn sync_on_write(mut self) -> Self {
        self.config.sync_on_write = true;
        self
    }

    /// Enable or disable CRC32 verification of archive members
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    pub fn build(self) -> Codec {
        debug!("Building codec with {:?}", self.config);
        Codec::new(self.config)
    }
}

impl Default for CodecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write elements as an array file with the default configuration
///
/// See [`Codec::save_array`].
pub fn save_array<T: Element, P: AsRef<Path>>(
    path: P,
    elements: &[T],
    shape: &[usize],
    mode: SaveMode,
) -> Result<()> {
    Codec::default().save_array(path, elements, shape, mode)
}

/// Write a typed buffer as an array file with the default configuration
pub fn save_buffer<P: AsRef<Path>>(path: P, buffer: &TypedBuffer, mode: SaveMode) -> Result<()> {
    Codec::default().save_buffer(path, buffer, mode)
}

/// Read an array file
pub fn load_array<P: AsRef<Path>>(path: P) -> Result<TypedBuffer> {
    Codec::default().load_array(path)
}

/// Add elements to an archive with the default configuration
///
/// See [`Codec::save_archive_member`].
pub fn save_archive_member<T: Element, P: AsRef<Path>>(
    container: P,
    name: &str,
    elements: &[T],
    shape: &[usize],
    mode: SaveMode,
) -> Result<()> {
    Codec::default().save_archive_member(container, name, elements, shape, mode)
}

/// Add a typed buffer to an archive with the default configuration
pub fn save_archive_buffer<P: AsRef<Path>>(
    container: P,
    name: &str,
    buffer: &TypedBuffer,
    mode: SaveMode,
) -> Result<()> {
    Codec::default().save_archive_buffer(container, name, buffer, mode)
}

/// Load every member of an archive; duplicates resolve to the last one
pub fn load_archive<P: AsRef<Path>>(container: P) -> Result<Archive> {
    Codec::default().load_archive(container)
}

/// Load the first member called `name`
///
/// See [`Codec::load_archive_member`] for how duplicates behave.
pub fn load_archive_member<P: AsRef<Path>>(container: P, name: &str) -> Result<TypedBuffer> {
    Codec::default().load_archive_member(container, name)
}

/// List the members recorded in an archive's central directory
pub fn list_archive<P: AsRef<Path>>(container: P) -> Result<Vec<MemberDescriptor>> {
    Codec::default().list_archive(container)
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
