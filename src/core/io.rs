//! Disk I/O for single-array files

use crate::buffer::TypedBuffer;
use crate::config::{CodecConfig, SaveMode};
use crate::dtype::Dtype;
use crate::error::{NpyError, Result};
use crate::header::ArrayHeader;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Open handle on one array file
///
/// The handle is closed when the value is dropped, on every exit path.
pub struct ArrayFile {
    file: File,
    path: PathBuf,
}

impl ArrayFile {
    /// Create (or truncate) a file and write `header` at offset 0
    pub fn create<P: AsRef<Path>>(path: P, header: &ArrayHeader) -> Result<Self> {
        let header_bytes = header.to_bytes()?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        file.write_all(&header_bytes)?;

        Ok(ArrayFile {
            file,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Open an existing file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        Ok(ArrayFile {
            file,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Open an existing file for reading and writing
    pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(ArrayFile {
            file,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Decode the header, returning it and its encoded length
    pub fn read_header(&mut self) -> Result<(ArrayHeader, usize)> {
        self.file.seek(SeekFrom::Start(0))?;
        ArrayHeader::read_from(&mut self.file)
    }

    /// Overwrite the header region at offset 0
    pub fn write_header(&mut self, header_bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(header_bytes)?;
        Ok(())
    }

    /// Read `len` payload bytes starting at `offset`
    ///
    /// Fails without allocating if the file is too short.
    pub fn read_payload(&mut self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let available = self.len()?.saturating_sub(offset as u64);
        if available < len as u64 {
            return Err(NpyError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "{}: payload needs {} bytes, only {} present",
                    self.path.display(),
                    len,
                    available
                ),
            )));
        }

        self.file.seek(SeekFrom::Start(offset as u64))?;
        let mut buffer = vec![0u8; len];
        self.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Write raw bytes at `offset`
    pub fn write_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Append raw bytes at end of file
    pub fn append_payload(&mut self, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn set_len(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and optionally sync all writes to disk
    pub fn finish(mut self, sync: bool) -> Result<()> {
        self.file.flush()?;
        if sync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

/// Write one array, creating the file or growing it along its leading dimension
pub fn write_array<P: AsRef<Path>>(
    path: P,
    dtype: Dtype,
    shape: &[usize],
    payload: &[u8],
    mode: SaveMode,
    config: &CodecConfig,
) -> Result<()> {
    let path = path.as_ref();
    let header = ArrayHeader::new(dtype, shape.to_vec());
    let expected = header.payload_len()?;
    if payload.len() != expected {
        return Err(NpyError::SizeMismatch(format!(
            "shape {:?} of {} needs {} bytes, got {}",
            shape,
            dtype,
            expected,
            payload.len()
        )));
    }

    if mode == SaveMode::Append && path.exists() {
        return append_array(path, header, payload, config);
    }

    debug!("Creating array file {:?} with shape {:?} ({})", path, shape, dtype);
    let mut file = ArrayFile::create(path, &header)?;
    file.append_payload(payload)?;
    file.finish(config.sync_on_write)
}

fn append_array(
    path: &Path,
    incoming: ArrayHeader,
    payload: &[u8],
    config: &CodecConfig,
) -> Result<()> {
    let mut file = ArrayFile::open_rw(path)?;
    let (existing, header_len) = file.read_header()?;
    let existing_len = existing.payload_len()?;

    let file_len = file.len()?;
    let declared_len = header_len.checked_add(existing_len).ok_or_else(|| {
        NpyError::format(format!("{:?}: header and payload length overflow", path))
    })?;
    if file_len != declared_len as u64 {
        return Err(NpyError::format(format!(
            "{:?} is {} bytes but its header describes {} (header) + {} (payload)",
            path, file_len, header_len, existing_len
        )));
    }

    let combined = ArrayHeader {
        dtype: existing.dtype,
        fortran_order: false,
        shape: appended_shape(&existing, &incoming)?,
    };
    debug!(
        "Appending {:?} to {:?}: shape {:?} -> {:?}",
        incoming.shape, path, existing.shape, combined.shape
    );

    let header_bytes = combined.to_bytes()?;
    if header_bytes.len() == header_len {
        file.write_header(&header_bytes)?;
        file.append_payload(payload)?;
    } else {
        // The header region changed size, so the payload has to move.
        info!(
            "Header of {:?} changes from {} to {} bytes; rewriting file",
            path,
            header_len,
            header_bytes.len()
        );
        let old_payload = file.read_payload(header_len, existing_len)?;
        let new_payload_at = header_bytes.len() + old_payload.len();
        file.write_header(&header_bytes)?;
        file.write_at(header_bytes.len(), &old_payload)?;
        // Old end of file is stale when the header shrinks
        file.write_at(new_payload_at, payload)?;
        file.set_len((new_payload_at + payload.len()) as u64)?;
    }

    file.finish(config.sync_on_write)
}

/// Validate an append and compute the grown shape
fn appended_shape(existing: &ArrayHeader, incoming: &ArrayHeader) -> Result<Vec<usize>> {
    if existing.fortran_order {
        return Err(NpyError::UnsupportedFeature(
            "appending to a Fortran-ordered array".to_string(),
        ));
    }
    if existing.dtype.word_size != incoming.dtype.word_size {
        return Err(NpyError::SizeMismatch(format!(
            "file has word size {} but appended data has word size {}",
            existing.dtype.word_size, incoming.dtype.word_size
        )));
    }
    if existing.dtype.kind != incoming.dtype.kind {
        warn!(
            "Appending {} data to a file declared as {}",
            incoming.dtype, existing.dtype
        );
    }
    if existing.shape.len() != incoming.shape.len() {
        return Err(NpyError::SizeMismatch(format!(
            "file has {} dimensions but appended data has {}",
            existing.shape.len(),
            incoming.shape.len()
        )));
    }
    if existing.shape.is_empty() {
        return Err(NpyError::SizeMismatch(
            "cannot append to a 0-d array".to_string(),
        ));
    }
    if existing.shape[1..] != incoming.shape[1..] {
        return Err(NpyError::SizeMismatch(format!(
            "trailing dimensions differ: file {:?}, appended {:?}",
            &existing.shape[1..],
            &incoming.shape[1..]
        )));
    }

    let mut shape = existing.shape.clone();
    shape[0] = shape[0].checked_add(incoming.shape[0]).ok_or_else(|| {
        NpyError::SizeMismatch("leading dimension overflows".to_string())
    })?;
    Ok(shape)
}

/// Read one array file into a buffer
pub fn read_array<P: AsRef<Path>>(path: P) -> Result<TypedBuffer> {
    let path = path.as_ref();
    let mut file = ArrayFile::open(path)?;
    let (header, header_len) = file.read_header()?;
    debug!(
        "Loading {:?}: shape {:?} ({}), header {} bytes",
        path, header.shape, header.dtype, header_len
    );

    let data = file.read_payload(header_len, header.payload_len()?)?;
    TypedBuffer::new(header.dtype, header.shape, header.fortran_order, data)
}
