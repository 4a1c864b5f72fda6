//! Multi-array archive container
//!
//! A ZIP-compatible container whose members are array files named
//! `<name>.npy`. Writing always stores members uncompressed and appends
//! one member per call; reading also accepts deflate-compressed members
//! produced by other tools.
//!
//! - [`entry`] - local headers, directory records, stored member framing
//! - [`directory`] - trailer parsing and directory rewrite on append
//! - [`reader`] - sequential member scan and decode

pub mod directory;
pub mod entry;
pub mod reader;

pub use directory::{CentralDirectory, EndOfCentralDirectory};
pub use entry::{CentralDirectoryRecord, LocalFileHeader, MemberDescriptor, MemberEntry};
pub use reader::{ArchiveReader, LocalMember};

use crate::buffer::TypedBuffer;
use crate::config::{CodecConfig, SaveMode};
use crate::dtype::Dtype;
use crate::error::{NpyError, Result};
use crate::header::ArrayHeader;
use crate::validation::MemberName;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};

/// Member name to array, as loaded from one container
pub type Archive = BTreeMap<String, TypedBuffer>;

/// Add one array as a stored member
///
/// With `SaveMode::Append` on an existing container the member is written
/// over the old central directory, which is then re-emitted with the new
/// record and a fresh trailer. Otherwise a new container is created.
pub fn write_member<P: AsRef<Path>>(
    path: P,
    name: &MemberName,
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
    let header_bytes = header.to_bytes()?;

    let (mut file, mut directory) = if mode == SaveMode::Append && path.exists() {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let directory = CentralDirectory::read_from(&mut file)?;
        (file, directory)
    } else {
        info!("Creating archive {:?}", path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        (file, CentralDirectory::empty())
    };

    let entry = MemberEntry::stored(name, &header_bytes, payload, directory.offset())?;
    debug!(
        "Writing member '{}' at offset {} ({} bytes, {} existing entries)",
        name,
        directory.offset(),
        entry.total_len(),
        directory.entry_count()
    );

    file.seek(SeekFrom::Start(directory.offset()))?;
    file.write_all(&entry.local_bytes())?;
    file.write_all(&header_bytes)?;
    file.write_all(payload)?;

    directory.push(&entry.central_record(), entry.total_len())?;
    directory.write_to(&mut file)?;

    let end = file.stream_position()?;
    file.set_len(end)?;
    file.flush()?;
    if config.sync_on_write {
        file.sync_all()?;
    }
    Ok(())
}

fn open_reader<P: AsRef<Path>>(path: P, config: &CodecConfig) -> Result<ArchiveReader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(ArchiveReader::new(BufReader::new(file), config.verify_checksums))
}

/// Load every member
///
/// If the container holds several members with one name, the last one wins.
pub fn read_archive<P: AsRef<Path>>(path: P, config: &CodecConfig) -> Result<Archive> {
    let path = path.as_ref();
    let mut reader = open_reader(path, config)?;
    let mut archive = Archive::new();

    while let Some(member) = reader.next_member()? {
        let array = reader.read_array(&member)?;
        archive.insert(member.name, array);
    }

    debug!("Loaded {} members from {:?}", archive.len(), path);
    Ok(archive)
}

/// Load the first member called `name`
///
/// Scanning stops at the first match, so a later member with the same
/// name is never returned here even though [`read_archive`] would keep it.
pub fn read_member<P: AsRef<Path>>(path: P, name: &str, config: &CodecConfig) -> Result<TypedBuffer> {
    let path = path.as_ref();
    let mut reader = open_reader(path, config)?;

    while let Some(member) = reader.next_member()? {
        if member.name == name {
            return reader.read_array(&member);
        }
        reader.skip_data(&member)?;
    }

    Err(NpyError::NotFound(format!(
        "member '{}' not found in {}",
        name,
        path.display()
    )))
}

/// Describe every member listed in the central directory
pub fn list_members<P: AsRef<Path>>(path: P) -> Result<Vec<MemberDescriptor>> {
    let mut file = File::open(path)?;
    let directory = CentralDirectory::read_from(&mut file)?;
    Ok(directory
        .records()?
        .iter()
        .map(CentralDirectoryRecord::descriptor)
        .collect())
}
