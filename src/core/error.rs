use thiserror::Error;

#[derive(Error, Debug)]
pub enum NpyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic string in array header")]
    InvalidMagic,

    #[error("Unsupported array format version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("Array header is missing the '{0}' key")]
    MissingHeaderKey(&'static str),

    #[error("Unsupported byte order '{0}' (only little-endian data can be read)")]
    UnsupportedByteOrder(char),

    #[error("Malformed data: {0}")]
    Format(String),

    #[error("CRC32 mismatch for member '{name}': stored {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("Size mismatch: {0}")]
    SizeMismatch(String),

    #[error("Member not found: {0}")]
    NotFound(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
}

/// Coarse failure classes callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    SizeMismatch,
    NotFound,
    UnsupportedFeature,
}

impl NpyError {
    /// Fold this error onto its failure class
    pub fn kind(&self) -> ErrorKind {
        match self {
            NpyError::Io(_) => ErrorKind::Io,
            NpyError::InvalidMagic
            | NpyError::UnsupportedVersion { .. }
            | NpyError::MissingHeaderKey(_)
            | NpyError::UnsupportedByteOrder(_)
            | NpyError::Format(_)
            | NpyError::ChecksumMismatch { .. } => ErrorKind::Format,
            NpyError::SizeMismatch(_) => ErrorKind::SizeMismatch,
            NpyError::NotFound(_) => ErrorKind::NotFound,
            NpyError::UnsupportedFeature(_) => ErrorKind::UnsupportedFeature,
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        NpyError::Format(msg.into())
    }

    pub(crate) fn unexpected_eof(what: &str) -> Self {
        NpyError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("Insufficient bytes for {}", what),
        ))
    }
}

pub type Result<T> = std::result::Result<T, NpyError>;
