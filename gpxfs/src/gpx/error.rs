use std::io;

use thiserror::Error;

/// Errors that can occur while decoding a GPX container.
#[derive(Error, Debug)]
pub enum GpxError {
    /// The byte source ended inside a read that had to complete.
    #[error("Source truncated")]
    TruncatedSource,

    /// The first four bytes are neither `BCFZ` nor `BCFS`.
    #[error("Unrecognized container magic {0:02x?}")]
    UnrecognizedContainer([u8; 4]),

    /// A back-reference points before the start of the decompressed output.
    #[error("Back-reference offset {offset} exceeds output length {position}")]
    CorruptBackReference { position: usize, offset: usize },

    /// The decompressed stream did not end exactly on its declared length.
    #[error("Decompressed length {actual} does not match header length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The sector table is structurally broken.
    #[error("Malformed entry table at 0x{offset:X}: {reason}")]
    MalformedEntryTable { offset: usize, reason: &'static str },

    /// No entry with the requested name exists in the container.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The byte source failed for a reason other than running out of data.
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl GpxError {
    pub(crate) fn malformed(offset: usize, reason: &'static str) -> Self {
        GpxError::MalformedEntryTable { offset, reason }
    }
}

impl From<io::Error> for GpxError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => GpxError::TruncatedSource,
            _ => GpxError::Io(e),
        }
    }
}

impl From<GpxError> for io::Error {
    fn from(e: GpxError) -> Self {
        match e {
            GpxError::Io(e) => e,
            GpxError::TruncatedSource => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            GpxError::FileNotFound(_) => io::Error::new(io::ErrorKind::NotFound, e),
            _ => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
