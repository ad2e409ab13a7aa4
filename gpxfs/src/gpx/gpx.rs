use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::bitreader::BitReader;
use super::container::{self, FileEntry};
use super::decompress::decompress;
use super::error::GpxError;

/// The two container variants, keyed by their 4-byte magic read as a little-endian u32
#[derive(Debug, IntoPrimitive, TryFromPrimitive, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ContainerFormat {
    /// `BCFS`: the sector filesystem stored as-is
    Uncompressed = 0x5346_4342,
    /// `BCFZ`: the sector filesystem compressed with the GPX LZ scheme
    Compressed = 0x5A46_4342,
}

impl ContainerFormat {
    pub fn from_magic(magic: [u8; 4]) -> Result<Self, GpxError> {
        ContainerFormat::try_from(LittleEndian::read_u32(&magic))
            .map_err(|_| GpxError::UnrecognizedContainer(magic))
    }

    pub fn magic(self) -> [u8; 4] {
        let mut magic = [0u8; 4];
        LittleEndian::write_u32(&mut magic, self.into());
        magic
    }
}

/// The top-level interface to a GPX container. All entries are decoded when the container is
/// opened; after that it can be used to list and look up files.
#[derive(Debug)]
pub struct Gpx {
    format: ContainerFormat,
    entries: Vec<FileEntry>,
}

impl Gpx {
    /// Open the contents of a filepath as a GPX container, using a BufReader
    pub fn open<P>(path: P) -> Result<Self, GpxError>
    where P: AsRef<Path>
    {
        Self::new(BufReader::new(File::open(path)?))
    }

    /// Decode a GPX container held in memory
    pub fn from_bytes(b: &[u8]) -> Result<Self, GpxError> {
        Self::new(b)
    }

    /// Decode a GPX container from the provided Reader. The reader is consumed up to the end of
    /// the container; on error its position is unspecified.
    pub fn new<R: Read>(r: R) -> Result<Self, GpxError> {
        let mut bits = BitReader::new(r);
        let mut magic = [0u8; 4];
        bits.read_exact_bits(&mut magic)?;
        let format = ContainerFormat::from_magic(magic)?;
        debug!("Container format {:?}", format);

        let body = match format {
            ContainerFormat::Compressed => decompress(&mut bits)?,
            ContainerFormat::Uncompressed => bits.read_to_end()?,
        };
        let entries = container::read_entries(&body)?;
        debug!("Decoded {} entries from {} byte body", entries.len(), body.len());
        Ok(Gpx { format, entries })
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// All file entries, in the order they appear in the container
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name())
    }

    /// Look up an entry by name. If several entries share a name, the first one wins.
    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Contents of the named file, trimmed to its declared size
    pub fn read_file(&self, name: &str) -> Result<&[u8], GpxError> {
        self.file(name)
            .map(|e| e.data())
            .ok_or_else(|| GpxError::FileNotFound(name.to_string()))
    }
}
