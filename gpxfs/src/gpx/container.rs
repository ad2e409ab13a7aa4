//! The sector filesystem stored inside a decompressed (BCFS) container body.
//!
//! The body is divided into 4096-byte sectors. Sector 0 is padding; the entry table starts at
//! sector 1. A file entry occupies one sector:
//!
//! | offset | size     | contents                                              |
//! |--------|----------|-------------------------------------------------------|
//! | 0x00   | 4        | entry type (2 = file)                                 |
//! | 0x04   | 127      | file name, zero terminated, Windows-1252              |
//! | 0x8C   | 4        | file size                                             |
//! | 0x98   | n*4      | indices of the sectors holding the data, 0 terminated |
//!
//! All integers are little-endian. Sector indices are absolute, so sector `n` starts at
//! `n * 4096` in the body.

use std::cmp;
use std::collections::HashSet;

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;
use log::{debug, trace};
use num_enum::{FromPrimitive, IntoPrimitive};

use super::error::GpxError;

pub const SECTOR_SIZE: usize = 0x1000;

const NAME_OFFSET: usize = 0x04;
const NAME_LEN: usize = 127;
const SIZE_OFFSET: usize = 0x8C;
const CHAIN_OFFSET: usize = 0x94;

#[derive(Debug, IntoPrimitive, FromPrimitive, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum EntryType {
    File = 2,
    #[num_enum(default)]
    Unknown = 0xFFFF_FFFF,
}

/// A single file stored in a GPX container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    declared_size: u32,
    data: Vec<u8>,
}

impl FileEntry {
    pub fn new(name: String, declared_size: u32, data: Vec<u8>) -> Self {
        Self { name, declared_size, data }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file size recorded in the entry table
    pub fn declared_size(&self) -> u32 {
        self.declared_size
    }

    /// Every sector of the file concatenated, including the padding of the last sector
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// The file contents cut down to the declared size. If the sectors hold less than the
    /// declared size, all of them are returned.
    pub fn data(&self) -> &[u8] {
        let len = cmp::min(self.declared_size as usize, self.data.len());
        &self.data[..len]
    }

    pub fn into_raw_data(self) -> Vec<u8> {
        self.data
    }
}

fn read_u32_at(data: &[u8], offset: usize, what: &'static str) -> Result<u32, GpxError> {
    data.get(offset..offset + 4)
        .map(LittleEndian::read_u32)
        .ok_or(GpxError::malformed(offset, what))
}

fn decode_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let (name, _) = WINDOWS_1252.decode_without_bom_handling(&raw[..end]);
    name.into_owned()
}

/// Walks the entry table of a container body and collects every file entry, in table order.
///
/// A file entry may send the scan backwards (see [`scan_resume_offset`]). Reaching the same
/// file entry twice would repeat forever, so it is reported as a malformed table.
pub fn read_entries(data: &[u8]) -> Result<Vec<FileEntry>, GpxError> {
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    let mut offset = SECTOR_SIZE;
    while offset + 4 <= data.len() {
        let entry_type = EntryType::from(read_u32_at(data, offset, "entry type")?);
        offset = match entry_type {
            EntryType::File => {
                if !visited.insert(offset) {
                    return Err(GpxError::malformed(offset, "table scan returns to a file entry"));
                }
                let (entry, next) = read_file_entry(data, offset)?;
                debug!("Found file {} ({} bytes) at 0x{:X}", entry.name, entry.declared_size, offset);
                entries.push(entry);
                next
            }
            EntryType::Unknown => {
                trace!("Skipping sector at 0x{:X}", offset);
                offset + SECTOR_SIZE
            }
        };
    }
    Ok(entries)
}

// Decode the file entry whose table sector starts at `offset`. Returns the entry and the offset
// at which the table scan continues.
fn read_file_entry(data: &[u8], offset: usize) -> Result<(FileEntry, usize), GpxError> {
    let name_start = offset + NAME_OFFSET;
    let raw_name = data
        .get(name_start..name_start + NAME_LEN)
        .ok_or(GpxError::malformed(name_start, "file name"))?;
    let name = decode_name(raw_name);
    let declared_size = read_u32_at(data, offset + SIZE_OFFSET, "file size")?;

    let chain = read_sector_chain(data, offset + CHAIN_OFFSET)?;
    let mut file_data = Vec::with_capacity(chain.len() * SECTOR_SIZE);
    for &sector in &chain {
        let start = (sector as usize)
            .checked_mul(SECTOR_SIZE)
            .filter(|&s| s < data.len())
            .ok_or(GpxError::malformed(offset, "sector index outside the container"))?;
        let sector_data = data
            .get(start..start + SECTOR_SIZE)
            .ok_or(GpxError::TruncatedSource)?;
        file_data.extend_from_slice(sector_data);
    }

    let next = scan_resume_offset(offset, &chain);
    Ok((FileEntry::new(name, declared_size, file_data), next))
}

// The chain is a list of u32 sector indices terminated by 0. Slot 0 at `base` is not part of it;
// the first index lives at `base + 4`.
fn read_sector_chain(data: &[u8], base: usize) -> Result<Vec<u32>, GpxError> {
    let mut chain = Vec::new();
    let mut slot = base + 4;
    loop {
        let sector = data
            .get(slot..slot + 4)
            .map(LittleEndian::read_u32)
            .ok_or(GpxError::malformed(base, "unterminated sector chain"))?;
        if sector == 0 {
            return Ok(chain);
        }
        chain.push(sector);
        slot += 4;
    }
}

/// The offset at which the entry table scan continues after the file entry at `entry_offset`.
///
/// Table scanning does not simply move to the next sector: it continues directly after the
/// last data sector the entry consumed. An entry without data sectors is followed by the next
/// sector. When the last data sector lies before the entry, the scan moves backwards.
pub fn scan_resume_offset(entry_offset: usize, chain: &[u32]) -> usize {
    match chain.last() {
        Some(&last) => (last as usize + 1) * SECTOR_SIZE,
        None => entry_offset + SECTOR_SIZE,
    }
}
