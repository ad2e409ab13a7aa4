mod bitreader;
mod decompress;
mod error;
mod gpx;

pub mod container;
pub use bitreader::{BitOrder, BitReader};
pub use container::{read_entries, FileEntry, SECTOR_SIZE};
pub use decompress::decompress;
pub use error::GpxError;
pub use gpx::*;
