//! gpxfs provides a read-only interface to ***GPX*** containers, the archive format Guitar Pro 6
//! stores its scores in. The API decodes the whole container up front and then offers the
//! stored files by name.
//!
//! A container starts with a 4-byte magic. `BCFS` is followed by the sector filesystem as-is;
//! `BCFZ` is followed by the same filesystem compressed with a small LZ scheme. The lower layers
//! ([`gpx::BitReader`], [`gpx::decompress`], [`gpx::read_entries`]) are public too.
//!
//! ## Usage Example
//! ```no_run
//! use gpxfs::gpx::Gpx;
//! fn print_score() -> Result<(), gpxfs::gpx::GpxError> {
//!     // Open and decode the container
//!     let gpx = Gpx::open("song.gpx")?;
//!
//!     // List the stored files
//!     for name in gpx.file_names() {
//!         println!("{}", name)
//!     }
//!
//!     // Read one of them, trimmed to its declared size
//!     let score = gpx.read_file("score.gpif")?;
//!     println!("{}", String::from_utf8_lossy(score));
//!     Ok(())
//! }
//! ```

pub mod gpx;
