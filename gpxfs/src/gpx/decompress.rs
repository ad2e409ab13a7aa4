use std::cmp;
use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use super::bitreader::{BitOrder, BitReader};
use super::error::GpxError;

// The declared length counts this header, which is part of the decompressed output
const LENGTH_HEADER_SIZE: usize = 4;

// Upper bound on the buffer reserved up front. Larger outputs still decompress, they just grow.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// Decompress a BCFZ payload.
///
/// `bits` must be positioned directly after the `BCFZ` magic. The payload starts with a
/// little-endian u32 holding the total decompressed length (header included), followed by a
/// bitstream of steps, each introduced by a single control bit:
///
/// * `0` - literal run: a 2-bit count (LSB first) followed by that many whole bytes
/// * `1` - back-reference: a 4-bit word size `w` (MSB first), then an offset and a size of `w`
///   bits each (LSB first). `min(offset, size)` bytes are copied from `offset` bytes before the
///   end of the output.
///
/// The returned buffer has the 4-byte length header removed.
pub fn decompress<R: Read>(bits: &mut BitReader<R>) -> Result<Vec<u8>, GpxError> {
    let mut header = [0u8; LENGTH_HEADER_SIZE];
    bits.read_exact_bits(&mut header)?;
    let expected = LittleEndian::read_u32(&header) as usize;
    debug!("Decompressing BCFZ payload of {} bytes", expected);

    let mut out: Vec<u8> = Vec::with_capacity(cmp::min(expected, MAX_PREALLOC));
    while out.len() < expected {
        let flag = bits.read_bits_exact(1, BitOrder::Msb)?;
        if flag == 1 {
            let word_size = bits.read_bits_exact(4, BitOrder::Msb)?;
            let offset = bits.read_bits_exact(word_size, BitOrder::Lsb)? as usize;
            let size = bits.read_bits_exact(word_size, BitOrder::Lsb)? as usize;
            copy_back_reference(&mut out, offset, size)?;
        } else {
            let count = bits.read_bits_exact(2, BitOrder::Lsb)?;
            for _ in 0..count {
                out.push(bits.read_bits_exact(8, BitOrder::Msb)? as u8);
            }
        }
    }

    if out.len() != expected {
        return Err(GpxError::LengthMismatch { expected, actual: out.len() });
    }
    trace!("Decompression consumed {} source bytes", bits.position());

    if out.len() < LENGTH_HEADER_SIZE {
        return Ok(Vec::new());
    }
    out.drain(..LENGTH_HEADER_SIZE);
    Ok(out)
}

/// Append `min(offset, size)` bytes starting `offset` bytes before the end of `out`.
///
/// Bytes are copied one at a time from the growing buffer.
fn copy_back_reference(out: &mut Vec<u8>, offset: usize, size: usize) -> Result<(), GpxError> {
    let position = out.len();
    if offset > position {
        return Err(GpxError::CorruptBackReference { position, offset });
    }
    let start = position - offset;
    let len = cmp::min(offset, size);
    out.reserve(len);
    for i in start..start + len {
        let b = out[i];
        out.push(b);
    }
    Ok(())
}
