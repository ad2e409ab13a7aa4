use std::io::{self, Read};

use super::error::GpxError;

/// Bit order used when packing a run of bits into an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// The first bit read becomes the most significant bit of the result
    Msb,
    /// The first bit read becomes the least significant bit of the result
    Lsb,
}

// Cursor within the byte most recently fetched from the source. A byte is only pulled from the
// source when a bit is requested in the NeedByte state.
#[derive(Debug, Clone, Copy)]
enum BitCursor {
    NeedByte,
    HaveByte { byte: u8, bit: u8 },
}

/// Reads a byte source one bit at a time, most significant bit of each byte first.
///
/// Bytes are fetched lazily: the first bit requested from a fresh byte triggers exactly one
/// single-byte read of the inner reader. Reaching the end of the inner reader is reported as
/// `None` by [`BitReader::read_bit`]; once that has happened the reader should not be used for
/// anything but error reporting.
#[derive(Debug)]
pub struct BitReader<R> {
    inner: R,
    cursor: BitCursor,
    position: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cursor: BitCursor::NeedByte,
            position: 0,
        }
    }

    /// Number of bytes fetched from the inner reader so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// True when the next bit will come from a fresh byte
    pub fn is_aligned(&self) -> bool {
        matches!(self.cursor, BitCursor::NeedByte)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fetch_byte(&mut self) -> Result<Option<u8>, GpxError> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read the next bit. Returns `Ok(None)` once the inner reader is exhausted.
    pub fn read_bit(&mut self) -> Result<Option<u8>, GpxError> {
        let (byte, bit) = match self.cursor {
            BitCursor::HaveByte { byte, bit } => (byte, bit),
            BitCursor::NeedByte => match self.fetch_byte()? {
                Some(byte) => (byte, 0),
                None => return Ok(None),
            },
        };
        let value = (byte >> (7 - bit)) & 0x01;
        self.cursor = if bit == 7 {
            BitCursor::NeedByte
        } else {
            BitCursor::HaveByte { byte, bit: bit + 1 }
        };
        Ok(Some(value))
    }

    /// Read `count` bits and pack them into an integer in the given order.
    ///
    /// Bits that could not be read because the source ended are skipped: they contribute nothing
    /// and the bits that were read keep the positions they would have had in a full read.
    ///
    /// # Panics
    ///
    /// Panics if `count` is greater than 32.
    pub fn read_bits(&mut self, count: u32, order: BitOrder) -> Result<u32, GpxError> {
        Ok(self.read_bits_counted(count, order)?.0)
    }

    /// Like [`BitReader::read_bits`], but running out of source data is an error
    ///
    /// # Panics
    ///
    /// Panics if `count` is greater than 32.
    pub fn read_bits_exact(&mut self, count: u32, order: BitOrder) -> Result<u32, GpxError> {
        let (value, read) = self.read_bits_counted(count, order)?;
        if read != count {
            return Err(GpxError::TruncatedSource);
        }
        Ok(value)
    }

    fn read_bits_counted(&mut self, count: u32, order: BitOrder) -> Result<(u32, u32), GpxError> {
        assert!(count <= u32::BITS, "cannot pack {} bits into a u32", count);
        let mut value: u32 = 0;
        let mut read = 0;
        for index in 0..count {
            if let Some(bit) = self.read_bit()? {
                let exp = match order {
                    BitOrder::Msb => count - index - 1,
                    BitOrder::Lsb => index,
                };
                value |= u32::from(bit) << exp;
                read += 1;
            }
        }
        Ok((value, read))
    }

    /// Read exactly `count` bytes worth of bits, most significant byte first
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, GpxError> {
        let mut buf = vec![0u8; count];
        self.read_exact_bits(&mut buf)?;
        Ok(buf)
    }

    /// Fill `buf` with the next `buf.len() * 8` bits
    pub fn read_exact_bits(&mut self, buf: &mut [u8]) -> Result<(), GpxError> {
        if self.is_aligned() {
            self.inner.read_exact(buf)?;
            self.position += buf.len() as u64;
            return Ok(());
        }
        for b in buf.iter_mut() {
            *b = self.read_bits_exact(8, BitOrder::Msb)? as u8;
        }
        Ok(())
    }

    /// Drain everything left in the source.
    ///
    /// When the reader is byte-aligned this is simply the remaining bytes. Otherwise the remaining
    /// bits are packed into one big-endian number, which is returned left-padded to whole bytes.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, GpxError> {
        let mut out = Vec::new();
        if self.is_aligned() {
            let n = self.inner.read_to_end(&mut out)?;
            self.position += n as u64;
            return Ok(out);
        }

        let mut bits = Vec::new();
        while let Some(bit) = self.read_bit()? {
            bits.push(bit);
        }
        let pad = (8 - bits.len() % 8) % 8;
        let mut acc: u8 = 0;
        for (n, bit) in std::iter::repeat(0).take(pad).chain(bits).enumerate() {
            acc = (acc << 1) | bit;
            if n % 8 == 7 {
                out.push(acc);
                acc = 0;
            }
        }
        Ok(out)
    }
}
