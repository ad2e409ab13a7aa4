//! Test-only writers for GPX containers: an MSB-first bit writer, a greedy encoder for the BCFZ
//! scheme and a builder for the BCFS sector layout.
#![allow(dead_code)]

pub const SECTOR_SIZE: usize = 0x1000;

const CHAIN_OFFSET: usize = 0x94;
const MAX_CHAIN_LEN: usize = (SECTOR_SIZE - CHAIN_OFFSET) / 4 - 2;
const SEARCH_WINDOW: usize = 512;
const MIN_MATCH: usize = 4;

/// Bit writer - MSB-first, accumulates into a byte buffer.
pub struct BitWriter {
    pub buf: Vec<u8>,
    used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new(), used: 8 }
    }

    pub fn write_bit(&mut self, bit: u32) {
        if self.used == 8 {
            self.buf.push(0);
            self.used = 0;
        }
        if bit != 0 {
            *self.buf.last_mut().unwrap() |= 1 << (7 - self.used);
        }
        self.used += 1;
    }

    pub fn write_msb(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1);
        }
    }

    pub fn write_lsb(&mut self, value: u32, count: u32) {
        for i in 0..count {
            self.write_bit((value >> i) & 1);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn emit_literals(w: &mut BitWriter, lits: &[u8]) {
    for run in lits.chunks(3) {
        w.write_bit(0);
        w.write_lsb(run.len() as u32, 2);
        for b in run {
            w.write_msb(u32::from(*b), 8);
        }
    }
}

fn emit_back_reference(w: &mut BitWriter, offset: usize, size: usize) {
    let word_size = 32 - (offset.max(size) as u32).leading_zeros();
    w.write_bit(1);
    w.write_msb(word_size, 4);
    w.write_lsb(offset as u32, word_size);
    w.write_lsb(size as u32, word_size);
}

/// Encode `body` as a BCFZ payload (everything after the magic). The decompressed stream starts
/// with its own 4-byte length, which the decoder strips again.
pub fn compress(body: &[u8]) -> Vec<u8> {
    let total = (body.len() + 4) as u32;
    let mut data = total.to_le_bytes().to_vec();
    data.extend_from_slice(body);

    let mut w = BitWriter::new();
    let mut pending = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let mut best = (0, 0);
        for offset in 1..=SEARCH_WINDOW.min(pos) {
            let start = pos - offset;
            let len = data[pos..]
                .iter()
                .zip(&data[start..start + offset])
                .take_while(|(a, b)| a == b)
                .count();
            if len > best.1 {
                best = (offset, len);
            }
        }
        if best.1 >= MIN_MATCH {
            emit_literals(&mut w, &pending);
            pending.clear();
            emit_back_reference(&mut w, best.0, best.1);
            pos += best.1;
        } else {
            pending.push(data[pos]);
            pos += 1;
        }
    }
    emit_literals(&mut w, &pending);

    let mut out = total.to_le_bytes().to_vec();
    out.extend_from_slice(&w.into_bytes());
    out
}

/// Lay out files in the BCFS sector format: each file gets one table sector followed directly
/// by its data sectors.
pub fn build_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = vec![0xFF; SECTOR_SIZE];
    for (name, content) in files {
        let table = body.len();
        body.resize(table + SECTOR_SIZE, 0);
        body[table..table + 4].copy_from_slice(&2u32.to_le_bytes());
        body[table + 0x04..table + 0x04 + name.len()].copy_from_slice(name.as_bytes());
        body[table + 0x8C..table + 0x90].copy_from_slice(&(content.len() as u32).to_le_bytes());

        let sectors: Vec<&[u8]> = content.chunks(SECTOR_SIZE).collect();
        assert!(sectors.len() <= MAX_CHAIN_LEN);
        for (i, chunk) in sectors.iter().enumerate() {
            let index = (body.len() / SECTOR_SIZE) as u32;
            let slot = table + CHAIN_OFFSET + 4 * (i + 1);
            body[slot..slot + 4].copy_from_slice(&index.to_le_bytes());
            let start = body.len();
            body.resize(start + SECTOR_SIZE, 0);
            body[start..start + chunk.len()].copy_from_slice(chunk);
        }
    }
    body
}

pub fn bcfs(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = b"BCFS".to_vec();
    out.extend_from_slice(&build_body(files));
    out
}

pub fn bcfz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = b"BCFZ".to_vec();
    out.extend_from_slice(&compress(&build_body(files)));
    out
}

/// Deterministic filler that mixes noise with repeated phrases
pub fn sample_data(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        if (state >> 16) % 4 == 0 {
            out.extend_from_slice(b"<Bar><Voices>0 1 -1 -1</Voices></Bar>");
        } else {
            out.push((state >> 24) as u8);
        }
    }
    out.truncate(len);
    out
}
