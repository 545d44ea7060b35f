//! In-test ZIP writer producing byte-exact archives with known layouts.

#![allow(dead_code)]

pub mod server;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

const LOCAL_FILE_SIGNATURE: u32 = 0x04034B50;
const CENTRAL_DIR_SIGNATURE: u32 = 0x02014B50;
const END_CENTRAL_DIR_SIGNATURE: u32 = 0x06054B50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074B50;

/// 2024-06-15 10:30:00 in DOS format
pub const DOS_TIME: u16 = (10 << 11) | (30 << 5);
pub const DOS_DATE: u16 = ((2024 - 1980) << 9) | (6 << 5) | 15;

#[derive(Debug, Clone)]
pub struct TestEntry {
    pub name: Vec<u8>,
    pub data: Vec<u8>,
    pub method: u16,
    pub extra: Vec<u8>,
    pub data_descriptor: bool,
}

/// Byte layout of a built archive
#[derive(Debug, Clone)]
pub struct BuiltArchive {
    pub bytes: Vec<u8>,
    /// Offset of each entry's local header
    pub local_offsets: Vec<usize>,
    /// Raw (possibly compressed) data of each entry
    pub raw_data: Vec<Vec<u8>>,
    pub central_offset: usize,
    pub eocd_offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ZipBuilder {
    entries: Vec<TestEntry>,
    comment: Vec<u8>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: TestEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn stored(self, name: impl AsRef<[u8]>, data: &[u8]) -> Self {
        self.entry(TestEntry {
            name: name.as_ref().to_vec(),
            data: data.to_vec(),
            method: 0,
            extra: Vec::new(),
            data_descriptor: false,
        })
    }

    pub fn deflated(self, name: impl AsRef<[u8]>, data: &[u8]) -> Self {
        self.entry(TestEntry {
            name: name.as_ref().to_vec(),
            data: data.to_vec(),
            method: 8,
            extra: Vec::new(),
            data_descriptor: false,
        })
    }

    pub fn folder(self, name: impl AsRef<[u8]>) -> Self {
        self.stored(name, b"")
    }

    /// Deflated entry whose local header leaves CRC and sizes to a data descriptor
    pub fn streamed(self, name: impl AsRef<[u8]>, data: &[u8]) -> Self {
        self.entry(TestEntry {
            name: name.as_ref().to_vec(),
            data: data.to_vec(),
            method: 8,
            extra: Vec::new(),
            data_descriptor: true,
        })
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn build(&self) -> BuiltArchive {
        let mut out = Vec::new();
        let mut local_offsets = Vec::new();
        let mut raw_data = Vec::new();

        for entry in &self.entries {
            let raw = match entry.method {
                0 => entry.data.clone(),
                _ => deflate(&entry.data),
            };
            let crc = memzip::crc32(&entry.data, None);
            let (local_crc, local_comp, local_uncomp) = if entry.data_descriptor {
                (0, 0, 0)
            } else {
                (crc, raw.len() as u32, entry.data.len() as u32)
            };

            local_offsets.push(out.len());
            put_u32(&mut out, LOCAL_FILE_SIGNATURE);
            put_u16(&mut out, 20);
            put_u16(&mut out, flags(entry));
            put_u16(&mut out, entry.method);
            put_u16(&mut out, DOS_TIME);
            put_u16(&mut out, DOS_DATE);
            put_u32(&mut out, local_crc);
            put_u32(&mut out, local_comp);
            put_u32(&mut out, local_uncomp);
            put_u16(&mut out, entry.name.len() as u16);
            put_u16(&mut out, entry.extra.len() as u16);
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&entry.extra);
            out.extend_from_slice(&raw);

            if entry.data_descriptor {
                put_u32(&mut out, DATA_DESCRIPTOR_SIGNATURE);
                put_u32(&mut out, crc);
                put_u32(&mut out, raw.len() as u32);
                put_u32(&mut out, entry.data.len() as u32);
            }
            raw_data.push(raw);
        }

        let central_offset = out.len();
        for (i, entry) in self.entries.iter().enumerate() {
            put_u32(&mut out, CENTRAL_DIR_SIGNATURE);
            put_u16(&mut out, 0x031E);
            put_u16(&mut out, 20);
            put_u16(&mut out, flags(entry));
            put_u16(&mut out, entry.method);
            put_u16(&mut out, DOS_TIME);
            put_u16(&mut out, DOS_DATE);
            put_u32(&mut out, memzip::crc32(&entry.data, None));
            put_u32(&mut out, raw_data[i].len() as u32);
            put_u32(&mut out, entry.data.len() as u32);
            put_u16(&mut out, entry.name.len() as u16);
            put_u16(&mut out, 0); // extra
            put_u16(&mut out, 0); // comment
            put_u16(&mut out, 0); // disk
            put_u16(&mut out, 0); // internal attributes
            put_u32(&mut out, 0o100644 << 16);
            put_u32(&mut out, local_offsets[i] as u32);
            out.extend_from_slice(&entry.name);
        }
        let central_size = out.len() - central_offset;

        let eocd_offset = out.len();
        put_u32(&mut out, END_CENTRAL_DIR_SIGNATURE);
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.entries.len() as u16);
        put_u16(&mut out, self.entries.len() as u16);
        put_u32(&mut out, central_size as u32);
        put_u32(&mut out, central_offset as u32);
        put_u16(&mut out, self.comment.len() as u16);
        out.extend_from_slice(&self.comment);

        BuiltArchive {
            bytes: out,
            local_offsets,
            raw_data,
            central_offset,
            eocd_offset,
        }
    }
}

fn flags(entry: &TestEntry) -> u16 {
    let mut flags = 0;
    if std::str::from_utf8(&entry.name).is_ok() && !entry.name.is_ascii() {
        flags |= 1 << 11;
    }
    if entry.data_descriptor {
        flags |= 1 << 3;
    }
    flags
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Deterministic, mildly compressible test content
pub fn sample_data(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| b"lorem ipsum dolor sit amet "[i % 27] ^ ((i / 1000) as u8))
        .collect()
}
