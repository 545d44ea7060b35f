//! CRC32 checksum (IEEE 802.3, reflected polynomial 0xEDB88320).
//!
//! This is the checksum stored in every ZIP header. Extraction does not verify
//! it automatically; callers compare [`crc32`] of the extracted bytes against
//! [`ZipEntry::crc32`](crate::ZipEntry) when they need integrity checks.

const POLYNOMIAL: u32 = 0xEDB88320;

/// CRC32 lookup table, built at compile time
const TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Calculate the CRC32 of `data`.
///
/// Pass the checksum of the preceding chunks as `prior` to continue a
/// computation over a larger stream:
///
/// ```
/// let whole = memzip::crc32(b"123456789", None);
/// let first = memzip::crc32(b"1234", None);
/// assert_eq!(memzip::crc32(b"56789", Some(first)), whole);
/// ```
pub fn crc32(data: &[u8], prior: Option<u32>) -> u32 {
    let mut crc = match prior {
        Some(value) => !value,
        None => 0xFFFFFFFF,
    };
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ TABLE[index];
    }
    !crc
}

/// Incremental CRC32 hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32 {
    value: Option<u32>,
}

impl Crc32 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.value = Some(crc32(data, self.value));
    }

    /// Checksum of everything fed so far (0 for no input)
    pub fn finalize(&self) -> u32 {
        self.value.unwrap_or(0)
    }
}
