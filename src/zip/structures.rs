use byteorder::{LittleEndian, ReadBytesExt};
use std::borrow::Cow;
use std::io::Cursor;

use crate::error::{Error, Result};

/// Local File Header signature (PK\x03\x04)
pub const LOCAL_FILE_SIGNATURE: u32 = 0x04034B50;
/// Central Directory File Header signature (PK\x01\x02)
pub const CENTRAL_DIR_SIGNATURE: u32 = 0x02014B50;
/// End of Central Directory signature (PK\x05\x06)
pub const END_CENTRAL_DIR_SIGNATURE: u32 = 0x06054B50;

/// General purpose flag bit 11: filename and comment are UTF-8
const FLAG_UTF8: u16 = 1 << 11;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Borrow `len` bytes at `offset`, or report how far short the buffer is.
fn record(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(Error::Truncated {
            offset: offset as u64,
            needed: len as u64,
            available: buf.len().saturating_sub(offset) as u64,
        })
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndCentDirHeader {
    pub signature: u32,
    pub disk_number: u16,
    pub start_disk_number: u16,
    pub disk_dir_entry: u16,
    pub dir_entry: u16,
    pub dir_size: u32,
    pub start_pos: u32,
    pub comment_len: u16,
}

impl EndCentDirHeader {
    pub const SIZE: usize = 22;

    /// Decode the record starting at `offset`.
    pub fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let mut cursor = Cursor::new(record(buf, offset, Self::SIZE)?);

        Ok(Self {
            signature: cursor.read_u32::<LittleEndian>()?,
            disk_number: cursor.read_u16::<LittleEndian>()?,
            start_disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_dir_entry: cursor.read_u16::<LittleEndian>()?,
            dir_entry: cursor.read_u16::<LittleEndian>()?,
            dir_size: cursor.read_u32::<LittleEndian>()?,
            start_pos: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirHeader {
    pub signature: u32,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_len: u16,
    pub extra_len: u16,
    pub comment_len: u16,
    pub disk_number: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    /// Absolute offset of the matching local file header
    pub header_pos: u32,
    /// Size of this record including name, extra field and comment
    pub all_size: usize,
}

impl CentralDirHeader {
    pub const MIN_SIZE: usize = 46;

    /// Decode the record starting at `offset`.
    ///
    /// Only the fixed part must be present; the variable fields are accounted
    /// for in [`all_size`](Self::all_size) but not read.
    pub fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let mut cursor = Cursor::new(record(buf, offset, Self::MIN_SIZE)?);

        let signature = cursor.read_u32::<LittleEndian>()?;
        let version_made_by = cursor.read_u16::<LittleEndian>()?;
        let version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
        let file_name_len = cursor.read_u16::<LittleEndian>()?;
        let extra_len = cursor.read_u16::<LittleEndian>()?;
        let comment_len = cursor.read_u16::<LittleEndian>()?;
        let disk_number = cursor.read_u16::<LittleEndian>()?;
        let internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let external_attrs = cursor.read_u32::<LittleEndian>()?;
        let header_pos = cursor.read_u32::<LittleEndian>()?;

        let all_size =
            Self::MIN_SIZE + file_name_len as usize + extra_len as usize + comment_len as usize;

        Ok(Self {
            signature,
            version_made_by,
            version_needed,
            flags,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_len,
            extra_len,
            comment_len,
            disk_number,
            internal_attrs,
            external_attrs,
            header_pos,
            all_size,
        })
    }
}

/// Local File Header (LFH) - 30 bytes plus file name and extra field
///
/// For buffer-backed archives `file_name_bytes` borrows straight from the
/// archive; ranged sources hold an owned copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader<'a> {
    pub signature: u32,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_len: u16,
    pub extra_len: u16,
    /// Fixed fields plus file name and extra field
    pub header_size: usize,
    /// `header_size` plus the compressed data
    pub total_size: usize,
    pub file_name_bytes: Cow<'a, [u8]>,
}

impl<'a> LocalFileHeader<'a> {
    pub const FIXED_SIZE: usize = 30;

    /// Decode the record starting at `offset`, borrowing the file name bytes.
    pub fn read(buf: &'a [u8], offset: usize) -> Result<Self> {
        let mut cursor = Cursor::new(record(buf, offset, Self::FIXED_SIZE)?);

        let signature = cursor.read_u32::<LittleEndian>()?;
        let version_needed = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
        let file_name_len = cursor.read_u16::<LittleEndian>()?;
        let extra_len = cursor.read_u16::<LittleEndian>()?;

        let header_size = Self::FIXED_SIZE + file_name_len as usize + extra_len as usize;
        let file_name_bytes = record(buf, offset + Self::FIXED_SIZE, file_name_len as usize)?;

        Ok(Self {
            signature,
            version_needed,
            flags,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_len,
            extra_len,
            header_size,
            total_size: header_size + compressed_size as usize,
            file_name_bytes: Cow::Borrowed(file_name_bytes),
        })
    }

    /// Take the authoritative CRC and sizes from the central directory.
    ///
    /// Local headers written with a trailing data descriptor carry zeroes in
    /// these fields.
    pub fn reconcile(&self, central: &CentralDirHeader) -> LocalFileHeader<'a> {
        LocalFileHeader {
            crc32: central.crc32,
            compressed_size: central.compressed_size,
            uncompressed_size: central.uncompressed_size,
            total_size: self.header_size + central.compressed_size as usize,
            ..self.clone()
        }
    }

    /// Detach from the source buffer.
    pub fn into_owned(self) -> LocalFileHeader<'static> {
        LocalFileHeader {
            signature: self.signature,
            version_needed: self.version_needed,
            flags: self.flags,
            compression_method: self.compression_method,
            last_mod_time: self.last_mod_time,
            last_mod_date: self.last_mod_date,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            file_name_len: self.file_name_len,
            extra_len: self.extra_len,
            header_size: self.header_size,
            total_size: self.total_size,
            file_name_bytes: Cow::Owned(self.file_name_bytes.into_owned()),
        }
    }

    pub fn method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.compression_method)
    }

    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.file_name_bytes.last() == Some(&b'/')
    }

    /// Whether the writer flagged the name as UTF-8
    pub fn is_utf8(&self) -> bool {
        self.flags & FLAG_UTF8 != 0
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}
