//! Archive reader over a random-access source.
//!
//! Only the parts of the archive that are needed get read: the first four
//! bytes, the tail holding the End of Central Directory record, the Central
//! Directory itself, every local header, and the data of extracted entries.
//! This keeps remote archives cheap to list.

use async_trait::async_trait;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::index::{ArchiveIndex, ZipEntry};
use super::inflate;
use super::locator::{find_end_central_dir, has_local_file_signature};
use super::options::ReaderOptions;
use super::progress::ProgressReporter;
use super::reader::{ArchiveReader, ensure_blocking};
use super::structures::{CentralDirHeader, EndCentDirHeader, LocalFileHeader};

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP reader fetching byte ranges from a [`ReadAt`] source on demand.
pub struct RangeArchiveReader<R: ReadAt> {
    reader: Arc<R>,
    options: ReaderOptions,
    index: ArchiveIndex<'static>,
}

impl<R: ReadAt> RangeArchiveReader<R> {
    /// Read the archive structure from `reader` and build the entry index.
    pub async fn init(reader: Arc<R>, options: ReaderOptions) -> Result<Self> {
        let size = reader.size();

        let head = read_range(&*reader, 0, size.min(4)).await?;
        if !has_local_file_signature(&head) {
            return Err(Error::InvalidArchive("missing local file header signature"));
        }

        // The EOCD is 22 bytes plus a comment of at most 65535 bytes
        let tail_len = (MAX_COMMENT_SIZE + EndCentDirHeader::SIZE as u64 + 1).min(size);
        let tail_start = size - tail_len;
        let tail = read_range(&*reader, tail_start, tail_len).await?;
        let eocd_pos = find_end_central_dir(&tail)
            .ok_or(Error::InvalidArchive("end of central directory not found"))?;
        let eocd = EndCentDirHeader::read(&tail, eocd_pos)?;
        debug!(
            "End of central directory at {}: {} entries starting at {}",
            tail_start + eocd_pos as u64,
            eocd.dir_entry,
            eocd.start_pos
        );

        // Fetch the whole central directory in a single read
        let directory = read_range(&*reader, eocd.start_pos as u64, eocd.dir_size as u64).await?;
        let mut offset = 0;
        let mut central_dir_headers = Vec::with_capacity(eocd.dir_entry as usize);
        for _ in 0..eocd.dir_entry {
            let header = CentralDirHeader::read(&directory, offset)?;
            offset += header.all_size;
            central_dir_headers.push(header);
        }

        let mut position = eocd.start_pos as u64 + offset as u64;
        let mut progress = ProgressReporter::new(options.progress.as_ref(), size);
        let mut local_file_headers = Vec::with_capacity(central_dir_headers.len());
        for central in &central_dir_headers {
            position = central.header_pos as u64;
            local_file_headers.push(read_local_header(&*reader, central).await?);
            progress.tick(position);
        }
        progress.finish(position);

        let index = ArchiveIndex::build(
            central_dir_headers,
            local_file_headers,
            options.encoding.as_deref(),
        )?;
        debug!(
            "Indexed {} entries as {}",
            index.len(),
            index.encoding().name()
        );

        Ok(Self {
            reader,
            options,
            index,
        })
    }

    /// Get a reference to the underlying source.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    fn extract(&self, entry: &ZipEntry<'_>, data: &[u8]) -> Result<Vec<u8>> {
        inflate::decompress(
            data,
            entry.compression_method(),
            self.options.chunk_size,
            entry.uncompressed_size() as usize,
        )
    }
}

impl<R: ReadAt> fmt::Debug for RangeArchiveReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeArchiveReader")
            .field("size", &self.reader.size())
            .field("options", &self.options)
            .field("index", &self.index)
            .finish()
    }
}

#[async_trait]
impl<R: ReadAt> ArchiveReader for RangeArchiveReader<R> {
    fn index(&self) -> &ArchiveIndex<'_> {
        &self.index
    }

    fn options(&self) -> &ReaderOptions {
        &self.options
    }

    async fn decompress(&self, file_name: &str) -> Result<Vec<u8>> {
        let entry = self.index.entry(file_name)?;
        let data = read_range(&*self.reader, entry.data_offset(), entry.compressed_size()).await?;
        self.extract(entry, &data)
    }

    fn decompress_sync(&self, file_name: &str) -> Result<Vec<u8>> {
        ensure_blocking(&self.options)?;
        if !self.reader.supports_blocking() {
            return Err(Error::UnsupportedEnvironment(
                "the archive source does not support blocking reads",
            ));
        }
        let entry = self.index.entry(file_name)?;
        let data = read_range_sync(&*self.reader, entry.data_offset(), entry.compressed_size())?;
        self.extract(entry, &data)
    }
}

/// Read a local header, fetching its name along with the fixed part.
///
/// The central directory's name length is used as a first guess; a second read
/// is only needed when the local header disagrees.
async fn read_local_header<R: ReadAt + ?Sized>(
    reader: &R,
    central: &CentralDirHeader,
) -> Result<LocalFileHeader<'static>> {
    let pos = central.header_pos as u64;
    let fixed = LocalFileHeader::FIXED_SIZE as u64;

    let mut record = read_range(reader, pos, fixed + central.file_name_len as u64).await?;
    let name_len = LittleEndian::read_u16(&record[26..28]);
    if name_len != central.file_name_len {
        record = read_range(reader, pos, fixed + name_len as u64).await?;
    }

    Ok(LocalFileHeader::read(&record, 0)?.into_owned())
}

/// Fail unless `len` bytes at `offset` lie within the source.
///
/// Lengths come from archive headers, so they are checked before anything is
/// allocated for them.
fn check_range<R: ReadAt + ?Sized>(reader: &R, offset: u64, len: u64) -> Result<()> {
    let size = reader.size();
    if offset.checked_add(len).is_none_or(|end| end > size) {
        return Err(Error::Truncated {
            offset,
            needed: len,
            available: size.saturating_sub(offset),
        });
    }
    Ok(())
}

/// Read exactly `len` bytes at `offset`.
async fn read_range<R: ReadAt + ?Sized>(reader: &R, offset: u64, len: u64) -> Result<Vec<u8>> {
    check_range(reader, offset, len)?;
    let mut buf = vec![0u8; len as usize];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read_at(offset + filled as u64, &mut buf[filled..]).await?;
        if n == 0 {
            return Err(Error::Truncated {
                offset,
                needed: len,
                available: filled as u64,
            });
        }
        filled += n;
    }
    Ok(buf)
}

/// Blocking form of [`read_range`].
fn read_range_sync<R: ReadAt + ?Sized>(reader: &R, offset: u64, len: u64) -> Result<Vec<u8>> {
    check_range(reader, offset, len)?;
    let mut buf = vec![0u8; len as usize];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read_at_sync(offset + filled as u64, &mut buf[filled..])?;
        if n == 0 {
            return Err(Error::Truncated {
                offset,
                needed: len,
                available: filled as u64,
            });
        }
        filled += n;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_range_reports_short_source() {
        let source = b"0123456789".to_vec();
        assert_eq!(read_range(&source, 2, 3).await.unwrap(), b"234");
        assert!(read_range(&source, 10, 0).await.unwrap().is_empty());
        assert!(matches!(
            read_range(&source, 8, 5).await,
            Err(Error::Truncated {
                offset: 8,
                needed: 5,
                available: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_read_range_checks_length_before_reading() {
        let source = b"0123456789".to_vec();
        assert!(matches!(
            read_range(&source, 4, 0xFFFF_FFF0).await,
            Err(Error::Truncated {
                offset: 4,
                needed: 0xFFFF_FFF0,
                available: 6
            })
        ));
        assert!(matches!(
            read_range(&source, u64::MAX, 2).await,
            Err(Error::Truncated { available: 0, .. })
        ));
        assert!(matches!(
            read_range_sync(&source, 0, u64::from(u32::MAX)),
            Err(Error::Truncated { .. })
        ));
    }

    #[tokio::test]
    async fn test_oversized_central_directory() {
        // One stored entry "a.txt" holding "hi"
        let mut archive = Vec::new();
        archive.extend_from_slice(b"PK\x03\x04\x14\0\0\0\0\0\0\0\0\0");
        archive.extend_from_slice(&crate::crc32(b"hi", None).to_le_bytes());
        archive.extend_from_slice(&[2, 0, 0, 0, 2, 0, 0, 0, 5, 0, 0, 0]);
        archive.extend_from_slice(b"a.txthi");
        let central_offset = archive.len() as u32;
        archive.extend_from_slice(b"PK\x01\x02");
        archive.extend_from_slice(&[0u8; 42]);
        archive[central_offset as usize + 28] = 5;
        archive.extend_from_slice(b"a.txt");
        archive.extend_from_slice(b"PK\x05\x06\0\0\0\0\x01\0\x01\0");
        archive.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        archive.extend_from_slice(&central_offset.to_le_bytes());
        archive.extend_from_slice(&[0, 0]);

        let err = RangeArchiveReader::init(Arc::new(archive), ReaderOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                needed: 0xFFFF_FFF0,
                ..
            }
        ));
    }

    #[test]
    fn test_read_range_sync() {
        let source = b"0123456789".to_vec();
        assert_eq!(read_range_sync(&source, 7, 3).unwrap(), b"789");
        assert!(read_range_sync(&source, 11, 1).is_err());
    }

    #[tokio::test]
    async fn test_debug_output() {
        let mut archive = b"PK\x03\x04".to_vec();
        archive.extend_from_slice(b"PK\x05\x06\0\0\0\0\0\0\0\0\0\0\0\0");
        archive.extend_from_slice(&4u32.to_le_bytes());
        archive.extend_from_slice(&[0, 0]);

        let reader = RangeArchiveReader::init(Arc::new(archive), ReaderOptions::new())
            .await
            .unwrap();
        let debug = format!("{:?}", reader);
        assert!(debug.starts_with("RangeArchiveReader"));
        assert!(debug.contains("size: 26"));
    }

    #[tokio::test]
    async fn test_rejects_non_zip() {
        let source = Arc::new(b"not a zip archive at all".to_vec());
        let err = RangeArchiveReader::init(source, ReaderOptions::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidArchive(_)));
    }
}
