//! Archive reader over an in-memory buffer.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::index::{ArchiveIndex, ZipEntry};
use super::inflate;
use super::locator::{find_end_central_dir, has_local_file_signature};
use super::options::ReaderOptions;
use super::progress::ProgressReporter;
use super::reader::{ArchiveReader, ensure_blocking};
use super::structures::{CentralDirHeader, EndCentDirHeader, LocalFileHeader};

/// ZIP reader borrowing a complete archive from memory.
///
/// File names and entry data are served straight out of the caller's buffer,
/// which is never copied or modified.
///
/// ## Example
///
/// ```no_run
/// use memzip::{ArchiveReader, BufferArchiveReader, ReaderOptions};
///
/// # async fn run(bytes: Vec<u8>) -> memzip::Result<()> {
/// let reader = BufferArchiveReader::init(&bytes, ReaderOptions::new()).await?;
/// for name in reader.list_file_names() {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BufferArchiveReader<'a> {
    bytes: &'a [u8],
    options: ReaderOptions,
    index: ArchiveIndex<'a>,
}

impl<'a> BufferArchiveReader<'a> {
    /// Parse `bytes` and build the entry index.
    pub async fn init(bytes: &'a [u8], options: ReaderOptions) -> Result<Self> {
        if !has_local_file_signature(bytes) {
            return Err(Error::InvalidArchive("missing local file header signature"));
        }

        let eocd_offset = find_end_central_dir(bytes)
            .ok_or(Error::InvalidArchive("end of central directory not found"))?;
        let eocd = EndCentDirHeader::read(bytes, eocd_offset)?;
        debug!(
            "End of central directory at {}: {} entries starting at {}",
            eocd_offset, eocd.dir_entry, eocd.start_pos
        );

        // Central directory records are packed back to back
        let mut offset = eocd.start_pos as usize;
        let mut central_dir_headers = Vec::with_capacity(eocd.dir_entry as usize);
        for _ in 0..eocd.dir_entry {
            let header = CentralDirHeader::read(bytes, offset)?;
            trace!("Central directory header at {}: {} bytes", offset, header.all_size);
            offset += header.all_size;
            central_dir_headers.push(header);
        }

        let mut progress = ProgressReporter::new(options.progress.as_ref(), bytes.len() as u64);
        let mut local_file_headers = Vec::with_capacity(central_dir_headers.len());
        for central in &central_dir_headers {
            offset = central.header_pos as usize;
            local_file_headers.push(LocalFileHeader::read(bytes, offset)?);
            progress.tick(offset as u64);
        }
        progress.finish(offset as u64);

        tokio::task::yield_now().await;
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
            bytes,
            options,
            index,
        })
    }

    /// The archive this reader was built from
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Resolve `file_name` to its entry and raw (possibly compressed) data.
    fn entry_data(&self, file_name: &str) -> Result<(&ZipEntry<'a>, &'a [u8])> {
        let entry = self.index.entry(file_name)?;
        let start = entry.data_offset();
        let len = entry.compressed_size();
        let data = start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start as usize..end as usize))
            .ok_or(Error::Truncated {
                offset: start,
                needed: len,
                available: (self.bytes.len() as u64).saturating_sub(start),
            })?;
        Ok((entry, data))
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

#[async_trait]
impl<'a> ArchiveReader for BufferArchiveReader<'a> {
    fn index(&self) -> &ArchiveIndex<'_> {
        &self.index
    }

    fn options(&self) -> &ReaderOptions {
        &self.options
    }

    async fn decompress(&self, file_name: &str) -> Result<Vec<u8>> {
        let (entry, data) = self.entry_data(file_name)?;
        tokio::task::yield_now().await;
        self.extract(entry, data)
    }

    fn decompress_sync(&self, file_name: &str) -> Result<Vec<u8>> {
        ensure_blocking(&self.options)?;
        let (entry, data) = self.entry_data(file_name)?;
        self.extract(entry, data)
    }
}
