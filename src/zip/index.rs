//! Entry index built once parsing is complete.

use encoding_rs::Encoding;
use tracing::debug;

use crate::error::{Error, Result};

use super::encoding;
use super::structures::{CentralDirHeader, CompressionMethod, LocalFileHeader};

/// One archived item, in Central Directory order.
#[derive(Debug, Clone)]
pub struct ZipEntry<'a> {
    pub file_name: String,
    /// Local header carrying the central directory's CRC and sizes
    pub header: LocalFileHeader<'a>,
    /// Absolute offset of the local header
    pub header_pos: u64,
}

impl ZipEntry<'_> {
    pub fn file_name_bytes(&self) -> &[u8] {
        &self.header.file_name_bytes
    }

    pub fn is_directory(&self) -> bool {
        self.header.is_directory()
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.header.method()
    }

    pub fn crc32(&self) -> u32 {
        self.header.crc32
    }

    pub fn compressed_size(&self) -> u64 {
        self.header.compressed_size as u64
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.header.uncompressed_size as u64
    }

    /// Absolute offset of the entry's data
    pub fn data_offset(&self) -> u64 {
        self.header_pos + self.header.header_size as u64
    }

    pub fn mod_date(&self) -> (u16, u8, u8) {
        self.header.mod_date()
    }

    pub fn mod_time(&self) -> (u8, u8, u8) {
        self.header.mod_time()
    }
}

/// Parsed archive contents
///
/// `central_dir_headers[i]` and `entries[i]` describe the same item.
#[derive(Debug, Clone)]
pub struct ArchiveIndex<'a> {
    central_dir_headers: Vec<CentralDirHeader>,
    entries: Vec<ZipEntry<'a>>,
    files: Vec<usize>,
    folders: Vec<usize>,
    encoding: &'static Encoding,
}

impl<'a> ArchiveIndex<'a> {
    /// Reconcile, classify and name the parsed records.
    ///
    /// `label` names the file name encoding; `None` detects one from the names.
    pub fn build(
        central_dir_headers: Vec<CentralDirHeader>,
        local_file_headers: Vec<LocalFileHeader<'a>>,
        label: Option<&str>,
    ) -> Result<Self> {
        if central_dir_headers.len() != local_file_headers.len() {
            return Err(Error::InvalidArchive(
                "central directory and local headers are misaligned",
            ));
        }

        let headers: Vec<LocalFileHeader<'a>> = local_file_headers
            .iter()
            .zip(&central_dir_headers)
            .map(|(local, central)| local.reconcile(central))
            .collect();

        let encoding = match label {
            Some(label) => encoding::resolve(label)?,
            None => encoding::detect(headers.iter().map(|h| h.file_name_bytes.as_ref())),
        };
        debug!("Decoding {} file names as {}", headers.len(), encoding.name());

        let entries: Vec<ZipEntry<'a>> = headers
            .into_iter()
            .zip(&central_dir_headers)
            .map(|(header, central)| ZipEntry {
                file_name: encoding::decode(encoding, &header.file_name_bytes),
                header,
                header_pos: central.header_pos as u64,
            })
            .collect();

        let (folders, files): (Vec<usize>, Vec<usize>) =
            (0..entries.len()).partition(|&i| entries[i].is_directory());

        Ok(Self {
            central_dir_headers,
            entries,
            files,
            folders,
            encoding,
        })
    }

    /// Position of the first entry named `file_name`.
    pub fn index_of(&self, file_name: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| entry.file_name == file_name)
            .ok_or_else(|| Error::EntryNotFound(file_name.to_string()))
    }

    /// First entry named `file_name`.
    pub fn entry(&self, file_name: &str) -> Result<&ZipEntry<'a>> {
        self.index_of(file_name).map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> &[ZipEntry<'a>] {
        &self.entries
    }

    pub fn central_dir_headers(&self) -> &[CentralDirHeader] {
        &self.central_dir_headers
    }

    pub fn files(&self) -> impl Iterator<Item = &ZipEntry<'a>> + '_ {
        self.files.iter().map(|&i| &self.entries[i])
    }

    pub fn folders(&self) -> impl Iterator<Item = &ZipEntry<'a>> + '_ {
        self.folders.iter().map(|&i| &self.entries[i])
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveIndex<'_> {
    /// Detach every entry from the source buffer.
    pub fn into_owned(self) -> ArchiveIndex<'static> {
        ArchiveIndex {
            central_dir_headers: self.central_dir_headers,
            entries: self
                .entries
                .into_iter()
                .map(|entry| ZipEntry {
                    file_name: entry.file_name,
                    header: entry.header.into_owned(),
                    header_pos: entry.header_pos,
                })
                .collect(),
            files: self.files,
            folders: self.folders,
            encoding: self.encoding,
        }
    }
}
