//! The archive reader capability shared by every backing source.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

use super::encoding;
use super::index::{ArchiveIndex, ZipEntry};
use super::options::ReaderOptions;

/// Content type used for data URLs
const OCTET_STREAM: &str = "application/octet-stream";

/// Extracted bytes tagged with a content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// A parsed, ready-to-use ZIP archive.
///
/// Implementors provide the index built by their `init` constructor and the two
/// decompression primitives; listing and the output adapters are shared.
///
/// The `*_sync` methods block the calling thread and fail with
/// [`Error::UnsupportedEnvironment`] unless the reader was opened with
/// [`ReaderOptions::allow_blocking`].
#[async_trait]
pub trait ArchiveReader: Send + Sync {
    fn index(&self) -> &ArchiveIndex<'_>;

    fn options(&self) -> &ReaderOptions;

    /// Decompressed content of the first entry named `file_name`.
    async fn decompress(&self, file_name: &str) -> Result<Vec<u8>>;

    /// Blocking form of [`decompress`](Self::decompress).
    fn decompress_sync(&self, file_name: &str) -> Result<Vec<u8>>;

    /// Names of all non-directory entries, in Central Directory order
    fn list_file_names(&self) -> Vec<&str> {
        self.index()
            .files()
            .map(|entry| entry.file_name.as_str())
            .collect()
    }

    fn list_files(&self) -> Vec<&ZipEntry<'_>> {
        self.index().files().collect()
    }

    fn list_folders(&self) -> Vec<&ZipEntry<'_>> {
        self.index().folders().collect()
    }

    fn index_of(&self, file_name: &str) -> Result<usize> {
        self.index().index_of(file_name)
    }

    fn entry(&self, file_name: &str) -> Result<&ZipEntry<'_>> {
        self.index().entry(file_name)
    }

    async fn extract_as_bytes(&self, file_name: &str) -> Result<Vec<u8>> {
        self.decompress(file_name).await
    }

    async fn extract_as_blob(&self, file_name: &str, content_type: Option<&str>) -> Result<Blob> {
        let data = self.decompress(file_name).await?;
        Ok(to_blob(data, content_type))
    }

    /// Entry content decoded as text; `encoding` defaults to UTF-8.
    async fn extract_as_text(&self, file_name: &str, encoding: Option<&str>) -> Result<String> {
        let label = encoding.unwrap_or("utf-8");
        let encoding = encoding::resolve(label)?;
        let data = self.decompress(file_name).await?;
        Ok(to_text(&data, encoding))
    }

    async fn extract_as_data_url(&self, file_name: &str) -> Result<String> {
        let data = self.decompress(file_name).await?;
        Ok(to_data_url(&data))
    }

    fn extract_as_bytes_sync(&self, file_name: &str) -> Result<Vec<u8>> {
        self.decompress_sync(file_name)
    }

    fn extract_as_blob_sync(&self, file_name: &str, content_type: Option<&str>) -> Result<Blob> {
        let data = self.decompress_sync(file_name)?;
        Ok(to_blob(data, content_type))
    }

    fn extract_as_text_sync(&self, file_name: &str, encoding: Option<&str>) -> Result<String> {
        ensure_blocking(self.options())?;
        let label = encoding.unwrap_or("utf-8");
        let encoding = encoding::resolve(label)?;
        let data = self.decompress_sync(file_name)?;
        Ok(to_text(&data, encoding))
    }

    fn extract_as_data_url_sync(&self, file_name: &str) -> Result<String> {
        let data = self.decompress_sync(file_name)?;
        Ok(to_data_url(&data))
    }
}

/// Fail unless blocking extraction was enabled for this reader.
pub(crate) fn ensure_blocking(options: &ReaderOptions) -> Result<()> {
    if options.allow_blocking {
        Ok(())
    } else {
        Err(Error::UnsupportedEnvironment(
            "blocking extraction requires ReaderOptions::allow_blocking",
        ))
    }
}

fn to_blob(data: Vec<u8>, content_type: Option<&str>) -> Blob {
    Blob {
        data,
        content_type: content_type.map(str::to_string),
    }
}

/// Decode with BOM sniffing, replacing malformed sequences.
fn to_text(data: &[u8], encoding: &'static encoding_rs::Encoding) -> String {
    let (text, _, _) = encoding.decode(data);
    text.into_owned()
}

fn to_data_url(data: &[u8]) -> String {
    format!("data:{};base64,{}", OCTET_STREAM, STANDARD.encode(data))
}
