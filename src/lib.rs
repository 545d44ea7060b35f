//! # memzip
//!
//! Read ZIP archives held in memory, or fetched lazily from a random-access
//! source such as a local file or an HTTP server supporting Range requests.
//!
//! The archive is parsed once: the End of Central Directory record is located
//! from the tail, every Central Directory and Local File header is decoded, and
//! file names are decoded with an explicit or detected encoding (UTF-8,
//! Shift_JIS, ...). Entries can then be extracted as bytes, blobs, text or data
//! URLs, asynchronously or, when explicitly allowed, on the calling thread.
//!
//! ## Features
//!
//! - Zero-copy parsing of in-memory archives
//! - Ranged reading of local files and HTTP/HTTPS URLs
//! - STORED and DEFLATE entries, inflated in configurable chunks
//! - File name encoding detection
//! - Standalone CRC32 checksum
//!
//! ## Example
//!
//! ```no_run
//! use memzip::{ArchiveReader, ReaderOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("archive.zip")?;
//!     let reader = memzip::open(&bytes, ReaderOptions::new()).await?;
//!
//!     for name in reader.list_file_names() {
//!         let data = reader.extract_as_bytes(name).await?;
//!         println!("{name}: {} bytes, crc {:08x}", data.len(), memzip::crc32(&data, None));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod crc32;
pub mod error;
pub mod io;
pub mod zip;

use std::sync::Arc;

pub use cli::Cli;
pub use crc32::{Crc32, crc32};
pub use error::{Error, Result};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt, RetryPolicy};
pub use zip::{
    ArchiveReader, Blob, BufferArchiveReader, Progress, RangeArchiveReader, ReaderOptions,
    ZipEntry,
};

/// Open an archive held in memory.
pub async fn open(buffer: &[u8], options: ReaderOptions) -> Result<BufferArchiveReader<'_>> {
    BufferArchiveReader::init(buffer, options).await
}

/// Open an archive served by a random-access source.
pub async fn open_ranged<R: ReadAt>(
    reader: Arc<R>,
    options: ReaderOptions,
) -> Result<RangeArchiveReader<R>> {
    RangeArchiveReader::init(reader, options).await
}
