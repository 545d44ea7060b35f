//! ZIP archive parsing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: header records and their little-endian decoders
//! - [`locator`]: End of Central Directory search
//! - [`index`]: reconciled, named entries in Central Directory order
//! - [`encoding`]: file name encoding resolution and detection
//! - [`progress`]: throttled progress reporting during `init`
//! - [`inflate`]: stored copy or chunked DEFLATE per entry
//! - [`reader`]: the [`ArchiveReader`] capability and its output adapters
//! - [`BufferArchiveReader`] and [`RangeArchiveReader`]: the two backing sources
//!
//! ## Parsing Strategy
//!
//! 1. Check the Local File Header signature at offset 0
//! 2. Scan backwards from the tail for the End of Central Directory record
//! 3. Read every Central Directory header, back to back
//! 4. Read the Local File Header each one points at; the Central Directory's
//!    CRC and sizes win over the local copy, which may be zero when the writer
//!    used a data descriptor
//! 5. Split entries into files and folders, resolve the name encoding, decode names
//!
//! ## Limitations
//!
//! - No ZIP64, encryption or multi-disk support
//! - Only STORED and DEFLATE data can be extracted
//! - CRC32 values are exposed but not verified during extraction

mod buffer;
pub mod encoding;
pub mod index;
pub mod inflate;
pub mod locator;
mod options;
pub mod progress;
mod ranged;
pub mod reader;
pub mod structures;

pub use buffer::BufferArchiveReader;
pub use index::{ArchiveIndex, ZipEntry};
pub use options::ReaderOptions;
pub use progress::{Progress, ProgressCallback};
pub use ranged::RangeArchiveReader;
pub use reader::{ArchiveReader, Blob};
pub use structures::*;
