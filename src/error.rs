//! Error types for archive parsing and extraction

use thiserror::Error;

/// Result type for memzip operations
pub type Result<T> = std::result::Result<T, Error>;

/// memzip error types
#[derive(Error, Debug)]
pub enum Error {
    /// The source is not a ZIP archive this reader can parse
    #[error("Invalid zip archive: {0}")]
    InvalidArchive(&'static str),

    /// No entry with the requested name
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Blocking extraction attempted without the blocking capability
    #[error("Unsupported environment: {0}")]
    UnsupportedEnvironment(&'static str),

    /// A record or data range runs past the end of the source
    #[error("Truncated data at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// Encoding label not known to encoding_rs
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inflate failed on the entry's compressed data
    #[error("Decompression failed: {0}")]
    Decompression(#[source] std::io::Error),

    /// Failure reported by a random-access source
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}
