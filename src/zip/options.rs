use std::fmt;
use std::sync::Arc;

use super::inflate::DEFAULT_CHUNK_SIZE;
use super::progress::{Progress, ProgressCallback};

/// Reader configuration
///
/// ```
/// use memzip::ReaderOptions;
///
/// let options = ReaderOptions::new()
///     .with_encoding("Shift_JIS")
///     .with_chunk_size(64 * 1024)
///     .with_progress(|p| eprintln!("{}%", p.percent))
///     .allow_blocking(true);
/// assert_eq!(options.chunk_size, 64 * 1024);
/// ```
#[derive(Clone)]
pub struct ReaderOptions {
    /// File name encoding label; detected from the names when `None`
    pub encoding: Option<String>,
    /// Called with the scan position while local headers are read
    pub progress: Option<ProgressCallback>,
    /// Bytes produced per inflate step
    pub chunk_size: usize,
    /// Permit the blocking `*_sync` extraction methods
    pub allow_blocking: bool,
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn allow_blocking(mut self, allow: bool) -> Self {
        self.allow_blocking = allow;
        self
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            progress: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            allow_blocking: false,
        }
    }
}

impl fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("encoding", &self.encoding)
            .field("progress", &self.progress.is_some())
            .field("chunk_size", &self.chunk_size)
            .field("allow_blocking", &self.allow_blocking)
            .finish()
    }
}
