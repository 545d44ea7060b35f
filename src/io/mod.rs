mod http;
mod local;

pub use http::{HttpRangeReader, RetryPolicy};
pub use local::LocalFileReader;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Whether [`read_at_sync`](Self::read_at_sync) can serve reads
    fn supports_blocking(&self) -> bool {
        false
    }

    /// Read data at the specified offset, blocking the calling thread
    fn read_at_sync(&self, _offset: u64, _buf: &mut [u8]) -> Result<usize> {
        bail!("This source does not support blocking reads")
    }
}

/// In-memory source, mostly useful for tests and small archives
#[async_trait]
impl ReadAt for Vec<u8> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.read_at_sync(offset, buf)
    }

    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn supports_blocking(&self) -> bool {
        true
    }

    fn read_at_sync(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = (offset as usize).min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}
