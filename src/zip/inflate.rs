//! Per-entry decompression: stored copy or chunked inflate.

use flate2::read::DeflateDecoder;
use std::io::Read;
use tracing::warn;

use crate::error::{Error, Result};

use super::structures::CompressionMethod;

/// Default number of bytes produced per inflate step
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Upper bound on the output capacity reserved up front
const MAX_PREALLOCATION: usize = 1024 * 1024;

/// Turn an entry's raw data into its content.
///
/// Method 0 is copied as is. Every other method is handed to inflate; methods
/// other than DEFLATE will normally fail there.
pub fn decompress(
    data: &[u8],
    method: CompressionMethod,
    chunk_size: usize,
    size_hint: usize,
) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Stored => Ok(data.to_vec()),
        CompressionMethod::Deflate => inflate(data, chunk_size, size_hint),
        CompressionMethod::Unknown(value) => {
            warn!("Compression method {} is not DEFLATE, trying inflate anyway", value);
            inflate(data, chunk_size, size_hint)
        }
    }
}

/// Inflate a raw DEFLATE stream, `chunk_size` bytes at a time.
///
/// `size_hint` is the declared uncompressed size. It only sizes the initial
/// allocation, bounded by the input length and [`MAX_PREALLOCATION`].
pub fn inflate(data: &[u8], chunk_size: usize, size_hint: usize) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let capacity = size_hint
        .min(data.len().saturating_mul(4))
        .min(MAX_PREALLOCATION);
    let mut output = Vec::with_capacity(capacity);
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        let n = decoder.read(&mut chunk).map_err(Error::Decompression)?;
        if n == 0 {
            break;
        }
        output.extend_from_slice(&chunk[..n]);
    }

    Ok(output)
}
