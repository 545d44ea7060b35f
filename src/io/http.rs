//! Random-access source over HTTP Range requests.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::ReadAt;

/// How failed connections are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first
    pub max_attempts: u32,
    /// Delay before the first retry, growing linearly
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Archive source served by an HTTP server that honours `Range` requests.
///
/// The archive reader only asks for what it needs: the first four bytes, the
/// tail holding the End of Central Directory, the central directory, each
/// local header, and the data of extracted entries.
#[derive(Debug)]
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
    retry: RetryPolicy,
}

impl HttpRangeReader {
    /// Connect with a default client (30 s timeout).
    pub async fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Self::with_client(client, url).await
    }

    /// Send a HEAD request through `client` to learn the archive size and
    /// check that byte ranges are accepted.
    pub async fn with_client(client: Client, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HEAD {} failed with status: {}", url, resp.status());
        }

        let headers = resp.headers();
        let accepts_bytes = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));
        if !accepts_bytes {
            bail!("{} does not advertise byte range support", url);
        }

        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| anyhow!("{} did not report a Content-Length", url))?;
        debug!("HEAD {}: {} bytes", url, size);

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Body bytes received so far
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// GET `bytes=start-end`, retrying connection failures and timeouts.
    async fn get_range(&self, start: u64, end: u64) -> Result<Response> {
        let range = format!("bytes={}-{}", start, end);
        let mut attempt = 1;
        loop {
            debug!("GET {} Range: {}", self.url, range);
            match self.client.get(&self.url).header(RANGE, &range).send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.retry.max_attempts => {
                    warn!(
                        "Connection error, retry {}/{}: {}",
                        attempt, self.retry.max_attempts, e
                    );
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("GET {} Range: {}", self.url, range));
                }
            }
        }
    }

    /// Copy the bytes from `start` to `end` (inclusive) into `out`, returning
    /// how many arrived.
    async fn fetch_into(&self, start: u64, end: u64, out: &mut [u8]) -> Result<usize> {
        let resp = self.get_range(start, end).await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        let chunk = match status {
            StatusCode::PARTIAL_CONTENT => &body[..],
            // The whole archive came back; keep the requested window
            StatusCode::OK => {
                warn!("{} ignored the Range header, slicing a full response", self.url);
                body.get(start as usize..).unwrap_or_default()
            }
            status => bail!("GET {} failed with status: {}", self.url, status),
        };
        if chunk.is_empty() {
            bail!("{} returned no data for bytes={}-{}", self.url, start, end);
        }

        let n = chunk.len().min(out.len());
        out[..n].copy_from_slice(&chunk[..n]);
        self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let len = (buf.len() as u64).min(self.size - offset) as usize;
        let mut filled = 0;
        while filled < len {
            let start = offset + filled as u64;
            let end = offset + len as u64 - 1;
            filled += self.fetch_into(start, end, &mut buf[filled..len]).await?;
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
