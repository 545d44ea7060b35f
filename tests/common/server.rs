//! Minimal HTTP/1.1 server answering HEAD and Range GETs over one byte buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const NO_BODY: &[u8] = &[];

/// How GET requests are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// 206 with the requested window
    Honor,
    /// 200 with the whole body
    Ignore,
    /// 206 with no body
    Empty,
}

pub struct RangeServer {
    pub url: String,
    gets: Arc<AtomicUsize>,
}

impl RangeServer {
    pub async fn start(body: Vec<u8>, mode: RangeMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/archive.zip", listener.local_addr().unwrap());
        let body = Arc::new(body);
        let gets = Arc::new(AtomicUsize::new(0));

        let counter = gets.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let body = body.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &body, mode, &counter).await;
                });
            }
        });

        Self { url, gets }
    }

    /// Number of GET requests answered so far
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

async fn serve(
    mut stream: TcpStream,
    body: &[u8],
    mode: RangeMode,
    gets: &AtomicUsize,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }
    let request = String::from_utf8_lossy(&request).to_ascii_lowercase();

    let total = body.len();
    let (status, headers, payload): (&str, Vec<String>, &[u8]) = if request.starts_with("head ") {
        (
            "200 OK",
            vec![
                format!("content-length: {total}"),
                "accept-ranges: bytes".to_string(),
            ],
            NO_BODY,
        )
    } else {
        gets.fetch_add(1, Ordering::SeqCst);
        match (mode, requested_range(&request, total)) {
            (RangeMode::Honor, Some((start, end))) => (
                "206 Partial Content",
                vec![
                    format!("content-range: bytes {start}-{end}/{total}"),
                    format!("content-length: {}", end - start + 1),
                ],
                &body[start..=end],
            ),
            (RangeMode::Empty, _) => (
                "206 Partial Content",
                vec!["content-length: 0".to_string()],
                NO_BODY,
            ),
            _ => (
                "200 OK",
                vec![format!("content-length: {total}")],
                body,
            ),
        }
    };

    let mut response = format!("HTTP/1.1 {status}\r\nconnection: close\r\n");
    for header in headers {
        response.push_str(&header);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");

    stream.write_all(response.as_bytes()).await?;
    stream.write_all(payload).await?;
    stream.shutdown().await
}

/// Parse `range: bytes=a-b`, clamped to the body.
fn requested_range(request: &str, total: usize) -> Option<(usize, usize)> {
    let window = request
        .lines()
        .find_map(|line| line.strip_prefix("range: bytes="))?;
    let (start, end) = window.trim().split_once('-')?;
    let start: usize = start.parse().ok()?;
    let end = end.parse::<usize>().ok()?.min(total.checked_sub(1)?);
    (start <= end).then_some((start, end))
}
