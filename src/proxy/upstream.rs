//! Upstream relay
//!
//! Fetches a resource from a plain-HTTP upstream and streams it back to the
//! client as a chunked body, followed by trailers carrying the SHA-256 and
//! length of everything relayed.

use anyhow::{Context, Result};
use bytes::BytesMut;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

use crate::http::headers::Headers;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::ResponseWriter;

/// Read size for streaming the upstream body
const BUFFER_SIZE: usize = 8192;

/// Largest upstream response head accepted
const MAX_HEAD_SIZE: usize = 64 * 1024;

pub const TRAILER_SHA256: &str = "X-Content-Sha256";
pub const TRAILER_LENGTH: &str = "X-Content-Length";

/// What was relayed, as reported in the trailers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySummary {
    pub bytes: usize,
    pub sha256: String,
}

/// Relays requests to a single upstream base URL.
#[derive(Debug, Clone)]
pub struct Relay {
    base: Url,
}

impl Relay {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves `path` against the base URL.
    pub fn upstream_url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("invalid upstream path: {path}"))
    }

    /// Streams the upstream resource at `path` into `w` as a chunked response.
    ///
    /// Nothing is written to `w` until the upstream has answered with a
    /// complete response head, so connection failures leave the writer untouched.
    /// A read failure after that returns an error with the chunked body left
    /// unterminated.
    pub async fn forward<W>(&self, path: &str, w: &mut ResponseWriter<W>) -> Result<RelaySummary>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.upstream_url(path)?;
        let mut stream = connect(&url).await?;

        stream.write_all(&build_request(&url)?).await?;
        stream.flush().await?;

        let (status, mut buffer) = read_response_head(&mut stream).await?;
        tracing::debug!(upstream = %url, status = %status, "Upstream responded");

        let mut headers = default_headers(0);
        headers.remove("Content-Length");
        headers.replace("Transfer-Encoding", "chunked");
        headers.replace("Trailer", &format!("{TRAILER_SHA256}, {TRAILER_LENGTH}"));

        w.write_status_line(StatusCode::Ok).await?;
        w.write_headers(headers).await?;

        let mut hasher = Sha256::new();
        let mut total = 0;

        loop {
            if !buffer.is_empty() {
                w.write_chunked_body(&buffer).await?;
                hasher.update(&buffer);
                total += buffer.len();
                buffer.clear();
            }

            buffer.reserve(BUFFER_SIZE);
            match stream.read_buf(&mut buffer).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    // No last chunk: the client must see the body as cut off.
                    tracing::warn!(upstream = %url, error = %e, bytes = total, "Upstream read failed mid-body");
                    return Err(anyhow::Error::new(e)
                        .context(format!("upstream body truncated after {total} bytes")));
                }
            }
        }

        let summary = RelaySummary {
            bytes: total,
            sha256: format!("{:x}", hasher.finalize()),
        };

        w.write_chunked_body_done().await?;

        let mut trailers = Headers::new();
        trailers.set(TRAILER_SHA256, &summary.sha256);
        trailers.set(TRAILER_LENGTH, &summary.bytes.to_string());
        w.write_trailers(trailers).await?;

        tracing::info!(upstream = %url, bytes = summary.bytes, "Relay finished");
        Ok(summary)
    }
}

/// Builds the upstream request.
///
/// HTTP/1.0 keeps the upstream from answering with its own chunked framing,
/// so the body is simply everything until the connection closes.
pub fn build_request(url: &Url) -> Result<Vec<u8>> {
    let host = url.host_str().context("upstream URL missing host")?;
    let host_value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut headers = Headers::new();
    headers.set("Host", &host_value);
    headers.set("User-Agent", concat!("rawhttp/", env!("CARGO_PKG_VERSION")));
    headers.set("Accept", "*/*");
    headers.set("Connection", "close");

    let mut buffer = format!("GET {target} HTTP/1.0\r\n").into_bytes();
    buffer.extend_from_slice(&headers.to_wire());
    Ok(buffer)
}

async fn connect(url: &Url) -> Result<TcpStream> {
    if url.scheme() != "http" {
        anyhow::bail!("unsupported upstream scheme: {}", url.scheme());
    }

    let host = url.host_str().context("upstream URL missing host")?;
    let port = url.port_or_known_default().unwrap_or(80);

    TcpStream::connect((host, port))
        .await
        .with_context(|| format!("failed to connect to {host}:{port}"))
}

/// Reads through the blank line ending the response head.
///
/// Returns the status code and any body bytes that arrived with the head.
async fn read_response_head(stream: &mut TcpStream) -> Result<(u16, BytesMut)> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    loop {
        if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = buffer.split_to(end + 4);
            let status = parse_status(&head)?;
            return Ok((status, buffer));
        }

        if buffer.len() > MAX_HEAD_SIZE {
            anyhow::bail!("upstream response head too large");
        }

        buffer.reserve(BUFFER_SIZE);
        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            anyhow::bail!("upstream closed before sending a complete response head");
        }
    }
}

fn parse_status(head: &[u8]) -> Result<u16> {
    let head = std::str::from_utf8(head).context("invalid UTF-8 in upstream response head")?;
    let status_line = head.lines().next().context("empty upstream response")?;

    let mut parts = status_line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        anyhow::bail!("invalid upstream status line: {status_line}");
    }

    parts
        .next()
        .context("upstream status line missing code")?
        .parse()
        .with_context(|| format!("invalid upstream status line: {status_line}"))
}
