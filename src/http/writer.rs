use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::http::error::WriteError;
use crate::http::headers::Headers;
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Where a [`ResponseWriter`] is in the message.
///
/// ```text
///  Init ──status line──▶ Headers ──headers──▶ Body ──body──────────────▶ Done
///                                             │  ▲                        ▲
///                                        chunk└──┘                        │
///                                             └──chunks done─┬────────────┤
///                                                (Trailer set)▼            │
///                                                        Trailers ─trailers┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Init,
    Headers,
    Body,
    Trailers,
    Done,
}

/// Serializes one HTTP/1.1 response onto a byte sink.
///
/// Every method is legal in exactly one [`WriteState`]; calling it anywhere
/// else returns [`WriteError::State`] without touching the sink.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    sink: BufWriter<W>,
    status_line: String,
    headers: Headers,
    trailers: Headers,
    body_len: usize,
    state: WriteState,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: BufWriter::new(sink),
            status_line: String::new(),
            headers: Headers::new(),
            trailers: Headers::new(),
            body_len: 0,
            state: WriteState::Init,
        }
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    /// The status line as written, including its CRLF.
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    /// Body bytes written so far, excluding chunk framing.
    pub fn body_len(&self) -> usize {
        self.body_len
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.expect(WriteState::Init, "write status line")?;

        let reason = status
            .reason_phrase()
            .ok_or(WriteError::UnsupportedStatus(status.as_u16()))?;

        let line = format!("{} {} {}\r\n", HTTP_VERSION, status.as_u16(), reason);
        self.sink.write_all(line.as_bytes()).await?;

        self.status_line = line;
        self.state = WriteState::Headers;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: Headers) -> Result<(), WriteError> {
        self.expect(WriteState::Headers, "write headers")?;

        self.sink.write_all(&headers.to_wire()).await?;

        self.headers = headers;
        self.state = WriteState::Body;
        Ok(())
    }

    /// Writes the whole body verbatim and flushes; the response is then done.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriteError> {
        self.expect(WriteState::Body, "write body")?;

        self.sink.write_all(body).await?;
        self.sink.flush().await?;

        self.body_len += body.len();
        self.state = WriteState::Done;
        Ok(body.len())
    }

    /// Writes one `<hex-len>\r\n<bytes>\r\n` chunk and flushes it.
    ///
    /// An empty slice writes nothing, since a zero-length chunk would end the body.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize, WriteError> {
        self.expect(WriteState::Body, "write chunked body")?;

        if chunk.is_empty() {
            return Ok(0);
        }

        let mut frame = Vec::with_capacity(chunk.len() + 20);
        frame.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        frame.extend_from_slice(chunk);
        frame.extend_from_slice(b"\r\n");

        self.sink.write_all(&frame).await?;
        self.sink.flush().await?;

        self.body_len += chunk.len();
        Ok(chunk.len())
    }

    /// Writes the last chunk.
    ///
    /// With a `Trailer` header declared the writer then waits for
    /// [`write_trailers`](Self::write_trailers); otherwise the message ends here.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), WriteError> {
        self.expect(WriteState::Body, "finish chunked body")?;

        if self.headers.contains("trailer") {
            self.sink.write_all(b"0\r\n").await?;
            self.state = WriteState::Trailers;
            return Ok(());
        }

        self.sink.write_all(b"0\r\n\r\n").await?;
        self.sink.flush().await?;
        self.state = WriteState::Done;
        Ok(())
    }

    pub async fn write_trailers(&mut self, trailers: Headers) -> Result<(), WriteError> {
        self.expect(WriteState::Trailers, "write trailers")?;

        self.sink.write_all(&trailers.to_wire()).await?;
        self.sink.flush().await?;

        self.trailers = trailers;
        self.state = WriteState::Done;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriteError> {
        self.sink.flush().await?;
        Ok(())
    }

    /// Flushes anything buffered and shuts down the write side of the sink.
    pub async fn shutdown(&mut self) -> Result<(), WriteError> {
        self.sink.shutdown().await?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Returns the sink. Bytes still buffered are lost, so flush first.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }

    fn expect(&self, state: WriteState, op: &'static str) -> Result<(), WriteError> {
        if self.state == state {
            Ok(())
        } else {
            Err(WriteError::State { op, state: self.state })
        }
    }
}
