use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::http::error::ParseError;
use crate::http::request::Request;

/// Starting size of the read buffer.
pub const INITIAL_BUFFER_SIZE: usize = 1024;

/// Default ceiling the read buffer may grow to.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Reads a single request from `reader` with the default buffer limits.
pub async fn request_from_reader<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    RequestReader::new().read_request(reader).await
}

/// Drives [`Request::feed`] from an async byte source.
#[derive(Debug, Clone, Copy)]
pub struct RequestReader {
    initial_buffer_size: usize,
    max_buffer_size: usize,
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestReader {
    pub fn new() -> Self {
        Self {
            initial_buffer_size: INITIAL_BUFFER_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    pub fn initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size.max(1);
        self
    }

    /// Caps how far the buffer may grow while a request is still unparsed.
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size.max(1);
        self
    }

    /// Reads until the request is complete, the stream ends, or parsing fails.
    ///
    /// A stream that ends while the body has no declared length completes the
    /// request. Ending anywhere else is [`ParseError::IncompleteRequest`].
    pub async fn read_request<R>(&self, reader: &mut R) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut request = Request::new();
        let mut buffer = ReadBuffer::new(self.initial_buffer_size, self.max_buffer_size);

        loop {
            buffer.grow_if_full();

            let tail = buffer.tail_mut();
            let stalled = tail.is_empty();
            let n = if stalled { 0 } else { reader.read(tail).await? };
            let eof = n == 0 && !stalled;
            buffer.commit(n);

            let consumed = request.feed(buffer.filled())?;
            buffer.consume(consumed);

            trace!(
                read = n,
                consumed,
                buffered = buffer.filled().len(),
                state = ?request.state(),
                "Fed request parser"
            );

            if request.is_done() {
                return Ok(request);
            }

            if eof {
                return if request.finish_at_eof()? {
                    Ok(request)
                } else {
                    Err(ParseError::IncompleteRequest)
                };
            }

            if n == 0 && consumed == 0 {
                return Err(ParseError::NoProgress);
            }
        }
    }
}

/// Growable byte buffer holding bytes read but not yet consumed.
///
/// Filled bytes always sit at the front; consuming shifts the remainder down.
#[derive(Debug)]
struct ReadBuffer {
    buf: Vec<u8>,
    filled: usize,
    max: usize,
}

impl ReadBuffer {
    fn new(initial: usize, max: usize) -> Self {
        Self {
            buf: vec![0; initial.min(max)],
            filled: 0,
            max,
        }
    }

    /// Doubles the capacity, up to the limit, when no free space is left.
    fn grow_if_full(&mut self) {
        if self.filled == self.buf.len() && self.buf.len() < self.max {
            let len = (self.buf.len() * 2).clamp(1, self.max);
            self.buf.resize(len, 0);
        }
    }

    fn tail_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    fn commit(&mut self, n: usize) {
        self.filled += n;
    }

    fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    fn consume(&mut self, n: usize) {
        self.buf.copy_within(n..self.filled, 0);
        self.filled -= n;
    }
}
