use crate::http::error::ParseError;
use crate::http::headers::{Headers, find_crlf};

const HTTP_PREFIX: &str = "HTTP/";

/// Progress of a [`Request`] through the wire format.
///
/// Transitions only move forward: `Initial → Headers → Body → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    /// Waiting for the request line.
    #[default]
    Initial,
    /// Request line parsed; reading header fields.
    Headers,
    /// Blank line seen; reading the body.
    Body,
    /// The request is complete.
    Done,
}

/// The first line of an HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// Uppercase method token, e.g. `GET`
    pub method: String,
    /// Request target, kept verbatim (e.g. `/search?q=rust`)
    pub target: String,
    /// Version without the `HTTP/` prefix, e.g. `1.1`
    pub http_version: String,
}

/// An HTTP request assembled incrementally from a byte stream.
///
/// Bytes are pushed in with [`Request::feed`]; the caller discards however
/// many bytes each call reports as consumed before feeding again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
    state: ParseState,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParseState::Done
    }

    /// Retrieves a header value by name (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Consumes as much of `data` as the current state allows.
    ///
    /// Keeps moving through states within one call while bytes remain, so a
    /// buffer holding the request line, headers and body is parsed in one go.
    /// Returns the number of bytes consumed; unconsumed bytes must be offered
    /// again, prefixed to whatever arrives next.
    pub fn feed(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut read = 0;

        loop {
            let before = self.state;
            let rest = &data[read..];

            let n = match self.state {
                ParseState::Initial => match parse_request_line(rest)? {
                    Some((line, n)) => {
                        self.request_line = line;
                        self.state = ParseState::Headers;
                        n
                    }
                    None => 0,
                },
                ParseState::Headers => {
                    let (n, done) = self.headers.parse_line(rest)?;
                    if done {
                        self.state = ParseState::Body;
                    }
                    n
                }
                ParseState::Body => self.parse_body(rest)?,
                ParseState::Done => 0,
            };

            read += n;

            if n == 0 && self.state == before {
                return Ok(read);
            }
        }
    }

    /// Declared body length; an empty `Content-Length` counts as absent.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        match self.headers.get("content-length") {
            None | Some("") => Ok(None),
            Some(v) => v
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ParseError::invalid_content_length(v)),
        }
    }

    /// Completes a body that has no declared length once the stream ends.
    ///
    /// Returns whether the request is now done.
    pub(crate) fn finish_at_eof(&mut self) -> Result<bool, ParseError> {
        if self.state == ParseState::Body && self.content_length()?.is_none() {
            self.state = ParseState::Done;
        }
        Ok(self.is_done())
    }

    fn parse_body(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let Some(content_length) = self.content_length()? else {
            // EOF is the only terminator; everything offered belongs to the body.
            self.body.extend_from_slice(data);
            return Ok(data.len());
        };

        let need = content_length
            .checked_sub(self.body.len())
            .ok_or(ParseError::BodyOverflow {
                body_len: self.body.len(),
                content_length,
            })?;

        let take = need.min(data.len());
        self.body.extend_from_slice(&data[..take]);

        if self.body.len() == content_length {
            if take < data.len() {
                return Err(ParseError::BodyOverflow {
                    body_len: self.body.len() + data.len() - take,
                    content_length,
                });
            }
            self.state = ParseState::Done;
        }

        Ok(take)
    }
}

/// Parses the request line if a full CRLF-terminated line is present.
///
/// Returns the line and the bytes it occupied, including the CRLF.
fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(end) = find_crlf(data) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&data[..end])
        .map_err(|_| ParseError::request_line("request line is not valid UTF-8"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();

    let [method, target, version] = fields[..] else {
        return Err(ParseError::request_line(line));
    };

    if !is_uppercase(method) {
        return Err(ParseError::request_line(format!("invalid method: {method}")));
    }

    let http_version = parse_http_version(version)
        .ok_or_else(|| ParseError::request_line(format!("invalid HTTP version: {version}")))?;

    let request_line = RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        http_version: http_version.to_string(),
    };

    Ok(Some((request_line, end + 2)))
}

/// Accepts `HTTP/<digits>[.<digits>]` and returns the part after the slash.
fn parse_http_version(version: &str) -> Option<&str> {
    let v = version.strip_prefix(HTTP_PREFIX)?;

    let mut parts = v.split('.');
    let major = parts.next()?;
    let minor = parts.next();

    if parts.next().is_some() || !is_digits(major) || minor.is_some_and(|m| !is_digits(m)) {
        return None;
    }

    Some(v)
}

fn is_uppercase(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_in_chunks(raw: &[u8], chunk: usize) -> Request {
        let mut request = Request::new();
        let mut pending = Vec::new();

        for piece in raw.chunks(chunk) {
            pending.extend_from_slice(piece);
            let n = request.feed(&pending).unwrap();
            pending.drain(..n);
        }

        if !request.is_done() {
            assert!(request.finish_at_eof().unwrap());
        }
        request
    }

    #[test]
    fn parses_request_line() {
        let mut request = Request::new();
        let n = request.feed(b"GET /coffee HTTP/1.1\r\n").unwrap();

        assert_eq!(n, 22);
        assert_eq!(request.state(), ParseState::Headers);
        assert_eq!(request.request_line.method, "GET");
        assert_eq!(request.request_line.target, "/coffee");
        assert_eq!(request.request_line.http_version, "1.1");
    }

    #[test]
    fn request_line_waits_for_crlf() {
        let mut request = Request::new();
        assert_eq!(request.feed(b"GET / HTTP/1.1").unwrap(), 0);
        assert_eq!(request.state(), ParseState::Initial);
    }

    #[test]
    fn continues_into_headers_and_body_in_one_feed() {
        let raw = b"POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        let mut request = Request::new();

        assert_eq!(request.feed(raw).unwrap(), raw.len());
        assert!(request.is_done());
        assert_eq!(request.header("HOST"), Some("localhost"));
        assert_eq!(request.body, b"hello");
    }

    #[test]
    fn chunk_size_does_not_change_result() {
        let raw: &[u8] = b"POST /api/v1/items?x=1 HTTP/1.1\r\n\
            Host: localhost:42069\r\n\
            Accept: */*\r\n\
            Accept: text/plain\r\n\
            Content-Length: 13\r\n\
            \r\n\
            {\"ok\": true}\n";

        let expected = feed_in_chunks(raw, raw.len());
        assert!(expected.is_done());
        assert_eq!(expected.header("accept"), Some("*/*, text/plain"));

        for size in 1..=raw.len() {
            assert_eq!(feed_in_chunks(raw, size), expected, "chunk size {size}");
        }
    }

    #[test]
    fn content_length_accounting_across_feeds() {
        for splits in [vec![2, 3], vec![1, 1, 1, 1, 1], vec![5]] {
            let mut request = Request::new();
            request
                .feed(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\n")
                .unwrap();

            let mut offset = 0;
            for len in splits {
                let n = request.feed(&b"hello"[offset..offset + len]).unwrap();
                assert_eq!(n, len);
                offset += len;
            }

            assert!(request.is_done());
            assert_eq!(request.body, b"hello");
        }
    }

    #[test]
    fn sixth_body_byte_overflows() {
        let mut request = Request::new();
        let err = request
            .feed(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello!")
            .unwrap_err();

        assert!(matches!(
            err,
            ParseError::BodyOverflow { body_len: 6, content_length: 5 }
        ));
    }

    #[test]
    fn zero_content_length_is_done_after_headers() {
        let mut request = Request::new();
        request
            .feed(b"POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
        assert!(request.is_done());
        assert!(request.body.is_empty());
    }

    #[test]
    fn body_without_length_waits_for_eof() {
        let mut request = Request::new();
        request.feed(b"POST / HTTP/1.1\r\nHost: x\r\n\r\nab").unwrap();
        assert_eq!(request.state(), ParseState::Body);

        request.feed(b"c").unwrap();
        assert_eq!(request.state(), ParseState::Body);

        assert!(request.finish_at_eof().unwrap());
        assert_eq!(request.body, b"abc");
    }

    #[test]
    fn eof_does_not_finish_short_declared_body() {
        let mut request = Request::new();
        request
            .feed(b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello")
            .unwrap();
        assert!(!request.finish_at_eof().unwrap());
    }

    #[test]
    fn done_consumes_nothing() {
        let mut request = Request::new();
        request
            .feed(b"GET / HTTP/1.1\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
        assert_eq!(request.feed(b"GET / HTTP/1.1\r\n").unwrap(), 0);
    }

    #[test]
    fn rejects_malformed_request_lines() {
        let cases: [&[u8]; 6] = [
            b"get / HTTP/1.1\r\n",
            b"GET /\r\n",
            b"GET / HTTP/1.1 extra\r\n",
            b"GET / HTTP/1.1.1\r\n",
            b"GET / HTTP/x\r\n",
            b"GET / HTTPS/1.1\r\n",
        ];

        for raw in cases {
            let mut request = Request::new();
            let err = request.feed(raw).unwrap_err();
            assert!(matches!(err, ParseError::RequestLine { .. }), "{raw:?}");
        }
    }

    #[test]
    fn rejects_non_utf8_target() {
        let mut request = Request::new();
        let err = request.feed(b"GET /caf\xe9 HTTP/1.1\r\n\r\n").unwrap_err();

        assert!(matches!(err, ParseError::RequestLine { .. }));
        assert_eq!(request.state(), ParseState::Initial);
    }

    #[test]
    fn accepts_major_only_version() {
        let mut request = Request::new();
        request.feed(b"GET / HTTP/2\r\n").unwrap();
        assert_eq!(request.request_line.http_version, "2");
    }

    #[test]
    fn rejects_bad_content_length() {
        let mut request = Request::new();
        let err = request
            .feed(b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength { .. }));
    }

    #[test]
    fn header_errors_abort_parsing() {
        let mut request = Request::new();
        let err = request
            .feed(b"GET / HTTP/1.1\r\nBad Key: v\r\n\r\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Header(_)));
    }
}
