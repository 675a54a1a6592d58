use std::io;
use thiserror::Error;

use crate::http::writer::WriteState;

/// A header line that can never become valid, no matter how many more bytes arrive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid header format: {line}")]
    Format { line: String },

    #[error("invalid header key: {key}")]
    InvalidKey { key: String },
}

impl HeaderError {
    pub fn format<S: ToString>(line: S) -> Self {
        Self::Format { line: line.to_string() }
    }

    pub fn invalid_key<S: ToString>(key: S) -> Self {
        Self::InvalidKey { key: key.to_string() }
    }
}

/// Failures while turning a byte stream into a [`Request`](crate::http::request::Request).
///
/// Every variant is fatal for the connection that produced it.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid request line: {reason}")]
    RequestLine { reason: String },

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("invalid content-length: {value}")]
    InvalidContentLength { value: String },

    #[error("body length exceeds content-length: {body_len} > {content_length}")]
    BodyOverflow { body_len: usize, content_length: usize },

    #[error("incomplete request")]
    IncompleteRequest,

    #[error("no progress: read buffer is full and the parser consumed nothing")]
    NoProgress,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn request_line<S: ToString>(reason: S) -> Self {
        Self::RequestLine { reason: reason.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(value: S) -> Self {
        Self::InvalidContentLength { value: value.to_string() }
    }
}

/// Failures raised by [`ResponseWriter`](crate::http::writer::ResponseWriter).
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot {op} in state {state:?}")]
    State { op: &'static str, state: WriteState },

    #[error("unsupported status code: {0}")]
    UnsupportedStatus(u16),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}
