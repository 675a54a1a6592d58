use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;

use crate::http::error::WriteError;
use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::ResponseWriter;

/// A failure a handler wants reported to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} {message}", .status.as_u16())]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InternalServerError, message)
    }
}

impl From<WriteError> for HandlerError {
    fn from(e: WriteError) -> Self {
        Self::internal(e.to_string())
    }
}

/// Application logic invoked once per successfully parsed request.
///
/// The handler owns the response: whatever it writes through `w` is what the
/// client sees. Returning an error before anything was written makes the
/// server answer with that error's status and message instead.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(
        &self,
        w: &mut ResponseWriter<TcpStream>,
        req: &Request,
    ) -> Result<(), HandlerError>;
}

/// Renders `err` as a plain-text response: status line, default headers, message.
///
/// Statuses without a status line (401, 403) fail with
/// [`WriteError::UnsupportedStatus`] and leave the sink untouched.
pub async fn write_error_response<W>(
    w: &mut ResponseWriter<W>,
    err: &HandlerError,
) -> Result<(), WriteError>
where
    W: AsyncWrite + Unpin,
{
    w.write_status_line(err.status).await?;
    w.write_headers(default_headers(err.message.len())).await?;
    w.write_body(err.message.as_bytes()).await?;
    Ok(())
}
