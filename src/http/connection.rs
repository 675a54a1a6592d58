use std::net::SocketAddr;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::http::parser::RequestReader;
use crate::http::writer::{ResponseWriter, WriteState};
use crate::server::handler::{Handler, HandlerError, write_error_response};

/// One accepted socket, carried through a single request/response exchange.
///
/// ```text
///   Reading ──parse error──▶ 400 response ──┐
///      │                                    │
///      │ request parsed                     ▼
///      └──▶ Handling (handler writes) ──▶ Closed
/// ```
///
/// There is no keep-alive: the write side is shut down after the handler
/// returns, whatever it wrote.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    reader: RequestReader,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            reader: RequestReader::new(),
        }
    }

    pub fn max_request_bytes(mut self, limit: usize) -> Self {
        self.reader = self.reader.max_buffer_size(limit);
        self
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub async fn run(self, handler: &dyn Handler) -> anyhow::Result<()> {
        let Self { mut stream, peer, reader } = self;

        let request = match reader.read_request(&mut stream).await {
            Ok(request) => request,
            Err(e) => {
                warn!(%peer, error = %e, "Failed to parse request");
                let mut writer = ResponseWriter::new(stream);
                write_error_response(&mut writer, &HandlerError::bad_request(e.to_string()))
                    .await?;
                writer.shutdown().await?;
                return Ok(());
            }
        };

        debug!(
            %peer,
            method = %request.request_line.method,
            target = %request.request_line.target,
            body_len = request.body.len(),
            "Request parsed"
        );

        let mut writer = ResponseWriter::new(stream);

        if let Err(err) = handler.handle(&mut writer, &request).await {
            if writer.state() == WriteState::Init {
                debug!(%peer, status = err.status.as_u16(), "Handler returned an error");
                if let Err(e) = write_error_response(&mut writer, &err).await {
                    warn!(%peer, error = %e, "Could not render handler error, closing");
                }
            } else {
                warn!(
                    %peer,
                    error = %err,
                    state = ?writer.state(),
                    "Handler failed after the response was started"
                );
            }
        }

        writer.shutdown().await?;
        Ok(())
    }
}
