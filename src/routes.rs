//! Demo routes served by the `rawhttp` binary.
//!
//! | Target            | Response                                        |
//! |-------------------|-------------------------------------------------|
//! | `/yourproblem`    | 400 HTML page                                   |
//! | `/myproblem`      | 500 HTML page                                   |
//! | `/video`          | `<assets_dir>/vim.mp4` as `video/mp4`           |
//! | `/httpbin/<path>` | upstream `<path>`, chunked, with hash trailers  |
//! | anything else     | 200 HTML page                                   |

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;

use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::{ResponseWriter, WriteState};
use crate::proxy::Relay;
use crate::server::handler::{Handler, HandlerError};

pub const VIDEO_FILE: &str = "vim.mp4";

const OK_HTML: &str = "<html>
<head>
<title>200 OK</title>
</head>
<body>
<h1>Success!</h1>
<p>Your request was parsed and answered.</p>
</body>
</html>
";

const BAD_REQUEST_HTML: &str = "<html>
<head>
<title>400 Bad Request</title>
</head>
<body>
<h1>Bad Request</h1>
<p>The problem is on your side of the socket.</p>
</body>
</html>
";

const INTERNAL_ERROR_HTML: &str = "<html>
<head>
<title>500 Internal Server Error</title>
</head>
<body>
<h1>Internal Server Error</h1>
<p>The problem is on our side of the socket.</p>
</body>
</html>
";

#[derive(Debug, Clone)]
pub struct DemoHandler {
    assets_dir: PathBuf,
    relay: Relay,
}

impl DemoHandler {
    pub fn new(assets_dir: impl Into<PathBuf>, relay: Relay) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            relay,
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(cfg.assets_dir.clone(), Relay::new(cfg.upstream()?)))
    }

    /// Dispatches on the request target.
    pub async fn route<W>(&self, w: &mut ResponseWriter<W>, req: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let target = req.request_line.target.as_str();

        match target {
            "/yourproblem" => write_html(w, StatusCode::BadRequest, BAD_REQUEST_HTML).await,
            "/myproblem" => write_html(w, StatusCode::InternalServerError, INTERNAL_ERROR_HTML).await,
            "/video" => self.video(w).await,
            t if t.starts_with("/httpbin") => self.httpbin(w, t).await,
            _ => write_html(w, StatusCode::Ok, OK_HTML).await,
        }
    }

    async fn video<W>(&self, w: &mut ResponseWriter<W>) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let path = self.assets_dir.join(VIDEO_FILE);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read video");
                return write_html(w, StatusCode::InternalServerError, INTERNAL_ERROR_HTML).await;
            }
        };

        let mut headers = default_headers(body.len());
        headers.replace("Content-Type", "video/mp4");

        w.write_status_line(StatusCode::Ok).await?;
        w.write_headers(headers).await?;
        w.write_body(&body).await?;
        Ok(())
    }

    async fn httpbin<W>(&self, w: &mut ResponseWriter<W>, target: &str) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let path = target.trim_start_matches("/httpbin").trim_start_matches('/');

        match self.relay.forward(path, w).await {
            Ok(_) => Ok(()),
            Err(e) if w.state() == WriteState::Init => {
                tracing::warn!(path, error = %e, "Upstream unavailable");
                write_html(w, StatusCode::InternalServerError, INTERNAL_ERROR_HTML).await
            }
            Err(e) => Err(HandlerError::internal(format!("relay failed: {e:#}"))),
        }
    }
}

#[async_trait]
impl Handler for DemoHandler {
    async fn handle(
        &self,
        w: &mut ResponseWriter<TcpStream>,
        req: &Request,
    ) -> Result<(), HandlerError> {
        self.route(w, req).await
    }
}

async fn write_html<W>(w: &mut ResponseWriter<W>, status: StatusCode, page: &str) -> Result<(), HandlerError>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut headers = default_headers(page.len());
    headers.replace("Content-Type", "text/html");

    w.write_status_line(status).await?;
    w.write_headers(headers).await?;
    w.write_body(page.as_bytes()).await?;
    Ok(())
}
