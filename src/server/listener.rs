use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::parser::DEFAULT_MAX_BUFFER_SIZE;
use crate::server::handler::Handler;

/// Lifecycle of a [`Server`].
///
/// `Running → Closing → Stopped`, or `Error` when accepting fails for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    Running = 0,
    Closing = 1,
    Stopped = 2,
    Error = 3,
}

impl ServerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ServerState::Running,
            1 => ServerState::Closing,
            2 => ServerState::Stopped,
            _ => ServerState::Error,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("accept loop did not stop cleanly: {0}")]
    Join(#[from] JoinError),
}

/// State shared between the server handle, the accept loop and every
/// connection task.
#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    closed: AtomicBool,
    shutdown: Notify,
    in_flight: AtomicUsize,
    idle: Notify,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(ServerState::Running as u8),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves `from → to`; a no-op when the server is in any other state.
    fn transition(&self, from: ServerState, to: ServerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Flips the shutdown flag; only the first caller gets `true`.
    fn request_shutdown(&self) -> bool {
        let first = self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            // Stores a permit if the accept loop is not parked yet.
            self.shutdown.notify_one();
        }
        first
    }

    async fn wait_idle(&self) {
        loop {
            let idle = self.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            if self.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Counts one connection task as in flight until dropped.
struct InFlightGuard(Arc<Shared>);

impl InFlightGuard {
    fn enter(shared: &Arc<Shared>) -> Self {
        shared.in_flight.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(shared))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// A running HTTP server.
///
/// Connections are served on their own tasks until [`Server::close`] stops
/// the listener and waits for them to finish.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Listens on `0.0.0.0:<port>` and starts accepting in the background.
    pub async fn serve<H: Handler>(port: u16, handler: H) -> Result<Self, ServerError> {
        Self::serve_addr(SocketAddr::from(([0, 0, 0, 0], port)), handler).await
    }

    pub async fn serve_addr<H: Handler>(addr: SocketAddr, handler: H) -> Result<Self, ServerError> {
        Self::start(addr, Arc::new(handler), DEFAULT_MAX_BUFFER_SIZE).await
    }

    pub async fn serve_with_config<H: Handler>(cfg: &Config, handler: H) -> Result<Self, ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
        Self::start(addr, Arc::new(handler), cfg.max_request_bytes).await
    }

    async fn start(
        addr: SocketAddr,
        handler: Arc<dyn Handler>,
        max_request_bytes: usize,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!("Listening on {}", local_addr);

        let shared = Arc::new(Shared::new());
        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&shared),
            handler,
            max_request_bytes,
        ));

        Ok(Self {
            local_addr,
            shared,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        self.shared.state()
    }

    /// Connections currently being served.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Stops accepting and waits for every in-flight connection to finish.
    ///
    /// Only the first call does any work; later calls return `Ok(())` at once.
    pub async fn close(&self) -> Result<(), ServerError> {
        if !self.shared.request_shutdown() {
            return Ok(());
        }

        self.shared.transition(ServerState::Running, ServerState::Closing);
        info!(in_flight = self.in_flight(), "Shutting down");

        let accept_task = self
            .accept_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let joined = match accept_task {
            Some(task) => task.await,
            None => Ok(()),
        };

        self.shared.wait_idle().await;

        match joined {
            Ok(()) => {
                self.shared.transition(ServerState::Closing, ServerState::Stopped);
                info!("Server stopped");
                Ok(())
            }
            Err(e) => {
                self.shared.transition(ServerState::Closing, ServerState::Error);
                error!(error = %e, "Accept loop failed during shutdown");
                Err(ServerError::Join(e))
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        // Release the port even if nobody called close(); connections still finish.
        self.shared.request_shutdown();
    }
}

async fn accept_loop(
    listener: TcpListener,
    shared: Arc<Shared>,
    handler: Arc<dyn Handler>,
    max_request_bytes: usize,
) {
    loop {
        let accepted = tokio::select! {
            _ = shared.shutdown.notified() => break,
            res = listener.accept() => res,
        };

        match accepted {
            Ok((socket, peer)) => {
                debug!(%peer, "Accepted connection");

                let guard = InFlightGuard::enter(&shared);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let _guard = guard;
                    let conn = Connection::new(socket, peer).max_request_bytes(max_request_bytes);
                    if let Err(e) = conn.run(handler.as_ref()).await {
                        error!("Connection error from {}: {}", peer, e);
                    }
                });
            }
            Err(_) if shared.is_closed() => break,
            Err(e) if is_transient_accept_error(&e) => {
                warn!(error = %e, "Temporary error accepting connection");
            }
            Err(e) => {
                error!(error = %e, "Accept error, stopping listener");
                shared.transition(ServerState::Running, ServerState::Error);
                break;
            }
        }
    }

    drop(listener);
    debug!("Accept loop stopped");
}

/// Accept failures that concern a single connection attempt, not the listener.
fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
