//! Connection server: accept loop, per-connection tasks and graceful shutdown.

pub mod handler;
pub mod listener;

pub use handler::{Handler, HandlerError, write_error_response};
pub use listener::{Server, ServerError, ServerState};
