//! rawhttp - HTTP/1.1 over raw TCP
//!
//! Incremental request parsing, framing-enforcing response writing and a
//! concurrent connection server, built directly on byte streams.

pub mod config;
pub mod http;
pub mod proxy;
pub mod routes;
pub mod server;
