//! HTTP/1.1 protocol implementation.
//!
//! This module turns raw byte streams into requests and writes correctly
//! framed responses back. One request is served per connection.
//!
//! # Architecture
//!
//! - **`headers`**: Case-insensitive header collection with line-at-a-time parsing
//! - **`request`**: Request state machine fed with whatever bytes have arrived
//! - **`parser`**: Drives the request state machine from an async reader
//! - **`response`**: Status codes and default response headers
//! - **`writer`**: Response state machine enforcing status line → headers → body order,
//!   including chunked bodies and trailers
//! - **`connection`**: One request/response exchange on an accepted socket
//! - **`error`**: Error types for parsing and writing
//!
//! # Request State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Initial   │ ← Wait for "METHOD target HTTP/x.y\r\n"
//!        └──────┬──────┘
//!               │ Request line parsed
//!               ▼
//!        ┌─────────────┐
//!        │   Headers   │ ← One "key: value\r\n" at a time
//!        └──────┬──────┘
//!               │ Blank line
//!               ▼
//!        ┌─────────────┐
//!        │    Body     │ ← Content-Length bytes, or everything until EOF
//!        └──────┬──────┘
//!               │
//!               ▼
//!        ┌─────────────┐
//!        │    Done     │
//!        └─────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use rawhttp::http::parser::request_from_reader;
//!
//! # tokio_test_block(async {
//! let mut raw: &[u8] = b"POST /echo HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi";
//! let request = request_from_reader(&mut raw).await.unwrap();
//!
//! assert_eq!(request.request_line.method, "POST");
//! assert_eq!(request.body, b"hi");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
