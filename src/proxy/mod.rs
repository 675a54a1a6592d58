//! Upstream relay used by the demo `/httpbin/` route.
//!
//! Speaks plain HTTP only; the relayed body is re-framed as chunked
//! transfer encoding with integrity trailers.

pub mod upstream;

pub use upstream::{Relay, RelaySummary};
