//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers:
//!     → headers.rs (drop hop-by-hop and connection-scoped names)
//!     → http::request (outbound header set)
//!
//! Upstream response headers:
//!     → headers.rs (drop hop-by-hop and framing headers)
//!     → http::response (client header set)
//! ```
//!
//! # Design Decisions
//! - Nothing connection-scoped crosses the proxy, in either direction
//! - No trust in client input: host and cookies are never copied verbatim

pub mod headers;
