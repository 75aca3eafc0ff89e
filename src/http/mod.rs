//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → middleware/ (preflight, bypass, method gate)
//!     → request.rs (target URL, outbound headers)
//!     → cookies.rs (strip-and-inject or merge)
//!     → redirect.rs (manual redirect following over transport.rs)
//!     → response.rs (inbound headers: CORS, cache, Set-Cookie)
//!     → Send to client
//! ```

pub mod cookies;
pub mod middleware;
pub mod redirect;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use cookies::CookiePolicy;
pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
pub use transport::{ProxyRequest, ReqwestTransport, Transport, TransportError};
