//! Request gates that run before the proxy handler.
//!
//! # Order (outermost first)
//! ```text
//! preflight.rs  OPTIONS → 204, never proxied
//! bypass.rs     configured paths → local 404
//! methods.rs    header-only deployments → 405 for body methods
//! ```

pub mod bypass;
pub mod methods;
pub mod preflight;

pub use bypass::bypass_middleware;
pub use methods::{method_gate, MethodPolicy};
pub use preflight::{preflight_middleware, CorsSettings};
