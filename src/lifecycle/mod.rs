//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() or OS signal → stop accepting → drain in-flight → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//! ```
//!
//! # Design Decisions
//! - In-flight exchanges finish; their streams are not cut by shutdown
//! - Embedders and tests trigger shutdown without sending signals

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
