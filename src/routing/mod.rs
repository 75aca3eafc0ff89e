//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (bypass lookup)
//!     → matcher.rs (evaluate path patterns)
//!     → Return: bypass (answer locally) or proxy
//!
//! Rule Compilation (at startup):
//!     bypass.paths
//!     → Compile matchers (exact, prefix, suffix)
//!     → Freeze as immutable BypassRules
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always gets the same decision

pub mod matcher;
pub mod router;

pub use router::BypassRules;
