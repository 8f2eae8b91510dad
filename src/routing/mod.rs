//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, Accept-Language)
//!     → router.rs (locale prefix? exclusion?)
//!     → matcher.rs (evaluate exclusion conditions)
//!     → Return: Bypass or Decide(RoutingDecision)
//!
//! Router Compilation (at startup):
//!     RoutingConfig
//!     → Compile matchers
//!     → Freeze as immutable LocaleRouter
//! ```
//!
//! # Design Decisions
//! - Compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same dispatch

pub mod matcher;
pub mod router;

pub use router::{Dispatch, LocaleRouter};
