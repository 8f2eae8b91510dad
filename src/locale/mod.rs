//! Locale subsystem.
//!
//! # Data Flow
//! ```text
//! (path, Accept-Language)
//!     → tag.rs (is the path already /<locale>-prefixed?)
//!     → negotiate.rs (weighted Accept-Language match)
//!     → decision.rs (ordered resolution chain → RoutingDecision)
//! ```
//!
//! # Design Decisions
//! - Pure and synchronous: no state, no I/O, no errors
//! - Supported locales and both defaults are compile-time constants

pub mod decision;
pub mod negotiate;
pub mod tag;

pub use decision::{decide, resolve, LocaleSource, RequestDescriptor, RoutingDecision};
pub use negotiate::negotiate;
pub use tag::{locale_prefix, localize_path, Locale, PRIMARY_DEFAULT, SECONDARY_FALLBACK};
