//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request under the API prefix:
//!     → rate_limit.rs (token bucket per client IP and path, 429 when empty)
//!     → gateway handler
//!
//! Outgoing response (page, redirect, 413, 429, health):
//!     → headers.rs (add security headers the upstream did not set)
//!     → Send to client
//! ```
//!
//! Request body limits are enforced by the server's middleware stack
//! (`security.max_body_size`).

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{Limited, RateLimiter};
