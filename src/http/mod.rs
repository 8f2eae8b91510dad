//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, Accept-Language)
//!     → [routing layer decides Bypass / Pass / Rewrite / Redirect]
//!     → forward.rs (upstream request) or response.rs (redirect)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, Upstream};
pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::{GatewayServer, HEALTH_PATH, X_GATEWAY_LOCALE};
