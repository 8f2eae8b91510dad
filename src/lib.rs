//! Locale-routing gateway for the 8px.app toolkit site.
//!
//! Sits in front of the site renderer and decides, per request, whether to
//! pass it through, rewrite it to the primary locale, or redirect the client
//! to an explicit locale prefix.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod locale;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use locale::{decide, Locale, RequestDescriptor, RoutingDecision};
