//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! The supported locales are not configurable; see [`crate::locale`].

use serde::{Deserialize, Serialize};

/// Root configuration for the locale gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Site renderer the gateway forwards to.
    pub upstream: UpstreamConfig,

    /// Paths excluded from locale routing.
    pub routing: RoutingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security response headers and request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the site renderer (e.g., "http://127.0.0.1:3000").
    pub url: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Exclusions applied before the locale decision.
///
/// Defaults mirror the site's matcher: framework internals, API routes
/// and anything that looks like a file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Raw path prefixes forwarded without a locale decision.
    pub excluded_prefixes: Vec<String>,

    /// Forward any path containing a `.` without a locale decision.
    pub exclude_dotted_paths: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec![
                "/_next".to_string(),
                "/_vercel".to_string(),
                "/api".to_string(),
            ],
            exclude_dotted_paths: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Backend API origin allowed in the CSP `connect-src`.
    pub api_origin: Option<String>,
    /// Per-client limits on API routes.
    pub rate_limit: RateLimitConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 10 * 1024 * 1024, // 10MB, same as the API upload cap
            api_origin: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-client-IP rate limiting for paths under `prefix`.
///
/// Each client gets one bucket per path, refilled evenly over `window_secs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,
    /// Raw path prefix the limits apply to.
    pub prefix: String,
    /// Length of the limit window in seconds.
    pub window_secs: u64,
    /// Requests per window for paths without a specific rule.
    pub requests_per_window: u32,
    /// Tighter limits for individual paths.
    pub rules: Vec<RateLimitRule>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "/api".to_string(),
            window_secs: 60,
            requests_per_window: 60,
            rules: vec![RateLimitRule {
                path: "/api/colors/extract".to_string(),
                requests_per_window: 10, // image processing
            }],
        }
    }
}

/// Limit for one exact path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitRule {
    pub path: String,
    pub requests_per_window: u32,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter (trace, debug, info, warn, error or a directive list).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
