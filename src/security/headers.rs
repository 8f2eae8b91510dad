//! Security response headers.
//!
//! # Responsibilities
//! - Build the site's static security headers
//! - Build a Content-Security-Policy that allows the backend API origin
//! - Apply them without overwriting headers the upstream already set
//!
//! # Design Decisions
//! - Headers are computed once at startup
//! - Upstream-provided values win (`if_not_present`)

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;

const SCRIPT_SRC: &str = "'self' 'unsafe-inline' https://www.googletagmanager.com";
const ANALYTICS_CONNECT: &str =
    "https://www.google-analytics.com https://region1.google-analytics.com";

/// Build the Content-Security-Policy value.
pub fn content_security_policy(api_origin: Option<&str>) -> String {
    let api = api_origin
        .map(|origin| origin.trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(|origin| format!(" {}", origin))
        .unwrap_or_default();

    format!(
        "default-src 'self'; script-src {}; style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: blob: https:; font-src 'self' data:; \
         connect-src 'self'{} {}; frame-ancestors 'none'; base-uri 'self'; form-action 'self'",
        SCRIPT_SRC, api, ANALYTICS_CONNECT
    )
}

/// All security headers for the given configuration.
pub fn security_headers(config: &SecurityConfig) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ),
    ];

    let csp = content_security_policy(config.api_origin.as_deref());
    match HeaderValue::from_str(&csp) {
        Ok(value) => headers.push((header::CONTENT_SECURITY_POLICY, value)),
        Err(e) => tracing::warn!(error = %e, "Skipping Content-Security-Policy header"),
    }

    headers
}

/// Layer the security headers onto `router` when enabled.
pub fn apply<S>(router: Router<S>, config: &SecurityConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if !config.enable_headers {
        return router;
    }
    security_headers(config)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_without_api() {
        let csp = content_security_policy(None);
        assert!(csp.contains("connect-src 'self' https://www.google-analytics.com"));
        assert!(csp.starts_with("default-src 'self'; script-src 'self' 'unsafe-inline'"));
        assert!(csp.ends_with("form-action 'self'"));
    }

    #[test]
    fn test_csp_normalizes_api_origin() {
        let csp = content_security_policy(Some("https://api.8px.app///"));
        assert!(csp.contains("connect-src 'self' https://api.8px.app https://www.google-analytics.com"));
    }

    #[test]
    fn test_security_headers_complete() {
        let headers = security_headers(&SecurityConfig::default());
        let names: Vec<&str> = headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "x-content-type-options",
                "x-frame-options",
                "x-xss-protection",
                "referrer-policy",
                "permissions-policy",
                "strict-transport-security",
                "content-security-policy",
            ]
        );
    }
}
