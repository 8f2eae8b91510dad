//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and the upstream URL
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Reject exclusions that would hide locale-prefixed paths
//! - Check rate limit rules fall under the limited prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;
use crate::locale::{locale_prefix, Locale};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url: {0}")]
    InvalidUpstream(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("routing.excluded_prefixes: {0:?} must start with '/'")]
    RelativePrefix(String),

    #[error("routing.excluded_prefixes: {prefix:?} would hide the /{locale} prefix")]
    ShadowsLocale { prefix: String, locale: Locale },

    #[error("security.api_origin: invalid URL {0:?}")]
    InvalidApiOrigin(String),

    #[error("security.rate_limit: path {0:?} must start with '/'")]
    RelativeRateLimitPath(String),

    #[error("security.rate_limit.rules: {path:?} is outside the limited prefix {prefix:?}")]
    RuleOutsidePrefix { path: String, prefix: String },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Err(reason) = check_upstream(&config.upstream.url) {
        errors.push(ValidationError::InvalidUpstream(reason));
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.connect_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    for prefix in &config.routing.excluded_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::RelativePrefix(prefix.clone()));
            continue;
        }
        if let Some(locale) = shadowed_locale(prefix) {
            errors.push(ValidationError::ShadowsLocale {
                prefix: prefix.clone(),
                locale,
            });
        }
    }

    if let Some(origin) = &config.security.api_origin {
        if Url::parse(origin).is_err() {
            errors.push(ValidationError::InvalidApiOrigin(origin.clone()));
        }
    }

    let limits = &config.security.rate_limit;
    if limits.enabled {
        if limits.window_secs == 0 {
            errors.push(ValidationError::Zero("security.rate_limit.window_secs"));
        }
        if limits.requests_per_window == 0 {
            errors.push(ValidationError::Zero("security.rate_limit.requests_per_window"));
        }
        if !limits.prefix.starts_with('/') {
            errors.push(ValidationError::RelativeRateLimitPath(limits.prefix.clone()));
        }
        for rule in &limits.rules {
            if rule.requests_per_window == 0 {
                errors.push(ValidationError::Zero("security.rate_limit.rules.requests_per_window"));
            }
            if !rule.path.starts_with('/') {
                errors.push(ValidationError::RelativeRateLimitPath(rule.path.clone()));
            } else if !rule.path.starts_with(&limits.prefix) {
                errors.push(ValidationError::RuleOutsidePrefix {
                    path: rule.path.clone(),
                    prefix: limits.prefix.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("{:?}: {}", raw, e))?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("{:?} has no host", raw));
    }
    // only scheme and authority are used when forwarding
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(format!("{:?} must not carry a path, query or fragment", raw));
    }
    Ok(())
}

/// A prefix hides a locale when `/<locale>` (or something under it) starts with it.
fn shadowed_locale(prefix: &str) -> Option<Locale> {
    Locale::ALL.into_iter().find(|locale| {
        let root = format!("/{}", locale);
        root.starts_with(prefix) || locale_prefix(prefix) == Some(*locale)
    })
}
