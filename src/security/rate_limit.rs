//! Per-client rate limiting for API routes.
//!
//! # Responsibilities
//! - Keep one token bucket per client IP and path
//! - Apply the tighter per-path rules, else the prefix-wide limit
//! - Answer `429 Too Many Requests` with `Retry-After` when a bucket is empty
//!
//! # Design Decisions
//! - Only paths under the configured prefix are limited; pages never are
//! - The client is the first `X-Forwarded-For` entry (set by the hosting
//!   edge), else the peer address
//! - Buckets refill evenly, so a drained bucket is full again one window later

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;

use crate::config::RateLimitConfig;
use crate::http::forward::X_FORWARDED_FOR;
use crate::observability::metrics;

/// Bucket count above which idle buckets are dropped.
const MAX_TRACKED_BUCKETS: usize = 10_000;

/// A simple token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take one token, or report the tokens missing for the next request.
    fn try_acquire(&mut self, limit: &Limit) -> Result<(), f64> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * limit.refill_per_sec()).min(limit.capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(1.0 - self.tokens)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Limit {
    capacity: f64,
    window_secs: f64,
}

impl Limit {
    fn refill_per_sec(&self) -> f64 {
        self.capacity / self.window_secs
    }

    fn seconds_until(&self, missing: f64) -> u64 {
        ((missing * self.window_secs / self.capacity).ceil() as u64).max(1)
    }
}

/// A rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limited {
    /// The rule path or prefix whose limit was hit.
    pub scope: String,
    /// Whole seconds until the client may retry.
    pub retry_after_secs: u64,
}

/// Shared limiter state.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    prefix: String,
    default_limit: Limit,
    rules: HashMap<String, Limit>,
    window: Duration,
}

impl RateLimiter {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let window_secs = config.window_secs as f64;
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                let limit = Limit {
                    capacity: f64::from(rule.requests_per_window),
                    window_secs,
                };
                (rule.path.clone(), limit)
            })
            .collect();

        Self {
            buckets: Mutex::new(HashMap::new()),
            prefix: config.prefix.clone(),
            default_limit: Limit {
                capacity: f64::from(config.requests_per_window),
                window_secs,
            },
            rules,
            window: Duration::from_secs(config.window_secs),
        }
    }

    fn limit_for<'a>(&'a self, path: &'a str) -> Option<(&'a str, Limit)> {
        if let Some((rule, limit)) = self.rules.get_key_value(path) {
            return Some((rule.as_str(), *limit));
        }
        path.starts_with(&self.prefix)
            .then(|| (self.prefix.as_str(), self.default_limit))
    }

    /// Count one request from `client` to `path`.
    pub fn check(&self, client: &str, path: &str) -> Result<(), Limited> {
        let Some((scope, limit)) = self.limit_for(path) else {
            return Ok(());
        };

        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if buckets.len() >= MAX_TRACKED_BUCKETS {
            self.prune(&mut buckets);
        }

        buckets
            .entry(format!("{}:{}", client, path))
            .or_insert_with(|| TokenBucket::new(limit.capacity))
            .try_acquire(&limit)
            .map_err(|missing| Limited {
                scope: scope.to_string(),
                retry_after_secs: limit.seconds_until(missing),
            })
    }

    /// Drop buckets idle for a whole window; they would be full again anyway.
    fn prune(&self, buckets: &mut HashMap<String, TokenBucket>) {
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.last_update.elapsed() < self.window);
        tracing::debug!(dropped = before - buckets.len(), "Pruned idle rate limit buckets");
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// The address a request is counted against.
pub fn client_key<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware function for per-client rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&request);

    match limiter.check(&client, request.uri().path()) {
        Ok(()) => next.run(request).await,
        Err(limited) => {
            tracing::warn!(
                client = %client,
                path = %request.uri().path(),
                retry_after = limited.retry_after_secs,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(&limited.scope);
            too_many_requests(limited.retry_after_secs)
        }
    }
}

fn too_many_requests(retry_after_secs: u64) -> Response {
    let body = json!({
        "error": "Too Many Requests",
        "message": format!(
            "Rate limit exceeded. Please try again in {} seconds.",
            retry_after_secs
        ),
    });
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        Json(body),
    )
        .into_response()
}

/// Layer the limiter onto `router` when enabled.
pub fn apply<S>(router: Router<S>, config: &RateLimitConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if !config.enabled {
        return router;
    }
    let limiter = Arc::new(RateLimiter::from_config(config));
    router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}
