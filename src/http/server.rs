//! HTTP server setup and the gateway handler.
//!
//! # Responsibilities
//! - Create Axum Router with the health endpoint and gateway handler
//! - Wire up middleware (request ID, tracing, timeout, body limit, rate limit,
//!   security headers)
//! - Dispatch requests through the locale router
//! - Forward pass-throughs and rewrites to the upstream, answer redirects directly
//! - Observability (metrics, request-scoped logs)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, HeaderValue, Request, StatusCode},
    response::Response,
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::forward::{ForwardError, Upstream};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::{self, vary_on_accept_language};
use crate::lifecycle::shutdown;
use crate::locale::{locale_prefix, Locale, RoutingDecision};
use crate::observability::metrics;
use crate::routing::{Dispatch, LocaleRouter};
use crate::security;

/// Header telling the upstream which locale to render.
pub const X_GATEWAY_LOCALE: HeaderName = HeaderName::from_static("x-gateway-locale");

/// Path of the gateway's own health endpoint.
pub const HEALTH_PATH: &str = "/_gateway/health";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<LocaleRouter>,
    pub upstream: Arc<Upstream>,
}

/// HTTP server for the locale gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    upstream: Arc<Upstream>,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ForwardError> {
        let upstream = Arc::new(Upstream::from_config(&config.upstream)?);
        let state = AppState {
            router: Arc::new(LocaleRouter::from_config(&config.routing)),
            upstream: upstream.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            upstream,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route(HEALTH_PATH, get(health_handler))
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state);

        // security headers wrap every response the gateway produces, 413/408/429 included
        let router = security::rate_limit::apply(router, &config.security.rate_limit)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        security::headers::apply(router, &config.security)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The service, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown_rx` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::recv(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn upstream_base(&self) -> &str {
        self.upstream.base()
    }
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    upstream: String,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream: state.upstream.base().to_string(),
    })
}

/// Main gateway handler.
/// Routes the request, then forwards, rewrites or redirects it.
async fn gateway_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().unwrap_or("unknown").to_string();
    let path = request.uri().path().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let dispatch = {
        let accept_language = request.accept_language();
        state.router.route(&path, accept_language.as_deref())
    };
    let kind = dispatch.kind();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %path,
        dispatch = kind,
        "Routing request"
    );

    // clients never get to pick the locale header themselves
    request.headers_mut().remove(&X_GATEWAY_LOCALE);

    let response = match dispatch {
        Dispatch::Bypass => forward(&state, request, None, peer, &request_id).await,
        Dispatch::Decide(RoutingDecision::PassThrough) => {
            if let Some(locale) = locale_prefix(&path) {
                set_locale_header(&mut request, locale);
            }
            forward(&state, request, None, peer, &request_id).await
        }
        Dispatch::Decide(decision @ RoutingDecision::RewriteTo { .. }) => {
            let target = decision.target_path().unwrap_or_else(|| path.clone());
            if let Some(locale) = decision.locale() {
                set_locale_header(&mut request, locale);
                metrics::record_locale_decision(kind, locale);
            }
            tracing::debug!(request_id = %request_id, target = %target, "Rewriting request");

            let mut response = forward(&state, request, Some(&target), peer, &request_id).await;
            vary_on_accept_language(response.headers_mut());
            response
        }
        Dispatch::Decide(decision @ RoutingDecision::RedirectTo { .. }) => {
            let target = decision.target_path().unwrap_or_else(|| path.clone());
            let location = match request.uri().query() {
                Some(query) => format!("{}?{}", target, query),
                None => target,
            };
            if let Some(locale) = decision.locale() {
                metrics::record_locale_decision(kind, locale);
            }
            tracing::debug!(request_id = %request_id, location = %location, "Redirecting request");
            response::redirect(&location)
        }
    };

    metrics::record_request(kind, response.status().as_u16(), start_time);
    response
}

fn set_locale_header(request: &mut Request<Body>, locale: Locale) {
    request
        .headers_mut()
        .insert(X_GATEWAY_LOCALE, HeaderValue::from_static(locale.as_str()));
}

async fn forward(
    state: &AppState,
    request: Request<Body>,
    path: Option<&str>,
    peer: Option<SocketAddr>,
    request_id: &str,
) -> Response {
    match state.upstream.forward(request, path, peer).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_upstream_error();
            response::error(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
    }
}
