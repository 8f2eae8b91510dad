//! Upstream forwarding.
//!
//! # Responsibilities
//! - Point the request at the upstream site renderer
//! - Optionally replace the path (locale rewrite), keeping the query
//! - Add X-Forwarded-* headers, strip hop-by-hop headers
//! - Stream the upstream response back unchanged otherwise
//!
//! # Design Decisions
//! - The client's Host header is preserved for the renderer
//! - Existing X-Forwarded-Proto / X-Forwarded-Host from the edge are kept
//! - No retries: pages are cheap to re-request from the browser

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{header, HeaderName, HeaderValue, Request, Uri, Version};
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::response::strip_hop_by_hop;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Error type for forwarding.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream url {0:?}")]
    InvalidUpstream(String),

    #[error("invalid forwarded uri: {0}")]
    InvalidUri(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// The site renderer behind the gateway.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
    base: String,
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream").field("base", &self.base).finish()
    }
}

impl Upstream {
    /// Create an upstream from its configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ForwardError> {
        let invalid = || ForwardError::InvalidUpstream(config.url.clone());

        let url = Url::parse(&config.url).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?;
        let port = url.port_or_known_default().ok_or_else(invalid)?;
        let scheme = Scheme::from_str(url.scheme()).map_err(|_| invalid())?;
        let authority = Authority::from_str(&format!("{}:{}", host, port)).map_err(|_| invalid())?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            scheme,
            authority,
            base: format!("{}://{}", url.scheme(), authority_str(&url, host, port)),
        })
    }

    /// Base URL requests are forwarded to.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Forward `request`, replacing its path with `path` when given.
    pub async fn forward(
        &self,
        request: Request<Body>,
        path: Option<&str>,
        peer: Option<SocketAddr>,
    ) -> Result<Response, ForwardError> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = match (path, parts.uri.query()) {
            (Some(path), Some(query)) => Some(format!("{}?{}", path, query)),
            (Some(path), None) => Some(path.to_string()),
            (None, _) => parts.uri.path_and_query().map(|pq| pq.as_str().to_string()),
        };

        parts.uri = Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query.unwrap_or_else(|| "/".to_string()))
            .build()?;
        // the pooled client speaks HTTP/1.1 to the renderer
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        add_forwarded_headers(&mut parts.headers, peer);

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

fn authority_str(url: &Url, host: &str, port: u16) -> String {
    match url.port() {
        Some(_) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Append the peer to X-Forwarded-For and fill in proto/host when absent.
pub fn add_forwarded_headers(headers: &mut axum::http::HeaderMap, peer: Option<SocketAddr>) {
    if let Some(peer) = peer {
        let ip = peer.ip().to_string();
        let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}, {}", existing, ip),
            None => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    if !headers.contains_key(&X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    }

    if !headers.contains_key(&X_FORWARDED_HOST) {
        if let Some(host) = headers.get(header::HOST).cloned() {
            headers.insert(X_FORWARDED_HOST, host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    fn upstream(url: &str) -> Result<Upstream, ForwardError> {
        Upstream::from_config(&UpstreamConfig {
            url: url.to_string(),
            connect_timeout_secs: 1,
        })
    }

    #[tokio::test]
    async fn test_from_config() {
        let up = upstream("http://127.0.0.1:3000").unwrap();
        assert_eq!(up.base(), "http://127.0.0.1:3000");
        assert_eq!(up.authority.as_str(), "127.0.0.1:3000");

        let default_port = upstream("http://site.internal").unwrap();
        assert_eq!(default_port.base(), "http://site.internal");
        assert_eq!(default_port.authority.as_str(), "site.internal:80");

        assert!(matches!(upstream("not a url"), Err(ForwardError::InvalidUpstream(_))));
    }

    #[test]
    fn test_forwarded_headers_appends_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));
        headers.insert(header::HOST, HeaderValue::from_static("8px.app"));

        add_forwarded_headers(&mut headers, Some("10.0.0.2:5555".parse().unwrap()));

        assert_eq!(headers[&X_FORWARDED_FOR], "203.0.113.7, 10.0.0.2");
        assert_eq!(headers[&X_FORWARDED_PROTO], "http");
        assert_eq!(headers[&X_FORWARDED_HOST], "8px.app");
    }

    #[test]
    fn test_forwarded_headers_keep_edge_values() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https"));
        headers.insert(X_FORWARDED_HOST, HeaderValue::from_static("www.8px.app"));
        headers.insert(header::HOST, HeaderValue::from_static("gateway.internal"));

        add_forwarded_headers(&mut headers, None);

        assert!(!headers.contains_key(&X_FORWARDED_FOR));
        assert_eq!(headers[&X_FORWARDED_PROTO], "https");
        assert_eq!(headers[&X_FORWARDED_HOST], "www.8px.app");
    }
}
