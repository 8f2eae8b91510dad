//! Response construction and header hygiene.
//!
//! # Responsibilities
//! - Build locale redirect responses
//! - Strip hop-by-hop headers before forwarding in either direction
//! - Mark locale-dependent responses with `Vary: Accept-Language`
//!
//! # Design Decisions
//! - Redirects are 307 so the method and body are replayed
//! - Upstream is never contacted for a redirect

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

/// Headers that apply to a single connection and must not be forwarded.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Add `Accept-Language` to `Vary` unless it is already listed.
pub fn vary_on_accept_language(headers: &mut HeaderMap) {
    let already = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| {
            let v = v.trim();
            v == "*" || v.eq_ignore_ascii_case("accept-language")
        });
    if !already {
        headers.append(header::VARY, HeaderValue::from_static("Accept-Language"));
    }
}

/// A `307 Temporary Redirect` to `location`.
pub fn redirect(location: &str) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::TEMPORARY_REDIRECT;
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(_) => {
            tracing::warn!(location = %location, "Redirect target is not a valid header value");
            *response.status_mut() = StatusCode::BAD_REQUEST;
        }
    }
    vary_on_accept_language(response.headers_mut());
    response
}

/// A plain-text error response.
pub fn error(status: StatusCode, message: &'static str) -> Response {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-secret"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-secret", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ja"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT_LANGUAGE));
    }

    #[test]
    fn test_vary_is_merged_once() {
        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        vary_on_accept_language(&mut headers);
        vary_on_accept_language(&mut headers);

        let values: Vec<&str> = headers
            .get_all(header::VARY)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["Accept-Encoding", "Accept-Language"]);
    }

    #[test]
    fn test_vary_star_is_left_alone() {
        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("*"));
        vary_on_accept_language(&mut headers);
        assert_eq!(headers.get_all(header::VARY).iter().count(), 1);
    }

    #[test]
    fn test_redirect() {
        let response = redirect("/en/pricing?plan=pro");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/en/pricing?plan=pro");
        assert_eq!(response.headers()[header::VARY], "Accept-Language");
    }
}
