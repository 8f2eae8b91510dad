//! Request identification and inspection.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for every request without one
//! - Propagate the ID onto the response and the upstream request
//! - Read routing-relevant headers (Accept-Language, Host)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept, not replaced

use std::borrow::Cow;

use axum::http::{header, HeaderName, HeaderValue, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Layer that assigns a request ID when the client did not send one.
pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Convenience accessors for request metadata.
pub trait RequestIdExt {
    /// The request ID assigned by [`set_request_id_layer`], if any.
    fn request_id(&self) -> Option<&str>;

    /// The `Accept-Language` value, if present and valid ASCII.
    ///
    /// Repeated field lines are joined into one comma-separated list.
    fn accept_language(&self) -> Option<Cow<'_, str>>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .or_else(|| {
                self.headers()
                    .get(&X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
            })
    }

    fn accept_language(&self) -> Option<Cow<'_, str>> {
        let mut lines = self
            .headers()
            .get_all(header::ACCEPT_LANGUAGE)
            .iter()
            .filter_map(|v| v.to_str().ok());

        let first = lines.next()?;
        let Some(second) = lines.next() else {
            return Some(Cow::Borrowed(first));
        };

        let mut joined = format!("{}, {}", first, second);
        for line in lines {
            joined.push_str(", ");
            joined.push_str(line);
        }
        Some(Cow::Owned(joined))
    }
}
