//! Request helpers shared by the assembler and application handlers.
//!
//! # Responsibilities
//! - Name the ajax marker header used by `<xhrget>` directives
//! - Let handlers ask whether a request is script-originated (`Xhr` extractor)
//!
//! # Design Decisions
//! - The marker is the conventional `X-Requested-With: XMLHttpRequest`
//! - Header value comparison is case-insensitive

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{header::HeaderName, request::Parts, HeaderMap};

/// Header carrying the ajax marker.
pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

/// Marker value set on `<xhrget>` internal requests.
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Request ID header propagated to internal requests.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Returns true if the headers carry the XMLHttpRequest marker.
pub fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get(X_REQUESTED_WITH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case(XML_HTTP_REQUEST))
        .unwrap_or(false)
}

/// Extractor reporting whether the request carries the XMLHttpRequest marker.
///
/// ```ignore
/// async fn sidebar(Xhr(xhr): Xhr) -> Html<String> {
///     if xhr { fragment() } else { with_layout(fragment()) }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xhr(pub bool);

impl<S> FromRequestParts<S> for Xhr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Xhr(is_xhr(&parts.headers)))
    }
}
