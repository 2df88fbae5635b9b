//! Request context snapshots and internal request derivation.
//!
//! # Responsibilities
//! - Snapshot the outer request before it is handed to the inner app
//! - Derive internal GET requests for directive references
//!
//! # Design Decisions
//! - The snapshot is never mutated; derivation copies and overrides
//! - Method is forced to GET and path/query come only from the reference
//! - The ajax marker is present exactly when the directive is `<xhrget>`
//! - Entity, range and conditional headers are dropped
//! - Routing state (`MatchedPath`, `OriginalUri`) is not part of the snapshot;
//!   the snapshot is taken before routing so path params never leak either

use axum::body::Body;
use axum::extract::{MatchedPath, OriginalUri};
use axum::http::{
    header, uri::PathAndQuery, Extensions, HeaderMap, HeaderValue, Method, Request, Uri, Version,
};

use crate::assembler::scanner::DirectiveKind;
use crate::assembler::DispatchError;
use crate::http::request::{is_xhr, X_REQUESTED_WITH, XML_HTTP_REQUEST};

/// Headers never copied into a derived request. It has no body, and it must
/// yield a full 200 rather than a partial or not-modified response.
const DROPPED_HEADERS: [header::HeaderName; 9] = [
    header::CONTENT_LENGTH,
    header::CONTENT_TYPE,
    header::TRANSFER_ENCODING,
    header::RANGE,
    header::IF_RANGE,
    header::IF_MATCH,
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
    header::IF_UNMODIFIED_SINCE,
];

/// Immutable snapshot of an inbound request's environment.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    extensions: Extensions,
}

impl RequestContext {
    /// Capture the context of an outer request. The body is not part of the snapshot.
    ///
    /// Routing state left by an enclosing router is dropped, so every derived
    /// request is routed as a fresh top-level GET.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let mut extensions = request.extensions().clone();
        extensions.remove::<MatchedPath>();
        extensions.remove::<OriginalUri>();

        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            headers: request.headers().clone(),
            extensions,
        }
    }

    /// Derive the context for an internal GET to `reference` (`path[?query]`).
    ///
    /// The reference is split on its first `?`. The outer query string is
    /// never merged in.
    pub fn derive(&self, reference: &str, kind: DirectiveKind) -> Result<Self, DispatchError> {
        let (path, query) = reference.split_once('?').unwrap_or((reference, ""));
        let target = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };

        let path_and_query: PathAndQuery =
            target
                .parse()
                .map_err(|source| DispatchError::InvalidReference {
                    reference: reference.to_string(),
                    source,
                })?;

        let mut headers = self.headers.clone();
        for name in DROPPED_HEADERS {
            headers.remove(name);
        }
        headers.remove(X_REQUESTED_WITH);
        if kind.is_ajax() {
            headers.insert(X_REQUESTED_WITH, HeaderValue::from_static(XML_HTTP_REQUEST));
        }

        Ok(Self {
            method: Method::GET,
            uri: Uri::from(path_and_query),
            version: self.version,
            headers,
            extensions: self.extensions.clone(),
        })
    }

    /// Build a bodiless request from this context.
    pub fn into_request(self) -> Request<Body> {
        let mut request = Request::new(Body::empty());
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers;
        *request.extensions_mut() = self.extensions;
        request
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Query string without the leading `?`, empty if absent.
    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or("")
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn is_xhr(&self) -> bool {
        is_xhr(&self.headers)
    }
}
