//! Response assembly middleware.
//!
//! Wraps an application so that eligible responses have their directives
//! resolved before they reach the client.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower::Layer;

use crate::assembler::{
    AssemblerError, ContentTypeGate, DirectiveResolver, Dispatch, RequestContext,
    ServiceDispatcher,
};
use crate::config::AssemblyConfig;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;

/// Gate and resolver compiled from configuration, shared by all requests.
pub struct ResponseAssembler<D> {
    gate: ContentTypeGate,
    resolver: DirectiveResolver<D>,
    max_body_bytes: usize,
}

impl<D: Dispatch> ResponseAssembler<D> {
    pub fn new(dispatcher: D, config: &AssemblyConfig) -> Result<Self, AssemblerError> {
        Ok(Self {
            gate: ContentTypeGate::new(&config.content_types)?,
            resolver: DirectiveResolver::new(dispatcher, config),
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Assemble an outer response produced for `context`.
    ///
    /// Ineligible responses are returned untouched. Eligible ones get a resolved
    /// body and a recomputed Content-Length; status and other headers are kept.
    /// Partial content is never rewritten, since its Content-Range describes
    /// the unassembled representation.
    pub async fn assemble(&self, response: Response, context: &RequestContext) -> Response {
        let start_time = Instant::now();

        // 0. Byte ranges of the raw body
        if response.status() == StatusCode::PARTIAL_CONTENT
            || response.headers().contains_key(header::CONTENT_RANGE)
        {
            metrics::record_passthrough("partial_content");
            return response;
        }

        // 1. Content-Type gate
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !self.gate.eligible(content_type) {
            metrics::record_passthrough("content_type");
            return response;
        }

        // 2. Skip bodies known to be too large to buffer
        let declared_len = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .or_else(|| response.body().size_hint().exact());
        if declared_len.is_some_and(|len| len > self.max_body_bytes as u64) {
            tracing::debug!(
                content_length = ?declared_len,
                max_body_bytes = self.max_body_bytes,
                "Response too large to assemble, passing through"
            );
            metrics::record_passthrough("too_large");
            return response;
        }

        // 3. Collect body chunks in order
        let (mut parts, body) = response.into_parts();
        let body = match to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let request_id = context
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::error!(
                    request_id = %request_id,
                    path = %context.path(),
                    error = %e,
                    "Failed to collect response body for assembly"
                );
                metrics::record_passthrough("body_error");
                return (StatusCode::BAD_GATEWAY, "Failed to assemble response").into_response();
            }
        };

        // 4. Resolve directives and fix up the length
        let resolved = self.resolver.resolve(&body, context).await;
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(resolved.len()));

        tracing::debug!(
            path = %context.path(),
            original_len = body.len(),
            resolved_len = resolved.len(),
            "Response assembled"
        );
        metrics::record_assembly(start_time);

        Response::from_parts(parts, Body::from(resolved))
    }
}

/// Axum middleware entry point; use via `middleware::from_fn_with_state`.
pub async fn assemble_responses<D>(
    State(assembler): State<Arc<ResponseAssembler<D>>>,
    request: Request,
    next: Next,
) -> Response
where
    D: Dispatch + 'static,
{
    let context = RequestContext::from_request(&request);
    let response = next.run(request).await;
    assembler.assemble(response, &context).await
}

/// Wrap `app` so its responses are assembled.
///
/// Internal requests go to `app` itself, not through the returned router, so
/// outer middleware added later runs once per client request.
///
/// The assembler sits in front of `app`'s routing rather than inside it, so the
/// outer request is captured before path params and matched paths are attached.
pub fn compose(app: Router, config: &AssemblyConfig) -> Result<Router, AssemblerError> {
    let dispatcher = ServiceDispatcher::from_router(app.clone());
    let assembler = Arc::new(ResponseAssembler::new(dispatcher, config)?);

    tracing::info!(
        content_types = ?config.content_types,
        max_depth = config.max_depth,
        "Response assembly enabled"
    );

    let layer = middleware::from_fn_with_state(
        assembler,
        assemble_responses::<ServiceDispatcher<Router>>,
    );
    Ok(Router::new().fallback_service(layer.layer(app)))
}
