//! Recursive directive resolution.
//!
//! # Responsibilities
//! - Replace every directive in a body with the body of its internal GET
//! - Resolve directives inside fetched fragments before splicing them in
//! - Substitute the error fragment for any dispatch that does not yield a 200
//!
//! # Design Decisions
//! - One left-to-right pass per body; fragments are resolved on their own, never
//!   re-scanned against already resolved siblings
//! - Each nesting level carries the chain of `(kind, reference)` ancestors so
//!   loops and runaway nesting fail closed
//! - The outer request context is passed explicitly, never stored

use std::time::Duration;

use axum::body::{to_bytes, Bytes};
use axum::http::StatusCode;
use futures_util::future::BoxFuture;

use crate::assembler::scanner::{self, Directive, DirectiveKind};
use crate::assembler::{Dispatch, DispatchError, RequestContext};
use crate::config::AssemblyConfig;
use crate::observability::metrics;

/// A directive currently being resolved further up the nesting chain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ancestor {
    kind: DirectiveKind,
    reference: String,
}

/// Resolves `<get>` and `<xhrget>` directives against a dispatcher.
pub struct DirectiveResolver<D> {
    dispatcher: D,
    error_fragment: Bytes,
    max_depth: usize,
    dispatch_timeout: Option<Duration>,
    max_body_bytes: usize,
}

impl<D: Dispatch> DirectiveResolver<D> {
    pub fn new(dispatcher: D, config: &AssemblyConfig) -> Self {
        Self {
            dispatcher,
            error_fragment: Bytes::from(config.error_message.clone()),
            max_depth: config.max_depth,
            dispatch_timeout: config.dispatch_timeout(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Resolve all directives in `body`, recursively, in the context of the outer request.
    pub fn resolve<'a>(
        &'a self,
        body: &'a [u8],
        context: &'a RequestContext,
    ) -> BoxFuture<'a, Vec<u8>> {
        self.resolve_nested(body, context, &[])
    }

    fn resolve_nested<'a>(
        &'a self,
        body: &'a [u8],
        context: &'a RequestContext,
        ancestors: &'a [Ancestor],
    ) -> BoxFuture<'a, Vec<u8>> {
        Box::pin(async move {
            let directives: Vec<Directive<'_>> = scanner::scan(body).collect();
            if directives.is_empty() {
                return body.to_vec();
            }

            let mut resolved = Vec::with_capacity(body.len());
            let mut cursor = 0;
            for directive in &directives {
                resolved.extend_from_slice(&body[cursor..directive.span.start]);
                let fragment = self.fragment(directive, context, ancestors).await;
                resolved.extend_from_slice(&fragment);
                cursor = directive.span.end;
            }
            resolved.extend_from_slice(&body[cursor..]);
            resolved
        })
    }

    /// Resolved replacement for one directive, or the error fragment.
    async fn fragment(
        &self,
        directive: &Directive<'_>,
        context: &RequestContext,
        ancestors: &[Ancestor],
    ) -> Vec<u8> {
        match self.try_fragment(directive, context, ancestors).await {
            Ok(fragment) => {
                metrics::record_fragment("resolved");
                fragment
            }
            Err(e) => {
                tracing::warn!(
                    reference = %String::from_utf8_lossy(directive.reference),
                    kind = %directive.kind,
                    depth = ancestors.len() + 1,
                    reason = %e,
                    "Directive resolution failed, substituting error fragment"
                );
                metrics::record_fragment(e.outcome());
                self.error_fragment.to_vec()
            }
        }
    }

    async fn try_fragment(
        &self,
        directive: &Directive<'_>,
        context: &RequestContext,
        ancestors: &[Ancestor],
    ) -> Result<Vec<u8>, DispatchError> {
        let reference =
            std::str::from_utf8(directive.reference).map_err(|_| DispatchError::NonUtf8Reference)?;
        let current = Ancestor {
            kind: directive.kind,
            reference: reference.to_string(),
        };

        if ancestors.contains(&current) {
            return Err(DispatchError::Cycle);
        }
        if ancestors.len() >= self.max_depth {
            return Err(DispatchError::TooDeep(self.max_depth));
        }

        let body = self.try_dispatch(reference, directive.kind, context).await?;

        let mut chain = ancestors.to_vec();
        chain.push(current);
        Ok(self.resolve_nested(&body, context, &chain).await)
    }

    /// Fetch `reference` with an internal GET and return its body.
    ///
    /// Never fails: any failure yields the error fragment.
    pub async fn dispatch_internal(
        &self,
        reference: &str,
        kind: DirectiveKind,
        context: &RequestContext,
    ) -> Bytes {
        match self.try_dispatch(reference, kind, context).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(reference = %reference, kind = %kind, reason = %e, "Internal dispatch failed");
                self.error_fragment.clone()
            }
        }
    }

    /// Fetch `reference` with an internal GET. Only a 200 response counts as success.
    pub async fn try_dispatch(
        &self,
        reference: &str,
        kind: DirectiveKind,
        context: &RequestContext,
    ) -> Result<Bytes, DispatchError> {
        let derived = context.derive(reference, kind)?;

        tracing::debug!(
            reference = %reference,
            kind = %kind,
            path = %derived.path(),
            "Dispatching internal request"
        );

        let fetch = async {
            let response = self.dispatcher.dispatch(derived).await?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(DispatchError::Status(status));
            }
            to_bytes(response.into_body(), self.max_body_bytes)
                .await
                .map_err(DispatchError::Body)
        };

        match self.dispatch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| DispatchError::TimedOut(limit))?,
            None => fetch.await,
        }
    }
}
