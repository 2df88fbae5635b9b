//! Internal dispatch to the wrapped application.
//!
//! # Responsibilities
//! - Turn a derived `RequestContext` into a request for the inner app
//! - Normalize service errors into `DispatchError`
//!
//! # Design Decisions
//! - Any cloneable tower service can be the host; `axum::Router` is the common case
//! - Router hosts are wrapped in `CatchPanicLayer` so a panicking handler yields a 500
//! - The trait returns a boxed future so it stays object safe

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use futures_util::future::BoxFuture;
use tower::{BoxError, Service, ServiceExt};
use tower_http::catch_panic::CatchPanicLayer;

use crate::assembler::{DispatchError, RequestContext};

/// Host capability: handle a derived request as if it were a fresh top-level GET.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, context: RequestContext) -> BoxFuture<'_, Result<Response, DispatchError>>;
}

/// Dispatches through a cloned tower service.
#[derive(Debug, Clone)]
pub struct ServiceDispatcher<S> {
    inner: S,
}

impl<S> ServiceDispatcher<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl ServiceDispatcher<Router> {
    /// Dispatch into `router`, converting handler panics into 500 responses.
    pub fn from_router(router: Router) -> Self {
        Self::new(router.layer(CatchPanicLayer::new()))
    }
}

impl<S> Dispatch for ServiceDispatcher<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
{
    fn dispatch(&self, context: RequestContext) -> BoxFuture<'_, Result<Response, DispatchError>> {
        let service = self.inner.clone();
        Box::pin(async move {
            service
                .oneshot(context.into_request())
                .await
                .map_err(|e| DispatchError::Handler(e.into()))
        })
    }
}

/// Adapts an async closure into a `Dispatch`. Mostly useful for tests and embedding.
pub struct FnDispatcher<F> {
    f: F,
}

impl<F> FnDispatcher<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> Dispatch for FnDispatcher<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn dispatch(&self, context: RequestContext) -> BoxFuture<'_, Result<Response, DispatchError>> {
        let fut = (self.f)(context);
        Box::pin(async move { fut.await.map_err(DispatchError::Handler) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::DirectiveKind;
    use axum::http::StatusCode;
    use axum::routing::get;

    fn context() -> RequestContext {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        RequestContext::from_request(&request)
    }

    #[tokio::test]
    async fn test_router_dispatch() {
        let router = Router::new().route("/a", get(|| async { "A" }));
        let dispatcher = ServiceDispatcher::from_router(router);

        let derived = context().derive("/a", DirectiveKind::Get).unwrap();
        let response = dispatcher.dispatch(derived).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_panic_becomes_500() {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }
        let router = Router::new().route("/boom", get(boom));
        let dispatcher = ServiceDispatcher::from_router(router);

        let derived = context().derive("/boom", DirectiveKind::Get).unwrap();
        let response = dispatcher.dispatch(derived).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_fn_dispatcher_error() {
        let dispatcher = FnDispatcher::new(|_ctx: RequestContext| async {
            Err::<Response, BoxError>("backend gone".into())
        });

        let err = dispatcher.dispatch(context()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
    }
}
