//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Serve the configured document root as the wrapped application
//! - Compose the application with the response assembler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::assembler::{self, AssemblerError};
use crate::config::{ServerConfig, SiteConfig};

/// HTTP server hosting an application behind the response assembler.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server that assembles responses from `app`.
    pub fn new(config: ServerConfig, app: Router) -> Result<Self, AssemblerError> {
        let router = Self::build_router(&config, app)?;
        Ok(Self { router, config })
    }

    /// Create a server for the static site described by `config.site`.
    pub fn for_site(config: ServerConfig) -> Result<Self, AssemblerError> {
        let app = site_router(&config.site);
        Self::new(config, app)
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, app: Router) -> Result<Router, AssemblerError> {
        let assembled = assembler::compose(app, &config.assembly)?;

        Ok(assembled
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)))
    }

    /// Router with all layers applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_depth = self.config.assembly.max_depth,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Application serving files from the document root.
pub fn site_router(site: &SiteConfig) -> Router {
    Router::new().fallback_service(ServeDir::new(&site.document_root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_id_set_and_propagated() {
        let app = Router::new()
            .route("/", get(|| async { "<get>/id</get>" }))
            .route(
                "/id",
                get(|headers: axum::http::HeaderMap| async move {
                    headers
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("missing")
                        .to_string()
                }),
            );
        let server = HttpServer::new(ServerConfig::default(), app).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, request_id.as_bytes());
    }

    #[tokio::test]
    async fn test_site_router_assembles_files() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("index.html"), "<h1><get>/title.txt</get></h1>").unwrap();
        std::fs::write(root.path().join("title.txt"), "Docs").unwrap();

        let mut config = ServerConfig::default();
        config.site.document_root = root.path().to_path_buf();
        let server = HttpServer::for_site(config).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Docs</h1>");
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let app = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let mut config = ServerConfig::default();
        config.timeouts.request_secs = 1;
        let server = HttpServer::new(config, app).unwrap();

        let response = server
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
