//! Shared utilities for integration tests.

use std::net::SocketAddr;

use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use response_assembler::config::ServerConfig;
use response_assembler::http::{HttpServer, Xhr};
use response_assembler::lifecycle::Shutdown;

/// Application used across tests, modelled on a small multi-handler site.
#[allow(dead_code)]
pub fn test_app() -> Router {
    Router::new()
        .route("/", get(|| async { "Hello World" }))
        .route("/response1", get(|| async { "GET_response1" }))
        .route("/response2", get(|| async { "GET_response2" }))
        .route(
            "/embed_two",
            get(|| async { "[<get>/response1</get>] [<get>/response2</get>]" }),
        )
        .route(
            "/get_ajax_and_not_ajax",
            get(|| async { "[<xhrget>/ajax_or_not</xhrget>] [<get>/ajax_or_not</get>]" }),
        )
        .route(
            "/ajax_or_not",
            get(|Xhr(xhr): Xhr| async move { if xhr { "Ajax!" } else { "Non-Ajax!" } }),
        )
        .route("/form", post(|| async { "[<get>/response1</get>]" }))
        .route("/broken", get(|| async { "before <get>/nowhere</get> after" }))
        .route("/nested", get(|| async { "<div><get>/embed_two</get></div>" }))
        .route(
            "/json",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/json")],
                    r#"{"embed":"<get>/response1</get>"}"#,
                )
                    .into_response()
            }),
        )
}

/// Start a server for `app` on an ephemeral port.
///
/// Returns the bound address and the shutdown handle; trigger it to stop the server.
#[allow(dead_code)]
pub async fn start_server(config: ServerConfig, app: Router) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config, app).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
