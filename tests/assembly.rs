//! End-to-end assembly through the full server stack.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use response_assembler::config::ServerConfig;
use response_assembler::http::HttpServer;

mod common;

fn config_with_error(message: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.assembly.error_message = message.to_string();
    config
}

fn router() -> Router {
    HttpServer::new(config_with_error("Oh, no!"), common::test_app())
        .unwrap()
        .router()
}

async fn get(router: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_passes_response_without_tags() {
    let (status, _, body) = get(router(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello World");
}

#[tokio::test]
async fn test_renders_plain_responses() {
    let (_, _, body) = get(router(), "/response1").await;
    assert_eq!(body, "GET_response1");

    let (_, _, body) = get(router(), "/response2").await;
    assert_eq!(body, "GET_response2");
}

#[tokio::test]
async fn test_embeds_paths_wrapped_in_get_tags() {
    let (status, headers, body) = get(router(), "/embed_two").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[GET_response1] [GET_response2]");
    assert_eq!(headers[header::CONTENT_LENGTH], body.len().to_string().as_str());
}

#[tokio::test]
async fn test_recognizes_ajax_and_non_ajax_calls() {
    let (_, _, body) = get(router(), "/get_ajax_and_not_ajax").await;
    assert_eq!(body, "[Ajax!] [Non-Ajax!]");
}

#[tokio::test]
async fn test_failed_fragment_uses_configured_message() {
    let (status, _, body) = get(router(), "/broken").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "before Oh, no! after");
}

#[tokio::test]
async fn test_nested_fragments_fully_resolved() {
    let (_, _, body) = get(router(), "/nested").await;
    assert_eq!(body, "<div>[GET_response1] [GET_response2]</div>");
}

#[tokio::test]
async fn test_ineligible_response_untouched() {
    let (_, headers, body) = get(router(), "/json").await;
    assert_eq!(body, r#"{"embed":"<get>/response1</get>"}"#);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
}

#[tokio::test]
async fn test_outer_post_still_dispatches_get() {
    let response = router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form?page=2")
                .body(Body::from("field=value"))
                .unwrap(),
        )
        .await
        .unwrap();

    // /response1 only accepts GET, so a resolved fragment proves the method was forced.
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"[GET_response1]");
}

#[tokio::test]
async fn test_real_server_round_trip() {
    let (addr, shutdown) = common::start_server(config_with_error("Oh, no!"), common::test_app()).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/embed_two", addr))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.content_length(), Some(31));
    assert_eq!(res.text().await.unwrap(), "[GET_response1] [GET_response2]");

    let res = client
        .get(format!("http://{}/get_ajax_and_not_ajax", addr))
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "[Ajax!] [Non-Ajax!]");

    shutdown.trigger();
}
