mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::*;
use pagepick::FetchConfig;
use pagepick::runtime::{RUNTIME_MARKER, script_block};
use pagepick::server::router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn proxy(site: &TargetSite, config: FetchConfig, target: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let app = router(Arc::new(fetcher_for(site, config)));
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/proxy?url={}", target))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

fn error_message(body: &str) -> String {
    let value: serde_json::Value = serde_json::from_str(body).unwrap();
    value["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_proxy_serves_rewritten_page() {
    let site = spawn_target_site().await;
    let (status, headers, body) = proxy(&site, quick_config(), &site.url(PUBLIC_HOST, "/page")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store, no-cache, must-revalidate");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");

    let base = format!(r#"<base href="http://public.test:{}/">"#, site.addr.port());
    assert_eq!(body.matches("<base ").count(), 1);
    assert!(body.contains(&base));
    assert!(!body.contains("Content-Security-Policy"));

    assert_eq!(body.matches(RUNTIME_MARKER).count(), 1);
    assert!(body.contains(&format!("{}</body>", script_block())));
    assert!(body.contains("<button class=\"btn primary\">Sign Up</button>"));
}

#[tokio::test]
async fn test_proxy_base_follows_final_url() {
    let site = spawn_target_site().await;
    let (status, _, body) = proxy(&site, quick_config(), &site.url(PUBLIC_HOST, "/chain/2")).await;

    assert_eq!(status, StatusCode::OK);
    let base = format!(r#"<base href="http://public.test:{}/chain/">"#, site.addr.port());
    assert!(body.contains(&base), "missing {} in {}", base, body);
}

#[tokio::test]
async fn test_proxy_blocks_localhost() {
    let site = spawn_target_site().await;
    let (status, _, body) = proxy(&site, quick_config(), "http://localhost/").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Blocked private/localhost targets");
    assert!(site.hosts_hit().is_empty());
}

#[tokio::test]
async fn test_proxy_blocks_private_redirect_hop() {
    let site = spawn_target_site().await;
    let to = site.url(PRIVATE_HOST, "/page");
    let (status, _, body) = proxy(
        &site,
        quick_config(),
        &site.url(PUBLIC_HOST, &format!("/redirect?to={}", to)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Blocked private/localhost targets");
    assert_eq!(site.hosts_hit(), vec!["public.test /redirect"]);
}

#[tokio::test]
async fn test_proxy_rejects_non_html() {
    let site = spawn_target_site().await;
    let (status, _, body) = proxy(&site, quick_config(), &site.url(PUBLIC_HOST, "/image")).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(error_message(&body).contains("image/png"));
}

#[tokio::test]
async fn test_proxy_redirect_loop_is_client_error() {
    let site = spawn_target_site().await;
    let (status, _, body) = proxy(&site, quick_config(), &site.url(PUBLIC_HOST, "/chain/9")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("Too many redirects"));
}

#[tokio::test]
async fn test_proxy_timeout_is_generic_server_error() {
    let site = spawn_target_site().await;
    let config = FetchConfig {
        timeout: Duration::from_millis(300),
        ..quick_config()
    };
    let (status, _, body) = proxy(&site, config, &site.url(PUBLIC_HOST, "/slow")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), "Failed to fetch target");
}
