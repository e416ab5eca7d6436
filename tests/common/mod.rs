// Common test utilities: a local target site and a resolver with fixed answers
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pagepick::{FetchConfig, Fetcher, HostValidator, Resolver};

/// Hostname the resolver reports as a public address
pub const PUBLIC_HOST: &str = "public.test";
/// Second public hostname, for cross-host redirects
pub const OTHER_HOST: &str = "other.test";
/// Hostname the resolver reports as a private address
pub const PRIVATE_HOST: &str = "private.test";
/// Hostname resolving to one public and one private address
pub const MIXED_HOST: &str = "mixed.test";

/// Resolver answering from a fixed table; unknown names fail to resolve
#[derive(Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn with(mut self, host: &str, addrs: &[&str]) -> Self {
        let ips = addrs.iter().map(|a| a.parse().unwrap()).collect();
        self.entries.insert(host.to_string(), ips);
        self
    }

    /// The table every pipeline test uses
    pub fn standard() -> Self {
        Self::default()
            .with(PUBLIC_HOST, &["93.184.216.34"])
            .with(OTHER_HOST, &["2606:2800:220:1:248:1893:25c8:1946"])
            .with(PRIVATE_HOST, &["10.0.0.8"])
            .with(MIXED_HOST, &["93.184.216.34", "192.168.1.5"])
            .with("localhost", &["127.0.0.1", "::1"])
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn lookup(&self, host: &str, _port: u16) -> std::io::Result<Vec<IpAddr>> {
        self.entries.get(host).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("unknown host {}", host))
        })
    }
}

/// Requests the target site received, as "host path"
pub type HitLog = Arc<Mutex<Vec<String>>>;

pub struct TargetSite {
    pub addr: SocketAddr,
    pub hits: HitLog,
}

impl TargetSite {
    /// URL on `host` at this site's port
    pub fn url(&self, host: &str, path: &str) -> String {
        format!("http://{}:{}{}", host, self.addr.port(), path)
    }

    pub fn hosts_hit(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

pub const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta http-equiv="Content-Security-Policy" content="script-src 'self'">
  <title>Landing</title>
</head>
<body>
  <section class="hero"><h1>Ship faster</h1><button class="btn primary">Sign Up</button></section>
</body>
</html>"#;

#[derive(Deserialize)]
struct RedirectQuery {
    to: String,
}

fn record(state: &HitLog, headers: &HeaderMap, path: &str) {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("?")
        .split(':')
        .next()
        .unwrap_or("?")
        .to_string();
    state.lock().unwrap().push(format!("{} {}", host, path));
}

fn html(body: impl Into<String>) -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body.into()).into_response()
}

async fn page(State(hits): State<HitLog>, headers: HeaderMap) -> Response {
    record(&hits, &headers, "/page");
    html(LANDING_PAGE)
}

async fn chain(State(hits): State<HitLog>, headers: HeaderMap, Path(n): Path<u32>) -> Response {
    record(&hits, &headers, &format!("/chain/{}", n));
    if n == 0 {
        return html("<html><head></head><body><p>end of chain</p></body></html>");
    }
    // relative Location, resolved against the current hop
    (StatusCode::FOUND, [(header::LOCATION, format!("/chain/{}", n - 1))]).into_response()
}

async fn redirect(
    State(hits): State<HitLog>,
    headers: HeaderMap,
    Query(q): Query<RedirectQuery>,
) -> Response {
    record(&hits, &headers, "/redirect");
    Redirect::temporary(&q.to).into_response()
}

async fn user_agent(headers: HeaderMap) -> Response {
    let ua = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    html(format!("<html><body><p id=\"ua\">{}</p></body></html>", ua))
}

pub async fn spawn_target_site() -> TargetSite {
    let hits: HitLog = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/page", get(page))
        .route("/chain/:n", get(chain))
        .route("/redirect", get(redirect))
        .route("/ua", get(user_agent))
        .route(
            "/upper",
            get(|| async {
                ([(header::CONTENT_TYPE, "TEXT/HTML; Charset=UTF-8")], "<p>shouting</p>")
            }),
        )
        .route(
            "/image",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G']) }),
        )
        .route(
            "/no-content-type",
            get(|| async { Response::new(axum::body::Body::from("<p>untyped</p>")) }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                html("<p>too late</p>")
            }),
        )
        .route("/no-location", get(|| async { StatusCode::FOUND }))
        .route(
            "/bad-location",
            get(|| async { (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "http://[::1")]) }),
        )
        .route(
            "/to-ftp",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "ftp://files.test/x")]) }),
        )
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/large",
            get(|| async { html(format!("<html><body>{}</body></html>", "x".repeat(LARGE_BODY_BYTES))) }),
        )
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind target site");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Target site failed");
    });

    TargetSite { addr, hits }
}

/// Fetcher whose client sends every test hostname to the local site while
/// validation sees the addresses from [`StaticResolver::standard`]
pub fn fetcher_for(site: &TargetSite, config: FetchConfig) -> Fetcher {
    fetcher_to(site.addr, config)
}

/// Like [`fetcher_for`], for any local listener
pub fn fetcher_to(addr: SocketAddr, config: FetchConfig) -> Fetcher {
    let validator = HostValidator::new(Arc::new(StaticResolver::standard()));
    // the overrides below take precedence over the guard
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .dns_resolver(Arc::new(validator.connect_guard()));
    for host in [PUBLIC_HOST, OTHER_HOST, PRIVATE_HOST, MIXED_HOST] {
        builder = builder.resolve(host, addr);
    }
    let client = builder.build().expect("Failed to build test client");
    Fetcher::with_client(client, validator, config)
}

/// Size of the `/large` page body filler
pub const LARGE_BODY_BYTES: usize = 100_000;

/// Serve one fixed, raw HTTP response on every connection.
///
/// Used for responses axum always frames with a Content-Length.
pub async fn spawn_raw_site(response: Vec<u8>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind raw site");
    let addr = listener.local_addr().unwrap();
    let response = Arc::new(response);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let response = response.clone();
            tokio::spawn(async move {
                use tokio::io::{AsyncReadExt, AsyncWriteExt};
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(&response).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// Chunked HTML response with no Content-Length, `chunks` chunks of `size` bytes
pub fn chunked_html(chunks: usize, size: usize) -> Vec<u8> {
    let mut out = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
    for _ in 0..chunks {
        out.extend_from_slice(format!("{:x}\r\n", size).as_bytes());
        out.extend(std::iter::repeat_n(b'y', size));
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// Fetcher using its own guarded client and the given resolver for both
/// validation and connection
pub fn guarded_fetcher(resolver: Arc<dyn Resolver>, config: FetchConfig) -> Fetcher {
    Fetcher::new(HostValidator::new(resolver), config).expect("Failed to build fetcher")
}

pub fn quick_config() -> FetchConfig {
    FetchConfig {
        timeout: Duration::from_secs(5),
        ..FetchConfig::default()
    }
}
