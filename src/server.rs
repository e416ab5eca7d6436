//! Retrieval endpoint and the host page that frames it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::errors::InspectError;
use crate::fetcher::{Fetcher, TargetRef};
use crate::rewriter;

#[derive(Clone)]
pub struct AppState {
    fetcher: Arc<Fetcher>,
}

#[derive(Debug, Deserialize)]
struct ProxyQuery {
    url: Option<String>,
}

pub fn router(fetcher: Arc<Fetcher>) -> Router {
    Router::new()
        .route("/", get(host_page))
        .route("/proxy", get(proxy))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { fetcher })
}

/// Bind and serve until Ctrl-C
pub async fn serve(bind: SocketAddr, fetcher: Arc<Fetcher>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(fetcher))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

/// Fetch, validate and rewrite one target. Shared by the endpoint and `pagepick fetch`.
pub async fn retrieve(fetcher: &Fetcher, raw_url: &str) -> Result<String, InspectError> {
    let target = TargetRef::parse(raw_url)?;
    let span = info_span!("retrieve", request_id = %Uuid::new_v4(), host = %target.host());

    async move {
        let result = fetcher.fetch(&target).await?;
        info!(
            "Rewriting {} ({} bytes, {} redirects)",
            result.final_url,
            result.body.len(),
            result.redirects
        );
        Ok(rewriter::rewrite(&result.body, &result.final_url))
    }
    .instrument(span)
    .await
}

async fn proxy(State(state): State<AppState>, query: Option<Query<ProxyQuery>>) -> Response {
    let raw = query.and_then(|Query(q)| q.url).unwrap_or_default();
    match retrieve(&state.fetcher, &raw).await {
        Ok(html) => page_response(html),
        Err(err) => err.into_response(),
    }
}

fn page_response(html: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        html,
    )
        .into_response()
}

impl IntoResponse for InspectError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match &self {
            InspectError::SecurityBlocked { host, addr, range } => {
                warn!("Refused {} ({} in {})", host, addr, range)
            }
            _ if status.is_server_error() => error!("Retrieval failed: {}", self),
            _ => info!("Rejected request: {}", self),
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn host_page() -> Html<&'static str> {
    Html(HOST_PAGE)
}

const HOST_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>pagepick</title>
  <style>
    body { margin: 0; font: 14px/1.4 system-ui, sans-serif; display: grid; grid-template-rows: auto 1fr; height: 100vh; }
    header { display: flex; gap: 8px; padding: 8px; border-bottom: 1px solid #e5e7eb; }
    header input { flex: 1; padding: 6px 8px; }
    main { display: grid; grid-template-columns: 1fr 380px; min-height: 0; }
    iframe { width: 100%; height: 100%; border: 0; }
    aside { border-left: 1px solid #e5e7eb; padding: 8px; overflow: auto; }
    pre { white-space: pre-wrap; background: #f9fafb; padding: 8px; border-radius: 4px; }
    #status { color: #6b7280; }
  </style>
</head>
<body>
  <header>
    <form id="load"><input id="url" type="url" placeholder="https://example.com" required></form>
    <button id="toggle" type="button" disabled>Pick element</button>
  </header>
  <main>
    <iframe id="frame" sandbox="allow-scripts" title="target page"></iframe>
    <aside>
      <div id="status">Enter a URL to load it.</div>
      <h4>Selector</h4><pre id="min"></pre>
      <h4>Structure</h4><pre id="pretty"></pre>
      <h4>Path</h4><pre id="path"></pre>
      <h4>CSS</h4><pre id="css"></pre>
    </aside>
  </main>
  <script>
    (function () {
      const frame = document.getElementById('frame');
      const toggle = document.getElementById('toggle');
      const status = document.getElementById('status');
      let picking = false;

      function send() {
        if (frame.contentWindow) {
          frame.contentWindow.postMessage({ type: 'toggle-picker', payload: { picking: picking } }, '*');
        }
        toggle.textContent = picking ? 'Stop picking' : 'Pick element';
      }

      document.getElementById('load').addEventListener('submit', function (ev) {
        ev.preventDefault();
        picking = false;
        toggle.disabled = true;
        status.textContent = 'Loading...';
        frame.src = '/proxy?url=' + encodeURIComponent(document.getElementById('url').value);
      });

      toggle.addEventListener('click', function () {
        picking = !picking;
        send();
      });

      window.addEventListener('message', function (ev) {
        if (ev.source !== frame.contentWindow || !ev.data) { return; }
        const msg = ev.data;
        if (msg.type === 'picker-ready') {
          toggle.disabled = false;
          status.textContent = 'Ready.';
          send();
        } else if (msg.type === 'hover') {
          status.textContent = '<' + msg.payload.tag + '>';
        } else if (msg.type === 'select') {
          document.getElementById('min').textContent = msg.payload.selectorMin;
          document.getElementById('pretty').textContent = msg.payload.selectorPretty;
          document.getElementById('path').textContent = msg.payload.selectorPath;
          document.getElementById('css').textContent = msg.payload.cssBlock;
        }
      });
    })();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::host_validator::HostValidator;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let fetcher = Fetcher::new(HostValidator::default(), FetchConfig::default()).unwrap();
        router(Arc::new(fetcher))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        for uri in ["/proxy", "/proxy?url=", "/proxy?url=%20%20"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(
                body_json(response).await,
                json!({ "error": "Missing url parameter" })
            );
        }
    }

    #[tokio::test]
    async fn test_disallowed_scheme_is_bad_request() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/proxy?url=file%3A%2F%2F%2Fetc%2Fpasswd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("http and https"));
    }

    #[tokio::test]
    async fn test_loopback_literal_is_blocked() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/proxy?url=http%3A%2F%2F127.0.0.1%3A9%2F")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Blocked private/localhost targets" })
        );
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail() {
        let response = InspectError::Network("dns exploded at 10.0.0.1".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Failed to fetch target" })
        );

        let response = InspectError::UnsupportedContent {
            content_type: "image/png".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_host_page_and_health() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains(r#"sandbox="allow-scripts""#));
        assert!(page.contains("'toggle-picker'"));

        let response = app()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
