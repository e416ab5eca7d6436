//! Redirect-aware fetcher.
//!
//! Follows redirects by hand so every hop's host goes through the
//! [`HostValidator`] before any connection is made to it. The whole pipeline
//! runs under one deadline and the body is read up to a fixed cap.

use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::errors::InspectError;
use crate::host_validator::HostValidator;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.1";

/// A parsed, scheme-checked target URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    url: Url,
}

impl TargetRef {
    /// Parse a caller-supplied URL; only http and https with a host are accepted
    pub fn parse(raw: &str) -> Result<Self, InspectError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InspectError::invalid("Missing url parameter"));
        }

        let url = Url::parse(raw).map_err(|e| InspectError::invalid(format!("Invalid URL: {}", e)))?;
        Self::from_url(url)
    }

    pub fn from_url(url: Url) -> Result<Self, InspectError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(InspectError::invalid(format!(
                "Only http and https URLs are allowed (got {})",
                url.scheme()
            )));
        }
        if url.host().is_none() {
            return Err(InspectError::invalid("URL has no host"));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Body and provenance of a fetched page
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub body: String,
    pub final_url: Url,
    pub content_type: String,
    /// Redirect hops followed to reach `final_url`
    pub redirects: u32,
}

/// Fetches one target, validating every hop
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    validator: HostValidator,
    config: FetchConfig,
}

impl Fetcher {
    /// Build a fetcher with its own HTTP client.
    ///
    /// The client resolves through the validator's
    /// [`ConnectGuard`](crate::host_validator::ConnectGuard), so the
    /// address actually connected to is classified as well.
    pub fn new(validator: HostValidator, config: FetchConfig) -> Result<Self, InspectError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .dns_resolver(Arc::new(validator.connect_guard()))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::with_client(client, validator, config))
    }

    /// Use a caller-built client. It must be built with `Policy::none()`,
    /// otherwise redirects would bypass hop validation, and should resolve
    /// through [`HostValidator::connect_guard`].
    pub fn with_client(client: reqwest::Client, validator: HostValidator, config: FetchConfig) -> Self {
        Self {
            client,
            validator,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn validator(&self) -> &HostValidator {
        &self.validator
    }

    /// Fetch `target`, following at most `max_redirects` redirects.
    ///
    /// Dropping the inner future on timeout aborts whatever request is in flight.
    pub async fn fetch(&self, target: &TargetRef) -> Result<FetchResult, InspectError> {
        let deadline = self.config.timeout;
        match tokio::time::timeout(deadline, self.fetch_hops(target)).await {
            Ok(result) => result,
            Err(_) => Err(InspectError::Timeout(deadline)),
        }
    }

    async fn fetch_hops(&self, target: &TargetRef) -> Result<FetchResult, InspectError> {
        let max = self.config.max_redirects;
        let mut current = target.url().clone();
        let mut hops: u32 = 0;

        self.validator.validate(&current).await?;

        loop {
            debug!("GET {} (hop {})", current, hops);
            let response = self
                .client
                .get(current.clone())
                .header(ACCEPT, ACCEPT_HTML)
                .header(USER_AGENT, self.config.user_agent.as_str())
                .send()
                .await
                .map_err(connect_error)?;
            let status = response.status();

            if status.is_redirection() {
                hops += 1;
                if hops > max {
                    return Err(InspectError::RedirectLoop { max });
                }

                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        InspectError::Protocol(format!("{} response without Location header", status.as_u16()))
                    })?;

                let next = current.join(location).map_err(|e| {
                    InspectError::Protocol(format!("Unresolvable Location '{}': {}", location, e))
                })?;
                let next = TargetRef::from_url(next)?;

                debug!("Redirect {} -> {}", current, next.url());
                self.validator.validate(next.url()).await?;
                current = next.url;
                continue;
            }

            if !status.is_success() {
                return Err(InspectError::Network(format!(
                    "Upstream responded with status {}",
                    status.as_u16()
                )));
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if !content_type.to_ascii_lowercase().contains("text/html") {
                return Err(InspectError::UnsupportedContent { content_type });
            }

            let body = read_body_limited(response, self.config.max_body_bytes).await?;
            info!(
                "Fetched {} ({} bytes, {} redirect(s))",
                current,
                body.len(),
                hops
            );

            return Ok(FetchResult {
                body,
                final_url: current,
                content_type,
                redirects: hops,
            });
        }
    }
}

/// A connect-time block stays `SecurityBlocked` instead of becoming `Network`
fn connect_error(err: reqwest::Error) -> InspectError {
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        if let Some(InspectError::SecurityBlocked { host, addr, range }) =
            cause.downcast_ref::<InspectError>()
        {
            return InspectError::SecurityBlocked {
                host: host.clone(),
                addr: *addr,
                range: *range,
            };
        }
        source = cause.source();
    }
    err.into()
}

/// Read at most `limit` bytes of body. A declared length over the limit
/// fails before anything is read.
async fn read_body_limited(mut response: reqwest::Response, limit: usize) -> Result<String, InspectError> {
    if let Some(declared) = response.content_length()
        && declared > limit as u64
    {
        warn!("Declared body of {} bytes exceeds limit {}", declared, limit);
        return Err(InspectError::BodyTooLarge { limit });
    }

    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            warn!("Body exceeded limit {} while streaming", limit);
            return Err(InspectError::BodyTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod fetcher_test;
