use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;

/// Default number of redirect hops followed before giving up
pub const DEFAULT_MAX_REDIRECTS: u32 = 4;

/// Default overall deadline for one retrieval
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cap on a fetched response body
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Default listen address for `pagepick serve`
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Settings for the redirect-aware fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum redirect hops; one more fails with a redirect-loop error
    pub max_redirects: u32,
    /// Deadline covering resolution, every hop and the body read
    pub timeout: Duration,
    /// Largest response body read before giving up
    pub max_body_bytes: usize,
    /// Identifying User-Agent sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Build a config from CLI values, rejecting a zero timeout or body cap
    pub fn new(
        max_redirects: u32,
        timeout_secs: f64,
        max_body_bytes: usize,
        user_agent: Option<String>,
    ) -> Result<Self> {
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            anyhow::bail!("Timeout must be a positive number of seconds");
        }
        if max_body_bytes == 0 {
            anyhow::bail!("Body limit must be at least one byte");
        }

        Ok(Self {
            max_redirects,
            timeout: Duration::from_secs_f64(timeout_secs),
            max_body_bytes,
            user_agent: user_agent.unwrap_or_else(default_user_agent),
        })
    }
}

pub fn default_user_agent() -> String {
    format!(
        "pagepick/{} (+element-inspector)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Bounds for the selector synthesizer's ancestor walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisLimits {
    /// Ancestor levels tried when qualifying a structural selector
    pub ancestor_depth: usize,
    /// Hops in the descriptive fallback path
    pub path_depth: usize,
}

impl Default for SynthesisLimits {
    fn default() -> Self {
        Self {
            ancestor_depth: 4,
            path_depth: 10,
        }
    }
}

/// Settings for the retrieval endpoint
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub fetch: FetchConfig,
}

impl ServerConfig {
    pub fn parse_bind(bind: &str) -> Result<SocketAddr> {
        bind.parse::<SocketAddr>()
            .map_err(|_| anyhow::anyhow!("Invalid bind address '{}'. Use HOST:PORT", bind))
    }
}
