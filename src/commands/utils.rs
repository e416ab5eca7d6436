use anyhow::Result;
use tracing::debug;

use pagepick::{FetchConfig, Fetcher, HostValidator};

/// Build the fetcher every network command shares
pub fn build_fetcher(config: FetchConfig) -> Result<Fetcher> {
    debug!(
        "Fetch config: max_redirects={} timeout={:?} user_agent={}",
        config.max_redirects, config.timeout, config.user_agent
    );
    Ok(Fetcher::new(HostValidator::default(), config)?)
}
