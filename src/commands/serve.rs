use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::commands::utils;
use pagepick::{FetchConfig, ServerConfig, server};

pub async fn handle_serve(bind: String, fetch: FetchConfig) -> Result<()> {
    let config = ServerConfig {
        bind: ServerConfig::parse_bind(&bind)?,
        fetch,
    };
    info!(
        "Starting retrieval endpoint (max {} redirects, {}s timeout)",
        config.fetch.max_redirects,
        config.fetch.timeout.as_secs_f64()
    );

    let fetcher = utils::build_fetcher(config.fetch)?;
    server::serve(config.bind, Arc::new(fetcher)).await
}
