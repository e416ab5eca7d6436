use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::commands::utils;
use pagepick::{FetchConfig, server};

pub async fn handle_fetch(url: String, output: Option<PathBuf>, fetch: FetchConfig) -> Result<()> {
    info!("Fetching {}", url);
    let fetcher = utils::build_fetcher(fetch)?;
    let html = server::retrieve(&fetcher, &url).await?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &html).await?;
            eprintln!("Wrote {} bytes to {}", html.len(), path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}
