#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use pagepick::config::{DEFAULT_BIND, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_REDIRECTS};
use pagepick::errors::exit_code_for;
use pagepick::types::OutputFormat;
use pagepick::{FetchConfig, SynthesisLimits};

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "pagepick")]
#[command(about = "Inspect remote pages safely and pick elements out of them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Redirect hops followed before giving up
    #[arg(long, global = true, env = "PAGEPICK_MAX_REDIRECTS", default_value_t = DEFAULT_MAX_REDIRECTS)]
    max_redirects: u32,

    /// Overall deadline for one retrieval, in seconds
    #[arg(long, global = true, env = "PAGEPICK_TIMEOUT_SECS", default_value_t = 10.0)]
    timeout: f64,

    /// Largest response body accepted, in bytes
    #[arg(long, global = true, env = "PAGEPICK_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    /// User-Agent sent to target sites
    #[arg(long, global = true, env = "PAGEPICK_USER_AGENT")]
    user_agent: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the retrieval endpoint and the picker host page
    Serve {
        /// Address to listen on (HOST:PORT)
        #[arg(short, long, env = "PAGEPICK_BIND", default_value = DEFAULT_BIND)]
        bind: String,
    },

    /// Fetch a page through the safe pipeline and print the rewritten HTML
    Fetch {
        /// URL to fetch
        url: String,

        /// Write the HTML to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Synthesize a selector and CSS rule for an element of a page
    Pick {
        /// URL to fetch
        url: String,

        /// CSS selector locating the element to pick
        selector: String,

        /// JSON computed-style snapshot to use instead of the inline style attribute
        #[arg(long)]
        style: Option<PathBuf>,

        /// Element box reported in the payload (X,Y,WIDTHxHEIGHT)
        #[arg(long)]
        rect: Option<String>,

        /// Pick the match at this index (0-based)
        #[arg(long)]
        index: Option<usize>,

        /// Ancestor levels tried when qualifying a selector
        #[arg(long, default_value_t = 4)]
        ancestor_depth: usize,

        /// Maximum hops in the descriptive path
        #[arg(long, default_value_t = 10)]
        path_depth: usize,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Resolve a host and show whether it may be fetched
    CheckHost {
        /// Hostname or IP literal
        host: String,

        /// Port used for resolution
        #[arg(long, default_value_t = 443)]
        port: u16,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    // Handle exit codes based on error type
    match run().await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let exit_code = exit_code_for(&err);

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": err.to_string(),
                "exit_code": exit_code
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {}", err);
            std::process::exit(exit_code);
        }
    }
}

async fn run() -> Result<()> {
    // Initialize tracing to stderr (so JSON/HTML output to stdout remains clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagepick=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    let fetch = FetchConfig::new(
        cli.max_redirects,
        cli.timeout,
        cli.max_body_bytes,
        cli.user_agent,
    );

    match cli.command {
        Commands::Serve { bind } => commands::serve::handle_serve(bind, fetch?).await,
        Commands::Fetch { url, output } => commands::fetch::handle_fetch(url, output, fetch?).await,
        Commands::Pick {
            url,
            selector,
            style,
            rect,
            index,
            ancestor_depth,
            path_depth,
            format,
        } => {
            let limits = SynthesisLimits {
                ancestor_depth,
                path_depth,
            };
            commands::pick::handle_pick(url, selector, style, rect, index, limits, format, fetch?)
                .await
        }
        Commands::CheckHost { host, port, format } => {
            commands::check_host::handle_check_host(host, port, format).await
        }
        Commands::Version => commands::version::handle_version().await,
    }
}
