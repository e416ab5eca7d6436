//! # pagepick
#![allow(clippy::uninlined_format_args)]
//!
//! Inspect a remote page safely and pick elements out of it.
//!
//! A target URL is fetched through an SSRF-hardened pipeline, rewritten so it
//! can be framed, and served with an in-page runtime that turns any clicked
//! element into a unique selector plus a minimal CSS rule.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Run the retrieval endpoint and host page on 127.0.0.1:8787
//! pagepick serve
//!
//! # Fetch and rewrite one page
//! pagepick fetch "https://example.com" --output page.html
//!
//! # Synthesize a selector and CSS rule for an element of a static page
//! pagepick pick "https://example.com" "main h1"
//!
//! # Use a computed style captured in a browser
//! pagepick pick "https://example.com" "a.signup" --style computed.json
//!
//! # Show how a host resolves and whether it may be fetched
//! pagepick check-host example.com
//! ```
//!
//! ## Pipeline
//!
//! 1. [`host_validator`] resolves the host and rejects any private or reserved
//!    address (loopback, RFC 1918, link-local, CGNAT, unique-local, ...).
//! 2. [`fetcher`] issues the request without automatic redirects, re-validating
//!    every hop, all under a single deadline.
//! 3. [`rewriter`] removes embedded CSP, pins relative URLs with `<base>`, and
//!    injects [`runtime::INSPECTOR_SCRIPT`].
//! 4. The runtime and the host frame talk over the [`protocol`] messages.
//!
//! [`inspector`] holds the same selector and style algorithms the runtime uses,
//! over a parsed document, so they can be tested and used offline.
//!
//! ## Library Usage
//!
//! ```no_run
//! use pagepick::{FetchConfig, Fetcher, HostValidator, TargetRef, rewriter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let fetcher = Fetcher::new(HostValidator::default(), FetchConfig::default())?;
//! let target = TargetRef::parse("https://example.com")?;
//! let page = fetcher.fetch(&target).await?;
//! let html = rewriter::rewrite(&page.body, &page.final_url);
//! # Ok(())
//! # }
//! ```
//!
//! ## Exit Codes
//!
//! - 0: Success
//! - 1: Generic error
//! - 2: Invalid input URL
//! - 3: Target blocked (private/reserved address)
//! - 4: Target is not HTML
//! - 5: Too many redirects
//! - 6: Timeout
//! - 7: Network error
//! - 8: Malformed redirect
//! - 9: Response body too large

pub mod config;
pub mod errors;
pub mod fetcher;
pub mod host_validator;
pub mod inspector;
pub mod protocol;
pub mod rewriter;
pub mod runtime;
pub mod server;
pub mod types;

pub use config::{FetchConfig, ServerConfig, SynthesisLimits};
pub use errors::InspectError;
pub use fetcher::{FetchResult, Fetcher, TargetRef};
pub use host_validator::{AddressClass, HostValidator, Resolver, ResolvedAddressSet, SystemResolver};
pub use inspector::{InspectorSession, PointerTarget, SelectorSynthesizer};
pub use protocol::Message;
