//! Make a fetched page frameable and inspectable.
//!
//! Pure string transformation: drop embedded CSP, pin relative URLs to the
//! original site with a `<base>`, then inject the inspector runtime as late
//! in the document as possible.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::runtime;

lazy_static! {
    static ref CSP_META: Regex = Regex::new(
        r#"(?is)<meta\b[^>]*?\bhttp-equiv\s*=\s*["']?\s*(?:x-)?(?:content-security-policy|webkit-csp)[^>]*>"#
    )
    .expect("CSP meta pattern is valid");
    static ref HEAD_OPEN: Regex =
        Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("head pattern is valid");
    static ref HTML_OPEN: Regex =
        Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("html pattern is valid");
    static ref BASE_TAG: Regex = Regex::new(r"(?i)<base[\s/>]").expect("base pattern is valid");
    static ref BODY_OPEN: Regex = Regex::new(r"(?i)<body[\s>]").expect("body open pattern is valid");
    static ref INERT_MARKUP: Regex = Regex::new(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>")
        .expect("inert markup pattern is valid");
    static ref BODY_CLOSE: Regex = Regex::new(r"(?i)</body\s*>").expect("body pattern is valid");
    static ref HEAD_CLOSE: Regex = Regex::new(r"(?i)</head\s*>").expect("head pattern is valid");
}

/// Run all rewriting steps in order
pub fn rewrite(html: &str, final_url: &Url) -> String {
    let out = strip_csp_meta(html);
    let out = insert_base(&out, &base_href(final_url));
    inject_runtime(&out)
}

/// Remove every `<meta http-equiv="content-security-policy">`
pub fn strip_csp_meta(html: &str) -> String {
    CSP_META.replace_all(html, "").into_owned()
}

/// Origin plus the directory part of the path, always ending in `/`
pub fn base_href(url: &Url) -> String {
    let path = url.path();
    let dir = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    format!("{}{}", url.origin().ascii_serialization(), dir)
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Whether the head already declares a `<base>`.
///
/// Only markup before the first `</head>` (else the first `<body>`) counts,
/// and comments and scripts inside it are ignored.
pub fn declares_base(html: &str) -> bool {
    let end = HEAD_CLOSE
        .find(html)
        .or_else(|| BODY_OPEN.find(html))
        .map_or(html.len(), |m| m.start());
    let head = INERT_MARKUP.replace_all(&html[..end], "");
    BASE_TAG.is_match(&head)
}

/// Add `<base href>` to the head unless the page already declares one
pub fn insert_base(html: &str, href: &str) -> String {
    if declares_base(html) {
        return html.to_string();
    }
    let tag = format!(r#"<base href="{}">"#, escape_attr(href));

    if let Some(m) = HEAD_OPEN.find(html) {
        return splice(html, m.end(), &tag);
    }
    if let Some(m) = HTML_OPEN.find(html) {
        return splice(html, m.end(), &format!("<head>{}</head>", tag));
    }
    format!("{}{}", tag, html)
}

/// Runtime goes before the last `</body>`, else the last `</head>`, else at the end
pub fn inject_runtime(html: &str) -> String {
    let block = runtime::script_block();
    let anchor = BODY_CLOSE
        .find_iter(html)
        .last()
        .or_else(|| HEAD_CLOSE.find_iter(html).last());

    match anchor {
        Some(m) => splice(html, m.start(), &block),
        None => format!("{}{}", html, block),
    }
}

fn splice(html: &str, at: usize, insert: &str) -> String {
    let mut out = String::with_capacity(html.len() + insert.len());
    out.push_str(&html[..at]);
    out.push_str(insert);
    out.push_str(&html[at..]);
    out
}

#[cfg(test)]
#[path = "rewriter_test.rs"]
mod rewriter_test;
