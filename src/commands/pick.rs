use anyhow::Result;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::commands::utils;
use pagepick::inspector::{InspectorSession, PointerTarget, SelectorSynthesizer, SelectorTier, StyleSnapshot};
use pagepick::protocol::{Message, Rect, SelectPayload};
use pagepick::types::{OutputFormat, PickReport, parse_rect};
use pagepick::{FetchConfig, SynthesisLimits, TargetRef};

/// What picking one element of a document produced
#[derive(Debug)]
pub struct Picked {
    pub matches: usize,
    pub tier: SelectorTier,
    pub select: SelectPayload,
}

#[allow(clippy::too_many_arguments)]
pub async fn handle_pick(
    url: String,
    css: String,
    style: Option<PathBuf>,
    rect: Option<String>,
    index: Option<usize>,
    limits: SynthesisLimits,
    format: OutputFormat,
    fetch: FetchConfig,
) -> Result<()> {
    info!("Picking {} on {}", css, url);

    let style = match style {
        Some(path) => Some(load_style(&path).await?),
        None => None,
    };
    let rect = rect.as_deref().map(parse_rect).transpose()?.unwrap_or_default();

    let fetcher = utils::build_fetcher(fetch)?;
    let target = TargetRef::parse(&url)?;
    let page = fetcher.fetch(&target).await?;

    let picked = pick_in_document(&page.body, &css, index.unwrap_or(0), style, rect, limits)?;
    if picked.matches > 1 && index.is_none() {
        warn!(
            "{} elements match '{}', using the first (use --index to choose)",
            picked.matches, css
        );
    }

    let report = PickReport {
        final_url: page.final_url.to_string(),
        redirects: page.redirects,
        matches: picked.matches,
        tier: picked.tier,
        select: picked.select,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Simple => print!("{}", render_simple(&report)),
    }
    Ok(())
}

async fn load_style(path: &Path) -> Result<StyleSnapshot> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read style file {}: {}", path.display(), e))?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Invalid style snapshot in {}: {}", path.display(), e))
}

/// Locate `css` in `html` and run a picking click on the chosen match.
///
/// Without an explicit `style`, the snapshot is approximated from the
/// element's inline style attribute.
pub fn pick_in_document(
    html: &str,
    css: &str,
    index: usize,
    style: Option<StyleSnapshot>,
    rect: Rect,
    limits: SynthesisLimits,
) -> Result<Picked> {
    let selector = Selector::parse(css)
        .map_err(|e| anyhow::anyhow!("Invalid CSS selector '{}': {}", css, e))?;
    let document = Html::parse_document(html);

    let matches: Vec<_> = document.select(&selector).collect();
    if matches.is_empty() {
        anyhow::bail!("No elements found matching selector: {}", css);
    }
    let element = *matches.get(index).ok_or_else(|| {
        anyhow::anyhow!(
            "Index {} out of range: only {} element(s) match '{}'",
            index,
            matches.len(),
            css
        )
    })?;

    let mut target = PointerTarget::from_element(element);
    if let Some(style) = style {
        target.style = style;
    }
    target.rect = rect;

    let tier = SelectorSynthesizer::new(&document, limits)
        .synthesize(element, &target.style)
        .tier;

    let mut session = InspectorSession::new(&document, limits);
    session.ready();
    session.handle_host_message(&Message::TogglePicker { picking: true });
    match session.click(Some(&target)) {
        Some(Message::Select(select)) => Ok(Picked {
            matches: matches.len(),
            tier,
            select,
        }),
        _ => anyhow::bail!("Inspector produced no selection for '{}'", css),
    }
}

pub fn render_simple(report: &PickReport) -> String {
    let select = &report.select;
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({:?}, {} match(es) for locator)\n",
        select.selector_min, report.tier, report.matches
    ));
    out.push_str(&format!("  Path: {}\n", select.selector_path));
    if report.redirects > 0 {
        out.push_str(&format!(
            "  Served from: {} after {} redirect(s)\n",
            report.final_url, report.redirects
        ));
    }
    out.push_str("\nStructure:\n");
    out.push_str(&select.selector_pretty);
    out.push_str("\n\nCSS:\n");
    out.push_str(&select.css_block);
    out.push('\n');
    out
}
