use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::protocol::{Rect, SelectPayload};

/// Output format for CLI results
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Parse an element box from "WIDTHxHEIGHT" or "X,Y,WIDTHxHEIGHT" (e.g. "10,20,120x40")
pub fn parse_rect(s: &str) -> Result<Rect> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let (x, y, size) = match parts.as_slice() {
        [size] => ("0", "0", *size),
        [x, y, size] => (*x, *y, *size),
        _ => anyhow::bail!("Invalid rect format. Use X,Y,WIDTHxHEIGHT (e.g., 10,20,120x40)"),
    };

    let (width, height) = size
        .split_once('x')
        .ok_or_else(|| anyhow::anyhow!("Invalid rect size. Use WIDTHxHEIGHT"))?;

    let number = |v: &str, what: &str| {
        v.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| anyhow::anyhow!("Invalid {} in rect", what))
    };

    let rect = Rect {
        x: number(x, "x")?,
        y: number(y, "y")?,
        width: number(width, "width")?,
        height: number(height, "height")?,
    };
    if rect.width < 0.0 || rect.height < 0.0 {
        anyhow::bail!("Rect size cannot be negative");
    }
    Ok(rect)
}

/// Result of `pagepick pick`
#[derive(Debug, Serialize)]
pub struct PickReport {
    /// URL the page was finally served from
    pub final_url: String,
    pub redirects: u32,
    /// Elements matching the locating selector
    pub matches: usize,
    /// Tier that produced `selector_min`
    pub tier: crate::inspector::SelectorTier,
    /// The `select` message the runtime would post for this element
    pub select: SelectPayload,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
