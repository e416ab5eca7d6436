//! CSS color normalization for extracted rules.

/// An sRGB color with straight alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const NAMED: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("navy", (0, 0, 128)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("silver", (192, 192, 192)),
    ("teal", (0, 128, 128)),
    ("maroon", (128, 0, 0)),
];

/// Parse the color forms a computed style or inline declaration produces
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim().to_ascii_lowercase();

    if value == "transparent" {
        return Some(Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0.0,
        });
    }

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(inner) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_args(inner);
    }

    NAMED
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, (r, g, b))| Rgba {
            r: *r,
            g: *g,
            b: *b,
            a: 1.0,
        })
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    let byte = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    let a = if expanded.len() == 8 {
        f64::from(byte(6)?) / 255.0
    } else {
        1.0
    };
    Some(Rgba {
        r: byte(0)?,
        g: byte(2)?,
        b: byte(4)?,
        a,
    })
}

/// Handles `r, g, b[, a]` and `r g b[ / a]`
fn parse_rgb_args(inner: &str) -> Option<Rgba> {
    let (channels, alpha) = match inner.split_once('/') {
        Some((c, a)) => (c, Some(a.trim())),
        None => (inner, None),
    };
    let parts: Vec<&str> = channels
        .split([',', ' '])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let (rgb, alpha) = match (parts.len(), alpha) {
        (3, a) => (&parts[..3], a),
        (4, None) => (&parts[..3], Some(parts[3])),
        _ => return None,
    };

    let channel = |s: &str| -> Option<u8> {
        let v = match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? * 255.0 / 100.0,
            None => s.parse::<f64>().ok()?,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };

    let a = match alpha {
        Some(a) => match a.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? / 100.0,
            None => a.parse::<f64>().ok()?,
        },
        None => 1.0,
    };

    Some(Rgba {
        r: channel(rgb[0])?,
        g: channel(rgb[1])?,
        b: channel(rgb[2])?,
        a: a.clamp(0.0, 1.0),
    })
}

/// Normalize a color for output.
///
/// Opaque colors become hex, translucent ones keep an explicit alpha, fully
/// transparent ones yield `None`. Forms we cannot parse pass through.
pub fn css_color(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_color(trimmed) {
        Some(c) if c.is_transparent() => None,
        Some(c) if c.is_opaque() => Some(c.to_hex()),
        Some(c) => Some(format!(
            "rgba({}, {}, {}, {})",
            c.r,
            c.g,
            c.b,
            (c.a * 1000.0).round() / 1000.0
        )),
        None => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_computed_forms_to_hex() {
        assert_eq!(css_color("rgb(255, 255, 255)").as_deref(), Some("#ffffff"));
        assert_eq!(css_color("rgb(37, 99, 235)").as_deref(), Some("#2563eb"));
        assert_eq!(css_color("rgba(0, 0, 0, 1)").as_deref(), Some("#000000"));
        assert_eq!(css_color("rgb(10 20 30)").as_deref(), Some("#0a141e"));
        assert_eq!(css_color("#ABC").as_deref(), Some("#aabbcc"));
        assert_eq!(css_color("red").as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_percentage_channels_scale_to_255() {
        assert_eq!(css_color("rgb(100%, 50%, 0%)").as_deref(), Some("#ff8000"));
        assert_eq!(css_color("rgb(20% 40% 60%)").as_deref(), Some("#336699"));
        assert_eq!(
            css_color("rgba(100%, 0%, 0%, 0.5)").as_deref(),
            Some("rgba(255, 0, 0, 0.5)")
        );
    }

    #[test]
    fn test_translucent_keeps_alpha() {
        assert_eq!(
            css_color("rgba(0, 0, 0, 0.5)").as_deref(),
            Some("rgba(0, 0, 0, 0.5)")
        );
        assert_eq!(
            css_color("rgb(255 0 0 / 25%)").as_deref(),
            Some("rgba(255, 0, 0, 0.25)")
        );
        assert_eq!(
            css_color("#00000080").as_deref(),
            Some("rgba(0, 0, 0, 0.502)")
        );
    }

    #[test]
    fn test_transparent_is_omitted() {
        assert_eq!(css_color("rgba(0, 0, 0, 0)"), None);
        assert_eq!(css_color("transparent"), None);
        assert_eq!(css_color("#0000"), None);
        assert_eq!(css_color("  "), None);
    }

    #[test]
    fn test_unknown_forms_pass_through() {
        assert_eq!(
            css_color("color(display-p3 1 0 0)").as_deref(),
            Some("color(display-p3 1 0 0)")
        );
        assert_eq!(css_color("currentcolor").as_deref(), Some("currentcolor"));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("rgb(1, 2)"), None);
    }
}
