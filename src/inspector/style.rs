//! Computed-style snapshot and the minimal CSS rule extracted from it.

use serde::{Deserialize, Serialize};

use super::color::{css_color, parse_color};

/// Per-side values (margin, padding)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Clone> Sides<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            top: value.clone(),
            right: value.clone(),
            bottom: value.clone(),
            left: value,
        }
    }

    pub fn as_array(&self) -> [&T; 4] {
        [&self.top, &self.right, &self.bottom, &self.left]
    }

    /// Expand 1-4 CSS shorthand values in top/right/bottom/left order
    pub fn from_shorthand(values: &[T]) -> Option<Self> {
        let (t, r, b, l) = match values {
            [a] => (a, a, a, a),
            [a, b] => (a, b, a, b),
            [a, b, c] => (a, b, c, b),
            [a, b, c, d] => (a, b, c, d),
            _ => return None,
        };
        Some(Self {
            top: t.clone(),
            right: r.clone(),
            bottom: b.clone(),
            left: l.clone(),
        })
    }
}

/// Width, style and color of one border edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderSide {
    pub width: String,
    pub style: String,
    pub color: String,
}

impl Default for BorderSide {
    fn default() -> Self {
        Self {
            width: "0px".to_string(),
            style: "none".to_string(),
            color: "rgb(0, 0, 0)".to_string(),
        }
    }
}

impl BorderSide {
    pub fn is_visible(&self) -> bool {
        !matches!(self.style.trim(), "" | "none" | "hidden") && !is_zero(&self.width)
    }

    fn render(&self) -> String {
        let color = css_color(&self.color).unwrap_or_else(|| "transparent".to_string());
        format!("{} {} {}", self.width.trim(), self.style.trim(), color)
    }
}

/// Four corner radii in top-left, top-right, bottom-right, bottom-left order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corners {
    pub top_left: String,
    pub top_right: String,
    pub bottom_right: String,
    pub bottom_left: String,
}

impl Default for Corners {
    fn default() -> Self {
        Self {
            top_left: "0px".to_string(),
            top_right: "0px".to_string(),
            bottom_right: "0px".to_string(),
            bottom_left: "0px".to_string(),
        }
    }
}

impl Corners {
    pub fn as_array(&self) -> [&str; 4] {
        [
            &self.top_left,
            &self.top_right,
            &self.bottom_right,
            &self.bottom_left,
        ]
    }

    pub fn any_rounded(&self) -> bool {
        self.as_array().iter().any(|v| !is_zero(v))
    }
}

/// The computed-style properties the inspector consults.
///
/// Field names serialize in camelCase so a snapshot captured in the page by
/// the runtime deserializes directly. Defaults are CSS initial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSnapshot {
    pub display: String,
    pub position: String,
    pub overflow: String,
    pub cursor: String,
    pub transition: String,
    pub box_shadow: String,
    pub opacity: String,
    pub color: String,
    pub background_color: String,
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub text_align: String,
    pub text_transform: String,
    pub text_decoration_line: String,
    pub margin: Sides<String>,
    pub padding: Sides<String>,
    pub border: Sides<BorderSide>,
    pub border_radius: Corners,
    pub flex_direction: String,
    pub justify_content: String,
    pub align_items: String,
    pub gap: String,
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        Self {
            display: "inline".to_string(),
            position: "static".to_string(),
            overflow: "visible".to_string(),
            cursor: "auto".to_string(),
            transition: "all 0s ease 0s".to_string(),
            box_shadow: "none".to_string(),
            opacity: "1".to_string(),
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            font_family: String::new(),
            font_size: "16px".to_string(),
            font_weight: "400".to_string(),
            line_height: "normal".to_string(),
            letter_spacing: "normal".to_string(),
            text_align: "start".to_string(),
            text_transform: "none".to_string(),
            text_decoration_line: "none".to_string(),
            margin: Sides::uniform("0px".to_string()),
            padding: Sides::uniform("0px".to_string()),
            border: Sides::uniform(BorderSide::default()),
            border_radius: Corners::default(),
            flex_direction: "row".to_string(),
            justify_content: "normal".to_string(),
            align_items: "normal".to_string(),
            gap: "normal".to_string(),
        }
    }
}

/// Display value a tag gets from the user-agent stylesheet
fn default_display(tag: &str) -> &'static str {
    match tag {
        "html" | "body" | "div" | "p" | "section" | "article" | "aside" | "header" | "footer"
        | "nav" | "main" | "form" | "fieldset" | "figure" | "ul" | "ol" | "dl" | "dd" | "dt"
        | "blockquote" | "pre" | "hr" | "address" | "details" | "h1" | "h2" | "h3" | "h4"
        | "h5" | "h6" => "block",
        "li" => "list-item",
        "button" | "input" | "select" | "textarea" | "img" => "inline-block",
        "table" => "table",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        _ => "inline",
    }
}

impl StyleSnapshot {
    /// Approximate a computed style from a static document: the tag's default
    /// display plus whatever the inline `style` attribute declares.
    pub fn from_inline(tag: &str, style_attr: Option<&str>) -> Self {
        let mut snap = StyleSnapshot {
            display: default_display(tag).to_string(),
            ..Default::default()
        };
        if let Some(style) = style_attr {
            for (prop, value) in parse_declarations(style) {
                snap.apply(&prop, &value);
            }
        }
        snap
    }

    /// Apply one declaration, expanding the common shorthands
    pub fn apply(&mut self, prop: &str, value: &str) {
        let value = value.trim().to_string();
        match prop {
            "display" => self.display = value,
            "position" => self.position = value,
            "overflow" => self.overflow = value,
            "cursor" => self.cursor = value,
            "transition" => self.transition = value,
            "box-shadow" => self.box_shadow = value,
            "opacity" => self.opacity = value,
            "color" => self.color = value,
            "background-color" => self.background_color = value,
            "background" => {
                if let Some(token) = split_tokens(&value)
                    .into_iter()
                    .find(|t| parse_color(t).is_some())
                {
                    self.background_color = token;
                }
            }
            "font-family" => self.font_family = value,
            "font-size" => self.font_size = value,
            "font-weight" => self.font_weight = value,
            "line-height" => self.line_height = value,
            "letter-spacing" => self.letter_spacing = value,
            "text-align" => self.text_align = value,
            "text-transform" => self.text_transform = value,
            "text-decoration" | "text-decoration-line" => {
                self.text_decoration_line = split_tokens(&value)
                    .into_iter()
                    .find(|t| matches!(t.as_str(), "none" | "underline" | "overline" | "line-through"))
                    .unwrap_or(value)
            }
            "flex-direction" => self.flex_direction = value,
            "justify-content" => self.justify_content = value,
            "align-items" => self.align_items = value,
            "gap" => self.gap = value,
            "margin" => {
                if let Some(sides) = Sides::from_shorthand(&split_tokens(&value)) {
                    self.margin = sides;
                }
            }
            "padding" => {
                if let Some(sides) = Sides::from_shorthand(&split_tokens(&value)) {
                    self.padding = sides;
                }
            }
            "border" => {
                let side = parse_border(&value);
                self.border = Sides::uniform(side);
            }
            "border-radius" => {
                let first = value.split('/').next().unwrap_or_default();
                if let Some(s) = Sides::from_shorthand(&split_tokens(first)) {
                    self.border_radius = Corners {
                        top_left: s.top,
                        top_right: s.right,
                        bottom_right: s.bottom,
                        bottom_left: s.left,
                    };
                }
            }
            "border-width" | "border-style" | "border-color" => {
                if let Some(s) = Sides::from_shorthand(&split_tokens(&value)) {
                    let field = &prop["border-".len()..];
                    for (side, v) in [
                        (&mut self.border.top, s.top),
                        (&mut self.border.right, s.right),
                        (&mut self.border.bottom, s.bottom),
                        (&mut self.border.left, s.left),
                    ] {
                        set_border_field(side, field, v);
                    }
                }
            }
            "border-top-left-radius" => self.border_radius.top_left = value,
            "border-top-right-radius" => self.border_radius.top_right = value,
            "border-bottom-right-radius" => self.border_radius.bottom_right = value,
            "border-bottom-left-radius" => self.border_radius.bottom_left = value,
            _ => self.apply_side_longhand(prop, value),
        }
    }

    /// `margin-top`, `border-left`, `border-right-color` and friends
    fn apply_side_longhand(&mut self, prop: &str, value: String) {
        let mut parts = prop.split('-');
        let (Some(group), Some(side)) = (parts.next(), parts.next()) else {
            return;
        };
        let field = parts.next();
        if parts.next().is_some() {
            return;
        }

        match (group, field) {
            ("margin", None) => {
                if let Some(slot) = side_slot(&mut self.margin, side) {
                    *slot = value;
                }
            }
            ("padding", None) => {
                if let Some(slot) = side_slot(&mut self.padding, side) {
                    *slot = value;
                }
            }
            ("border", None) => {
                if let Some(slot) = side_slot(&mut self.border, side) {
                    *slot = parse_border(&value);
                }
            }
            ("border", Some(field)) => {
                if let Some(slot) = side_slot(&mut self.border, side) {
                    set_border_field(slot, field, value);
                }
            }
            _ => {}
        }
    }
}

fn side_slot<'a, T>(sides: &'a mut Sides<T>, side: &str) -> Option<&'a mut T> {
    match side {
        "top" => Some(&mut sides.top),
        "right" => Some(&mut sides.right),
        "bottom" => Some(&mut sides.bottom),
        "left" => Some(&mut sides.left),
        _ => None,
    }
}

fn set_border_field(side: &mut BorderSide, field: &str, value: String) {
    match field {
        "width" => side.width = value,
        "style" => side.style = value,
        "color" => side.color = value,
        _ => {}
    }
}

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

/// `border: 1px solid #ccc` in any order
fn parse_border(value: &str) -> BorderSide {
    let mut side = BorderSide {
        width: "medium".to_string(),
        ..Default::default()
    };
    for token in split_tokens(value) {
        let lower = token.to_ascii_lowercase();
        if BORDER_STYLES.contains(&lower.as_str()) {
            side.style = lower;
        } else if matches!(lower.as_str(), "thin" | "medium" | "thick")
            || lower.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        {
            side.width = token;
        } else {
            side.color = token;
        }
    }
    if side.width == "medium" {
        side.width = "3px".to_string();
    }
    side
}

/// Split a declaration value on whitespace, keeping parenthesized groups whole
pub fn split_tokens(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse `prop: value; ...` from a style attribute, lowercasing property names
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            Some((prop, value.to_string()))
        })
        .collect()
}

/// True for `0`, `0px`, `0em`, `0%` and friends
pub fn is_zero(value: &str) -> bool {
    let v = value.trim();
    let numeric: String = v
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();
    if numeric.is_empty() {
        return false;
    }
    numeric.parse::<f64>().map(|n| n == 0.0).unwrap_or(false)
}

/// Leading numeric value in pixels-or-whatever units, if any
pub fn leading_number(value: &str) -> Option<f64> {
    let numeric: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .collect();
    numeric.parse().ok()
}

fn normalize_length(value: &str) -> String {
    if is_zero(value) {
        "0".to_string()
    } else {
        value.trim().to_string()
    }
}

/// Fold four side values into the shortest equivalent shorthand.
///
/// Returns `None` when every side is zero.
pub fn collapse_sides(values: [&str; 4]) -> Option<String> {
    if values.iter().all(|v| is_zero(v)) {
        return None;
    }
    let [t, r, b, l] = values.map(normalize_length);
    Some(if t == r && r == b && b == l {
        t
    } else if t == b && r == l {
        format!("{} {}", t, r)
    } else if r == l {
        format!("{} {} {}", t, r, b)
    } else {
        format!("{} {} {} {}", t, r, b, l)
    })
}

/// One-value radius when all corners match, else the 4-value form
pub fn collapse_radius(corners: &Corners) -> Option<String> {
    let values = corners.as_array();
    if values.iter().all(|v| is_zero(v)) {
        return None;
    }
    let [tl, tr, br, bl] = values.map(normalize_length);
    Some(if tl == tr && tr == br && br == bl {
        tl
    } else {
        format!("{} {} {} {}", tl, tr, br, bl)
    })
}

/// Single `border` when all four edges match, else one longhand per visible edge
pub fn collapse_borders(border: &Sides<BorderSide>) -> Vec<Declaration> {
    let sides = border.as_array();
    let first = sides[0];
    if first.is_visible() && sides.iter().all(|s| *s == first) {
        return vec![Declaration::new("border", first.render())];
    }

    ["top", "right", "bottom", "left"]
        .iter()
        .zip(sides)
        .filter(|(_, side)| side.is_visible())
        .map(|(name, side)| Declaration::new(format!("border-{}", name), side.render()))
        .collect()
}

fn is_flex(display: &str) -> bool {
    matches!(display.trim(), "flex" | "inline-flex")
}

/// A transition only matters if some duration or delay is non-zero
fn has_transition(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() || v == "none" {
        return false;
    }
    v.split([',', ' '])
        .filter_map(|token| {
            token
                .strip_suffix("ms")
                .or_else(|| token.strip_suffix('s'))
                .and_then(|n| n.parse::<f64>().ok())
        })
        .any(|n| n > 0.0)
}

/// One `property: value` pair of the generated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Build the declaration list, skipping everything at its implied default
pub fn extract(style: &StyleSnapshot) -> Vec<Declaration> {
    let mut out = Vec::new();
    let mut push = |prop: &str, value: &str| out.push(Declaration::new(prop, value.trim()));

    let display = style.display.trim();
    if !display.is_empty() && display != "inline" {
        push("display", display);
    }
    if !matches!(style.position.trim(), "" | "static") {
        push("position", &style.position);
    }

    if is_flex(display) {
        if !matches!(style.flex_direction.trim(), "" | "row") {
            push("flex-direction", &style.flex_direction);
        }
        if !matches!(style.justify_content.trim(), "" | "normal" | "flex-start" | "start") {
            push("justify-content", &style.justify_content);
        }
        if !matches!(style.align_items.trim(), "" | "normal" | "stretch") {
            push("align-items", &style.align_items);
        }
        if !matches!(style.gap.trim(), "" | "normal") && !is_zero(&style.gap) {
            push("gap", &style.gap);
        }
    }

    let margin = style.margin.as_array().map(String::as_str);
    if let Some(value) = collapse_sides(margin) {
        push("margin", &value);
    }
    let padding = style.padding.as_array().map(String::as_str);
    if let Some(value) = collapse_sides(padding) {
        push("padding", &value);
    }

    for decl in collapse_borders(&style.border) {
        push(&decl.property, &decl.value);
    }
    if let Some(radius) = collapse_radius(&style.border_radius) {
        push("border-radius", &radius);
    }

    if let Some(bg) = css_color(&style.background_color) {
        push("background-color", &bg);
    }
    if let Some(color) = css_color(&style.color) {
        push("color", &color);
    }

    if !style.font_family.trim().is_empty() {
        push("font-family", &style.font_family);
    }
    if !style.font_size.trim().is_empty() {
        push("font-size", &style.font_size);
    }
    if !matches!(style.font_weight.trim(), "" | "400" | "normal") {
        push("font-weight", &style.font_weight);
    }
    if !matches!(style.line_height.trim(), "" | "normal") {
        push("line-height", &style.line_height);
    }
    if !matches!(style.letter_spacing.trim(), "" | "normal") && !is_zero(&style.letter_spacing) {
        push("letter-spacing", &style.letter_spacing);
    }
    if !matches!(style.text_align.trim(), "" | "start") {
        push("text-align", &style.text_align);
    }
    if !matches!(style.text_transform.trim(), "" | "none") {
        push("text-transform", &style.text_transform);
    }
    if !matches!(style.text_decoration_line.trim(), "" | "none") {
        push("text-decoration", &style.text_decoration_line);
    }

    if !matches!(style.box_shadow.trim(), "" | "none") {
        push("box-shadow", &style.box_shadow);
    }
    if !matches!(style.cursor.trim(), "" | "auto" | "default") {
        push("cursor", &style.cursor);
    }
    if has_transition(&style.transition) {
        push("transition", &style.transition);
    }
    if leading_number(&style.opacity).is_some_and(|o| o < 1.0) {
        push("opacity", &style.opacity);
    }
    if !matches!(style.overflow.trim(), "" | "visible") {
        push("overflow", &style.overflow);
    }

    out
}

/// Render `selector { prop: value; ... }` one declaration per line
pub fn render_rule(selector: &str, declarations: &[Declaration]) -> String {
    let mut rule = format!("{} {{\n", selector);
    for decl in declarations {
        rule.push_str(&format!("  {}: {};\n", decl.property, decl.value));
    }
    rule.push('}');
    rule
}

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;
