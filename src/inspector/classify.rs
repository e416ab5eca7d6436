//! Button-like and call-to-action heuristics behind semantic selectors.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

use super::style::{StyleSnapshot, leading_number};
use super::color::parse_color;

/// Class fragments that mark an interactive control
const INTERACTIVE_CLASS_WORDS: &[&str] = &["btn", "button", "cta", "primary", "action"];

/// Semantic class proposed for a button that is also a call to action
pub const CTA_BUTTON_CLASS: &str = ".cta-button";
/// Semantic class proposed for any other button-like element
pub const BUTTON_CLASS: &str = ".button";

/// Longest text prefix consulted when looking for action verbs
const CTA_TEXT_WINDOW: usize = 80;

lazy_static! {
    static ref CTA_TEXT: Regex = Regex::new(
        r"(?i)\b(get started|start|try|sign ?up|register|join|buy|order|shop|download|subscribe|book|get|claim|request|contact|learn more|add to cart|checkout|donate)\b"
    )
    .expect("call-to-action pattern is valid");
}

/// The facts about an element the heuristics look at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementTraits {
    pub tag: String,
    pub role: Option<String>,
    pub input_type: Option<String>,
    pub classes: Vec<String>,
    /// Visible text, whitespace-collapsed
    pub text: String,
}

impl ElementTraits {
    pub fn from_element(el: ElementRef<'_>) -> Self {
        let value = el.value();
        let text = el.text().collect::<Vec<_>>().join(" ");
        Self {
            tag: value.name().to_ascii_lowercase(),
            role: value.attr("role").map(|r| r.trim().to_ascii_lowercase()),
            input_type: value.attr("type").map(|t| t.trim().to_ascii_lowercase()),
            classes: class_list(el).into_iter().map(str::to_string).collect(),
            text: collapse_whitespace(&text),
        }
    }
}

/// Class tokens in `classList` order, duplicates dropped after their first occurrence
pub fn class_list<'a>(el: ElementRef<'a>) -> Vec<&'a str> {
    let mut classes: Vec<&'a str> = Vec::new();
    let value: &'a scraper::node::Element = el.value();
    for class in value.attr("class").unwrap_or_default().split_ascii_whitespace() {
        if !classes.contains(&class) {
            classes.push(class);
        }
    }
    classes
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a class token contains an interactive-role word as a `-`/`_` delimited part
pub fn is_interactive_class(class: &str) -> bool {
    class
        .to_ascii_lowercase()
        .split(['-', '_'])
        .any(|part| {
            INTERACTIVE_CLASS_WORDS
                .iter()
                .any(|w| part == *w || part.strip_suffix('s') == Some(*w))
        })
}

fn px(value: &str) -> f64 {
    leading_number(value).unwrap_or(0.0)
}

/// Padding, clickability and decoration together read as a button
pub fn style_suggests_button(style: &StyleSnapshot) -> bool {
    let p = &style.padding;
    let generous_padding =
        px(&p.top) >= 4.0 && px(&p.bottom) >= 4.0 && px(&p.left) >= 8.0 && px(&p.right) >= 8.0;
    if !generous_padding {
        return false;
    }

    let clickable = style.cursor.trim() == "pointer" || style.display.trim() != "inline";
    let has_background = parse_color(&style.background_color)
        .map(|c| !c.is_transparent())
        .unwrap_or(false);
    let decorated = has_background || style.border_radius.any_rounded();

    clickable && decorated
}

pub fn is_button_like(traits: &ElementTraits, style: &StyleSnapshot) -> bool {
    if traits.tag == "button" {
        return true;
    }
    if traits.tag == "input"
        && matches!(traits.input_type.as_deref(), Some("button" | "submit" | "reset"))
    {
        return true;
    }
    if traits.role.as_deref() == Some("button") {
        return true;
    }
    if traits.classes.iter().any(|c| is_interactive_class(c)) {
        return true;
    }
    style_suggests_button(style)
}

pub fn is_call_to_action(traits: &ElementTraits) -> bool {
    let window: String = traits.text.chars().take(CTA_TEXT_WINDOW).collect();
    CTA_TEXT.is_match(&window) || traits.classes.iter().any(|c| is_interactive_class(c))
}

/// Human-friendly class to label the element with, if it reads as a button.
///
/// This is a label, not a DOM binding: no uniqueness check is made.
pub fn semantic_class(traits: &ElementTraits, style: &StyleSnapshot) -> Option<&'static str> {
    if !is_button_like(traits, style) {
        return None;
    }
    if is_call_to_action(traits) {
        Some(CTA_BUTTON_CLASS)
    } else {
        Some(BUTTON_CLASS)
    }
}
