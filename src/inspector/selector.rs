//! Selector synthesis: turn one element into a selector that finds it again.
//!
//! Tiers are tried in order and the first hit wins:
//! 1. `#id` when the id is unique in the document
//! 2. a semantic class label for button-like elements (not uniqueness-checked)
//! 3. tag + readable classes, qualified by position and then by up to
//!    `ancestor_depth` ancestors, accepted only when exactly one element matches
//! 4. a descriptive ancestor path, not guaranteed unique

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::classify::{ElementTraits, class_list, semantic_class};
use super::style::StyleSnapshot;
use crate::config::SynthesisLimits;

/// Longest class name still considered human-written
const MAX_SEMANTIC_CLASS_LEN: usize = 24;
/// Readable classes kept per element
const MAX_SEMANTIC_CLASSES: usize = 2;

/// Which tier produced a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorTier {
    Identity,
    Semantic,
    Structural,
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSelector {
    pub selector: String,
    pub tier: SelectorTier,
}

/// Looks machine-generated: `__`/`--`, any digit, two or more capitals, or too long
pub fn is_hashy_class(class: &str) -> bool {
    class.contains("__")
        || class.contains("--")
        || class.chars().any(|c| c.is_ascii_digit())
        || class.chars().filter(|c| c.is_uppercase()).count() >= 2
        || class.chars().count() > MAX_SEMANTIC_CLASS_LEN
}

/// Up to two readable classes, shortest first
pub fn semantic_classes(el: ElementRef<'_>) -> Vec<String> {
    let mut classes: Vec<&str> = class_list(el)
        .into_iter()
        .filter(|c| !is_hashy_class(c))
        .collect();
    // stable, so equal lengths keep document order
    classes.sort_by_key(|c| c.chars().count());
    classes
        .into_iter()
        .take(MAX_SEMANTIC_CLASSES)
        .map(str::to_string)
        .collect()
}

/// Escape an identifier for use in a selector (CSSOM `CSS.escape`)
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());
    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (i == 0 && c.is_ascii_digit())
            || (i == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

fn tag_name(el: ElementRef<'_>) -> String {
    el.value().name().to_ascii_lowercase()
}

fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

fn element_id(el: ElementRef<'_>) -> Option<&str> {
    el.value().id().filter(|id| !id.is_empty())
}

/// `tag.class1.class2` using only readable classes
pub fn base_form(el: ElementRef<'_>) -> String {
    let mut form = tag_name(el);
    for class in semantic_classes(el) {
        form.push('.');
        form.push_str(&css_escape(&class));
    }
    form
}

/// 1-based position among same-tag siblings
pub fn nth_of_type(el: ElementRef<'_>) -> usize {
    let name = el.value().name();
    1 + el
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|s| s.value().name() == name)
        .count()
}

fn has_same_tag_siblings(el: ElementRef<'_>) -> bool {
    let name = el.value().name();
    el.prev_siblings()
        .chain(el.next_siblings())
        .filter_map(ElementRef::wrap)
        .any(|s| s.value().name() == name)
}

/// Evaluates selector candidates against one parsed document
pub struct SelectorSynthesizer<'a> {
    document: &'a Html,
    limits: SynthesisLimits,
}

impl<'a> SelectorSynthesizer<'a> {
    pub fn new(document: &'a Html, limits: SynthesisLimits) -> Self {
        Self { document, limits }
    }

    pub fn document(&self) -> &'a Html {
        self.document
    }

    /// Exactly one element matches. Selectors that fail to parse never do.
    pub fn is_unique(&self, selector: &str) -> bool {
        match Selector::parse(selector) {
            Ok(parsed) => self.document.select(&parsed).take(2).count() == 1,
            Err(_) => false,
        }
    }

    /// Run the tiers in order for `el`
    pub fn synthesize(&self, el: ElementRef<'_>, style: &StyleSnapshot) -> SynthesizedSelector {
        if let Some(selector) = self.identity(el) {
            return SynthesizedSelector {
                selector,
                tier: SelectorTier::Identity,
            };
        }

        let traits = ElementTraits::from_element(el);
        if let Some(class) = semantic_class(&traits, style) {
            return SynthesizedSelector {
                selector: class.to_string(),
                tier: SelectorTier::Semantic,
            };
        }

        if let Some(selector) = self.structural(el) {
            return SynthesizedSelector {
                selector,
                tier: SelectorTier::Structural,
            };
        }

        SynthesizedSelector {
            selector: self.readable_path(el),
            tier: SelectorTier::Path,
        }
    }

    /// `#id` if the id matches only this element
    pub fn identity(&self, el: ElementRef<'_>) -> Option<String> {
        let selector = format!("#{}", css_escape(element_id(el)?));
        self.is_unique(&selector).then_some(selector)
    }

    /// Tag + classes, then positional, then ancestor-qualified
    pub fn structural(&self, el: ElementRef<'_>) -> Option<String> {
        let base = base_form(el);
        if self.is_unique(&base) {
            return Some(base);
        }

        let positional = format!("{}:nth-of-type({})", base, nth_of_type(el));
        if self.is_unique(&positional) {
            return Some(positional);
        }

        let mut ancestor = parent_element(el);
        let mut depth = 0;
        while let Some(current) = ancestor {
            if depth >= self.limits.ancestor_depth {
                break;
            }
            depth += 1;

            let scope = self.identity(current).unwrap_or_else(|| base_form(current));
            for candidate in [
                format!("{} {}", scope, base),
                format!("{} {}", scope, positional),
            ] {
                if self.is_unique(&candidate) {
                    return Some(candidate);
                }
            }
            ancestor = parent_element(current);
        }

        None
    }

    /// Descriptive `a > b > c` path up to the nearest id or `path_depth` hops
    pub fn readable_path(&self, el: ElementRef<'_>) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut node = Some(el);

        while let Some(current) = node {
            if segments.len() >= self.limits.path_depth {
                break;
            }
            let tag = tag_name(current);
            if tag == "html" {
                break;
            }

            let mut segment = tag;
            let id = element_id(current);
            if let Some(id) = id {
                segment.push('#');
                segment.push_str(&css_escape(id));
            }
            for class in semantic_classes(current) {
                segment.push('.');
                segment.push_str(&css_escape(&class));
            }
            if id.is_none() && has_same_tag_siblings(current) {
                segment.push_str(&format!(":nth-of-type({})", nth_of_type(current)));
            }
            segments.push(segment);

            if id.is_some() {
                break;
            }
            node = parent_element(current);
        }

        if segments.is_empty() {
            return tag_name(el);
        }
        segments.reverse();
        segments.join(" > ")
    }
}

/// Split a selector into compound selectors with the combinator preceding each
fn split_compounds(selector: &str) -> Vec<(Option<char>, String)> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut pending: Option<char> = None;
    let mut depth = 0usize;
    let mut chars = selector.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                match chars.peek().copied() {
                    Some(h) if h.is_ascii_hexdigit() => {
                        let mut digits = 0;
                        while let Some(h) = chars.peek().copied() {
                            if !h.is_ascii_hexdigit() || digits == 6 {
                                break;
                            }
                            current.push(h);
                            chars.next();
                            digits += 1;
                        }
                        if chars.peek() == Some(&' ') {
                            current.push(' ');
                            chars.next();
                        }
                    }
                    Some(other) => {
                        current.push(other);
                        chars.next();
                    }
                    None => {}
                }
            }
            '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if depth == 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~')) => {
                if !current.is_empty() {
                    out.push((pending.take(), std::mem::take(&mut current)));
                }
                if !c.is_whitespace() {
                    pending = Some(c);
                } else if pending.is_none() && !out.is_empty() {
                    pending = Some(' ');
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push((pending.take(), current));
    }
    out
}

/// Multi-line rendering: one compound per line, indented by depth
pub fn pretty(selector: &str) -> String {
    split_compounds(selector)
        .into_iter()
        .enumerate()
        .map(|(depth, (combinator, compound))| {
            let indent = "  ".repeat(depth);
            match combinator {
                Some(c) if c != ' ' => format!("{}{} {}", indent, c, compound),
                _ => format!("{}{}", indent, compound),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod selector_test;
