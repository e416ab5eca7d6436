//! Native model of the in-page inspector.
//!
//! The same ranked selector tiers and style extraction that the shipped
//! runtime performs in the browser, run over a parsed document and an
//! explicit [`StyleSnapshot`] instead of a live rendering engine.

pub mod classify;
pub mod color;
pub mod selector;
pub mod style;

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::debug;

pub use classify::{ElementTraits, class_list, is_button_like, is_call_to_action, semantic_class};
pub use color::{Rgba, css_color, parse_color};
pub use selector::{SelectorSynthesizer, SelectorTier, SynthesizedSelector, pretty};
pub use style::{Declaration, StyleSnapshot, extract, render_rule};

use crate::config::SynthesisLimits;
use crate::protocol::{ElementDescriptor, Message, Rect, SelectPayload};

/// Everything produced for one picked element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub selector_min: String,
    pub selector_pretty: String,
    pub selector_path: String,
    pub css_block: String,
    pub tier: SelectorTier,
}

/// Synthesize selectors for `el` and render its style under the chosen one
pub fn inspect_element(
    synthesizer: &SelectorSynthesizer<'_>,
    el: ElementRef<'_>,
    style: &StyleSnapshot,
) -> Selection {
    let chosen = synthesizer.synthesize(el, style);
    let css_block = render_rule(&chosen.selector, &extract(style));
    Selection {
        selector_pretty: pretty(&chosen.selector),
        selector_path: synthesizer.readable_path(el),
        css_block,
        tier: chosen.tier,
        selector_min: chosen.selector,
    }
}

/// Tag, id, classes and box of an element
pub fn describe(el: ElementRef<'_>, rect: Rect) -> ElementDescriptor {
    let value = el.value();
    ElementDescriptor {
        tag: value.name().to_ascii_lowercase(),
        id: value.id().filter(|id| !id.is_empty()).map(str::to_string),
        classes: class_list(el).into_iter().map(str::to_string).collect(),
        rect,
    }
}

/// The element a pointer event landed on, with its computed style and box
#[derive(Debug, Clone)]
pub struct PointerTarget<'a> {
    pub element: ElementRef<'a>,
    pub style: StyleSnapshot,
    pub rect: Rect,
}

impl<'a> PointerTarget<'a> {
    /// Style approximated from the element's inline `style` attribute
    pub fn from_element(element: ElementRef<'a>) -> Self {
        let value = element.value();
        Self {
            element,
            style: StyleSnapshot::from_inline(value.name(), value.attr("style")),
            rect: Rect::default(),
        }
    }
}

/// One inspector session per document.
///
/// `picking` changes only through a host `toggle-picker` message. Pointer
/// events without a target, or arriving while not picking, are dropped.
pub struct InspectorSession<'a> {
    synthesizer: SelectorSynthesizer<'a>,
    picking: bool,
    announced: bool,
    overlay: Option<Rect>,
}

impl<'a> InspectorSession<'a> {
    pub fn new(document: &'a Html, limits: SynthesisLimits) -> Self {
        Self {
            synthesizer: SelectorSynthesizer::new(document, limits),
            picking: false,
            announced: false,
            overlay: None,
        }
    }

    /// `picker-ready`, the first time only
    pub fn ready(&mut self) -> Option<Message> {
        if self.announced {
            return None;
        }
        self.announced = true;
        Some(Message::PickerReady)
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    /// Box the hover overlay currently covers
    pub fn overlay(&self) -> Option<Rect> {
        self.overlay
    }

    /// Apply a message from the host frame. Anything but `toggle-picker` is ignored.
    pub fn handle_host_message(&mut self, message: &Message) {
        if let Message::TogglePicker { picking } = message {
            debug!("Picker {}", if *picking { "enabled" } else { "disabled" });
            self.picking = *picking;
            if !self.picking {
                self.overlay = None;
            }
        }
    }

    pub fn pointer_move(&mut self, target: Option<&PointerTarget<'_>>) -> Option<Message> {
        if !self.picking {
            return None;
        }
        let target = target?;
        self.overlay = Some(target.rect);
        Some(Message::Hover {
            tag: target.element.value().name().to_ascii_lowercase(),
        })
    }

    /// Synthesize and report the clicked element. Picking stays on afterwards.
    pub fn click(&mut self, target: Option<&PointerTarget<'_>>) -> Option<Message> {
        if !self.picking {
            return None;
        }
        let target = target?;
        let selection = inspect_element(&self.synthesizer, target.element, &target.style);
        debug!(
            "Selected {} via {:?} tier",
            selection.selector_min, selection.tier
        );
        Some(Message::Select(SelectPayload {
            element: describe(target.element, target.rect),
            selector_min: selection.selector_min,
            selector_pretty: selection.selector_pretty,
            selector_path: selection.selector_path,
            css_block: selection.css_block,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::Selector;

    fn page() -> Html {
        Html::parse_document(
            r#"<html><body>
                <div id="hero" style="margin: 10px">
                  <button class="btn primary" style="padding: 8px 16px">Sign Up</button>
                </div>
                <p>one</p><p>two</p>
              </body></html>"#,
        )
    }

    fn target<'a>(html: &'a Html, css: &str) -> PointerTarget<'a> {
        let sel = Selector::parse(css).unwrap();
        PointerTarget::from_element(html.select(&sel).next().unwrap())
    }

    #[test]
    fn test_ready_is_sent_once() {
        let html = page();
        let mut session = InspectorSession::new(&html, SynthesisLimits::default());
        assert_eq!(session.ready(), Some(Message::PickerReady));
        assert_eq!(session.ready(), None);
    }

    #[test]
    fn test_events_ignored_until_toggled() {
        let html = page();
        let mut session = InspectorSession::new(&html, SynthesisLimits::default());
        let button = target(&html, "button");

        assert!(!session.is_picking());
        assert_eq!(session.pointer_move(Some(&button)), None);
        assert_eq!(session.click(Some(&button)), None);

        // messages other than toggle-picker never change state
        session.handle_host_message(&Message::Hover { tag: "x".into() });
        session.handle_host_message(&Message::PickerReady);
        assert!(!session.is_picking());

        session.handle_host_message(&Message::TogglePicker { picking: true });
        assert!(session.is_picking());
        assert_eq!(
            session.pointer_move(Some(&button)),
            Some(Message::Hover {
                tag: "button".into()
            })
        );
    }

    #[test]
    fn test_missing_target_is_dropped() {
        let html = page();
        let mut session = InspectorSession::new(&html, SynthesisLimits::default());
        session.handle_host_message(&Message::TogglePicker { picking: true });
        assert_eq!(session.pointer_move(None), None);
        assert_eq!(session.click(None), None);
        assert!(session.is_picking());
    }

    #[test]
    fn test_click_selects_and_keeps_picking() {
        let html = page();
        let mut session = InspectorSession::new(&html, SynthesisLimits::default());
        session.handle_host_message(&Message::TogglePicker { picking: true });

        let Some(Message::Select(payload)) = session.click(Some(&target(&html, "button"))) else {
            panic!("expected a select message");
        };
        assert_eq!(payload.element.tag, "button");
        assert_eq!(payload.element.classes, vec!["btn", "primary"]);
        assert_eq!(payload.selector_min, ".cta-button");
        assert_eq!(payload.selector_path, "div#hero > button.btn.primary");
        assert_eq!(
            payload.css_block,
            ".cta-button {\n  display: inline-block;\n  padding: 8px 16px;\n  color: #000000;\n  font-size: 16px;\n}"
        );
        assert!(session.is_picking());

        let Some(Message::Select(payload)) = session.click(Some(&target(&html, "#hero"))) else {
            panic!("expected a select message");
        };
        assert_eq!(payload.selector_min, "#hero");
        assert!(payload.css_block.contains("  margin: 10px;\n"));
    }

    #[test]
    fn test_toggle_off_clears_overlay() {
        let html = page();
        let mut session = InspectorSession::new(&html, SynthesisLimits::default());
        session.handle_host_message(&Message::TogglePicker { picking: true });
        let mut p = target(&html, "p");
        p.rect = Rect {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        };
        session.pointer_move(Some(&p));
        assert_eq!(session.overlay(), Some(p.rect));

        session.handle_host_message(&Message::TogglePicker { picking: false });
        assert_eq!(session.overlay(), None);
        assert_eq!(session.pointer_move(Some(&p)), None);
    }

    #[test]
    fn test_inspect_element_structural() {
        let html = page();
        let synth = SelectorSynthesizer::new(&html, SynthesisLimits::default());
        let sel = Selector::parse("p").unwrap();
        let second = html.select(&sel).nth(1).unwrap();
        let selection = inspect_element(&synth, second, &StyleSnapshot::from_inline("p", None));
        assert_eq!(selection.tier, SelectorTier::Structural);
        assert_eq!(selection.selector_min, "p:nth-of-type(2)");
        assert_eq!(selection.selector_path, "body > p:nth-of-type(2)");
        assert!(selection.css_block.starts_with("p:nth-of-type(2) {\n  display: block;\n"));
    }
}
