//! Messages exchanged between the in-page runtime and the host frame.
//!
//! Every message is a `{type, payload}` envelope. `picker-ready` carries no
//! payload.

use serde::{Deserialize, Serialize};

/// Bounding box in CSS pixels, relative to the viewport
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// What the runtime reports about the element under the pointer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPayload {
    #[serde(flatten)]
    pub element: ElementDescriptor,
    /// Shortest selector found by the ranked tiers
    pub selector_min: String,
    /// `selector_min` split one compound per line
    pub selector_pretty: String,
    /// Descriptive ancestor path, not necessarily unique
    pub selector_path: String,
    /// One CSS rule reproducing the element's style
    pub css_block: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Message {
    /// runtime -> host, once per document
    PickerReady,
    /// host -> runtime, the only way to change picking state
    TogglePicker { picking: bool },
    /// runtime -> host, per pointer move while picking
    Hover { tag: String },
    /// runtime -> host, per click while picking
    Select(SelectPayload),
}

impl Message {
    /// Envelope `type` string
    pub fn kind(&self) -> &'static str {
        match self {
            Message::PickerReady => "picker-ready",
            Message::TogglePicker { .. } => "toggle-picker",
            Message::Hover { .. } => "hover",
            Message::Select(_) => "select",
        }
    }
}
