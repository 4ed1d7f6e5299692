//! # Template Model
//!
//! A single type hierarchy that is both the Rust API and the JSON API.
//! `Template` is constructible in Rust and deserializable from JSON.
//!
//! A template is an ordered scene graph: nodes paint in vector order, so a
//! later node paints over an earlier one. Geometry is expressed in the
//! template's own pixel space (`width` × `height`); the renderer scales it
//! uniformly to whatever output resolution the caller asks for.
//!
//! ```ignore
//! use cardpress::template::*;
//!
//! // Rust construction
//! let template = Template {
//!     width: 640,
//!     height: 400,
//!     nodes: vec![
//!         Node::Text(TextNode::new("{{name}}", 20.0, 20.0, 300.0, 40.0)),
//!     ],
//! };
//!
//! // JSON deserialization
//! let template: Template = serde_json::from_str(
//!     r#"{"width":640,"height":400,"nodes":[{"type":"text","content":"hi","x":0,"y":0,"width":100,"height":20}]}"#,
//! ).unwrap();
//! ```

pub mod resolve;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

use crate::error::EngineError;

// ============================================================================
// GEOMETRY & STYLE PRIMITIVES
// ============================================================================

/// Placement and binding attributes shared by every node type.
///
/// Flattened into each node's JSON object, so a text node reads as
/// `{"type":"text","x":10,"y":10,"width":200,"height":30,"content":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Node opacity in [0, 1]. Applied on top of any per-pixel alpha.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Optional clip applied to the node's bounds.
    #[serde(default)]
    pub clip: Option<ClipShape>,
    /// Explicit field binding: when the record has this field, the node's
    /// displayed content is replaced wholesale with the field's value.
    #[serde(default)]
    pub field: Option<String>,
}

fn default_opacity() -> f32 {
    1.0
}

impl Frame {
    /// Frame at a position with a size, full opacity, no clip, no binding.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            opacity: 1.0,
            clip: None,
            field: None,
        }
    }
}

/// Clip region shape, always sized to the node's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipShape {
    Rect,
    /// Largest circle inscribed in the node's bounds, centered on it.
    Circle,
}

/// An RGBA color. Serializes as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let expand = |c: u8| (c << 4) | c;
        let nibble = |c: u8| -> Result<u8, EngineError> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| EngineError::InvalidInput(format!("bad hex color: {s:?}")))
        };
        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => Ok(Color([
                expand(nibble(bytes[0])?),
                expand(nibble(bytes[1])?),
                expand(nibble(bytes[2])?),
                255,
            ])),
            6 | 8 => {
                let mut out = [0u8, 0, 0, 255];
                for (i, pair) in bytes.chunks(2).enumerate() {
                    out[i] = (nibble(pair[0])? << 4) | nibble(pair[1])?;
                }
                Ok(Color(out))
            }
            _ => Err(EngineError::InvalidInput(format!("bad hex color: {s:?}"))),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [r, g, b, a] = self.0;
        if a == 255 {
            serializer.serialize_str(&format!("#{r:02x}{g:02x}{b:02x}"))
        } else {
            serializer.serialize_str(&format!("#{r:02x}{g:02x}{b:02x}{a:02x}"))
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Horizontal text alignment within the node's bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

// ============================================================================
// NODE TYPES
// ============================================================================

/// Literal or bound text. Content may contain `{{field}}` markers that the
/// resolver substitutes from the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    #[serde(flatten)]
    pub frame: Frame,
    pub content: String,
    /// Glyph height in template pixels.
    #[serde(default = "default_text_size")]
    pub size_px: f32,
    #[serde(default = "default_text_color")]
    pub color: Color,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub align: TextAlign,
    /// Registered TTF font name. `None` or an unknown name uses the
    /// built-in bitmap font.
    #[serde(default)]
    pub font: Option<String>,
}

fn default_text_size() -> f32 {
    16.0
}

fn default_text_color() -> Color {
    Color::BLACK
}

impl TextNode {
    pub fn new(content: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            frame: Frame::new(x, y, width, height),
            content: content.into(),
            size_px: default_text_size(),
            color: Color::BLACK,
            bold: false,
            align: TextAlign::Left,
            font: None,
        }
    }
}

/// Filled geometric shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeNode {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default)]
    pub shape: ShapeKind,
    #[serde(default = "default_fill")]
    pub fill: Color,
    /// Corner rounding for rectangles, in template pixels.
    #[serde(default)]
    pub corner_radius: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rect,
    /// Largest ellipse inscribed in the bounds.
    Ellipse,
}

fn default_fill() -> Color {
    Color([220, 220, 220, 255])
}

/// Static image baked into the template (logo, background art).
/// `src` is a URL or file path, resolvable by the render context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
    #[serde(flatten)]
    pub frame: Frame,
    pub src: String,
}

/// Slot for the record's photo. Carries no content of its own: the
/// renderer fills it from `record.photo_url`, or paints a neutral
/// placeholder box when no photo is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoNode {
    #[serde(flatten)]
    pub frame: Frame,
}

/// A template node. Closed set; the resolver and renderer match
/// exhaustively so adding a variant is a compile-guided change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Text(TextNode),
    Shape(ShapeNode),
    ImagePlaceholder(ImageNode),
    PhotoPlaceholder(PhotoNode),
}

impl Node {
    /// Placement attributes common to all node types.
    pub fn frame(&self) -> &Frame {
        match self {
            Node::Text(n) => &n.frame,
            Node::Shape(n) => &n.frame,
            Node::ImagePlaceholder(n) => &n.frame,
            Node::PhotoPlaceholder(n) => &n.frame,
        }
    }
}

// ============================================================================
// TEMPLATE
// ============================================================================

/// A reusable card design: declared pixel dimensions plus an ordered scene
/// graph. Node order is paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Template {
    /// Parse a template from JSON, rejecting degenerate dimensions.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let template: Template = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidInput(format!("template JSON: {e}")))?;
        if template.width == 0 || template.height == 0 {
            return Err(EngineError::InvalidInput(format!(
                "template dimensions must be positive, got {}x{}",
                template.width, template.height
            )));
        }
        Ok(template)
    }

    /// True when the card design is wider than tall.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Per-subject data: a flat map of field name to JSON scalar.
///
/// Lookups for absent fields resolve to "no value", never an error. The
/// `photo_url` field is distinguished: it names the image resource the
/// renderer fills photo placeholders from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field from anything serde_json can represent as a value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Fetch a field stringified, or `None` for absent / null / non-scalar
    /// values.
    pub fn get(&self, field: &str) -> Option<String> {
        stringify_scalar(self.fields.get(field)?)
    }

    /// The distinguished photo reference, when present and non-empty.
    pub fn photo_url(&self) -> Option<String> {
        self.get("photo_url").filter(|url| !url.is_empty())
    }
}

/// Stringify a JSON scalar the way it should appear on a card.
/// Arrays, objects and null have no card representation.
fn stringify_scalar(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
