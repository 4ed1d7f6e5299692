//! # Card Renderer
//!
//! Rasterizes a resolved template against one record into an RGBA bitmap.
//!
//! ```text
//! resolved Template + Record → render_card → RenderedCard (PNG-encodable)
//!                                  ↓
//!                       paint each node in z-order:
//!                       - shapes: filled rect / ellipse
//!                       - text: bitmap or TTF glyphs
//!                       - images & photo: fetched, cover-fit, clipped
//! ```
//!
//! Every call allocates a fresh [`Surface`] scoped to the call; the one
//! suspension point is image fetch/decode. A photo that fails to load is
//! logged and skipped — it never aborts the card.

pub mod fetch;
pub mod surface;
pub mod text;

pub use fetch::{RenderContext, fetch_image};
pub use surface::{ClipRegion, Rect, Surface};
pub use text::FontStore;

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;

use crate::error::EngineError;
use crate::template::{ClipShape, Color, Frame, Node, Record, ShapeKind, Template};

/// An immutable rendered card bitmap.
///
/// Owned linearly: produced here, handed to the orientation corrector,
/// consumed by the sheet composer — never aliased between cards.
#[derive(Debug)]
pub struct RenderedCard {
    image: RgbaImage,
}

impl RenderedCard {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_landscape(&self) -> bool {
        self.image.width() > self.image.height()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Encode the card as PNG bytes.
    pub fn png_bytes(&self) -> Result<Vec<u8>, EngineError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| EngineError::Image(format!("PNG encode: {e}")))?;
        Ok(bytes)
    }
}

/// A rendered card plus the non-fatal problems hit along the way.
#[derive(Debug)]
pub struct RenderOutput {
    pub card: RenderedCard,
    pub warnings: Vec<String>,
}

/// Render a resolved template at the requested pixel size.
///
/// Geometry is computed in the template's declared pixel space and scaled
/// per-axis to the output size. DPI and physical units are the layout
/// planner's concern, not this function's.
pub async fn render_card(
    template: &Template,
    record: &Record,
    width: u32,
    height: u32,
    ctx: &RenderContext,
) -> Result<RenderOutput, EngineError> {
    if template.nodes.is_empty() {
        return Err(EngineError::EmptyOrMissingDesign);
    }
    if width == 0 || height == 0 {
        return Err(EngineError::InvalidInput(format!(
            "render size must be positive, got {width}x{height}"
        )));
    }

    let scale_x = width as f32 / template.width as f32;
    let scale_y = height as f32 / template.height as f32;
    let mut surface = Surface::new(width, height);
    let mut warnings = Vec::new();

    // Only the first photo placeholder binds the record's photo.
    let mut photo_slot_taken = false;

    for node in &template.nodes {
        let frame = node.frame();
        let rect = Rect::new(
            frame.x * scale_x,
            frame.y * scale_y,
            frame.width * scale_x,
            frame.height * scale_y,
        );
        let clip = frame.clip.map(|shape| ClipRegion { shape, rect });

        match node {
            Node::Shape(shape) => match shape.shape {
                ShapeKind::Rect => surface.fill_rect(
                    rect,
                    shape.fill,
                    frame.opacity,
                    shape.corner_radius * scale_x.min(scale_y),
                    clip.as_ref(),
                ),
                ShapeKind::Ellipse => {
                    surface.fill_ellipse(rect, shape.fill, frame.opacity, clip.as_ref())
                }
            },
            Node::Text(text_node) => text::paint_text(
                &mut surface,
                rect,
                text_node,
                text_node.size_px * scale_y,
                frame.opacity,
                clip.as_ref(),
                &ctx.fonts,
            ),
            Node::ImagePlaceholder(image_node) => {
                if image_node.src.is_empty() {
                    continue;
                }
                match fetch_image(&image_node.src, ctx).await {
                    Ok(asset) => paint_cover_image(&mut surface, &asset, rect, frame, &mut warnings),
                    Err(e) => {
                        log::warn!("image asset skipped: {e}");
                        warnings.push(e.to_string());
                    }
                }
            }
            Node::PhotoPlaceholder(_) => {
                let binds_photo = !photo_slot_taken;
                photo_slot_taken = true;
                match record.photo_url().filter(|_| binds_photo) {
                    Some(url) => match fetch_image(&url, ctx).await {
                        Ok(photo) => {
                            paint_cover_image(&mut surface, &photo, rect, frame, &mut warnings)
                        }
                        // Failed photo: log, leave the slot unpainted,
                        // keep rendering the card.
                        Err(e) => {
                            log::warn!("photo skipped: {e}");
                            warnings.push(e.to_string());
                        }
                    },
                    // No photo bound: the placeholder stays visible.
                    None => paint_photo_placeholder(&mut surface, rect, frame),
                }
            }
        }
    }

    Ok(RenderOutput {
        card: RenderedCard {
            image: surface.into_image(),
        },
        warnings,
    })
}

/// Paint an image cover-fit into `rect`: scaled by
/// `max(rect.w/img.w, rect.h/img.h)`, centered, overflow clipped to the
/// node's clip shape (or the rect itself). Covers the bounds exactly,
/// never letterboxes, never distorts.
fn paint_cover_image(
    surface: &mut Surface,
    source: &DynamicImage,
    rect: Rect,
    frame: &Frame,
    warnings: &mut Vec<String>,
) {
    let (iw, ih) = (source.width() as f32, source.height() as f32);
    if iw <= 0.0 || ih <= 0.0 || rect.width < 1.0 || rect.height < 1.0 {
        warnings.push(format!(
            "degenerate image placement skipped ({iw}x{ih} into {}x{})",
            rect.width, rect.height
        ));
        return;
    }
    let scale = (rect.width / iw).max(rect.height / ih);
    let scaled_w = ((iw * scale).round() as u32).max(1);
    let scaled_h = ((ih * scale).round() as u32).max(1);
    let scaled = source
        .resize_exact(scaled_w, scaled_h, FilterType::Lanczos3)
        .to_rgba8();

    let x = rect.x + (rect.width - scaled_w as f32) / 2.0;
    let y = rect.y + (rect.height - scaled_h as f32) / 2.0;
    // Overflow from cover fit is always clipped to the bounds; a circle
    // clip tightens that further.
    let clip = ClipRegion {
        shape: frame.clip.unwrap_or(ClipShape::Rect),
        rect,
    };
    surface.blit(&scaled, x, y, frame.opacity, Some(&clip));
}

/// Neutral glyph for an unfilled photo slot: grey box with a head-and-
/// shoulders silhouette, so proofs show where the photo would go.
fn paint_photo_placeholder(surface: &mut Surface, rect: Rect, frame: &Frame) {
    let clip = ClipRegion {
        shape: frame.clip.unwrap_or(ClipShape::Rect),
        rect,
    };
    surface.fill_rect(rect, Color([224, 224, 224, 255]), frame.opacity, 0.0, Some(&clip));

    let silhouette = Color([160, 160, 160, 255]);
    let head = Rect::new(
        rect.x + rect.width * 0.35,
        rect.y + rect.height * 0.18,
        rect.width * 0.30,
        rect.height * 0.28,
    );
    let shoulders = Rect::new(
        rect.x + rect.width * 0.15,
        rect.y + rect.height * 0.55,
        rect.width * 0.70,
        rect.height * 0.50,
    );
    surface.fill_ellipse(head, silhouette, frame.opacity, Some(&clip));
    surface.fill_ellipse(shoulders, silhouette, frame.opacity, Some(&clip));
}
