//! Text painting: built-in bitmap font plus optional registered TTFs.
//!
//! Two paths, chosen by the node's `font` name:
//!
//! - **Built-in**: the Spleen 12×24 bitmap font, nearest-neighbour scaled
//!   to the requested pixel height. Fully deterministic on every platform,
//!   which keeps golden renders byte-identical.
//! - **TTF**: any font registered on the [`FontStore`], laid out and
//!   rasterized with `ab_glyph` (caret advance, ascent baseline,
//!   anti-aliased coverage).
//!
//! Unknown font names fall back to the built-in font rather than failing:
//! a card with a misspelled font name still prints legibly.

use std::collections::HashMap;

use ab_glyph::{Font, FontArc, ScaleFont};
use spleen_font::{FONT_12X24, PSF2Font};

use crate::error::EngineError;
use crate::template::{TextAlign, TextNode};

use super::surface::{ClipRegion, Rect, Surface};

const GLYPH_WIDTH: usize = 12;
const GLYPH_HEIGHT: usize = 24;

/// Registered TTF fonts, looked up by the name text nodes reference.
#[derive(Default)]
pub struct FontStore {
    fonts: HashMap<String, FontArc>,
}

impl FontStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TTF/OTF font under a name.
    pub fn register(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), EngineError> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| EngineError::Font(format!("invalid font data: {e}")))?;
        self.fonts.insert(name.into(), font);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FontArc> {
        self.fonts.get(name)
    }
}

/// A rendered line of text as an anti-aliased coverage buffer.
/// 0.0 = untouched, 1.0 = full glyph coverage.
struct TextRaster {
    width: usize,
    height: usize,
    coverage: Vec<f32>,
}

/// Paint a text node's resolved content into `frame` on the surface.
///
/// Lines split on `\n`; the line block is vertically centered in the
/// frame and each line is aligned horizontally per the node's `align`.
pub fn paint_text(
    surface: &mut Surface,
    frame: Rect,
    node: &TextNode,
    px_height: f32,
    opacity: f32,
    clip: Option<&ClipRegion>,
    fonts: &FontStore,
) {
    let px_height = px_height.max(1.0);
    let lines: Vec<&str> = node.content.split('\n').collect();
    let line_height = px_height.ceil();
    let total_height = line_height * lines.len() as f32;
    let mut y = frame.y + (frame.height - total_height) / 2.0;

    let ttf = node.font.as_deref().and_then(|name| fonts.get(name));

    for line in lines {
        if !line.is_empty() {
            let raster = match ttf {
                Some(font) => render_ttf_line(line, font, px_height, node.bold),
                None => render_builtin_line(line, px_height, node.bold),
            };
            let x = match node.align {
                TextAlign::Left => frame.x,
                TextAlign::Center => frame.x + (frame.width - raster.width as f32) / 2.0,
                TextAlign::Right => frame.x + frame.width - raster.width as f32,
            };
            blend_raster(surface, &raster, x, y, node.color.0, opacity, clip);
        }
        y += line_height;
    }
}

fn blend_raster(
    surface: &mut Surface,
    raster: &TextRaster,
    x: f32,
    y: f32,
    color: [u8; 4],
    opacity: f32,
    clip: Option<&ClipRegion>,
) {
    let ox = x.round() as i64;
    let oy = y.round() as i64;
    for ry in 0..raster.height {
        for rx in 0..raster.width {
            let coverage = raster.coverage[ry * raster.width + rx];
            if coverage <= 0.0 {
                continue;
            }
            let dx = ox + rx as i64;
            let dy = oy + ry as i64;
            if let Some(clip) = clip {
                if !clip.admits(dx as f32 + 0.5, dy as f32 + 0.5) {
                    continue;
                }
            }
            surface.blend_pixel(dx, dy, color, coverage * opacity);
        }
    }
}

// ============================================================================
// BUILT-IN BITMAP FONT
// ============================================================================

/// Extract a Spleen 12×24 glyph as a flat 0/1 bitmap.
fn builtin_glyph(ch: char) -> Vec<u8> {
    let mut glyph = vec![0u8; GLYPH_WIDTH * GLYPH_HEIGHT];
    let mut spleen = match PSF2Font::new(FONT_12X24) {
        Ok(font) => font,
        Err(_) => return glyph,
    };
    let utf8 = ch.to_string();
    if let Some(rows) = spleen.glyph_for_utf8(utf8.as_bytes()) {
        for (y, row) in rows.enumerate().take(GLYPH_HEIGHT) {
            for (x, on) in row.enumerate().take(GLYPH_WIDTH) {
                if on {
                    glyph[y * GLYPH_WIDTH + x] = 1;
                }
            }
        }
    }
    glyph
}

/// Render one line with the built-in font, nearest-neighbour scaled so a
/// glyph cell is exactly `px_height` tall.
fn render_builtin_line(line: &str, px_height: f32, bold: bool) -> TextRaster {
    let scale = px_height / GLYPH_HEIGHT as f32;
    let cell_width = (GLYPH_WIDTH as f32 * scale).round().max(1.0) as usize;
    let cell_height = px_height.ceil().max(1.0) as usize;

    let chars: Vec<char> = line.chars().collect();
    let width = (chars.len() * cell_width).max(1);
    let height = cell_height;
    let mut coverage = vec![0.0f32; width * height];

    let mut glyph_cache: HashMap<char, Vec<u8>> = HashMap::new();
    // Double-strike offset emulates bold at any scale.
    let strikes = if bold {
        vec![0usize, (scale.round() as usize).max(1)]
    } else {
        vec![0usize]
    };

    for (i, ch) in chars.iter().enumerate() {
        let glyph = glyph_cache
            .entry(*ch)
            .or_insert_with(|| builtin_glyph(*ch));
        let x0 = i * cell_width;
        for y in 0..cell_height {
            let gy = ((y as f32 / scale) as usize).min(GLYPH_HEIGHT - 1);
            for x in 0..cell_width {
                let gx = ((x as f32 / scale) as usize).min(GLYPH_WIDTH - 1);
                if glyph[gy * GLYPH_WIDTH + gx] == 0 {
                    continue;
                }
                for dx in &strikes {
                    let out_x = x0 + x + dx;
                    if out_x < width {
                        coverage[y * width + out_x] = 1.0;
                    }
                }
            }
        }
    }

    TextRaster { width, height, coverage }
}

// ============================================================================
// TTF FONTS
// ============================================================================

/// Render one line with a registered TTF via ab_glyph.
fn render_ttf_line(line: &str, font: &FontArc, px_height: f32, bold: bool) -> TextRaster {
    let scaled = font.as_scaled(px_height);

    // Layout: advance a caret per glyph.
    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    for ch in line.chars() {
        let glyph_id = font.glyph_id(ch);
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
    }

    let width = (caret_x.ceil() as usize).max(1);
    let ascent = scaled.ascent();
    let height = ((ascent - scaled.descent()).ceil() as usize).max(1);
    let mut coverage = vec![0.0f32; width * height];

    let strikes: &[f32] = if bold { &[0.0, 1.0] } else { &[0.0] };
    for &(glyph_id, glyph_x) in &glyphs {
        for offset in strikes {
            let glyph = glyph_id
                .with_scale_and_position(px_height, ab_glyph::point(glyph_x + offset, ascent));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, c| {
                    let x = px as i32 + bounds.min.x as i32;
                    let y = py as i32 + bounds.min.y as i32;
                    if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                        let idx = y as usize * width + x as usize;
                        coverage[idx] = (coverage[idx] + c).min(1.0);
                    }
                });
            }
        }
    }

    TextRaster { width, height, coverage }
}
