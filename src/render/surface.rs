//! Owned raster surface for card rendering.
//!
//! Every render call allocates a fresh `Surface` and drops it when the
//! card is flattened — surfaces are never shared or reused across cards,
//! so no state can bleed between unrelated subjects' output.
//!
//! Drawing uses bounds-checked pixel loops with source-over alpha
//! blending; shape membership is tested at pixel centers.

use image::{Rgba, RgbaImage};

use crate::template::{ClipShape, Color};

/// Axis-aligned rectangle in output pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A clip region: a shape stretched over a rectangle in output space.
#[derive(Debug, Clone, Copy)]
pub struct ClipRegion {
    pub shape: ClipShape,
    pub rect: Rect,
}

impl ClipRegion {
    /// Whether the clip admits the pixel at (px, py).
    pub fn admits(&self, px: f32, py: f32) -> bool {
        match self.shape {
            ClipShape::Rect => self.rect.contains(px, py),
            ClipShape::Circle => {
                let (cx, cy) = self.rect.center();
                let radius = self.rect.width.min(self.rect.height) / 2.0;
                let (dx, dy) = (px - cx, py - cy);
                dx * dx + dy * dy <= radius * radius
            }
        }
    }
}

/// A fresh, exclusively owned RGBA raster. White until painted.
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([255, 255, 255, 255])),
        }
    }

    /// Wrap an existing canvas so overlay drawing can reuse the same
    /// blending ops. The caller keeps exclusive ownership throughout.
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Flatten the surface into its backing image.
    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Source-over blend of `color` at strength `alpha` onto one pixel.
    pub(crate) fn blend_pixel(&mut self, x: i64, y: i64, color: [u8; 4], alpha: f32) {
        if x < 0 || y < 0 || x >= self.pixels.width() as i64 || y >= self.pixels.height() as i64 {
            return;
        }
        let a = (alpha * color[3] as f32 / 255.0).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        for channel in 0..3 {
            let blended = color[channel] as f32 * a + dst[channel] as f32 * (1.0 - a);
            dst[channel] = blended.round() as u8;
        }
        let out_a = a * 255.0 + dst[3] as f32 * (1.0 - a);
        dst[3] = out_a.round() as u8;
    }

    /// Fill a rectangle, optionally corner-rounded, honoring a clip.
    pub fn fill_rect(
        &mut self,
        rect: Rect,
        color: Color,
        opacity: f32,
        corner_radius: f32,
        clip: Option<&ClipRegion>,
    ) {
        let radius = corner_radius
            .max(0.0)
            .min(rect.width / 2.0)
            .min(rect.height / 2.0);
        self.fill_shape(rect, color, opacity, clip, |px, py| {
            if radius <= 0.0 {
                return true;
            }
            // Rounded corners: inside the corner squares, membership is
            // distance to the corner arc center.
            let cx = px.clamp(rect.x + radius, rect.x + rect.width - radius);
            let cy = py.clamp(rect.y + radius, rect.y + rect.height - radius);
            let (dx, dy) = (px - cx, py - cy);
            dx * dx + dy * dy <= radius * radius
        });
    }

    /// Fill the ellipse inscribed in `rect`, honoring a clip.
    pub fn fill_ellipse(&mut self, rect: Rect, color: Color, opacity: f32, clip: Option<&ClipRegion>) {
        let (cx, cy) = rect.center();
        let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
        self.fill_shape(rect, color, opacity, clip, |px, py| {
            if rx <= 0.0 || ry <= 0.0 {
                return false;
            }
            let nx = (px - cx) / rx;
            let ny = (py - cy) / ry;
            nx * nx + ny * ny <= 1.0
        });
    }

    fn fill_shape(
        &mut self,
        rect: Rect,
        color: Color,
        opacity: f32,
        clip: Option<&ClipRegion>,
        inside: impl Fn(f32, f32) -> bool,
    ) {
        let x0 = rect.x.floor() as i64;
        let y0 = rect.y.floor() as i64;
        let x1 = (rect.x + rect.width).ceil() as i64;
        let y1 = (rect.y + rect.height).ceil() as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                if !rect.contains(px, py) || !inside(px, py) {
                    continue;
                }
                if let Some(clip) = clip {
                    if !clip.admits(px, py) {
                        continue;
                    }
                }
                self.blend_pixel(x, y, color.0, opacity);
            }
        }
    }

    /// Blit an RGBA image with its top-left corner at (x, y).
    pub fn blit(&mut self, source: &RgbaImage, x: f32, y: f32, opacity: f32, clip: Option<&ClipRegion>) {
        let ox = x.round() as i64;
        let oy = y.round() as i64;
        for (sx, sy, pixel) in source.enumerate_pixels() {
            let dx = ox + sx as i64;
            let dy = oy + sy as i64;
            if let Some(clip) = clip {
                if !clip.admits(dx as f32 + 0.5, dy as f32 + 0.5) {
                    continue;
                }
            }
            self.blend_pixel(dx, dy, pixel.0, opacity);
        }
    }
}
