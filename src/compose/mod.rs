//! # Sheet Composer
//!
//! Pagination driver: consumes rendered card bitmaps one at a time,
//! places them into grid slots row-major (left-to-right, top-to-bottom),
//! and produces a multi-page document.
//!
//! State machine: `Empty → FillingPage → PageFull → Finalized`. A full
//! page rolls over to a fresh one on the next card; finalization draws
//! the optional overlays (tiled 45° watermark, footer caption) on every
//! page and seals the document. Finalization consumes the composer, so a
//! sealed document is immutable by construction.
//!
//! Cards are placed strictly in input order — downstream cutting depends
//! on a predictable slot→subject mapping — and a partially filled last
//! page keeps its empty slots empty, never padded.

pub mod pdf;

use image::{DynamicImage, Rgba, RgbaImage, imageops};

use crate::layout::{GridConfig, LayoutMode, orient};
use crate::render::surface::{Rect, Surface};
use crate::render::text;
use crate::template::{TextAlign, TextNode};

/// Default watermark strength over the page.
const WATERMARK_OPACITY: f32 = 0.12;

/// Where a card landed on a page, in page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One composed sheet: a fixed-size canvas plus placement metadata.
#[derive(Debug)]
pub struct Page {
    canvas: RgbaImage,
    placements: Vec<Placement>,
}

impl Page {
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}

/// A finalized multi-page document, ready for the PDF writer.
#[derive(Debug)]
pub struct PrintDocument {
    pages: Vec<Page>,
}

impl PrintDocument {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Composer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Empty,
    FillingPage,
    PageFull,
}

/// Stateful pagination driver over an input sequence of card bitmaps.
pub struct SheetComposer {
    grid: GridConfig,
    mode: LayoutMode,
    pages: Vec<Page>,
    placed: usize,
    state: ComposerState,
}

impl SheetComposer {
    pub fn new(grid: GridConfig, mode: LayoutMode) -> Self {
        Self {
            grid,
            mode,
            pages: Vec::new(),
            placed: 0,
            state: ComposerState::Empty,
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Cards placed so far.
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// Place the next card into the next slot, correcting its
    /// orientation to the slot's first.
    ///
    /// Fit policy follows the layout mode: Production stretches to the
    /// slot's exact size (orientation correction already guarantees the
    /// aspect matches for standard card ratios); Proof scales by
    /// `min(slot_w/w, slot_h/h)` and centers, preserving aspect exactly.
    pub fn place(&mut self, card: RgbaImage) {
        let card = orient::correct(card, self.grid.slot_is_landscape());

        let per_page = self.grid.per_page();
        let index_on_page = self.placed % per_page;
        if index_on_page == 0 {
            self.pages.push(Page {
                canvas: RgbaImage::from_pixel(
                    self.grid.page_width.round() as u32,
                    self.grid.page_height.round() as u32,
                    Rgba([255, 255, 255, 255]),
                ),
                placements: Vec::new(),
            });
        }

        let slot = self.grid.slot_rect(index_on_page);
        let placement = match self.mode {
            LayoutMode::Production => Placement {
                x: slot.x,
                y: slot.y,
                width: slot.width,
                height: slot.height,
            },
            LayoutMode::Proof => {
                let scale =
                    (slot.width / card.width() as f32).min(slot.height / card.height() as f32);
                let width = card.width() as f32 * scale;
                let height = card.height() as f32 * scale;
                Placement {
                    x: slot.x + (slot.width - width) / 2.0,
                    y: slot.y + (slot.height - height) / 2.0,
                    width,
                    height,
                }
            }
        };

        let target_w = (placement.width.round() as u32).max(1);
        let target_h = (placement.height.round() as u32).max(1);
        // A pixel-exact card (the common case) is blitted verbatim.
        let resized = if card.width() == target_w && card.height() == target_h {
            card
        } else {
            imageops::resize(&card, target_w, target_h, imageops::FilterType::Lanczos3)
        };
        let page = self.pages.last_mut().expect("page pushed above");
        imageops::overlay(
            &mut page.canvas,
            &resized,
            placement.x.round() as i64,
            placement.y.round() as i64,
        );
        page.placements.push(placement);

        self.placed += 1;
        self.state = if self.placed % per_page == 0 {
            ComposerState::PageFull
        } else {
            ComposerState::FillingPage
        };
    }

    /// Draw overlays on every page and seal the document.
    ///
    /// Consuming `self` is what makes a finalized document immutable; a
    /// cancelled batch can finalize early and the pages already composed
    /// remain valid (composition is append-only).
    pub fn finalize(self, watermark: Option<&DynamicImage>, footer: Option<&str>) -> PrintDocument {
        let mut pages = self.pages;
        for page in &mut pages {
            if let Some(mark) = watermark {
                overlay_watermark(&mut page.canvas, mark);
            }
            if let Some(caption) = footer {
                draw_footer(&mut page.canvas, caption);
            }
        }
        PrintDocument { pages }
    }
}

// ============================================================================
// OVERLAYS
// ============================================================================

/// Tile a semi-transparent, 45°-rotated watermark across the page.
fn overlay_watermark(canvas: &mut RgbaImage, watermark: &DynamicImage) {
    // Scale the mark to about a quarter of the page width before rotating.
    let target_width = (canvas.width() / 4).max(1);
    let scale = target_width as f32 / watermark.width() as f32;
    let target_height = ((watermark.height() as f32 * scale).round() as u32).max(1);
    let scaled = watermark
        .resize_exact(target_width, target_height, imageops::FilterType::Triangle)
        .to_rgba8();
    let rotated = rotate_45(&scaled);

    let step_x = (rotated.width() as i64 * 3 / 2).max(1);
    let step_y = (rotated.height() as i64 * 3 / 2).max(1);

    let mut row = 0i64;
    let mut y = -(rotated.height() as i64) / 2;
    while y < canvas.height() as i64 {
        // Stagger alternate rows by half a step.
        let offset = if row % 2 == 0 { 0 } else { step_x / 2 };
        let mut x = -(rotated.width() as i64) / 2 + offset;
        while x < canvas.width() as i64 {
            blend_onto(canvas, &rotated, x, y, WATERMARK_OPACITY);
            x += step_x;
        }
        y += step_y;
        row += 1;
    }
}

/// Rotate an RGBA image 45° counter-clockwise onto a transparent canvas,
/// nearest-neighbour sampled by inverse mapping.
fn rotate_45(source: &RgbaImage) -> RgbaImage {
    let (w, h) = (source.width() as f32, source.height() as f32);
    let c = std::f32::consts::FRAC_1_SQRT_2; // cos 45° = sin 45°
    let out_w = ((w + h) * c).ceil().max(1.0) as u32;
    let out_h = out_w;
    let mut out = RgbaImage::from_pixel(out_w, out_h, Rgba([0, 0, 0, 0]));

    let (ocx, ocy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);
    let (cx, cy) = (w / 2.0, h / 2.0);
    for oy in 0..out_h {
        for ox in 0..out_w {
            let dx = ox as f32 + 0.5 - ocx;
            let dy = oy as f32 + 0.5 - ocy;
            let sx = cx + c * (dx + dy);
            let sy = cy + c * (dy - dx);
            if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
                out.put_pixel(ox, oy, *source.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

/// Source-over blend of `top` onto `canvas` at (x, y) with extra opacity.
fn blend_onto(canvas: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64, opacity: f32) {
    for (sx, sy, pixel) in top.enumerate_pixels() {
        let dx = x + sx as i64;
        let dy = y + sy as i64;
        if dx < 0 || dy < 0 || dx >= canvas.width() as i64 || dy >= canvas.height() as i64 {
            continue;
        }
        let alpha = pixel.0[3] as f32 / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }
        let dst = canvas.get_pixel_mut(dx as u32, dy as u32);
        for channel in 0..3 {
            let blended = pixel.0[channel] as f32 * alpha + dst.0[channel] as f32 * (1.0 - alpha);
            dst.0[channel] = blended.round() as u8;
        }
    }
}

/// Paint the footer caption centered along the bottom of the page.
fn draw_footer(canvas: &mut RgbaImage, caption: &str) {
    let page_w = canvas.width() as f32;
    let page_h = canvas.height() as f32;
    let text_height = (page_h * 0.012).max(12.0);

    let node = TextNode {
        align: TextAlign::Center,
        ..TextNode::new(caption, 0.0, 0.0, page_w, text_height * 2.0)
    };
    let frame = Rect::new(0.0, page_h - text_height * 3.0, page_w, text_height * 2.0);

    let mut surface = Surface::from_image(std::mem::take(canvas));
    text::paint_text(
        &mut surface,
        frame,
        &node,
        text_height,
        1.0,
        None,
        &text::FontStore::new(),
    );
    *canvas = surface.into_image();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PageSpec, plan};

    fn grid_2x5() -> GridConfig {
        plan(1011, 638, &PageSpec::default(), LayoutMode::Production).unwrap()
    }

    fn landscape_card() -> RgbaImage {
        RgbaImage::from_pixel(1011, 638, Rgba([40, 80, 120, 255]))
    }

    #[test]
    fn test_pagination_exactness() {
        // 23 cards at 10 per page: exactly 3 pages, 3 cards on the last.
        let mut composer = SheetComposer::new(grid_2x5(), LayoutMode::Production);
        for _ in 0..23 {
            composer.place(landscape_card());
        }
        let document = composer.finalize(None, None);
        assert_eq!(document.page_count(), 3);
        assert_eq!(document.pages()[0].placements().len(), 10);
        assert_eq!(document.pages()[1].placements().len(), 10);
        assert_eq!(document.pages()[2].placements().len(), 3);
    }

    #[test]
    fn test_state_transitions() {
        let mut composer = SheetComposer::new(grid_2x5(), LayoutMode::Production);
        assert_eq!(composer.state(), ComposerState::Empty);
        composer.place(landscape_card());
        assert_eq!(composer.state(), ComposerState::FillingPage);
        for _ in 1..10 {
            composer.place(landscape_card());
        }
        assert_eq!(composer.state(), ComposerState::PageFull);
        composer.place(landscape_card());
        assert_eq!(composer.state(), ComposerState::FillingPage);
        assert_eq!(composer.placed(), 11);
    }

    #[test]
    fn test_row_major_fill_order() {
        let mut composer = SheetComposer::new(grid_2x5(), LayoutMode::Production);
        for _ in 0..4 {
            composer.place(landscape_card());
        }
        let document = composer.finalize(None, None);
        let placements = document.pages()[0].placements();
        // Pairs share a row; rows descend the page.
        assert_eq!(placements[0].y, placements[1].y);
        assert!(placements[1].x > placements[0].x);
        assert!(placements[2].y > placements[0].y);
        assert_eq!(placements[2].x, placements[0].x);
    }

    #[test]
    fn test_production_stretches_to_slot() {
        let grid = grid_2x5();
        let mut composer = SheetComposer::new(grid, LayoutMode::Production);
        // Slightly off-size card still fills the slot exactly.
        composer.place(RgbaImage::from_pixel(900, 600, Rgba([1, 2, 3, 255])));
        let document = composer.finalize(None, None);
        let placement = document.pages()[0].placements()[0];
        assert_eq!(placement.width, grid.cell_width);
        assert_eq!(placement.height, grid.cell_height);
    }

    #[test]
    fn test_exact_size_card_is_copied_verbatim() {
        let grid = grid_2x5();
        let mut composer = SheetComposer::new(grid, LayoutMode::Production);
        // Slot-sized card with a marker pixel: no resampling may touch it.
        let mut card = RgbaImage::from_pixel(1011, 638, Rgba([37, 99, 201, 255]));
        card.put_pixel(10, 10, Rgba([255, 0, 0, 255]));
        composer.place(card);
        let document = composer.finalize(None, None);
        let page = &document.pages()[0];
        let placement = page.placements()[0];
        let x = placement.x.round() as u32 + 10;
        let y = placement.y.round() as u32 + 10;
        assert_eq!(page.canvas().get_pixel(x, y).0, [255, 0, 0, 255]);
        assert_eq!(page.canvas().get_pixel(x + 1, y).0, [37, 99, 201, 255]);
    }

    #[test]
    fn test_proof_contains_and_centers() {
        let grid = plan(1011, 638, &PageSpec::default(), LayoutMode::Proof).unwrap();
        let mut composer = SheetComposer::new(grid, LayoutMode::Proof);
        // A 2:1 card in a ~1.58:1 slot letterboxes vertically.
        composer.place(RgbaImage::from_pixel(1000, 500, Rgba([9, 9, 9, 255])));
        let document = composer.finalize(None, None);
        let placement = document.pages()[0].placements()[0];
        let slot = grid.slot_rect(0);
        assert!((placement.width - slot.width).abs() < 1.0);
        assert!(placement.height < slot.height);
        // Centered: symmetric margins above and below.
        let top = placement.y - slot.y;
        let bottom = (slot.y + slot.height) - (placement.y + placement.height);
        assert!((top - bottom).abs() < 1.0);
    }

    #[test]
    fn test_mismatched_card_is_rotated_into_slot() {
        // Portrait bitmap into landscape slots: corrected before placing.
        let mut composer = SheetComposer::new(grid_2x5(), LayoutMode::Proof);
        composer.place(RgbaImage::from_pixel(500, 800, Rgba([7, 7, 7, 255])));
        let document = composer.finalize(None, None);
        let placement = document.pages()[0].placements()[0];
        assert!(placement.width > placement.height);
    }

    #[test]
    fn test_footer_marks_page_bottom() {
        let mut composer = SheetComposer::new(grid_2x5(), LayoutMode::Proof);
        composer.place(landscape_card());
        let document = composer.finalize(None, Some("Proof sheet"));
        let canvas = document.pages()[0].canvas();
        let bottom_band = (canvas.height() as f32 * 0.95) as u32;
        let dark = (0..canvas.width())
            .flat_map(|x| (bottom_band..canvas.height()).map(move |y| (x, y)))
            .filter(|&(x, y)| canvas.get_pixel(x, y).0[0] < 128)
            .count();
        assert!(dark > 0, "footer painted nothing near the page bottom");
    }

    #[test]
    fn test_watermark_tiles_every_page() {
        let mut composer = SheetComposer::new(grid_2x5(), LayoutMode::Proof);
        for _ in 0..11 {
            composer.place(landscape_card());
        }
        let mark = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            200,
            80,
            Rgba([255, 0, 0, 255]),
        ));
        let document = composer.finalize(Some(&mark), None);
        assert_eq!(document.page_count(), 2);
        for page in document.pages() {
            let canvas = page.canvas();
            let tinted = canvas.pixels().filter(|p| p.0[0] != p.0[2]).count();
            assert!(tinted > 0, "watermark left no tint on a page");
        }
    }

    #[test]
    fn test_rotate_45_swaps_extent() {
        let source = RgbaImage::from_pixel(100, 40, Rgba([1, 1, 1, 255]));
        let rotated = rotate_45(&source);
        let expected = ((100.0 + 40.0) * std::f32::consts::FRAC_1_SQRT_2).ceil() as u32;
        assert_eq!(rotated.width(), expected);
        // Corners of the rotated canvas are transparent.
        assert_eq!(rotated.get_pixel(0, 0).0[3], 0);
    }
}
