//! # Layout Planner
//!
//! Pure grid geometry: given card pixel dimensions and a physical page,
//! compute how many cards fit per sheet and where every slot sits.
//!
//! One planner, presets as data. `Proof` trades density for generous
//! spacing a human can annotate; `Production` packs the maximum slots
//! with minimal cutting gaps. The page orientation is always the
//! complement of the card orientation (landscape cards on a portrait
//! page and vice versa), which maximizes slot count for standard card
//! and paper dimensions.
//!
//! Margins are derived, never fixed:
//! `margin_x = (page_w - (cols*cell_w + (cols-1)*gap_x)) / 2`, so the
//! grid is exactly centered regardless of card dimension variation.

pub mod orient;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::render::surface::Rect;

/// Layout density preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Spacious, low-density layout for human review before printing.
    Proof,
    /// Maximum slots per sheet, minimal spacing, for final cutting.
    #[default]
    Production,
}

/// Physical page description plus the working raster density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub width_mm: f32,
    pub height_mm: f32,
    pub dpi: f32,
}

impl PageSpec {
    /// A4 paper at the given working DPI.
    pub fn a4(dpi: f32) -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            dpi,
        }
    }

    pub fn mm_to_px(&self, mm: f32) -> f32 {
        mm / 25.4 * self.dpi
    }

    /// Page pixel dimensions in the requested orientation.
    fn oriented_px(&self, landscape: bool) -> (f32, f32) {
        let w = self.mm_to_px(self.width_mm);
        let h = self.mm_to_px(self.height_mm);
        let (short, long) = if w <= h { (w, h) } else { (h, w) };
        if landscape { (long, short) } else { (short, long) }
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::a4(300.0)
    }
}

/// A computed sheet grid. All lengths in page pixels.
///
/// Invariant: `columns*cell_width + (columns-1)*gap_x + 2*margin_x`
/// equals `page_width` exactly (and the row analogue for height).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub cell_width: f32,
    pub cell_height: f32,
    pub columns: usize,
    pub rows: usize,
    pub gap_x: f32,
    pub gap_y: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub page_width: f32,
    pub page_height: f32,
}

impl GridConfig {
    /// Slots per sheet.
    pub fn per_page(&self) -> usize {
        self.columns * self.rows
    }

    /// Whether slots are wider than tall.
    pub fn slot_is_landscape(&self) -> bool {
        self.cell_width > self.cell_height
    }

    /// Slot rectangle for a row-major index on one page
    /// (left-to-right, top-to-bottom).
    pub fn slot_rect(&self, index_on_page: usize) -> Rect {
        let col = index_on_page % self.columns;
        let row = index_on_page / self.columns;
        Rect::new(
            self.margin_x + col as f32 * (self.cell_width + self.gap_x),
            self.margin_y + row as f32 * (self.cell_height + self.gap_y),
            self.cell_width,
            self.cell_height,
        )
    }
}

/// Grid preset: slot counts and cutting gaps for one orientation class.
struct Preset {
    columns: usize,
    rows: usize,
    gap_mm: f32,
}

fn preset(mode: LayoutMode, card_landscape: bool) -> Preset {
    match (mode, card_landscape) {
        (LayoutMode::Production, true) => Preset { columns: 2, rows: 5, gap_mm: 2.0 },
        (LayoutMode::Production, false) => Preset { columns: 5, rows: 2, gap_mm: 2.0 },
        (LayoutMode::Proof, true) => Preset { columns: 2, rows: 4, gap_mm: 8.0 },
        (LayoutMode::Proof, false) => Preset { columns: 4, rows: 2, gap_mm: 8.0 },
    }
}

const FIT_EPS: f32 = 0.01;

/// Plan a sheet grid for cards of the given pixel size.
///
/// The preset's grid shrinks toward 1×1 when the page cannot hold it;
/// planning fails only when even a single slot does not fit.
pub fn plan(
    card_width: u32,
    card_height: u32,
    page: &PageSpec,
    mode: LayoutMode,
) -> Result<GridConfig, EngineError> {
    if card_width == 0 || card_height == 0 {
        return Err(EngineError::InvalidInput(format!(
            "card dimensions must be positive, got {card_width}x{card_height}"
        )));
    }

    let card_landscape = card_width > card_height;
    // Complement orientation: landscape cards on a portrait page.
    let (page_width, page_height) = page.oriented_px(!card_landscape);
    let preset = preset(mode, card_landscape);
    let gap = page.mm_to_px(preset.gap_mm);

    let cell_width = card_width as f32;
    let cell_height = card_height as f32;
    let span = |count: usize, cell: f32| count as f32 * cell + (count - 1) as f32 * gap;

    let mut columns = preset.columns;
    while columns > 1 && span(columns, cell_width) > page_width + FIT_EPS {
        columns -= 1;
    }
    let mut rows = preset.rows;
    while rows > 1 && span(rows, cell_height) > page_height + FIT_EPS {
        rows -= 1;
    }

    if cell_width > page_width + FIT_EPS || cell_height > page_height + FIT_EPS {
        return Err(EngineError::CardTooLargeForPage {
            card_width,
            card_height,
            page_width: page_width.round() as u32,
            page_height: page_height.round() as u32,
        });
    }

    let margin_x = (page_width - span(columns, cell_width)) / 2.0;
    let margin_y = (page_height - span(rows, cell_height)) / 2.0;

    Ok(GridConfig {
        cell_width,
        cell_height,
        columns,
        rows,
        gap_x: gap,
        gap_y: gap,
        margin_x,
        margin_y,
        page_width,
        page_height,
    })
}
