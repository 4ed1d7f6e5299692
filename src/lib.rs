//! # Cardpress - Template Rendering & Print Layout Engine
//!
//! Cardpress turns a reusable card template (a scene graph of shapes,
//! text, and placeholder nodes) plus per-subject records into rasterized
//! card images, and arranges batches of cards onto standard paper sheets
//! as a print-ready PDF with correct geometry, orientation, scaling, and
//! optional watermarking.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cardpress::batch::{BatchOptions, compose_batch};
//! use cardpress::compose::pdf::write_pdf;
//! use cardpress::layout::LayoutMode;
//! use cardpress::render::RenderContext;
//! use cardpress::template::{Record, Template};
//!
//! # async fn run() -> Result<(), cardpress::EngineError> {
//! let template = Template::from_json(include_str!("../demos/id_card.json"))?;
//! let mut record = Record::new();
//! record.set("name", "Ada Lovelace");
//! record.set("roll_number", "A-1815");
//!
//! let ctx = RenderContext::new();
//! let options = BatchOptions::new(LayoutMode::Proof);
//! let out = compose_batch(&template, &[record], &options, &ctx).await?;
//! let pdf = write_pdf(&out.document, options.page.dpi)?;
//! std::fs::write("sheets.pdf", pdf)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Template/Record model and placeholder resolution |
//! | [`render`] | Card rasterization (surfaces, text, image fetch) |
//! | [`layout`] | Sheet grid planning and orientation correction |
//! | [`compose`] | Pagination, overlays, and PDF output |
//! | [`batch`] | Sequential batch driver with per-card reporting |
//! | [`error`] | Error types |
//!
//! ## Pipeline
//!
//! ```text
//! Template + Record → resolve → render_card → RenderedCard
//!                                                  ↓
//!              plan (GridConfig) → SheetComposer (orient, place, paginate)
//!                                                  ↓
//!                         finalize (watermark, footer) → write_pdf
//! ```

pub mod batch;
pub mod compose;
pub mod error;
pub mod layout;
pub mod render;
pub mod template;

// Re-exports for convenience
pub use batch::{BatchOptions, BatchOutput, BatchReport, compose_batch};
pub use compose::{PrintDocument, SheetComposer};
pub use error::EngineError;
pub use layout::{GridConfig, LayoutMode, PageSpec, plan};
pub use render::{RenderContext, RenderedCard, render_card};
pub use template::{Node, Record, Template, resolve::resolve};
