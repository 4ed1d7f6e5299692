//! # Batch Driver
//!
//! Renders a sequence of records against one template and composes the
//! results into a print document.
//!
//! Rendering is strictly sequential: one card is fully rendered,
//! orientation-corrected and placed before the next begins, so peak
//! memory holds a single in-flight raster surface. The layout is planned
//! before any rendering starts, so a card size that cannot fit the page
//! fails the batch before partial work exists.
//!
//! Per-card failures skip that card and are recorded; the report accounts
//! for every input record, rendered or not.

use crate::compose::{PrintDocument, SheetComposer};
use crate::error::EngineError;
use crate::layout::{LayoutMode, PageSpec, plan};
use crate::render::{RenderContext, fetch_image, render_card};
use crate::template::resolve::resolve;
use crate::template::{Record, Template};

/// CR80 card physical dimensions (the standard ID-1 card).
pub const CARD_WIDTH_MM: f32 = 85.6;
pub const CARD_HEIGHT_MM: f32 = 54.0;

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub mode: LayoutMode,
    pub page: PageSpec,
    /// Card render resolution; also the physical slot size at the page DPI.
    pub card_width: u32,
    pub card_height: u32,
    /// Image reference tiled as a watermark over every page.
    pub watermark_ref: Option<String>,
    /// Footer caption. Proof mode defaults to a dated caption when unset.
    pub footer_text: Option<String>,
}

impl BatchOptions {
    /// Defaults: A4 at 300 DPI, CR80 landscape cards.
    pub fn new(mode: LayoutMode) -> Self {
        Self::with_page(mode, PageSpec::default())
    }

    /// Defaults on a specific page spec; card pixel size is CR80 at the
    /// page's DPI.
    pub fn with_page(mode: LayoutMode, page: PageSpec) -> Self {
        Self {
            mode,
            card_width: page.mm_to_px(CARD_WIDTH_MM).round() as u32,
            card_height: page.mm_to_px(CARD_HEIGHT_MM).round() as u32,
            page,
            watermark_ref: None,
            footer_text: None,
        }
    }
}

/// How one input record fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardStatus {
    Rendered,
    Skipped(String),
}

/// Per-card entry in the batch report.
#[derive(Debug, Clone)]
pub struct CardOutcome {
    pub index: usize,
    pub label: String,
    pub status: CardStatus,
    pub warnings: Vec<String>,
}

impl CardOutcome {
    pub fn is_rendered(&self) -> bool {
        self.status == CardStatus::Rendered
    }
}

/// Accounting for a whole batch: one outcome per input record, in input
/// order, plus batch-level warnings (e.g. a watermark that failed to
/// load).
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<CardOutcome>,
    pub warnings: Vec<String>,
    pub pages: usize,
}

impl BatchReport {
    pub fn rendered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rendered()).count()
    }

    /// Overall flag: every card rendered (warnings allowed).
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.is_rendered())
    }
}

/// A composed document plus its accounting.
#[derive(Debug)]
pub struct BatchOutput {
    pub document: PrintDocument,
    pub report: BatchReport,
}

/// Render every record and compose the results into sheets.
pub async fn compose_batch(
    template: &Template,
    records: &[Record],
    options: &BatchOptions,
    ctx: &RenderContext,
) -> Result<BatchOutput, EngineError> {
    // Fail fast: no rendering until the layout is known to fit.
    let grid = plan(options.card_width, options.card_height, &options.page, options.mode)?;
    let mut composer = SheetComposer::new(grid, options.mode);
    let mut outcomes = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let label = record
            .get("name")
            .or_else(|| record.get("roll_number"))
            .unwrap_or_else(|| format!("card {}", index + 1));
        let resolved = resolve(template, record);
        match render_card(
            &resolved,
            record,
            options.card_width,
            options.card_height,
            ctx,
        )
        .await
        {
            Ok(output) => {
                composer.place(output.card.into_image());
                outcomes.push(CardOutcome {
                    index,
                    label,
                    status: CardStatus::Rendered,
                    warnings: output.warnings,
                });
            }
            Err(e) => {
                log::warn!("card {label:?} skipped: {e}");
                outcomes.push(CardOutcome {
                    index,
                    label,
                    status: CardStatus::Skipped(e.to_string()),
                    warnings: Vec::new(),
                });
            }
        }
    }

    // Even a fully failed batch keeps its per-card accounting: the error
    // carries every skip reason.
    if composer.placed() == 0 {
        return Err(EngineError::NoRenderableCards { outcomes });
    }

    let mut warnings = Vec::new();
    // The watermark decodes once per document, not once per card.
    let watermark = match &options.watermark_ref {
        Some(reference) => match fetch_image(reference, ctx).await {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("watermark skipped: {e}");
                warnings.push(format!("watermark skipped: {e}"));
                None
            }
        },
        None => None,
    };

    let footer = options.footer_text.clone().or_else(|| match options.mode {
        LayoutMode::Proof => Some(format!(
            "Proof sheet {}",
            chrono::Local::now().format("%Y-%m-%d")
        )),
        LayoutMode::Production => None,
    });

    let document = composer.finalize(watermark.as_ref(), footer.as_deref());
    let report = BatchReport {
        pages: document.page_count(),
        outcomes,
        warnings,
    };
    Ok(BatchOutput { document, report })
}
