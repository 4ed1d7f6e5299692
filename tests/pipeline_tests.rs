//! # Pipeline Tests
//!
//! End-to-end coverage of the public API: template JSON in, resolved
//! scene graphs, rendered cards, planned grids, composed sheets, and PDF
//! bytes out. Everything runs offline — photo fixtures are temp files,
//! and text uses the deterministic built-in font.

use cardpress::batch::{BatchOptions, compose_batch};
use cardpress::compose::pdf::write_pdf;
use cardpress::layout::{LayoutMode, PageSpec, orient, plan};
use cardpress::render::{RenderContext, render_card};
use cardpress::template::{Record, Template, resolve::resolve};
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const TEMPLATE_JSON: &str = r##"{
    "width": 856,
    "height": 540,
    "nodes": [
        {"type": "shape", "x": 0, "y": 0, "width": 856, "height": 540, "fill": "#ffffff"},
        {"type": "shape", "x": 0, "y": 0, "width": 856, "height": 90, "fill": "#1f3a5f"},
        {"type": "text", "x": 40, "y": 140, "width": 500, "height": 60,
         "content": "{{name}}", "size_px": 40, "bold": true},
        {"type": "text", "x": 40, "y": 220, "width": 500, "height": 40,
         "content": "Roll no: {{roll_number}}", "size_px": 28},
        {"type": "photo_placeholder", "x": 600, "y": 140, "width": 200, "height": 250}
    ]
}"##;

fn template() -> Template {
    Template::from_json(TEMPLATE_JSON).unwrap()
}

fn record(name: &str, roll: i64) -> Record {
    let mut r = Record::new();
    r.set("name", name);
    r.set("roll_number", roll);
    r
}

/// Batch options scaled down to 60 DPI so tests stay fast.
fn small_options(mode: LayoutMode) -> BatchOptions {
    BatchOptions::with_page(mode, PageSpec::a4(60.0))
}

fn photo_fixture(dir: &tempfile::TempDir, color: [u8; 4]) -> String {
    let path = dir.path().join("photo.png");
    RgbaImage::from_pixel(300, 300, Rgba(color)).save(&path).unwrap();
    path.to_str().unwrap().to_string()
}

// ============================================================================
// RESOLUTION → RENDER
// ============================================================================

#[tokio::test]
async fn resolved_content_changes_the_raster() {
    let ctx = RenderContext::new();
    let template = template();
    let a = render_card(&resolve(&template, &record("Ada", 1)), &Record::new(), 428, 270, &ctx)
        .await
        .unwrap();
    let b = render_card(&resolve(&template, &record("Bob", 2)), &Record::new(), 428, 270, &ctx)
        .await
        .unwrap();
    assert_ne!(
        a.card.png_bytes().unwrap(),
        b.card.png_bytes().unwrap(),
        "different records must render different cards"
    );
}

#[tokio::test]
async fn repeated_pipeline_runs_are_byte_identical() {
    let ctx = RenderContext::new();
    let resolved = resolve(&template(), &record("Ada Lovelace", 1815));
    let first = render_card(&resolved, &Record::new(), 428, 270, &ctx).await.unwrap();
    let second = render_card(&resolved, &Record::new(), 428, 270, &ctx).await.unwrap();
    assert_eq!(first.card.png_bytes().unwrap(), second.card.png_bytes().unwrap());
}

#[tokio::test]
async fn unresolved_markers_render_visibly() {
    // A record lacking roll_number leaves the marker literal, which must
    // still paint glyphs (the marker is longer than the empty string).
    let ctx = RenderContext::new();
    let mut r = Record::new();
    r.set("name", "X");
    let resolved = resolve(&template(), &r);
    let json = serde_json::to_string(&resolved).unwrap();
    assert!(json.contains("{{roll_number}}"));

    let out = render_card(&resolved, &r, 428, 270, &ctx).await.unwrap();
    assert!(out.warnings.is_empty());
}

// ============================================================================
// PHOTO HANDLING
// ============================================================================

#[tokio::test]
async fn photo_lands_in_the_final_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let mut r = record("With Photo", 7);
    r.set("photo_url", photo_fixture(&dir, [200, 0, 0, 255]));

    let options = small_options(LayoutMode::Production);
    let out = compose_batch(&template(), &[r], &options, &RenderContext::new())
        .await
        .unwrap();
    let page = &out.document.pages()[0];
    let placement = page.placements()[0];

    // The photo sits in the right ~quarter of the card; sample there.
    let sample_x = (placement.x + placement.width * 0.82) as u32;
    let sample_y = (placement.y + placement.height * 0.5) as u32;
    let pixel = page.canvas().get_pixel(sample_x, sample_y).0;
    assert!(
        pixel[0] > 150 && pixel[1] < 100,
        "expected photo red at ({sample_x},{sample_y}), got {pixel:?}"
    );
}

#[tokio::test]
async fn broken_photo_never_fails_the_card() {
    let mut r = record("No Photo", 8);
    r.set("photo_url", "/not/a/real/file.png");
    let options = small_options(LayoutMode::Production);
    let out = compose_batch(&template(), &[r], &options, &RenderContext::new())
        .await
        .unwrap();
    assert!(out.report.success());
    assert_eq!(out.report.outcomes[0].warnings.len(), 1);
    assert_eq!(out.document.page_count(), 1);
}

// ============================================================================
// LAYOUT & COMPOSITION
// ============================================================================

#[test]
fn planned_slots_stay_inside_the_page() {
    for mode in [LayoutMode::Proof, LayoutMode::Production] {
        let grid = plan(1011, 638, &PageSpec::default(), mode).unwrap();
        for index in 0..grid.per_page() {
            let slot = grid.slot_rect(index);
            assert!(slot.x >= 0.0 && slot.y >= 0.0);
            assert!(slot.x + slot.width <= grid.page_width + 0.01);
            assert!(slot.y + slot.height <= grid.page_height + 0.01);
        }
    }
}

#[test]
fn orientation_correction_spec_example() {
    let bitmap = RgbaImage::new(800, 500);
    let corrected = orient::correct(bitmap, false);
    assert_eq!((corrected.width(), corrected.height()), (500, 800));
}

#[tokio::test]
async fn twenty_three_cards_make_three_sheets() {
    let records: Vec<Record> = (0..23).map(|i| record(&format!("Subject {i}"), i)).collect();
    let options = small_options(LayoutMode::Production);
    let grid = plan(options.card_width, options.card_height, &options.page, options.mode).unwrap();
    assert_eq!(grid.per_page(), 10);

    let out = compose_batch(&template(), &records, &options, &RenderContext::new())
        .await
        .unwrap();
    assert_eq!(out.document.page_count(), 3);
    assert_eq!(out.document.pages()[2].placements().len(), 3);
    // Every input card is accounted for, in order.
    assert_eq!(out.report.outcomes.len(), 23);
    assert!(out.report.success());
    let labels: Vec<&str> = out.report.outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels[0], "Subject 0");
    assert_eq!(labels[22], "Subject 22");
}

#[tokio::test]
async fn proof_sheets_carry_watermark_and_footer() {
    let dir = tempfile::tempdir().unwrap();
    let mark = dir.path().join("mark.png");
    RgbaImage::from_pixel(120, 60, Rgba([255, 0, 0, 255])).save(&mark).unwrap();

    let mut options = small_options(LayoutMode::Proof);
    options.watermark_ref = Some(mark.to_str().unwrap().to_string());
    options.footer_text = Some("REVIEW ONLY".into());

    let out = compose_batch(&template(), &[record("Ada", 1)], &options, &RenderContext::new())
        .await
        .unwrap();
    let canvas = out.document.pages()[0].canvas();
    // Watermark tint: red channel pulled above blue somewhere on the page.
    assert!(canvas.pixels().any(|p| p.0[0] > p.0[2]));
    // Footer ink near the bottom edge.
    let bottom = canvas.height() - canvas.height() / 20;
    let footer_ink = (0..canvas.width())
        .flat_map(|x| (bottom..canvas.height()).map(move |y| (x, y)))
        .any(|(x, y)| canvas.get_pixel(x, y).0[0] < 128);
    assert!(footer_ink);
}

// ============================================================================
// PDF OUTPUT
// ============================================================================

#[tokio::test]
async fn batch_to_pdf_end_to_end() {
    let records: Vec<Record> = (0..3).map(|i| record(&format!("Subject {i}"), i)).collect();
    let options = small_options(LayoutMode::Production);
    let out = compose_batch(&template(), &records, &options, &RenderContext::new())
        .await
        .unwrap();
    let pdf = write_pdf(&out.document, options.page.dpi).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert!(pdf.len() > 1000);
}
