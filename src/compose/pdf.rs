//! PDF output for composed sheet documents.
//!
//! Each composed page canvas is embedded as a single full-page RGB image
//! at the DPI the page was rastered at, so the PDF's physical page size
//! matches the paper the layout was planned for. All compositing already
//! happened in pixel space; this writer only wraps pages in a container
//! printers accept.

use image::DynamicImage;
use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px};

use crate::error::EngineError;

use super::PrintDocument;

/// Serialize a finalized document as PDF bytes.
pub fn write_pdf(document: &PrintDocument, dpi: f32) -> Result<Vec<u8>, EngineError> {
    let first = document
        .pages()
        .first()
        .ok_or_else(|| EngineError::DocumentAssembly("document has no pages".into()))?;

    let px_to_mm = |px: u32| px as f32 / dpi * 25.4;
    let (doc, first_page, first_layer) = PdfDocument::new(
        "cardpress sheets",
        Mm(px_to_mm(first.canvas().width())),
        Mm(px_to_mm(first.canvas().height())),
        "Layer 1",
    );

    for (i, page) in document.pages().iter().enumerate() {
        let canvas = page.canvas();
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(
                Mm(px_to_mm(canvas.width())),
                Mm(px_to_mm(canvas.height())),
                "Layer 1",
            )
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        // Pages are composed over opaque white, so dropping alpha is lossless.
        let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
        let image = Image::from(ImageXObject {
            width: Px(canvas.width() as usize),
            height: Px(canvas.height() as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: false,
            image_data: rgb.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });
        image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }

    doc.save_to_bytes()
        .map_err(|e| EngineError::DocumentAssembly(e.to_string()))
}
