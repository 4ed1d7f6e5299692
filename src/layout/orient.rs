//! # Orientation Corrector
//!
//! Rotates a card bitmap 90° when its orientation does not match the
//! slot it is headed for. The rotation direction is always clockwise —
//! card content has no preferred "up" once orientations mismatch, so the
//! direction is fixed rather than guessed. Callers that need
//! upright-correct output must pre-normalize their template's intrinsic
//! orientation; that is a documented caveat, not something this function
//! second-guesses.

use image::RgbaImage;

/// Whether a bitmap is wider than tall. Square bitmaps count as portrait.
pub fn is_landscape(image: &RgbaImage) -> bool {
    image.width() > image.height()
}

/// Match a bitmap's orientation to its slot.
///
/// Pure and always succeeds: on mismatch the bitmap is rotated 90°
/// clockwise (width and height swap), otherwise it passes through
/// unchanged.
pub fn correct(image: RgbaImage, slot_landscape: bool) -> RgbaImage {
    if is_landscape(&image) != slot_landscape {
        image::imageops::rotate90(&image)
    } else {
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_landscape_into_portrait_slot_rotates() {
        let bitmap = RgbaImage::new(800, 500);
        let corrected = correct(bitmap, false);
        assert_eq!((corrected.width(), corrected.height()), (500, 800));
    }

    #[test]
    fn test_matching_orientation_passes_through() {
        let bitmap = RgbaImage::new(800, 500);
        let corrected = correct(bitmap, true);
        assert_eq!((corrected.width(), corrected.height()), (800, 500));
    }

    #[test]
    fn test_rotation_is_clockwise() {
        // Mark the top-left pixel; clockwise rotation moves it to the
        // top-right corner.
        let mut bitmap = RgbaImage::new(4, 2);
        bitmap.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let corrected = correct(bitmap, false);
        assert_eq!((corrected.width(), corrected.height()), (2, 4));
        assert_eq!(corrected.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_square_counts_as_portrait() {
        let bitmap = RgbaImage::new(100, 100);
        // Portrait slot: no rotation.
        let same = correct(bitmap.clone(), false);
        assert_eq!((same.width(), same.height()), (100, 100));
        // Landscape slot: mismatch, rotates (dimensions stay square).
        let rotated = correct(bitmap, true);
        assert_eq!((rotated.width(), rotated.height()), (100, 100));
    }
}
