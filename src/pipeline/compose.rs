//! Group compositing: one image per group.
//!
//! A single-page group passes through untouched. Multi-page groups are
//! stacked top to bottom in page order on a canvas as wide as the widest page
//! and as tall as all pages together. Pages are pasted at `x = 0`; narrower
//! pages leave the rest of their band black. Nothing is scaled, cropped or
//! centred.
//!
//! The canvas is RGB8: pdfium hands back BGRA/RGBA bitmaps, and JPEG has no
//! alpha channel.
//!
//! The final size is checked against the output format before any canvas is
//! allocated. JPEG caps each side at 65 535 px, which a group of 20 Letter
//! pages at 300 DPI already exceeds.

use crate::config::OutputFormat;
use crate::error::Pdf2ImgError;
use crate::pipeline::render::RenderedPage;
use image::{DynamicImage, RgbImage};
use tracing::debug;

/// Largest stitched RGB8 canvas, in bytes.
pub const MAX_COMPOSITE_BYTES: u64 = 1 << 30;

/// Merge the rendered pages of one group into a single image.
///
/// `pages` must be non-empty and in page order.
///
/// # Errors
/// [`Pdf2ImgError::CompositeTooLarge`] when the result cannot be written in
/// `format` or the stitched canvas would exceed [`MAX_COMPOSITE_BYTES`].
pub fn compose(
    mut pages: Vec<RenderedPage>,
    format: OutputFormat,
) -> Result<DynamicImage, Pdf2ImgError> {
    if pages.is_empty() {
        return Err(Pdf2ImgError::Internal("cannot compose an empty group".into()));
    }
    let (width, height) = composite_size(&pages, format)?;
    if pages.len() == 1 {
        return Ok(pages.swap_remove(0).image);
    }
    Ok(stitch_vertically(&pages, width, height))
}

/// Size of the image `pages` combine into, checked against the limits of
/// `format`. The memory budget only applies when a new canvas is needed.
pub fn composite_size(
    pages: &[RenderedPage],
    format: OutputFormat,
) -> Result<(u32, u32), Pdf2ImgError> {
    let first_page = pages.first().map_or(0, |p| p.page);
    let last_page = pages.last().map_or(0, |p| p.page);
    let too_large = || Pdf2ImgError::CompositeTooLarge {
        first_page,
        last_page,
    };

    let width = pages.iter().map(RenderedPage::width).max().unwrap_or(0);
    let height: u64 = pages.iter().map(|p| u64::from(p.height())).sum();
    if !within_limits(width, height, pages.len() > 1, format) {
        return Err(too_large());
    }
    let height = u32::try_from(height).map_err(|_| too_large())?;
    Ok((width, height))
}

fn within_limits(width: u32, height: u64, stitched: bool, format: OutputFormat) -> bool {
    let limit = u64::from(format.max_dimension());
    if u64::from(width) > limit || height > limit {
        return false;
    }
    !stitched || u64::from(width) * height * 3 <= MAX_COMPOSITE_BYTES
}

fn stitch_vertically(pages: &[RenderedPage], width: u32, height: u32) -> DynamicImage {
    let mut canvas = RgbImage::new(width, height);
    let mut y = 0i64;
    for page in pages {
        image::imageops::replace(&mut canvas, &page.image.to_rgb8(), 0, y);
        y += i64::from(page.height());
    }

    debug!(
        "Stitched pages {}-{} → {}x{} px",
        pages[0].page,
        pages[pages.len() - 1].page,
        width,
        height
    );
    DynamicImage::ImageRgb8(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn page(page: usize, w: u32, h: u32, colour: [u8; 3]) -> RenderedPage {
        let [r, g, b] = colour;
        RenderedPage {
            page,
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([r, g, b, 255]))),
        }
    }

    #[test]
    fn single_page_passes_through() {
        let p = page(3, 40, 20, [10, 20, 30]);
        let out = compose(vec![p.clone()], OutputFormat::Jpeg).unwrap();
        // Untouched: still RGBA, same pixels.
        assert_eq!(out, p.image);
    }

    #[test]
    fn stitched_size_is_max_width_by_sum_height() {
        let out = compose(
            vec![
                page(1, 100, 50, [255, 0, 0]),
                page(2, 60, 30, [0, 255, 0]),
                page(3, 80, 20, [0, 0, 255]),
            ],
            OutputFormat::Png,
        )
        .unwrap();
        assert_eq!(out.width(), 100);
        assert_eq!(out.height(), 100);
    }

    #[test]
    fn pages_stack_top_to_bottom_left_aligned() {
        let out = compose(
            vec![page(1, 10, 4, [255, 0, 0]), page(2, 6, 3, [0, 0, 255])],
            OutputFormat::Png,
        )
        .unwrap()
        .to_rgb8();

        assert_eq!(*out.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(9, 3), Rgb([255, 0, 0]));
        // Second page starts right below the first.
        assert_eq!(*out.get_pixel(0, 4), Rgb([0, 0, 255]));
        assert_eq!(*out.get_pixel(5, 6), Rgb([0, 0, 255]));
        // Right of the narrower page stays black.
        assert_eq!(*out.get_pixel(6, 4), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(9, 6), Rgb([0, 0, 0]));
    }

    #[test]
    fn stitched_output_has_no_alpha() {
        let out = compose(
            vec![page(1, 4, 4, [1, 2, 3]), page(2, 4, 4, [4, 5, 6])],
            OutputFormat::Jpeg,
        )
        .unwrap();
        assert!(!out.color().has_alpha());
    }

    #[test]
    fn empty_group_is_an_error() {
        assert!(compose(Vec::new(), OutputFormat::Jpeg).is_err());
    }

    #[test]
    fn jpeg_height_limit_is_checked_before_stitching() {
        // 20 × 3300 px = 66 000 px, one Letter page at 300 DPI each.
        let pages: Vec<_> = (1..=20).map(|n| page(n, 1, 3300, [9, 9, 9])).collect();
        let err = composite_size(&pages, OutputFormat::Jpeg).unwrap_err();
        assert!(
            matches!(err, Pdf2ImgError::CompositeTooLarge { first_page: 1, last_page: 20 }),
            "{err:?}"
        );
        // 19 pages (62 700 px) still fit.
        assert_eq!(
            composite_size(&pages[..19], OutputFormat::Jpeg).unwrap(),
            (1, 62_700)
        );
    }

    #[test]
    fn png_allows_taller_images() {
        let pages: Vec<_> = (1..=20).map(|n| page(n, 1, 3300, [9, 9, 9])).collect();
        assert_eq!(
            composite_size(&pages, OutputFormat::Png).unwrap(),
            (1, 66_000)
        );
    }

    #[test]
    fn canvas_memory_budget_applies_to_stitching_only() {
        // 20 000 × 20 000 RGB8 is 1.2 GB.
        assert!(!within_limits(20_000, 20_000, true, OutputFormat::Png));
        assert!(within_limits(20_000, 20_000, false, OutputFormat::Png));
        assert!(within_limits(20_000, 10_000, true, OutputFormat::Png));
        // Both sides are capped for JPEG, stitched or not.
        assert!(!within_limits(70_000, 10, false, OutputFormat::Jpeg));
        assert!(within_limits(65_535, 65_535, false, OutputFormat::Jpeg));
    }
}
