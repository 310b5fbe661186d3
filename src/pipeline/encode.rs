//! Image encoding: `DynamicImage` → JPEG or PNG bytes.

use crate::config::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Encode an image in the requested format.
///
/// `quality` (1–100) only applies to JPEG. Images with an alpha channel are
/// flattened to RGB first because the JPEG encoder rejects them.
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let flattened;
            let img = match img.color() {
                ColorType::Rgb8 | ColorType::L8 => img,
                _ => {
                    flattened = DynamicImage::ImageRgb8(img.to_rgb8());
                    &flattened
                }
            };
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
    }

    debug!(
        "Encoded {}x{} image → {} bytes {}",
        img.width(),
        img.height(),
        buf.len(),
        format
    );
    Ok(buf)
}
