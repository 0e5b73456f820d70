//! Raster encoding: `DynamicImage` → PNG/JPEG bytes or a base64 data URI.

use crate::config::AssetFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image in the requested format.
///
/// JPEG has no alpha channel, so images are flattened to RGB first.
pub fn encode_image(img: &DynamicImage, format: AssetFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        AssetFormat::Png => img.write_to(&mut Cursor::new(&mut buf), format.image_format())?,
        AssetFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), format.image_format())?,
    }
    Ok(buf)
}

/// `data:{mime};base64,{payload}` for inline embedding.
pub fn data_uri(img: &DynamicImage, format: AssetFormat) -> Result<String, image::ImageError> {
    let bytes = encode_image(img, format)?;
    let b64 = STANDARD.encode(&bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(format!("data:{};base64,{}", format.mime_type(), b64))
}
