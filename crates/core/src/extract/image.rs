//! Bitmap image extraction for the two accepted encodings.

use crate::content::{Bitmap, ExtractedContent};
use crate::error::{ConversionError, Result};
use crate::source::parse_data_url;
use image::ImageFormat;
use tracing::debug;

/// Media types accepted for image input.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// Reject declared types outside the allow-list. Runs before the source is
/// read.
pub fn check_media_type(declared: &str) -> Result<()> {
    let normalized = normalize_media_type(declared);
    if ALLOWED_IMAGE_TYPES.contains(&normalized.as_str()) {
        Ok(())
    } else {
        Err(ConversionError::UnsupportedMediaType {
            declared: declared.to_string(),
            allowed: ALLOWED_IMAGE_TYPES.to_vec(),
        })
    }
}

/// Lowercase, drop parameters, and fold the non-standard `image/jpg` alias.
fn normalize_media_type(declared: &str) -> String {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        essence
    }
}

/// Decode an image delivered as a data URL.
pub fn extract_data_url(url: &str) -> Result<ExtractedContent> {
    let (_, bytes) = parse_data_url(url)?;
    extract(&bytes)
}

/// Decode PNG or JPEG bytes into a single bitmap page. The declared type may
/// disagree with the content as long as the content is an accepted format.
pub fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
    let format = image::guess_format(bytes)?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(ConversionError::input(
            "image",
            format!("{:?} content is not an accepted image encoding", format),
        ));
    }
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    debug!(
        "Decoded {:?} image {}x{}",
        format,
        decoded.width(),
        decoded.height()
    );
    Ok(ExtractedContent::Raster {
        pages: vec![Bitmap::new(decoded.to_rgba8())],
    })
}
