//! PNG output for bitmap pages.

use crate::content::Bitmap;
use crate::error::{ConversionError, Result};
use crate::layout::PageBlock;
use std::io::Cursor;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Encode an RGBA bitmap as an 8-bit RGBA PNG.
pub fn encode_bitmap(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let image = bitmap.as_rgba();
    let mut buffer = Cursor::new(Vec::new());

    let mut encoder = png::Encoder::new(&mut buffer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);

    let mut writer = encoder
        .write_header()
        .map_err(|e| ConversionError::encoding("PNG", format!("header: {}", e)))?;
    writer
        .write_image_data(image.as_raw())
        .map_err(|e| ConversionError::encoding("PNG", format!("image data: {}", e)))?;
    drop(writer);

    Ok(buffer.into_inner())
}

/// Encode every image page, in order. Text pages carry no bitmap and are
/// skipped.
pub fn encode_pages(pages: &[PageBlock]) -> Result<Vec<Vec<u8>>> {
    pages
        .iter()
        .filter_map(PageBlock::image)
        .map(|placed| encode_bitmap(&placed.bitmap))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_encode_bitmap_writes_signature() {
        let mut image = RgbaImage::new(10, 10);
        for pixel in image.pixels_mut() {
            *pixel = Rgba([255, 0, 0, 255]);
        }
        let data = encode_bitmap(&Bitmap::new(image)).unwrap();
        assert!(data.len() > 8);
        assert_eq!(&data[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encoded_png_decodes_to_same_pixels() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([0, 255, 0, 128]));
        let data = encode_bitmap(&Bitmap::new(image.clone())).unwrap();
        let decoded = image::load_from_memory(&data).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }
}
