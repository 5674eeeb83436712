//! PDF output for laid-out pages, built with lopdf.
//!
//! Text uses the standard Helvetica faces with WinAnsi encoding, so no font
//! data is embedded. Bitmaps become RGB image XObjects; every stream is
//! Flate-compressed before saving.

use crate::capability::PdfWriter;
use crate::error::{ConversionError, Result};
use crate::layout::{PageBlock, PageContent, PlacedImage, PlacedLine};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Background composited under transparent image pixels.
const WHITE: (u8, u8, u8) = (255, 255, 255);

const IMAGE_NAME: &str = "Im1";

fn pdf_error(e: impl std::fmt::Display) -> ConversionError {
    ConversionError::encoding("PDF", e.to_string())
}

/// A coordinate rounded to hundredths; whole values stay integers.
fn num(value: f32) -> Object {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        Object::Integer(rounded as i64)
    } else {
        Object::Real(rounded.into())
    }
}

/// Map a character to its WinAnsi code, or `?` when it has none.
fn win_ansi(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\t' => b' ',
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => b'?',
    }
}

fn win_ansi_string(text: &str) -> Object {
    Object::String(text.chars().map(win_ansi).collect(), StringFormat::Literal)
}

fn text_operations(ops: &mut Vec<Operation>, line: &PlacedLine, page_height: f32) {
    if line.text.is_empty() {
        return;
    }
    let font = if line.emphasis { "F2" } else { "F1" };
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), num(line.font_size)]));
    ops.push(Operation::new(
        "Td",
        vec![num(line.x), num(page_height - line.y)],
    ));
    ops.push(Operation::new("Tj", vec![win_ansi_string(&line.text)]));
    ops.push(Operation::new("ET", vec![]));
}

fn image_operations(ops: &mut Vec<Operation>, image: &PlacedImage, page_height: f32) {
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![
            num(image.width),
            Object::Integer(0),
            Object::Integer(0),
            num(image.height),
            num(image.x),
            num(page_height - image.y - image.height),
        ],
    ));
    ops.push(Operation::new("Do", vec![IMAGE_NAME.into()]));
    ops.push(Operation::new("Q", vec![]));
}

fn type1_font(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Add one page object and return its id.
fn add_page(
    doc: &mut Document,
    page: &PageBlock,
    pages_id: ObjectId,
    fonts: Dictionary,
) -> Result<ObjectId> {
    let mut ops = Vec::new();
    let mut resources = dictionary! { "Font" => fonts };

    match &page.content {
        PageContent::Text(lines) => {
            for line in lines {
                text_operations(&mut ops, line, page.height);
            }
        }
        PageContent::Image(image) => {
            let bitmap = &image.bitmap;
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => bitmap.width() as i64,
                    "Height" => bitmap.height() as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                },
                bitmap.to_rgb_bytes(WHITE),
            ));
            resources.set("XObject", dictionary! { IMAGE_NAME => image_id });
            image_operations(&mut ops, image, page.height);
        }
    }

    let content = Content { operations: ops }.encode().map_err(pdf_error)?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), num(page.width), num(page.height)],
        "Resources" => resources,
        "Contents" => content_id,
    }))
}

/// [`PdfWriter`] backed by lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfWriter;

impl PdfWriter for LopdfWriter {
    fn write(&self, pages: &[PageBlock]) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(type1_font("Helvetica"));
        let bold_id = doc.add_object(type1_font("Helvetica-Bold"));
        let fonts = dictionary! { "F1" => regular_id, "F2" => bold_id };

        let mut kids = Vec::with_capacity(pages.len());
        for page in pages {
            let page_id = add_page(&mut doc, page, pages_id, fonts.clone())?;
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(pdf_error)?;
        debug!("Wrote PDF with {} pages ({} bytes)", pages.len(), bytes.len());
        Ok(bytes)
    }
}

/// Write pages, in order, through the PDF writer capability.
pub fn encode(writer: &dyn PdfWriter, pages: &[PageBlock]) -> Result<Vec<u8>> {
    writer.write(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, PageGeometry, TextMetrics};
    use crate::content::{Bitmap, ExtractedContent};
    use crate::layout::paginate;

    fn config() -> LayoutConfig {
        LayoutConfig::paged(PageGeometry::default(), TextMetrics::new(12.0, 16.0))
    }

    fn write(content: ExtractedContent) -> Document {
        let pages = paginate(content, &config());
        let bytes = encode(&LopdfWriter, &pages).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        Document::load_mem(&bytes).unwrap()
    }

    /// Decoded content operations of every page, in page order.
    fn page_operations(doc: &Document) -> Vec<Vec<Operation>> {
        doc.get_pages()
            .values()
            .map(|id| {
                let data = doc.get_page_content(*id).unwrap();
                Content::decode(&data).unwrap().operations
            })
            .collect()
    }

    fn operands(ops: &[Operation], operator: &str) -> Vec<Vec<Object>> {
        ops.iter()
            .filter(|op| op.operator == operator)
            .map(|op| op.operands.clone())
            .collect()
    }

    fn floats(objects: &[Object]) -> Vec<f32> {
        objects.iter().map(|o| o.as_float().unwrap()).collect()
    }

    fn shown_text(ops: &[Operation]) -> Vec<Vec<u8>> {
        operands(ops, "Tj")
            .into_iter()
            .map(|o| o[0].as_str().unwrap().to_vec())
            .collect()
    }

    #[test]
    fn test_num_rounds_to_hundredths() {
        assert_eq!(num(40.0), Object::Integer(40));
        assert_eq!(num(-0.001), Object::Integer(0));
        assert!((num(595.28).as_float().unwrap() - 595.28).abs() < 1e-3);
        assert!((num(12.504).as_float().unwrap() - 12.5).abs() < 1e-3);
    }

    #[test]
    fn test_strings_map_to_win_ansi() {
        assert_eq!(win_ansi_string("a(b)"), Object::string_literal("a(b)"));
        assert_eq!(
            win_ansi_string("é…中"),
            Object::String(vec![0xE9, 0x85, b'?'], StringFormat::Literal)
        );
    }

    #[test]
    fn test_single_page_with_media_box() {
        let doc = write(ExtractedContent::plain("hello\nworld"));
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page = doc.get_dictionary(pages[&1]).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let media_box = floats(media_box);
        assert_eq!(media_box[..2], [0.0, 0.0]);
        assert!((media_box[2] - 595.28).abs() < 1e-3);
        assert!((media_box[3] - 841.89).abs() < 1e-3);
    }

    #[test]
    fn test_text_is_placed_with_flipped_y() {
        let doc = write(ExtractedContent::plain("hello"));
        let ops = &page_operations(&doc)[0];

        let tf = &operands(ops, "Tf")[0];
        assert_eq!(tf[0].as_name().unwrap(), b"F1");
        assert_eq!(tf[1].as_float().unwrap(), 12.0);

        let td = floats(&operands(ops, "Td")[0]);
        assert_eq!(td[0], 40.0);
        assert!((td[1] - 801.89).abs() < 1e-3);
        assert_eq!(shown_text(ops), vec![b"hello".to_vec()]);
    }

    #[test]
    fn test_pages_keep_input_order() {
        let body = (0..60).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n");
        let doc = write(ExtractedContent::plain(body));
        let pages = page_operations(&doc);
        assert_eq!(pages.len(), 2);
        assert_eq!(shown_text(&pages[0])[0], b"line0".to_vec());
        assert_eq!(shown_text(&pages[1])[0], b"line48".to_vec());
    }

    #[test]
    fn test_image_page_embeds_rgb_xobject() {
        let doc = write(ExtractedContent::Raster {
            pages: vec![Bitmap::blank(4, 2)],
        });

        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..]))
            .unwrap();
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 4);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 2);
        let pixels = image
            .decompressed_content()
            .unwrap_or_else(|_| image.content.clone());
        assert_eq!(pixels, vec![255u8; 4 * 2 * 3]);

        let ops = &page_operations(&doc)[0];
        let cm = floats(&operands(ops, "cm")[0]);
        assert_eq!(cm[..5], [4.0, 0.0, 0.0, 2.0, 40.0]);
        assert!((cm[5] - 799.89).abs() < 1e-3);
        assert_eq!(operands(ops, "Do")[0][0].as_name().unwrap(), b"Im1");
    }
}
