//! Intermediate content produced by the extractors.

use crate::error::{ConversionError, Result};
use image::{Rgba, RgbaImage};

/// Placeholder line used when an extractor finds nothing to show.
pub fn placeholder_line(source_name: &str) -> String {
    format!("(Content was extracted from {})", source_name)
}

/// A decoded RGBA bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// An opaque white bitmap.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbaImage::from_pixel(
            width.max(1),
            height.max(1),
            Rgba([255, 255, 255, 255]),
        ))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    /// Composite transparent pixels onto an opaque background.
    pub fn flatten(mut self, background: (u8, u8, u8)) -> Self {
        let (r, g, b) = background;
        for pixel in self.image.pixels_mut() {
            let alpha = pixel[3] as f32 / 255.0;
            if alpha < 1.0 {
                let inv_alpha = 1.0 - alpha;
                pixel[0] = ((pixel[0] as f32 * alpha) + (r as f32 * inv_alpha)) as u8;
                pixel[1] = ((pixel[1] as f32 * alpha) + (g as f32 * inv_alpha)) as u8;
                pixel[2] = ((pixel[2] as f32 * alpha) + (b as f32 * inv_alpha)) as u8;
                pixel[3] = 255;
            }
        }
        self
    }

    /// Packed RGB samples with transparency composited onto `background`.
    pub fn to_rgb_bytes(&self, background: (u8, u8, u8)) -> Vec<u8> {
        let (r, g, b) = background;
        let mut out = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for pixel in self.image.pixels() {
            let alpha = pixel[3] as u32;
            let inv = 255 - alpha;
            out.push(((pixel[0] as u32 * alpha + r as u32 * inv) / 255) as u8);
            out.push(((pixel[1] as u32 * alpha + g as u32 * inv) / 255) as u8);
            out.push(((pixel[2] as u32 * alpha + b as u32 * inv) / 255) as u8);
        }
        out
    }
}

/// One source page of text: an optional heading and its lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPage {
    pub heading: Option<String>,
    pub lines: Vec<String>,
}

impl TextPage {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            heading: None,
            lines,
        }
    }

    pub fn with_heading(heading: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            lines,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Type a raw delimited-text field: numbers and booleans become typed
    /// cells, everything else stays text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Cell::Number(n);
            }
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "TRUE" => Cell::Bool(true),
            "FALSE" => Cell::Bool(false),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// Display form used when the sheet is serialized to delimited text.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A named sheet of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Serialize to delimited text, one record per line, with RFC 4180
    /// quoting. Trailing empty cells of a row are kept so columns stay
    /// aligned.
    pub fn to_delimited(&self, delimiter: u8) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(Vec::new());
        for row in &self.rows {
            writer
                .write_record(row.iter().map(Cell::display))
                .map_err(|e| ConversionError::encoding("CSV", e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ConversionError::encoding("CSV", e.to_string()))?;
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

/// Sheets in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// What an extractor hands to the layout engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    /// Unstructured text.
    PlainText { body: String },
    /// Text split by source page (slide, sheet, PDF page).
    PagedText { pages: Vec<TextPage> },
    /// One decoded bitmap per page.
    Raster { pages: Vec<Bitmap> },
    /// Typed sheets, kept structured for spreadsheet targets.
    Tabular(Workbook),
}

impl ExtractedContent {
    pub fn plain(body: impl Into<String>) -> Self {
        ExtractedContent::PlainText { body: body.into() }
    }

    /// Paged text that is never empty: zero pages become one page holding the
    /// placeholder line.
    pub fn paged_or_placeholder(pages: Vec<TextPage>, placeholder: impl Into<String>) -> Self {
        if pages.is_empty() {
            tracing::warn!("No pages extracted; substituting placeholder page");
            return ExtractedContent::PagedText {
                pages: vec![TextPage::new(vec![placeholder.into()])],
            };
        }
        ExtractedContent::PagedText { pages }
    }

    /// Number of source units (pages, sheets, bitmaps); plain text counts as one.
    pub fn unit_count(&self) -> usize {
        match self {
            ExtractedContent::PlainText { .. } => 1,
            ExtractedContent::PagedText { pages } => pages.len(),
            ExtractedContent::Raster { pages } => pages.len(),
            ExtractedContent::Tabular(workbook) => workbook.sheets.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_fills_transparent_pixels() {
        let bitmap = Bitmap::new(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let out = bitmap.flatten((255, 255, 255));
        assert!(out.as_rgba().pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_flatten_keeps_opaque_and_blends_partial() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
        let out = Bitmap::new(image).flatten((200, 200, 200));
        assert_eq!(*out.as_rgba().get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        let p = out.as_rgba().get_pixel(1, 0);
        assert_eq!(p[3], 255);
        assert!((98..=100).contains(&p[0]), "got {}", p[0]);
    }

    #[test]
    fn test_paged_or_placeholder_substitutes_single_page() {
        let content = ExtractedContent::paged_or_placeholder(vec![], "(nothing here)");
        match content {
            ExtractedContent::PagedText { pages } => {
                assert_eq!(pages.len(), 1);
                assert_eq!(pages[0].lines, vec!["(nothing here)".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_paged_or_placeholder_keeps_empty_pages() {
        let content =
            ExtractedContent::paged_or_placeholder(vec![TextPage::default()], "(unused)");
        assert_eq!(content.unit_count(), 1);
        if let ExtractedContent::PagedText { pages } = content {
            assert!(pages[0].lines.is_empty());
        }
    }

    #[test]
    fn test_cell_inference() {
        assert_eq!(Cell::infer("42"), Cell::Number(42.0));
        assert_eq!(Cell::infer(" 3.5 "), Cell::Number(3.5));
        assert_eq!(Cell::infer("true"), Cell::Bool(true));
        assert_eq!(Cell::infer(""), Cell::Empty);
        assert_eq!(Cell::infer("inf"), Cell::Text("inf".to_string()));
        assert_eq!(Cell::infer("abc"), Cell::Text("abc".to_string()));
    }

    #[test]
    fn test_sheet_to_delimited_quotes_when_needed() {
        let sheet = Sheet::new(
            "Data",
            vec![
                vec![Cell::Text("name".into()), Cell::Text("note".into())],
                vec![Cell::Text("a,b".into()), Cell::Text("say \"hi\"".into())],
                vec![Cell::Number(1.0), Cell::Number(2.5)],
                vec![Cell::Bool(false), Cell::Empty],
            ],
        );
        assert_eq!(
            sheet.to_delimited(b',').unwrap(),
            "name,note\n\"a,b\",\"say \"\"hi\"\"\"\n1,2.5\nFALSE,"
        );
    }

    #[test]
    fn test_sheet_to_delimited_quotes_line_breaks_and_other_delimiters() {
        let sheet = Sheet::new(
            "Data",
            vec![
                vec![Cell::Text("two\nlines".into()), Cell::Text("x;y".into())],
                vec![Cell::Text("short".into())],
            ],
        );
        assert_eq!(
            sheet.to_delimited(b';').unwrap(),
            "\"two\nlines\";\"x;y\"\nshort"
        );
        assert_eq!(Sheet::new("Empty", vec![]).to_delimited(b',').unwrap(), "");
    }

    #[test]
    fn test_bitmap_rgb_composites_on_background() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let rgb = Bitmap::new(image).to_rgb_bytes((255, 255, 255));
        assert_eq!(rgb, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_blank_bitmap_is_white_and_non_empty() {
        let bitmap = Bitmap::blank(0, 3);
        assert_eq!(bitmap.width(), 1);
        assert_eq!(bitmap.height(), 3);
        assert_eq!(bitmap.as_rgba().get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }
}
