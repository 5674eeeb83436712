//! Layout and pagination of extracted content into page-sized blocks.
//!
//! Coordinates are in points with the origin at the top-left corner of the
//! page; a text line's `y` is its baseline. Glyph widths use a fixed-width
//! approximation of half the font size per character.

use crate::config::{LayoutConfig, TextMetrics};
use crate::content::{Bitmap, ExtractedContent, TextPage};
use tracing::{debug, warn};

/// Width of one glyph relative to the font size.
pub const GLYPH_ADVANCE: f32 = 0.5;

/// Marker appended to truncated lines.
pub const ELLIPSIS: char = '…';

const TAB_WIDTH: usize = 4;

/// A text line positioned on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// Headings are drawn in the bold face.
    pub emphasis: bool,
}

/// A bitmap positioned and scaled on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub bitmap: Bitmap,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    Text(Vec<PlacedLine>),
    Image(PlacedImage),
}

/// One page's worth of laid-out content.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBlock {
    pub width: f32,
    pub height: f32,
    pub content: PageContent,
}

impl PageBlock {
    /// Text lines of the page; empty for image pages.
    pub fn lines(&self) -> &[PlacedLine] {
        match &self.content {
            PageContent::Text(lines) => lines,
            PageContent::Image(_) => &[],
        }
    }

    pub fn image(&self) -> Option<&PlacedImage> {
        match &self.content {
            PageContent::Image(image) => Some(image),
            PageContent::Text(_) => None,
        }
    }
}

/// Scale factor fitting a `width` x `height` box inside `max_width` x
/// `max_height`. Never greater than 1.
pub fn fit_ratio(width: f32, height: f32, max_width: f32, max_height: f32) -> f32 {
    if width <= 0.0 || height <= 0.0 {
        return 1.0;
    }
    (max_width / width).min(max_height / height).min(1.0)
}

/// Characters of `font_size` text that fit in `max_width`; at least one.
pub fn chars_per_line(max_width: f32, font_size: f32) -> usize {
    let advance = GLYPH_ADVANCE * font_size;
    if advance <= 0.0 {
        return usize::MAX;
    }
    ((max_width / advance).floor() as usize).max(1)
}

/// Greedy word wrap of a single line. Words longer than the width are split
/// across lines; an empty input yields one empty line.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let max_chars = chars_per_line(max_width, font_size);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        let mut word_len = word.chars().count();

        while word_len > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let split = word
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
            word_len -= max_chars;
        }
        if word.is_empty() {
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shorten `line` to at most `max_chars` characters, ending in an ellipsis
/// when anything was cut.
pub fn truncate_with_ellipsis(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = line.chars().take(max_chars - 1).collect();
    out.push(ELLIPSIS);
    out
}

fn expand_tabs(line: &str) -> String {
    line.replace('\t', &" ".repeat(TAB_WIDTH))
}

/// Accumulates placed lines and cuts pages.
struct Paginator<'a> {
    config: &'a LayoutConfig,
    pages: Vec<PageBlock>,
    lines: Vec<PlacedLine>,
    y: f32,
}

impl<'a> Paginator<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            lines: Vec::new(),
            y: config.geometry.margin,
        }
    }

    fn finish_page(&mut self) {
        let geometry = &self.config.geometry;
        self.pages.push(PageBlock {
            width: geometry.width,
            height: geometry.height,
            content: PageContent::Text(std::mem::take(&mut self.lines)),
        });
        self.y = geometry.margin;
    }

    fn place(&mut self, text: String, metrics: TextMetrics, emphasis: bool) {
        if !self.config.flowing && self.y > self.config.geometry.bottom_limit() {
            self.finish_page();
        }
        self.lines.push(PlacedLine {
            text,
            x: self.config.geometry.margin,
            y: self.y,
            font_size: metrics.font_size,
            emphasis,
        });
        self.y += metrics.line_height;
    }

    fn place_heading(&mut self, heading: &str) {
        let metrics = self.config.heading;
        let max_chars = chars_per_line(self.config.geometry.printable_width(), metrics.font_size);
        self.place(truncate_with_ellipsis(heading, max_chars), metrics, true);
    }

    fn place_body(&mut self, line: &str) {
        let metrics = self.config.body;
        if self.config.wrap {
            let width = self.config.geometry.printable_width();
            for wrapped in wrap_text(&expand_tabs(line), width, metrics.font_size) {
                self.place(wrapped, metrics, false);
            }
        } else {
            self.place(line.to_string(), metrics, false);
        }
    }

    fn text_pages(&mut self, pages: Vec<TextPage>) {
        for (i, page) in pages.into_iter().enumerate() {
            if i > 0 {
                self.finish_page();
            }
            let heading = page.heading.or_else(|| {
                self.config
                    .page_label
                    .as_ref()
                    .map(|label| format!("{} {}", label, i + 1))
            });
            if let Some(heading) = heading {
                self.place_heading(&heading);
            }
            for line in &page.lines {
                self.place_body(line);
            }
        }
        self.finish_page();
    }

    fn bitmap_page(&mut self, bitmap: Bitmap) {
        let (w, h) = (bitmap.width() as f32, bitmap.height() as f32);
        let page = if self.config.fit_page_to_bitmap {
            PageBlock {
                width: w,
                height: h,
                content: PageContent::Image(PlacedImage {
                    bitmap,
                    x: 0.0,
                    y: 0.0,
                    width: w,
                    height: h,
                }),
            }
        } else {
            let geometry = &self.config.geometry;
            let ratio = fit_ratio(w, h, geometry.printable_width(), geometry.printable_height());
            PageBlock {
                width: geometry.width,
                height: geometry.height,
                content: PageContent::Image(PlacedImage {
                    bitmap,
                    x: geometry.margin,
                    y: geometry.margin,
                    width: w * ratio,
                    height: h * ratio,
                }),
            }
        };
        self.pages.push(page);
    }
}

/// Lay out content into pages. Always returns at least one page.
pub fn paginate(content: ExtractedContent, config: &LayoutConfig) -> Vec<PageBlock> {
    let mut paginator = Paginator::new(config);

    match content {
        ExtractedContent::PlainText { body } => {
            if !body.is_empty() {
                for line in body.split('\n') {
                    paginator.place_body(line);
                }
            }
            paginator.finish_page();
        }
        ExtractedContent::PagedText { pages } => paginator.text_pages(pages),
        ExtractedContent::Tabular(workbook) => {
            let pages = workbook
                .sheets
                .iter()
                .map(|sheet| {
                    let body = sheet.to_delimited(b',').unwrap_or_else(|e| {
                        warn!("Sheet {} could not be serialized: {}", sheet.name, e);
                        String::new()
                    });
                    TextPage::with_heading(
                        format!("Sheet: {}", sheet.name),
                        body.split('\n').map(str::to_string).collect(),
                    )
                })
                .collect();
            paginator.text_pages(pages);
        }
        ExtractedContent::Raster { pages } => {
            for bitmap in pages {
                paginator.bitmap_page(bitmap);
            }
        }
    }

    let mut pages = paginator.pages;
    if pages.is_empty() {
        pages.push(PageBlock {
            width: config.geometry.width,
            height: config.geometry.height,
            content: PageContent::Text(Vec::new()),
        });
    }
    debug!("Laid out {} pages", pages.len());
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageGeometry, A4_HEIGHT, A4_WIDTH};
    use crate::content::{Cell, Sheet, Workbook};

    fn text_config() -> LayoutConfig {
        LayoutConfig::paged(PageGeometry::default(), TextMetrics::new(12.0, 16.0))
    }

    #[test]
    fn test_fit_ratio_never_upscales() {
        assert_eq!(fit_ratio(100.0, 50.0, 500.0, 700.0), 1.0);
        let r = fit_ratio(2000.0, 1000.0, 500.0, 700.0);
        assert!(r <= 1.0);
        assert!((r - 0.25).abs() < 1e-6);
        let r = fit_ratio(100.0, 1400.0, 500.0, 700.0);
        assert!((r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_text_greedy() {
        // 12pt glyphs are 6pt wide: 60pt holds 10 characters.
        let lines = wrap_text("the quick brown fox jumps", 60.0, 12.0);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn test_wrap_text_hard_wraps_long_words() {
        let lines = wrap_text("abcdefghijklmnopqrstuvwxy z", 60.0, 12.0);
        assert_eq!(lines, vec!["abcdefghij", "klmnopqrst", "uvwxy z"]);
    }

    #[test]
    fn test_wrap_text_keeps_empty_and_short_lines() {
        assert_eq!(wrap_text("", 60.0, 12.0), vec![""]);
        assert_eq!(wrap_text("  indented", 60.0, 12.0), vec!["  indented"]);
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("a long heading", 6), "a lon…");
        assert_eq!(truncate_with_ellipsis("abc", 0), "");
    }

    #[test]
    fn test_empty_body_yields_one_page_without_lines() {
        let pages = paginate(ExtractedContent::plain(""), &text_config());
        assert_eq!(pages.len(), 1);
        assert!(pages[0].lines().is_empty());
        assert_eq!((pages[0].width, pages[0].height), (A4_WIDTH, A4_HEIGHT));
    }

    #[test]
    fn test_lines_overflow_onto_new_pages() {
        // Baselines at 40, 56, ... stay on the page while y <= 801.89: 48 lines.
        let body = vec!["x"; 100].join("\n");
        let pages = paginate(ExtractedContent::plain(body), &text_config());
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].lines().len(), 48);
        assert_eq!(pages[1].lines().len(), 48);
        assert_eq!(pages[2].lines().len(), 4);
        assert_eq!(pages[1].lines()[0].y, 40.0);
        let last = pages[0].lines().last().unwrap();
        assert!(last.y <= PageGeometry::default().bottom_limit());
    }

    #[test]
    fn test_blank_lines_are_placed() {
        let pages = paginate(ExtractedContent::plain("line1\n\nline3"), &text_config());
        let texts: Vec<&str> = pages[0].lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["line1", "", "line3"]);
        assert_eq!(pages[0].lines()[2].y, 40.0 + 32.0);
    }

    #[test]
    fn test_paged_text_starts_fresh_page_per_source_page_with_labels() {
        let config = text_config().page_label("Slide");
        let content = ExtractedContent::PagedText {
            pages: vec![
                TextPage::new(vec!["a".into()]),
                TextPage::new(vec![]),
                TextPage::new(vec!["c".into()]),
            ],
        };
        let pages = paginate(content, &config);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].lines()[0].text, "Slide 2");
        assert!(pages[1].lines()[0].emphasis);
        assert_eq!(pages[1].lines()[0].font_size, 14.0);
        assert_eq!(pages[2].lines()[1].text, "c");
        assert_eq!(pages[2].lines()[1].y, 40.0 + 24.0);
    }

    #[test]
    fn test_tabular_content_gets_sheet_headings() {
        let workbook = Workbook::new(vec![
            Sheet::new("First", vec![vec![Cell::Text("a".into()), Cell::Number(1.0)]]),
            Sheet::new("Second", vec![]),
        ]);
        let pages = paginate(ExtractedContent::Tabular(workbook), &text_config());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines()[0].text, "Sheet: First");
        assert_eq!(pages[0].lines()[1].text, "a,1");
        assert_eq!(pages[1].lines()[0].text, "Sheet: Second");
    }

    #[test]
    fn test_long_heading_is_truncated_with_ellipsis() {
        let content = ExtractedContent::PagedText {
            pages: vec![TextPage::with_heading("h".repeat(200), vec![])],
        };
        let pages = paginate(content, &text_config());
        let heading = &pages[0].lines()[0].text;
        assert!(heading.ends_with(ELLIPSIS));
        // 515.28pt at 7pt per glyph.
        assert_eq!(heading.chars().count(), 73);
    }

    #[test]
    fn test_flowing_layout_never_breaks_on_height() {
        let config = LayoutConfig::flowing(PageGeometry::default());
        let body = vec!["x".repeat(300); 200].join("\n");
        let pages = paginate(ExtractedContent::plain(body), &config);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines().len(), 200);
        assert_eq!(pages[0].lines()[0].text.len(), 300);
    }

    #[test]
    fn test_bitmap_is_scaled_into_printable_area() {
        let content = ExtractedContent::Raster {
            pages: vec![Bitmap::blank(1030, 100), Bitmap::blank(50, 20)],
        };
        let pages = paginate(content, &text_config());
        assert_eq!(pages.len(), 2);

        let big = pages[0].image().unwrap();
        assert_eq!((big.x, big.y), (40.0, 40.0));
        assert!((big.width - 515.28).abs() < 1e-2);
        assert!(big.width <= 1030.0 && big.height <= 100.0);

        let small = pages[1].image().unwrap();
        assert_eq!((small.width, small.height), (50.0, 20.0));
    }

    #[test]
    fn test_raster_layout_uses_bitmap_size() {
        let content = ExtractedContent::Raster {
            pages: vec![Bitmap::blank(1190, 1684)],
        };
        let pages = paginate(content, &LayoutConfig::raster());
        assert_eq!((pages[0].width, pages[0].height), (1190.0, 1684.0));
    }
}
