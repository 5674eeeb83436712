//! Packaged-document (.docx) output.

use crate::capability::DocumentPackager;
use crate::error::{ConversionError, Result};
use crate::layout::PageBlock;
use docx_rs::{BreakType, Docx, Paragraph, Run};
use std::io::Cursor;
use tracing::debug;

/// Text of the paragraph standing in for an empty line, so word processors
/// do not collapse it.
pub const BLANK_PARAGRAPH: &str = "\u{00A0}";

/// [`DocumentPackager`] backed by the docx-rs builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxPackager;

impl DocumentPackager for DocxPackager {
    fn package(&self, pages: &[Vec<String>]) -> Result<Vec<u8>> {
        let mut docx = Docx::new();
        let mut count = 0;

        let blank = [String::new()];
        for (page_index, paragraphs) in pages.iter().enumerate() {
            let page_break = page_index > 0;
            // An empty page still occupies one paragraph.
            let lines = if paragraphs.is_empty() {
                &blank[..]
            } else {
                paragraphs.as_slice()
            };

            for (i, text) in lines.iter().enumerate() {
                let mut paragraph = Paragraph::new();
                if page_break && i == 0 {
                    paragraph = paragraph.add_run(Run::new().add_break(BreakType::Page));
                }
                let text = if text.is_empty() {
                    BLANK_PARAGRAPH
                } else {
                    text.as_str()
                };
                docx = docx.add_paragraph(paragraph.add_run(Run::new().add_text(text)));
                count += 1;
            }
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| ConversionError::encoding("DOCX", e.to_string()))?;
        debug!("Packaged {} paragraphs over {} pages", count, pages.len());
        Ok(cursor.into_inner())
    }
}

/// One paragraph per laid-out line, grouped by page.
pub fn paragraphs(pages: &[PageBlock]) -> Vec<Vec<String>> {
    pages
        .iter()
        .map(|page| page.lines().iter().map(|l| l.text.clone()).collect())
        .collect()
}

/// Package laid-out pages as a document.
pub fn encode(packager: &dyn DocumentPackager, pages: &[PageBlock]) -> Result<Vec<u8>> {
    packager.package(&paragraphs(pages))
}
