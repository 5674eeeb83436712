//! Format extractors: raw source content to [`ExtractedContent`].
//!
//! Each submodule handles one family of source formats. [`extract`] routes a
//! read source to the right one.

pub mod image;
pub mod markup;
pub mod pdf;
pub mod sheets;
pub mod slides;
pub mod text;

use crate::capability::CapabilityRegistry;
use crate::config::RenderConfig;
use crate::content::ExtractedContent;
use crate::error::Result;
use crate::source::SourceContent;

/// Source format families, each with its own extraction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Rich document, flattened to text.
    RichDocument,
    /// PDF, one text page per source page.
    PdfText,
    /// PDF, one bitmap per source page.
    PdfRaster,
    /// Slide deck, one text page per slide.
    SlideDeck,
    /// Workbook of named sheets.
    Spreadsheet,
    /// PNG or JPEG bitmap.
    Image,
    /// Unstructured text.
    PlainText,
    /// Comma-separated text.
    DelimitedText,
}

/// Everything an extractor may need besides the source bytes.
pub struct ExtractContext<'a> {
    pub source_name: &'a str,
    pub registry: &'a CapabilityRegistry,
    pub render: &'a RenderConfig,
}

/// Turn read source content into extracted content.
pub fn extract(
    format: SourceFormat,
    content: SourceContent,
    ctx: &ExtractContext<'_>,
) -> Result<ExtractedContent> {
    match format {
        SourceFormat::RichDocument => {
            markup::extract(ctx.registry.markup()?, &content.into_bytes()?)
        }
        SourceFormat::PdfText => {
            pdf::extract_text(ctx.registry.pdf_engine()?, &content.into_bytes()?, ctx.source_name)
        }
        SourceFormat::PdfRaster => {
            pdf::extract_raster(ctx.registry.pdf_engine()?, &content.into_bytes()?, ctx.render)
        }
        SourceFormat::SlideDeck => slides::extract(&content.into_bytes()?, ctx.source_name),
        SourceFormat::Spreadsheet => sheets::extract(
            ctx.registry.spreadsheet()?,
            &content.into_bytes()?,
            ctx.source_name,
        ),
        SourceFormat::Image => match content {
            SourceContent::DataUrl(url) => image::extract_data_url(&url),
            other => image::extract(&other.into_bytes()?),
        },
        SourceFormat::PlainText => Ok(text::extract(&content.into_text()?)),
        SourceFormat::DelimitedText => {
            sheets::extract_delimited(&text::normalize_newlines(&content.into_text()?))
        }
    }
}
