//! Extraction from already-paginated PDF documents.

use crate::capability::PdfEngine;
use crate::config::{RenderConfig, A4_HEIGHT, A4_WIDTH};
use crate::content::{placeholder_line, Bitmap, ExtractedContent, TextPage};
use crate::error::Result;
use tracing::{debug, warn};

/// Rasterize every page, in order, at the configured scale, over the
/// configured background.
///
/// A document without pages yields one blank A4 page at the same scale.
pub fn extract_raster(
    engine: &dyn PdfEngine,
    bytes: &[u8],
    render: &RenderConfig,
) -> Result<ExtractedContent> {
    let document = engine.open(bytes)?;
    let count = document.page_count();
    debug!("Rasterizing {} pages at scale {}", count, render.scale);

    let mut pages = Vec::with_capacity(count.max(1));
    for index in 0..count {
        let bitmap = document.render_page(index, render.scale)?;
        pages.push(bitmap.flatten(render.background_color));
    }

    if pages.is_empty() {
        warn!("Document has no pages; substituting a blank page");
        pages.push(Bitmap::blank(
            (A4_WIDTH * render.scale).round() as u32,
            (A4_HEIGHT * render.scale).round() as u32,
        ));
    }
    Ok(ExtractedContent::Raster { pages })
}

/// Text of every page, one output page per source page.
pub fn extract_text(
    engine: &dyn PdfEngine,
    bytes: &[u8],
    source_name: &str,
) -> Result<ExtractedContent> {
    let document = engine.open(bytes)?;
    let mut pages = Vec::with_capacity(document.page_count());
    for index in 0..document.page_count() {
        let text = document.page_text(index)?;
        let lines = text
            .lines()
            .map(|l| l.trim_end().to_string())
            .collect();
        pages.push(TextPage::new(lines));
    }
    Ok(ExtractedContent::paged_or_placeholder(
        pages,
        placeholder_line(source_name),
    ))
}
