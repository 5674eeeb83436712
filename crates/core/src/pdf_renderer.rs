//! PDF page access and rasterization using pdfium (Google's PDF engine).
//!
//! [`PdfiumEngine`] implements [`PdfEngine`]: documents are loaded from an
//! in-memory byte slice and released when the handle is dropped. Rendered
//! pages keep their alpha channel; callers composite a background.

use crate::capability::{PdfEngine, PdfHandle};
use crate::content::Bitmap;
use crate::error::{ConversionError, Result};
use pdfium_render::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

fn pdf_error(e: impl std::fmt::Display) -> ConversionError {
    ConversionError::input("PDF", e.to_string())
}

/// [`PdfEngine`] backed by a bound pdfium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind to pdfium, trying the working directory and the usual library
    /// directories before the system loader.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/usr/local/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(bind_error)?;

        info!("pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind to the pdfium module the host page has already initialized.
    #[cfg(target_arch = "wasm32")]
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_system_library().map_err(bind_error)?;
        info!("pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

fn bind_error(e: PdfiumError) -> ConversionError {
    ConversionError::InvalidConfig(format!("Failed to load pdfium library: {}", e))
}

impl PdfEngine for PdfiumEngine {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn PdfHandle + 'a>> {
        let start = Instant::now();
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| pdf_error(format!("failed to load document: {}", e)))?;
        debug!(
            "Loaded PDF with {} pages in {:?}",
            document.pages().len(),
            start.elapsed()
        );
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| pdf_error(format!("failed to get page {}: {}", index + 1, e)))
    }
}

impl<'a> PdfHandle for PdfiumDocument<'a> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let page = self.page(index)?;
        let text = page
            .text()
            .map_err(|e| pdf_error(format!("failed to read text of page {}: {}", index + 1, e)))?;
        Ok(text.all())
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<Bitmap> {
        let page = self.page(index)?;
        let width = ((page.width().value * scale) as u32).max(1);
        let height = ((page.height().value * scale) as u32).max(1);

        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| pdf_error(format!("failed to render page {}: {}", index + 1, e)))?;

        Ok(Bitmap::new(bitmap.as_image().into_rgba8()))
    }
}
