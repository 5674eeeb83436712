//! Typed registry of the external codecs the pipeline depends on.
//!
//! Each capability is an optional trait object. A conversion names the
//! capabilities it needs and the registry checks all of them up front, so a
//! missing codec is reported before any byte of the source is read.

use crate::audio::DecodedAudio;
use crate::content::{Bitmap, Workbook};
use crate::error::{ConversionError, Result};
use crate::extract::markup::MarkupNode;
use crate::layout::PageBlock;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Identifier of an external capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Rich-document markup to an HTML-like tree.
    Markup,
    /// PDF page counting, text extraction and rasterization.
    PdfEngine,
    /// PDF document construction from laid-out pages.
    PdfWriter,
    /// Packaged-document (.docx) assembly.
    DocumentPackaging,
    /// Spreadsheet read and write.
    Spreadsheet,
    /// Block-wise MP3 encoding.
    Mp3Encoding,
    /// Compressed/container audio decoding.
    AudioDecoding,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Markup,
        Capability::PdfEngine,
        Capability::PdfWriter,
        Capability::DocumentPackaging,
        Capability::Spreadsheet,
        Capability::Mp3Encoding,
        Capability::AudioDecoding,
    ];

    /// Stable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Markup => "markup",
            Capability::PdfEngine => "pdf-engine",
            Capability::PdfWriter => "pdf-writer",
            Capability::DocumentPackaging => "document-packaging",
            Capability::Spreadsheet => "spreadsheet",
            Capability::Mp3Encoding => "mp3-encoding",
            Capability::AudioDecoding => "audio-decoding",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Converts a rich document into an HTML-like tree.
pub trait MarkupConverter {
    fn convert(&self, bytes: &[u8]) -> Result<MarkupNode>;
}

/// Opens PDF documents.
pub trait PdfEngine {
    /// Load a document. The handle borrows the bytes and is released when
    /// dropped.
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn PdfHandle + 'a>>;
}

/// A loaded PDF document, scoped to one conversion call.
pub trait PdfHandle {
    fn page_count(&self) -> usize;

    /// Text of a page (0-based), one line per text line.
    fn page_text(&self, index: usize) -> Result<String>;

    /// Rasterize a page (0-based) at `scale` pixels per point.
    fn render_page(&self, index: usize, scale: f32) -> Result<Bitmap>;
}

/// Builds a PDF document from laid-out pages, keeping their order.
pub trait PdfWriter {
    fn write(&self, pages: &[PageBlock]) -> Result<Vec<u8>>;
}

/// Assembles a packaged document from paragraph text.
pub trait DocumentPackager {
    /// `pages` holds one paragraph per string; each inner vector after the
    /// first starts on a new page.
    fn package(&self, pages: &[Vec<String>]) -> Result<Vec<u8>>;
}

/// Reads and writes spreadsheet workbooks.
pub trait SpreadsheetCodec {
    fn read(&self, bytes: &[u8]) -> Result<Workbook>;
    fn write(&self, workbook: &Workbook) -> Result<Vec<u8>>;
}

/// Encodes PCM blocks into MP3 frames.
pub trait BlockEncoder {
    /// Encode one block of samples; may return no bytes while the encoder
    /// fills its lookahead.
    fn encode_block(&mut self, left: &[i16], right: &[i16]) -> Result<Vec<u8>>;

    /// Drain buffered state.
    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Creates stereo MP3 block encoders.
pub trait Mp3EncoderFactory {
    fn create(&self, sample_rate: u32, bitrate_kbps: u32) -> Result<Box<dyn BlockEncoder>>;
}

/// Decodes a whole compressed or container audio stream.
pub trait AudioDecoder {
    /// `extension_hint` is the source file extension, if any.
    fn decode(&self, bytes: &[u8], extension_hint: Option<&str>) -> Result<DecodedAudio>;
}

/// One optional handle per [`Capability`].
#[derive(Default)]
pub struct CapabilityRegistry {
    markup: Option<Box<dyn MarkupConverter>>,
    pdf: Option<Box<dyn PdfEngine>>,
    pdf_writer: Option<Box<dyn PdfWriter>>,
    packaging: Option<Box<dyn DocumentPackager>>,
    spreadsheet: Option<Box<dyn SpreadsheetCodec>>,
    mp3: Option<Box<dyn Mp3EncoderFactory>>,
    audio: Option<Box<dyn AudioDecoder>>,
}

impl CapabilityRegistry {
    /// A registry with nothing available.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry populated with the built-in implementations.
    ///
    /// The PDF engine is only registered when the pdfium library can be
    /// bound, and the MP3 encoder only when the `lame` feature is enabled.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty()
            .with_markup(crate::extract::markup::DocxMarkupConverter)
            .with_pdf_writer(crate::encode::pdf::LopdfWriter)
            .with_packaging(crate::encode::docx::DocxPackager)
            .with_spreadsheet(crate::extract::sheets::OfficeSpreadsheetCodec)
            .with_audio_decoder(crate::audio::SymphoniaDecoder);

        match crate::pdf_renderer::PdfiumEngine::bind() {
            Ok(engine) => registry = registry.with_pdf_engine(engine),
            Err(e) => warn!("PDF engine unavailable: {}", e),
        }

        #[cfg(feature = "lame")]
        {
            registry = registry.with_mp3_encoder(crate::audio::lame::LameEncoderFactory);
        }

        debug!("Capabilities available: {:?}", registry.available());
        registry
    }

    pub fn with_markup(mut self, markup: impl MarkupConverter + 'static) -> Self {
        self.markup = Some(Box::new(markup));
        self
    }

    pub fn with_pdf_engine(mut self, engine: impl PdfEngine + 'static) -> Self {
        self.pdf = Some(Box::new(engine));
        self
    }

    pub fn with_pdf_writer(mut self, writer: impl PdfWriter + 'static) -> Self {
        self.pdf_writer = Some(Box::new(writer));
        self
    }

    pub fn with_packaging(mut self, packager: impl DocumentPackager + 'static) -> Self {
        self.packaging = Some(Box::new(packager));
        self
    }

    pub fn with_spreadsheet(mut self, codec: impl SpreadsheetCodec + 'static) -> Self {
        self.spreadsheet = Some(Box::new(codec));
        self
    }

    pub fn with_mp3_encoder(mut self, factory: impl Mp3EncoderFactory + 'static) -> Self {
        self.mp3 = Some(Box::new(factory));
        self
    }

    pub fn with_audio_decoder(mut self, decoder: impl AudioDecoder + 'static) -> Self {
        self.audio = Some(Box::new(decoder));
        self
    }

    /// Whether a capability has a registered handle.
    pub fn is_available(&self, capability: Capability) -> bool {
        match capability {
            Capability::Markup => self.markup.is_some(),
            Capability::PdfEngine => self.pdf.is_some(),
            Capability::PdfWriter => self.pdf_writer.is_some(),
            Capability::DocumentPackaging => self.packaging.is_some(),
            Capability::Spreadsheet => self.spreadsheet.is_some(),
            Capability::Mp3Encoding => self.mp3.is_some(),
            Capability::AudioDecoding => self.audio.is_some(),
        }
    }

    /// Every capability with a registered handle.
    pub fn available(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.is_available(*c))
            .collect()
    }

    /// Pre-flight check: fails once, naming every missing capability.
    pub fn check(&self, required: &[Capability]) -> Result<()> {
        let missing: Vec<Capability> = required
            .iter()
            .copied()
            .filter(|c| !self.is_available(*c))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConversionError::MissingCapability { missing })
        }
    }

    pub fn markup(&self) -> Result<&dyn MarkupConverter> {
        self.markup.as_deref().ok_or_else(|| missing(Capability::Markup))
    }

    pub fn pdf_engine(&self) -> Result<&dyn PdfEngine> {
        self.pdf.as_deref().ok_or_else(|| missing(Capability::PdfEngine))
    }

    pub fn pdf_writer(&self) -> Result<&dyn PdfWriter> {
        self.pdf_writer
            .as_deref()
            .ok_or_else(|| missing(Capability::PdfWriter))
    }

    pub fn packaging(&self) -> Result<&dyn DocumentPackager> {
        self.packaging
            .as_deref()
            .ok_or_else(|| missing(Capability::DocumentPackaging))
    }

    pub fn spreadsheet(&self) -> Result<&dyn SpreadsheetCodec> {
        self.spreadsheet
            .as_deref()
            .ok_or_else(|| missing(Capability::Spreadsheet))
    }

    pub fn mp3_encoder(&self) -> Result<&dyn Mp3EncoderFactory> {
        self.mp3.as_deref().ok_or_else(|| missing(Capability::Mp3Encoding))
    }

    pub fn audio_decoder(&self) -> Result<&dyn AudioDecoder> {
        self.audio
            .as_deref()
            .ok_or_else(|| missing(Capability::AudioDecoding))
    }
}

fn missing(capability: Capability) -> ConversionError {
    ConversionError::MissingCapability {
        missing: vec![capability],
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("available", &self.available())
            .finish()
    }
}
