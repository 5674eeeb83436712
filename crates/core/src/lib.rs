//! # conversion-heaven-core
//!
//! Client-side file conversion pipeline: documents, spreadsheets, slide
//! decks, images and audio, converted entirely in memory.
//!
//! Every conversion runs the same chain:
//!
//! - **Byte source**: the selected file as bytes, text or a data URL
//! - **Extractors**: source bytes to text, paged text, a workbook or bitmaps
//! - **Layout**: content to fixed-size pages (A4 by default)
//! - **Encoders**: pages to PDF, DOCX, XLSX, PNG or a ZIP of PNGs
//! - **Audio**: decode, quantize to 16-bit PCM, encode MP3 in 1152-sample
//!   blocks
//!
//! External codecs are reached through a typed [`CapabilityRegistry`] that
//! is checked before a conversion reads anything.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use conversion_heaven_core::{ConversionKind, Converter, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let converter = Converter::with_defaults()?;
//!
//!     let source = SourceFile::new("report.txt", "text/plain", b"line1\n\nline3".to_vec());
//!     let artifact = converter.convert(ConversionKind::TxtToWord, &source).await?;
//!
//!     std::fs::write(&artifact.filename, &artifact.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Dispatch with Delivery
//!
//! ```rust,no_run
//! use conversion_heaven_core::{
//!     ConversionOutcome, Converter, Delivery, Dispatcher, LogObserver, OutputArtifact,
//!     Result, SourceFile,
//! };
//!
//! struct SaveToDisk;
//!
//! impl Delivery for SaveToDisk {
//!     fn deliver(&self, artifact: OutputArtifact) -> Result<()> {
//!         std::fs::write(&artifact.filename, artifact.bytes)
//!             .map_err(|e| conversion_heaven_core::ConversionError::SourceRead(e.to_string()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let converter = Converter::with_defaults()?;
//!     let dispatcher = Dispatcher::new(&converter, SaveToDisk).with_observer(LogObserver);
//!
//!     let source = SourceFile::new("data.csv", "text/csv", b"a,b\n1,2".to_vec());
//!     match dispatcher.run("csv-to-excel", &source).await {
//!         ConversionOutcome::Delivered { filename } => println!("wrote {}", filename),
//!         ConversionOutcome::Failed { message } => eprintln!("{}", message),
//!     }
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod capability;
pub mod config;
pub mod content;
pub mod converter;
pub mod delivery;
pub mod encode;
pub mod error;
pub mod extract;
pub mod layout;
pub mod pdf_renderer;
pub mod source;

// Re-export main types for convenience
pub use capability::{Capability, CapabilityRegistry};
pub use config::{AudioConfig, ConverterConfig, LayoutConfig, PageGeometry, RenderConfig, TextMetrics};
pub use content::{Bitmap, ExtractedContent, Workbook};
pub use converter::{
    is_file_accepted, output_filename, BatchResult, ConversionKind, Converter, OutputArtifact,
};
pub use delivery::{
    ConversionObserver, ConversionOutcome, Delivery, Dispatcher, LogObserver, SilentObserver,
};
pub use error::{ConversionError, Result, FAILURE_PREFIX};
pub use layout::{paginate, PageBlock};
pub use pdf_renderer::PdfiumEngine;
pub use source::{ByteSource, ReadMode, SourceFile};

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
