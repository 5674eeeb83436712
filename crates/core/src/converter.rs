//! Conversion catalogue and the orchestrator that runs one conversion.
//!
//! A [`ConversionKind`] fixes everything about a conversion except the input:
//! how the source is read, which extractor and layout apply, which encoder
//! produces the output and which capabilities must be present.
//! [`Converter::convert`] runs the chain for one source:
//!
//! 1. pre-flight capability check (all missing capabilities reported at once)
//! 2. media-type allow-list check
//! 3. read the source in the kind's read mode
//! 4. extract, paginate, encode
//!
//! Nothing is read from the source before steps 1 and 2 pass.

use crate::audio;
use crate::capability::{Capability, CapabilityRegistry};
use crate::config::{ConverterConfig, LayoutConfig, TextMetrics};
use crate::content::ExtractedContent;
use crate::encode::{self, mime, TargetFormat};
use crate::error::{ConversionError, Result};
use crate::extract::{self, ExtractContext, SourceFormat};
use crate::layout::paginate;
use crate::source::{ByteSource, ReadMode};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// How the source-extension is removed from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixRule {
    /// Strip the first matching suffix, compared case-insensitively.
    Known(&'static [&'static str]),
    /// Strip whatever follows the last dot.
    AnyExtension,
}

impl SuffixRule {
    /// The file name without its source extension. Names that do not match
    /// are kept whole.
    pub fn strip<'a>(&self, name: &'a str) -> &'a str {
        match self {
            SuffixRule::Known(suffixes) => {
                let lower = name.to_ascii_lowercase();
                suffixes
                    .iter()
                    .find(|suffix| lower.ends_with(*suffix))
                    .map(|suffix| &name[..name.len() - suffix.len()])
                    .unwrap_or(name)
            }
            SuffixRule::AnyExtension => match name.rfind('.') {
                Some(dot) if dot + 1 < name.len() => &name[..dot],
                _ => name,
            },
        }
    }
}

/// Every supported conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    WordToPdf,
    PdfToWord,
    PptToPdf,
    ExcelToPdf,
    ImageToPdf,
    PdfToImage,
    TxtToPdf,
    TxtToWord,
    CsvToExcel,
    #[serde(alias = "audio-to-mp3")]
    VideoToAudio,
}

impl ConversionKind {
    pub const ALL: [ConversionKind; 10] = [
        ConversionKind::WordToPdf,
        ConversionKind::PdfToWord,
        ConversionKind::PptToPdf,
        ConversionKind::ExcelToPdf,
        ConversionKind::ImageToPdf,
        ConversionKind::PdfToImage,
        ConversionKind::TxtToPdf,
        ConversionKind::TxtToWord,
        ConversionKind::CsvToExcel,
        ConversionKind::VideoToAudio,
    ];

    /// Wire id, e.g. `word-to-pdf`.
    pub fn id(&self) -> &'static str {
        match self {
            ConversionKind::WordToPdf => "word-to-pdf",
            ConversionKind::PdfToWord => "pdf-to-word",
            ConversionKind::PptToPdf => "ppt-to-pdf",
            ConversionKind::ExcelToPdf => "excel-to-pdf",
            ConversionKind::ImageToPdf => "image-to-pdf",
            ConversionKind::PdfToImage => "pdf-to-image",
            ConversionKind::TxtToPdf => "txt-to-pdf",
            ConversionKind::TxtToWord => "txt-to-word",
            ConversionKind::CsvToExcel => "csv-to-excel",
            ConversionKind::VideoToAudio => "video-to-audio",
        }
    }

    /// Resolve a wire id. `audio-to-mp3` is an alias of `video-to-audio`.
    pub fn from_id(id: &str) -> Result<Self> {
        if id == "audio-to-mp3" {
            return Ok(ConversionKind::VideoToAudio);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| ConversionError::UnknownConversion(id.to_string()))
    }

    pub fn read_mode(&self) -> ReadMode {
        match self {
            ConversionKind::ImageToPdf => ReadMode::DataUrl,
            ConversionKind::TxtToPdf | ConversionKind::TxtToWord | ConversionKind::CsvToExcel => {
                ReadMode::Text
            }
            _ => ReadMode::Bytes,
        }
    }

    pub fn suffix_rule(&self) -> SuffixRule {
        match self {
            ConversionKind::WordToPdf => SuffixRule::Known(&[".docx", ".doc"]),
            ConversionKind::PdfToWord | ConversionKind::PdfToImage => SuffixRule::Known(&[".pdf"]),
            ConversionKind::PptToPdf => SuffixRule::Known(&[".pptx", ".ppt"]),
            ConversionKind::ExcelToPdf => SuffixRule::Known(&[".xlsx", ".xls"]),
            ConversionKind::TxtToPdf | ConversionKind::TxtToWord => SuffixRule::Known(&[".txt"]),
            ConversionKind::CsvToExcel => SuffixRule::Known(&[".csv"]),
            ConversionKind::ImageToPdf | ConversionKind::VideoToAudio => SuffixRule::AnyExtension,
        }
    }

    pub fn target(&self) -> TargetFormat {
        match self {
            ConversionKind::PdfToWord | ConversionKind::TxtToWord => TargetFormat::Docx,
            ConversionKind::PdfToImage => TargetFormat::PngOrArchive,
            ConversionKind::CsvToExcel => TargetFormat::Xlsx,
            ConversionKind::VideoToAudio => TargetFormat::Mp3,
            _ => TargetFormat::Pdf,
        }
    }

    /// Capabilities checked before anything is read.
    pub fn required_capabilities(&self) -> &'static [Capability] {
        match self {
            ConversionKind::WordToPdf => &[Capability::Markup, Capability::PdfWriter],
            ConversionKind::PdfToWord => &[Capability::PdfEngine, Capability::DocumentPackaging],
            ConversionKind::ExcelToPdf => &[Capability::Spreadsheet, Capability::PdfWriter],
            ConversionKind::CsvToExcel => &[Capability::Spreadsheet],
            ConversionKind::PdfToImage => &[Capability::PdfEngine],
            ConversionKind::TxtToWord => &[Capability::DocumentPackaging],
            ConversionKind::VideoToAudio => &[Capability::AudioDecoding, Capability::Mp3Encoding],
            ConversionKind::PptToPdf | ConversionKind::ImageToPdf | ConversionKind::TxtToPdf => {
                &[Capability::PdfWriter]
            }
        }
    }

    /// Extractor for page-producing kinds; `None` for the audio path.
    pub fn source_format(&self) -> Option<SourceFormat> {
        Some(match self {
            ConversionKind::WordToPdf => SourceFormat::RichDocument,
            ConversionKind::PdfToWord => SourceFormat::PdfText,
            ConversionKind::PptToPdf => SourceFormat::SlideDeck,
            ConversionKind::ExcelToPdf => SourceFormat::Spreadsheet,
            ConversionKind::ImageToPdf => SourceFormat::Image,
            ConversionKind::PdfToImage => SourceFormat::PdfRaster,
            ConversionKind::TxtToPdf | ConversionKind::TxtToWord => SourceFormat::PlainText,
            ConversionKind::CsvToExcel => SourceFormat::DelimitedText,
            ConversionKind::VideoToAudio => return None,
        })
    }

    /// Layout preset on the configured page geometry.
    pub fn layout(&self, config: &ConverterConfig) -> LayoutConfig {
        let page = config.page;
        match self {
            ConversionKind::PdfToWord | ConversionKind::TxtToWord => LayoutConfig::flowing(page),
            ConversionKind::PptToPdf => {
                LayoutConfig::paged(page, TextMetrics::new(12.0, 16.0)).page_label("Slide")
            }
            ConversionKind::ExcelToPdf => LayoutConfig::paged(page, TextMetrics::new(10.0, 14.0))
                .heading(TextMetrics::new(14.0, 24.0)),
            ConversionKind::TxtToPdf => LayoutConfig::paged(page, TextMetrics::new(11.0, 15.0)),
            ConversionKind::PdfToImage => LayoutConfig::raster(),
            _ => LayoutConfig::paged(page, TextMetrics::new(12.0, 16.0)),
        }
    }

    /// File-picker style accept patterns: `.ext`, `type/*` or an exact type.
    pub fn accept(&self) -> &'static [&'static str] {
        match self {
            ConversionKind::WordToPdf => &[".doc", ".docx"],
            ConversionKind::PdfToWord | ConversionKind::PdfToImage => &[".pdf"],
            ConversionKind::PptToPdf => &[".ppt", ".pptx"],
            ConversionKind::ExcelToPdf => &[".xls", ".xlsx"],
            ConversionKind::ImageToPdf => extract::image::ALLOWED_IMAGE_TYPES,
            ConversionKind::TxtToPdf | ConversionKind::TxtToWord => &[".txt", "text/plain"],
            ConversionKind::CsvToExcel => &[".csv", "text/csv"],
            ConversionKind::VideoToAudio => &["video/*", "audio/*"],
        }
    }

    /// Whether a dropped file matches [`accept`](Self::accept).
    pub fn accepts(&self, name: &str, mime_type: &str) -> bool {
        is_file_accepted(self.accept(), name, mime_type)
    }

    /// Reject declared media types outside the kind's allow-list.
    pub fn check_media_type(&self, declared: &str) -> Result<()> {
        match self {
            ConversionKind::ImageToPdf => extract::image::check_media_type(declared),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ConversionKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(s)
    }
}

/// Match a file against accept patterns. An empty pattern list accepts
/// everything.
pub fn is_file_accepted(patterns: &[&str], name: &str, mime_type: &str) -> bool {
    if patterns.is_empty() {
        return true;
    }
    let name = name.to_ascii_lowercase();
    let mime_type = mime_type.to_ascii_lowercase();
    patterns.iter().any(|pattern| {
        let pattern = pattern.trim().to_ascii_lowercase();
        if pattern.starts_with('.') {
            name.ends_with(&pattern)
        } else if let Some(prefix) = pattern.strip_suffix("/*") {
            mime_type.starts_with(&format!("{}/", prefix))
        } else {
            mime_type == pattern
        }
    })
}

/// Output file name for a source name and target extension.
pub fn output_filename(source_name: &str, kind: ConversionKind, extension: &str) -> String {
    format!("{}.{}", kind.suffix_rule().strip(source_name), extension)
}

/// The finished output of one conversion, handed once to delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
}

/// A conversion that failed inside a batch.
#[derive(Debug)]
pub struct FailedConversion {
    pub source_name: String,
    pub error: ConversionError,
}

/// Result of [`Converter::convert_batch`].
#[derive(Debug, Default)]
pub struct BatchResult {
    pub successful: Vec<OutputArtifact>,
    pub failed: Vec<FailedConversion>,
    pub total_duration: Duration,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs conversions against a capability registry.
///
/// The converter holds only configuration and read-only capability handles;
/// each call owns its own transient state.
#[derive(Debug)]
pub struct Converter {
    config: ConverterConfig,
    registry: CapabilityRegistry,
}

impl Converter {
    /// Create a converter with the given configuration and capabilities.
    pub fn new(config: ConverterConfig, registry: CapabilityRegistry) -> Result<Self> {
        config.validate()?;
        info!(
            "Converter ready with capabilities {:?}",
            registry.available()
        );
        Ok(Self { config, registry })
    }

    /// Default configuration and the built-in capabilities.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ConverterConfig::default(), CapabilityRegistry::with_defaults())
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Convert one source file.
    pub async fn convert<S: ByteSource + ?Sized>(
        &self,
        kind: ConversionKind,
        source: &S,
    ) -> Result<OutputArtifact> {
        let start = Instant::now();
        info!("Converting {} ({})", source.name(), kind);

        self.registry.check(kind.required_capabilities())?;
        kind.check_media_type(source.mime_type())?;

        let content = source.read(kind.read_mode()).await?;
        debug!("Read {} as {:?}", source.name(), kind.read_mode());

        let artifact = match kind.source_format() {
            Some(format) => {
                let ctx = ExtractContext {
                    source_name: source.name(),
                    registry: &self.registry,
                    render: &self.config.render,
                };
                let extracted = extract::extract(format, content, &ctx)?;
                debug!("Extracted {} content units", extracted.unit_count());
                self.encode(kind, source.name(), extracted)?
            }
            None => {
                let bytes = content.into_bytes()?;
                let hint = source
                    .name()
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_ascii_lowercase());
                let mp3 = audio::reencode(
                    self.registry.audio_decoder()?,
                    self.registry.mp3_encoder()?,
                    &self.config.audio,
                    &bytes,
                    hint.as_deref(),
                )?;
                OutputArtifact {
                    bytes: mp3,
                    filename: output_filename(source.name(), kind, "mp3"),
                    mime_type: mime::MP3,
                }
            }
        };

        info!(
            "Converted {} to {} ({} bytes) in {:?}",
            source.name(),
            artifact.filename,
            artifact.bytes.len(),
            start.elapsed()
        );
        Ok(artifact)
    }

    fn encode(
        &self,
        kind: ConversionKind,
        source_name: &str,
        extracted: ExtractedContent,
    ) -> Result<OutputArtifact> {
        let artifact = |bytes, extension, mime_type| OutputArtifact {
            bytes,
            filename: output_filename(source_name, kind, extension),
            mime_type,
        };

        if kind.target() == TargetFormat::Xlsx {
            let ExtractedContent::Tabular(workbook) = extracted else {
                return Err(ConversionError::encoding(
                    "XLSX",
                    "only tabular content can be written as a workbook",
                ));
            };
            let bytes = encode::xlsx::encode(self.registry.spreadsheet()?, &workbook)?;
            return Ok(artifact(bytes, "xlsx", mime::XLSX));
        }

        let pages = paginate(extracted, &kind.layout(&self.config));
        match kind.target() {
            TargetFormat::Pdf => {
                let bytes = encode::pdf::encode(self.registry.pdf_writer()?, &pages)?;
                Ok(artifact(bytes, "pdf", mime::PDF))
            }
            TargetFormat::Docx => {
                let bytes = encode::docx::encode(self.registry.packaging()?, &pages)?;
                Ok(artifact(bytes, "docx", mime::DOCX))
            }
            TargetFormat::PngOrArchive => {
                let mut images = encode::png::encode_pages(&pages)?;
                if images.len() == 1 {
                    let png = images.remove(0);
                    return Ok(artifact(png, "png", mime::PNG));
                }
                let stem = kind.suffix_rule().strip(source_name);
                let entries = images.iter().enumerate().map(|(i, png)| {
                    (
                        encode::archive::page_entry_name(stem, i + 1, "png"),
                        png.as_slice(),
                    )
                });
                let zip = encode::archive::encode(entries)?;
                Ok(artifact(zip, "zip", mime::ZIP))
            }
            TargetFormat::Xlsx | TargetFormat::Mp3 => Err(ConversionError::encoding(
                "pages",
                format!("{} does not produce paged output", kind),
            )),
        }
    }

    /// Convert several sources one after another. Each conversion is
    /// independent: a failure is recorded and the batch continues.
    pub async fn convert_batch<S: ByteSource>(
        &self,
        requests: Vec<(ConversionKind, S)>,
    ) -> BatchResult {
        let start = Instant::now();
        let outcomes: Vec<(String, Result<OutputArtifact>)> = stream::iter(requests)
            .then(|(kind, source)| async move {
                let result = self.convert(kind, &source).await;
                (source.name().to_string(), result)
            })
            .collect()
            .await;

        let mut batch = BatchResult::default();
        for (source_name, outcome) in outcomes {
            match outcome {
                Ok(artifact) => batch.successful.push(artifact),
                Err(e) => {
                    error!("Failed to convert {}: {}", source_name, e);
                    batch.failed.push(FailedConversion {
                        source_name,
                        error: e,
                    });
                }
            }
        }
        batch.total_duration = start.elapsed();
        batch
    }
}
