//! Format encoders: laid-out pages (or a workbook) to output bytes.
//!
//! Encoders write pages in the order given and never reorder them.

pub mod archive;
pub mod docx;
pub mod pdf;
pub mod png;
pub mod xlsx;

/// Output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Pdf,
    Docx,
    Xlsx,
    /// One PNG for a single page, a ZIP of PNGs otherwise.
    PngOrArchive,
    Mp3,
}

/// Target extensions and their container MIME tags.
pub mod mime {
    pub const PDF: &str = "application/pdf";
    pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    pub const PNG: &str = "image/png";
    pub const ZIP: &str = "application/zip";
    pub const MP3: &str = "audio/mpeg";
}
