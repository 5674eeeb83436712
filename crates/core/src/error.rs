//! Error types for the conversion pipeline.

use crate::capability::Capability;
use thiserror::Error;

/// Prefix of every message shown to the user for a failed conversion.
pub const FAILURE_PREFIX: &str = "Conversion failed: ";

/// Main error type for the conversion pipeline.
///
/// Every variant is terminal for the conversion that produced it: nothing is
/// retried and no partial output is delivered.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// One or more external codecs are unavailable. Nothing was attempted.
    #[error(
        "Required libraries failed to load: {}. Please check your installation and reload.",
        join_capabilities(.missing)
    )]
    MissingCapability { missing: Vec<Capability> },

    /// The declared media type is outside the allow-list for this conversion.
    #[error("Unsupported media type '{declared}'. Supported: {}", .allowed.join(", "))]
    UnsupportedMediaType {
        declared: String,
        allowed: Vec<&'static str>,
    },

    /// The bytes do not match the format the extractor expects.
    #[error("Unsupported {format} input: {message}")]
    UnsupportedInput {
        format: &'static str,
        message: String,
    },

    /// The audio stream could not be decoded at all.
    #[error("Unsupported audio codec: {0}")]
    UnsupportedAudioCodec(String),

    /// An encoder rejected well-formed intermediate data.
    #[error("{format} encoding failed: {message}")]
    EncodingFailure {
        format: &'static str,
        message: String,
    },

    /// The source file could not be read.
    #[error("Failed to read source file: {0}")]
    SourceRead(String),

    /// No conversion is registered under this id.
    #[error("Unknown conversion '{0}'")]
    UnknownConversion(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ConversionError>;

fn join_capabilities(missing: &[Capability]) -> String {
    missing
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConversionError {
    pub(crate) fn input(format: &'static str, message: impl Into<String>) -> Self {
        ConversionError::UnsupportedInput {
            format,
            message: message.into(),
        }
    }

    pub(crate) fn encoding(format: &'static str, message: impl Into<String>) -> Self {
        ConversionError::EncodingFailure {
            format,
            message: message.into(),
        }
    }

    /// The single human-readable message surfaced for this failure.
    pub fn user_message(&self) -> String {
        format!("{}{}", FAILURE_PREFIX, self)
    }
}

impl From<zip::result::ZipError> for ConversionError {
    fn from(e: zip::result::ZipError) -> Self {
        ConversionError::input("archive", e.to_string())
    }
}

impl From<quick_xml::Error> for ConversionError {
    fn from(e: quick_xml::Error) -> Self {
        ConversionError::input("XML", e.to_string())
    }
}

impl From<calamine::Error> for ConversionError {
    fn from(e: calamine::Error) -> Self {
        ConversionError::input("spreadsheet", e.to_string())
    }
}

impl From<image::ImageError> for ConversionError {
    fn from(e: image::ImageError) -> Self {
        ConversionError::input("image", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capability_lists_every_name() {
        let err = ConversionError::MissingCapability {
            missing: vec![Capability::Markup, Capability::PdfEngine],
        };
        let msg = err.to_string();
        assert!(msg.contains("markup, pdf-engine"), "got: {}", msg);
    }

    #[test]
    fn test_unsupported_media_type_display() {
        let err = ConversionError::UnsupportedMediaType {
            declared: "image/gif".to_string(),
            allowed: vec!["image/png", "image/jpeg"],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("image/gif"));
        assert!(msg.contains("image/png, image/jpeg"));
    }

    #[test]
    fn test_unsupported_input_display() {
        let err = ConversionError::input("presentation", "not a zip archive");
        assert_eq!(
            err.to_string(),
            "Unsupported presentation input: not a zip archive"
        );
    }

    #[test]
    fn test_encoding_failure_display() {
        let err = ConversionError::encoding("MP3", "encoder rejected block");
        assert_eq!(err.to_string(), "MP3 encoding failed: encoder rejected block");
    }

    #[test]
    fn test_user_message_has_fixed_prefix() {
        let err = ConversionError::UnsupportedAudioCodec("no tracks".to_string());
        let msg = err.user_message();
        assert!(msg.starts_with(FAILURE_PREFIX));
        assert!(msg.ends_with("Unsupported audio codec: no tracks"));
    }

    #[test]
    fn test_error_from_zip_error() {
        let err: ConversionError = zip::result::ZipError::FileNotFound.into();
        match err {
            ConversionError::UnsupportedInput { format, .. } => assert_eq!(format, "archive"),
            _ => panic!("Expected UnsupportedInput"),
        }
    }

    #[test]
    fn test_error_debug_impl() {
        let err = ConversionError::SourceRead("permission denied".to_string());
        let debug = format!("{:?}", err);
        assert!(debug.contains("SourceRead"));
        assert!(debug.contains("permission denied"));
    }
}
