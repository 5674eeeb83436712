//! Byte source adapter: the selected file as bytes, text or a data URL.

use crate::error::{ConversionError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// How a conversion wants its source delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// The full byte buffer.
    Bytes,
    /// A full-text decode.
    Text,
    /// A base64 `data:` URL.
    DataUrl,
}

/// A source read in one of the [`ReadMode`]s.
#[derive(Debug, Clone)]
pub enum SourceContent {
    Bytes(Vec<u8>),
    Text(String),
    DataUrl(String),
}

impl SourceContent {
    /// Byte view of the content, decoding data URLs.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            SourceContent::Bytes(bytes) => Ok(bytes),
            SourceContent::Text(text) => Ok(text.into_bytes()),
            SourceContent::DataUrl(url) => parse_data_url(&url).map(|(_, bytes)| bytes),
        }
    }

    /// Text view of the content.
    pub fn into_text(self) -> Result<String> {
        match self {
            SourceContent::Text(text) => Ok(text),
            other => Ok(decode_text(&other.into_bytes()?)),
        }
    }
}

/// A user-selected file, owned by the conversion call that reads it.
///
/// Reads suspend in browser builds, so every accessor is async. Nothing is
/// read until the pipeline asks for it.
#[allow(async_fn_in_trait)]
pub trait ByteSource {
    /// Declared file name.
    fn name(&self) -> &str;

    /// Declared MIME-type-like tag, possibly empty.
    fn mime_type(&self) -> &str;

    /// Read the whole file into memory.
    async fn read_bytes(&self) -> Result<Vec<u8>>;

    /// Read the whole file as text.
    async fn read_text(&self) -> Result<String> {
        Ok(decode_text(&self.read_bytes().await?))
    }

    /// Read the whole file as a base64 data URL.
    async fn read_data_url(&self) -> Result<String> {
        let bytes = self.read_bytes().await?;
        Ok(to_data_url(self.mime_type(), &bytes))
    }

    /// Read the file in the requested mode.
    async fn read(&self, mode: ReadMode) -> Result<SourceContent> {
        Ok(match mode {
            ReadMode::Bytes => SourceContent::Bytes(self.read_bytes().await?),
            ReadMode::Text => SourceContent::Text(self.read_text().await?),
            ReadMode::DataUrl => SourceContent::DataUrl(self.read_data_url().await?),
        })
    }
}

/// An immutable in-memory file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    /// Create a source file from its declared name, type and contents.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ByteSource for SourceFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Decode text the way a browser `readAsText` does: UTF-8 with replacement,
/// minus a leading byte order mark.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Build a `data:<mime>;base64,<payload>` URL.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let mime = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its media type and decoded payload.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ConversionError::input("data URL", "missing 'data:' scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ConversionError::input("data URL", "missing payload separator"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ConversionError::input("data URL", "payload is not base64"))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ConversionError::input("data URL", e.to_string()))?;
    Ok((mime.to_ascii_lowercase(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip_keeps_mime() {
        let url = to_data_url("image/png", &[0x89, b'P', b'N', b'G']);
        assert!(url.starts_with("data:image/png;base64,"));
        let (mime, bytes) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_data_url_without_mime_uses_octet_stream() {
        let url = to_data_url("", b"x");
        assert!(url.starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn test_parse_data_url_rejects_non_base64() {
        assert!(parse_data_url("data:text/plain,hello").is_err());
        assert!(parse_data_url("http://example.com").is_err());
        assert!(parse_data_url("data:image/png;base64").is_err());
    }

    #[test]
    fn test_decode_text_strips_bom_and_replaces_invalid() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello"), "hello");
        assert_eq!(decode_text(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn test_source_file_reads_in_every_mode() {
        let file = SourceFile::new("notes.txt", "text/plain", b"hi".to_vec());
        assert_eq!(file.name(), "notes.txt");
        assert_eq!(file.len(), 2);

        match file.read(ReadMode::Bytes).await.unwrap() {
            SourceContent::Bytes(b) => assert_eq!(b, b"hi"),
            other => panic!("unexpected {:?}", other),
        }
        match file.read(ReadMode::Text).await.unwrap() {
            SourceContent::Text(t) => assert_eq!(t, "hi"),
            other => panic!("unexpected {:?}", other),
        }
        let content = file.read(ReadMode::DataUrl).await.unwrap();
        assert_eq!(content.into_bytes().unwrap(), b"hi");
    }
}
