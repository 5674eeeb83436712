//! A browser `File` as a [`ByteSource`].

use conversion_heaven_core::{ByteSource, ConversionError, Result};
use js_sys::Uint8Array;
use wasm_bindgen_futures::JsFuture;

/// Wraps a user-selected `File`. Contents are only read when a conversion
/// asks for them.
pub struct BrowserFile {
    file: web_sys::File,
    name: String,
    mime_type: String,
}

impl BrowserFile {
    pub fn new(file: web_sys::File) -> Self {
        let name = file.name();
        let mime_type = file.type_();
        Self {
            file,
            name,
            mime_type,
        }
    }

    /// Size reported by the browser, in bytes.
    pub fn size(&self) -> f64 {
        self.file.size()
    }
}

impl ByteSource for BrowserFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        let buffer = JsFuture::from(self.file.array_buffer())
            .await
            .map_err(|e| ConversionError::SourceRead(crate::describe(&e)))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }

    async fn read_text(&self) -> Result<String> {
        let text = JsFuture::from(self.file.text())
            .await
            .map_err(|e| ConversionError::SourceRead(crate::describe(&e)))?;
        text.as_string()
            .ok_or_else(|| ConversionError::SourceRead(format!("{} is not text", self.name)))
    }
}
