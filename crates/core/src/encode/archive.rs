//! ZIP archive output.

use crate::error::{ConversionError, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the `index`-th (1-based) page image of `stem`.
pub fn page_entry_name(stem: &str, index: usize, extension: &str) -> String {
    format!("{}_page_{}.{}", stem, index, extension)
}

/// Write `(name, data)` entries, in order, into a deflated ZIP archive.
pub fn encode<'a, I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (String, &'a [u8])>,
{
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, data) in entries {
        writer
            .start_file(name, options)
            .map_err(|e| ConversionError::encoding("ZIP", e.to_string()))?;
        writer
            .write_all(data)
            .map_err(|e| ConversionError::encoding("ZIP", e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| ConversionError::encoding("ZIP", e.to_string()))?;
    Ok(cursor.into_inner())
}
