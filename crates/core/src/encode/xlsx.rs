//! Spreadsheet workbook output.

use crate::capability::SpreadsheetCodec;
use crate::content::Workbook;
use crate::error::Result;
use tracing::debug;

/// Write a workbook through the spreadsheet capability.
pub fn encode(codec: &dyn SpreadsheetCodec, workbook: &Workbook) -> Result<Vec<u8>> {
    debug!("Writing workbook with {} sheets", workbook.sheets.len());
    codec.write(workbook)
}
