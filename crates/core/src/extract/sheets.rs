//! Spreadsheet and delimited-text extraction, plus the default
//! [`SpreadsheetCodec`].

use crate::capability::SpreadsheetCodec;
use crate::content::{placeholder_line, Cell, ExtractedContent, Sheet, Workbook};
use crate::error::{ConversionError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use std::io::Cursor;
use tracing::{debug, warn};

/// Name given to the single sheet built from delimited text.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Longest sheet name accepted by spreadsheet writers.
const MAX_SHEET_NAME: usize = 31;

/// calamine for reading (xlsx, xls, xlsb, ods), rust_xlsxwriter for writing.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfficeSpreadsheetCodec;

impl SpreadsheetCodec for OfficeSpreadsheetCodec {
    fn read(&self, bytes: &[u8]) -> Result<Workbook> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let (first_row, first_col) = range.start().unwrap_or((0, 0));

            // Ranges start at the first used cell; pad back to A1.
            let mut rows: Vec<Vec<Cell>> = (0..first_row).map(|_| Vec::new()).collect();
            for row in range.rows() {
                let mut cells: Vec<Cell> = (0..first_col).map(|_| Cell::Empty).collect();
                cells.extend(row.iter().map(cell_from_data));
                rows.push(cells);
            }
            sheets.push(Sheet::new(name, rows));
        }
        debug!("Read workbook with sheets {:?}", sheets.iter().map(|s| &s.name).collect::<Vec<_>>());
        Ok(Workbook::new(sheets))
    }

    fn write(&self, workbook: &Workbook) -> Result<Vec<u8>> {
        let mut out = XlsxWorkbook::new();
        for sheet in &workbook.sheets {
            let worksheet = out.add_worksheet();
            worksheet
                .set_name(sanitize_sheet_name(&sheet.name))
                .map_err(|e| ConversionError::encoding("XLSX", e.to_string()))?;

            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let (r, c) = (r as u32, c as u16);
                    let written = match cell {
                        Cell::Empty => continue,
                        Cell::Text(s) => worksheet.write_string(r, c, s),
                        Cell::Number(n) => worksheet.write_number(r, c, *n),
                        Cell::Bool(b) => worksheet.write_boolean(r, c, *b),
                    };
                    written.map_err(|e| ConversionError::encoding("XLSX", e.to_string()))?;
                }
            }
        }
        out.save_to_buffer()
            .map_err(|e| ConversionError::encoding("XLSX", e.to_string()))
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Text(dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Strip characters spreadsheet writers reject and cap the length.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.trim().is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a spreadsheet into structured sheets. A workbook without sheets
/// becomes one sheet holding the placeholder line.
pub fn extract(
    codec: &dyn SpreadsheetCodec,
    bytes: &[u8],
    source_name: &str,
) -> Result<ExtractedContent> {
    let mut workbook = codec.read(bytes)?;
    if workbook.sheets.is_empty() {
        warn!("No sheets in {}; substituting placeholder sheet", source_name);
        workbook.sheets.push(Sheet::new(
            DEFAULT_SHEET_NAME,
            vec![vec![Cell::Text(placeholder_line(source_name))]],
        ));
    }
    Ok(ExtractedContent::Tabular(workbook))
}

/// Parse delimited text into a one-sheet workbook. Records may have
/// different lengths; numeric and boolean fields are typed.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Workbook> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ConversionError::input("CSV", e.to_string()))?;
        rows.push(record.iter().map(Cell::infer).collect());
    }
    Ok(Workbook::new(vec![Sheet::new(DEFAULT_SHEET_NAME, rows)]))
}

/// Delimited text as tabular content.
pub fn extract_delimited(text: &str) -> Result<ExtractedContent> {
    Ok(ExtractedContent::Tabular(parse_delimited(text, b',')?))
}
