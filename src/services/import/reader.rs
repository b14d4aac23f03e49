//! Import file readers: raw bytes -> normalized [`ImportRow`]s
//!
//! CSV files from 1C come in whatever encoding the exporting machine used,
//! so decoding walks a fixed list of encodings. Spreadsheets go through
//! `calamine` (cargo feature `xlsx`).

use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1251;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::ImportRow;

use super::columns::normalize_headers;

/// Batch-fatal import failures: nothing is imported when one of these occurs
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported file format '{0}'. Please use CSV or Excel (.xlsx, .xls)")]
    UnsupportedFormat(String),

    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not decode file. Please ensure it's a valid CSV file.")]
    Decode,

    #[error("Error parsing CSV file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Error parsing Excel file: {0}")]
    Spreadsheet(String),

    #[error(
        "Excel file support is not available in this build. \
         Rebuild with `cargo build --features xlsx` or convert the file to CSV."
    )]
    SpreadsheetSupportUnavailable,

    #[error("{0} file is empty or has no data rows.")]
    NoDataRows(FileKind),
}

/// Supported import file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    /// Detect the kind from a file extension (case-insensitive)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(FileKind::Spreadsheet),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Csv => f.write_str("CSV"),
            FileKind::Spreadsheet => f.write_str("Excel"),
        }
    }
}

/// Text encodings tried for CSV input, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8Bom,
    Utf8,
    /// Also covers "cp1251": same code page
    Windows1251,
    Latin1,
}

impl TextEncoding {
    pub const ORDER: [TextEncoding; 4] = [
        TextEncoding::Utf8Bom,
        TextEncoding::Utf8,
        TextEncoding::Windows1251,
        TextEncoding::Latin1,
    ];

    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8Bom => bytes
                .strip_prefix(b"\xEF\xBB\xBF")
                .and_then(|rest| std::str::from_utf8(rest).ok())
                .map(str::to_string),
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            TextEncoding::Windows1251 => WINDOWS_1251
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

/// Decode file bytes with the first encoding that accepts them
pub fn decode_text(bytes: &[u8]) -> Result<(String, TextEncoding), ImportError> {
    TextEncoding::ORDER
        .iter()
        .find_map(|encoding| encoding.decode(bytes).map(|text| (text, *encoding)))
        .ok_or(ImportError::Decode)
}

/// Pick the CSV delimiter by counting candidates in the header line
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, header.matches(char::from(d)).count()))
        .filter(|(_, count)| *count > 0)
        // max_by_key keeps the last maximum; reverse so ',' wins ties
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

/// Parse CSV bytes into normalized rows
pub fn parse_csv_bytes(bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    let (text, encoding) = decode_text(bytes)?;
    let delimiter = sniff_delimiter(&text);
    debug!(
        "CSV decoded as {:?}, delimiter {:?}",
        encoding,
        char::from(delimiter)
    );

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = normalize_headers(&headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<&str> = record.iter().collect();
        rows.push(ImportRow::from_cells(&columns, &cells));
    }

    if rows.is_empty() {
        return Err(ImportError::NoDataRows(FileKind::Csv));
    }
    Ok(rows)
}

/// Parse spreadsheet bytes (first worksheet) into normalized rows
#[cfg(feature = "xlsx")]
pub fn parse_spreadsheet_bytes(bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    use calamine::{open_workbook_auto_from_rs, Reader};
    use std::io::Cursor;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    rows_from_range(&range)
}

#[cfg(not(feature = "xlsx"))]
pub fn parse_spreadsheet_bytes(_bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    Err(ImportError::SpreadsheetSupportUnavailable)
}

/// Header = first row; fully blank rows are dropped
#[cfg(feature = "xlsx")]
fn rows_from_range(range: &calamine::Range<calamine::Data>) -> Result<Vec<ImportRow>, ImportError> {
    let mut sheet_rows = range.rows();

    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => return Err(ImportError::NoDataRows(FileKind::Spreadsheet)),
    };
    let columns = normalize_headers(&headers);

    let rows: Vec<ImportRow> = sheet_rows
        .map(|cells| cells.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|cells| ImportRow::from_cells(&columns, &cells))
        .collect();

    if rows.is_empty() {
        return Err(ImportError::NoDataRows(FileKind::Spreadsheet));
    }
    Ok(rows)
}

/// Render a cell the way a person would type it: integral floats lose
/// their ".0" so phone numbers stored as numbers survive
#[cfg(feature = "xlsx")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Parse file bytes of a known kind
pub fn parse_bytes(kind: FileKind, bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    match kind {
        FileKind::Csv => parse_csv_bytes(bytes),
        FileKind::Spreadsheet => parse_spreadsheet_bytes(bytes),
    }
}

/// Read and parse an import file, choosing the parser by extension
pub fn read_import_file(path: &Path) -> Result<Vec<ImportRow>, ImportError> {
    if !path.exists() {
        return Err(ImportError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let kind = FileKind::from_extension(extension)
        .ok_or_else(|| ImportError::UnsupportedFormat(extension.to_string()))?;

    info!("Reading {} import file {}", kind, path.display());
    let bytes = std::fs::read(path)?;
    let rows = parse_bytes(kind, &bytes)?;
    info!("Found {} rows to process", rows.len());
    Ok(rows)
}
