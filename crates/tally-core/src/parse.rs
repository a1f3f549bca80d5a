//! File parsing: delimited text and spreadsheets into rows of raw cells
//!
//! The parser does not interpret cells. Values come back exactly as stored in
//! the file, empty cells become `""`, and rows whose cells are all blank are
//! dropped and counted.

use std::io::Read;
use std::path::Path;

use calamine::{Data, Reader};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};

/// Rows of raw cell text
pub type Rows = Vec<Vec<String>>;

/// The table read from one file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFile {
    pub rows: Rows,
    /// Rows dropped because every cell was blank
    pub empty_rows: usize,
    /// One-based file line (or sheet row) of each kept row. Empty means the
    /// rows are numbered consecutively from 1.
    pub lines: Vec<usize>,
}

impl ParsedFile {
    /// Rows with no blank lines dropped before them
    pub fn from_rows(rows: Rows) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// One-based source line of the row at `index`
    pub fn line_of(&self, index: usize) -> usize {
        self.lines.get(index).copied().unwrap_or(index + 1)
    }

    /// Cell count of the first row, header or data
    pub fn column_count(&self) -> Option<usize> {
        self.rows.first().map(|r| r.len())
    }
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl FileFormat {
    /// Pick a format from the file extension. Unknown extensions are read as CSV.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Self::Spreadsheet,
            "tsv" | "tab" => Self::Tsv,
            _ => Self::Csv,
        }
    }
}

/// Parse a file on disk, choosing the reader from its extension
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let parsed = match FileFormat::from_path(path) {
        FileFormat::Spreadsheet => parse_spreadsheet(path)?,
        FileFormat::Tsv => parse_delimited(std::fs::File::open(path)?, b'\t')?,
        FileFormat::Csv => parse_delimited(std::fs::File::open(path)?, b',')?,
    };
    debug!(
        path = %path.display(),
        rows = parsed.rows.len(),
        empty_rows = parsed.empty_rows,
        "Parsed file"
    );
    Ok(parsed)
}

/// Parse delimited text
pub fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> Result<ParsedFile> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut parsed = ParsedFile::default();
    for (index, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| Error::Parse(format!("line {}: {}", index + 1, e)))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        if index == 0 {
            if let Some(first) = cells.first_mut() {
                if let Some(stripped) = first.strip_prefix('\u{feff}') {
                    *first = stripped.to_string();
                }
            }
        }
        push_row(&mut parsed, line, cells);
    }

    if parsed.rows.is_empty() {
        return Err(no_rows(&parsed, "file"));
    }
    Ok(parsed)
}

/// Parse the first worksheet of a spreadsheet
pub fn parse_spreadsheet(path: &Path) -> Result<ParsedFile> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| Error::Parse(format!("failed to open spreadsheet: {}", e)))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::Parse("spreadsheet has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| Error::Parse(format!("failed to read sheet '{}': {}", sheet, e)))?;

    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut parsed = ParsedFile::default();
    for (index, row) in range.rows().enumerate() {
        push_row(
            &mut parsed,
            first_row + index + 1,
            row.iter().map(cell_to_string).collect(),
        );
    }

    if parsed.rows.is_empty() {
        return Err(no_rows(&parsed, &format!("sheet '{}'", sheet)));
    }
    Ok(parsed)
}

fn push_row(parsed: &mut ParsedFile, line: usize, cells: Vec<String>) {
    if cells.iter().all(|c| c.trim().is_empty()) {
        parsed.empty_rows += 1;
    } else {
        parsed.rows.push(cells);
        parsed.lines.push(line);
    }
}

fn no_rows(parsed: &ParsedFile, what: &str) -> Error {
    if parsed.empty_rows > 0 {
        Error::Parse(format!("{} contains only blank rows", what))
    } else {
        Error::Parse(format!("{} contains no rows", what))
    }
}

/// Render a spreadsheet cell the way it would appear in a CSV export
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::Error(e) => format!("#{:?}", e),
    }
}

/// Convert a spreadsheet serial day number to a date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounts for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::TimeDelta::try_days(serial.trunc() as i64)?)
}
