//! Row materialization: apply a resolved mapping to parsed rows to produce
//! candidate transactions.
//!
//! Amounts follow one sign rule for single-column files and another for
//! split credit/debit files:
//!
//! - `Amount`: keep digits, `.` and `-`, parse, then negate unless negative
//!   amounts are declared to mean `Debit`.
//! - `Credit`: keep digits and `.`, parse, use as money in.
//! - `Debit`: keep digits and `.`, parse, use as money out (negated).

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::mapping::{AmountColumns, ResolvedMapping};
use crate::models::{CandidateTransaction, Mapping, RowError};

/// Date formats tried in order when no list is configured
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-15
    "%m/%d/%y", // 01/15/24 (before %Y, which would read "24" as year 24)
    "%m/%d/%Y", // 01/15/2024
    "%m-%d-%Y", // 01-15-2024
    "%Y/%m/%d", // 2024/01/15
    "%d/%m/%Y", // 15/01/2024
    "%d.%m.%Y", // 15.01.2024
];

/// Per-import settings for the materializer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Skip the first row
    pub includes_header: bool,
    /// Account name stamped on every candidate
    pub account_name: String,
    /// Date formats tried in order; empty means [`DEFAULT_DATE_FORMATS`]
    pub date_formats: Vec<String>,
}

impl MaterializeOptions {
    /// Options for importing with a stored mapping.
    ///
    /// An import-time header flag wins over the mapping's, and a non-empty
    /// account override wins over the mapping's account name.
    pub fn for_mapping(
        mapping: &Mapping,
        includes_header: Option<bool>,
        account_override: Option<&str>,
    ) -> Self {
        let account_name = match account_override {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => mapping.account_name.clone(),
        };
        Self {
            includes_header: includes_header.unwrap_or(mapping.includes_header),
            account_name,
            date_formats: Vec::new(),
        }
    }

    pub fn with_date_formats(mut self, formats: &[String]) -> Self {
        self.date_formats = formats.to_vec();
        self
    }
}

/// Candidates and the rows that did not make it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Materialized {
    pub candidates: Vec<CandidateTransaction>,
    /// Source row index of each candidate
    pub source_rows: Vec<usize>,
    pub row_errors: Vec<RowError>,
    pub skipped_empty: usize,
}

/// Turn rows into candidate transactions.
///
/// A row whose cell count differs from the mapping aborts the whole run with
/// a validation error. Empty rows are skipped and counted. Rows with a bad
/// date or amount are reported in `row_errors` and skipped.
pub fn materialize(
    rows: &[Vec<String>],
    mapping: &ResolvedMapping,
    options: &MaterializeOptions,
) -> Result<Materialized> {
    let start = usize::from(options.includes_header);

    if let Some((index, row)) = rows
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, row)| !is_blank(row) && row.len() != mapping.column_count)
    {
        warn!(
            row = index,
            cells = row.len(),
            expected = mapping.column_count,
            "Column count mismatch, aborting import"
        );
        return Err(Error::invalid(format!(
            "Row {} has {} columns but the mapping has {}",
            index,
            row.len(),
            mapping.column_count
        )));
    }

    let default_formats: Vec<String>;
    let formats: &[String] = if options.date_formats.is_empty() {
        default_formats = DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect();
        &default_formats
    } else {
        &options.date_formats
    };

    let mut out = Materialized::default();
    for (index, row) in rows.iter().enumerate().skip(start) {
        if is_blank(row) {
            out.skipped_empty += 1;
            continue;
        }
        match materialize_row(row, mapping, &options.account_name, formats) {
            Ok(candidate) => {
                out.candidates.push(candidate);
                out.source_rows.push(index);
            }
            Err(messages) => {
                let message = messages.join("; ");
                warn!(row = index, error = %message, "Skipping row");
                out.row_errors.push(RowError {
                    row: index,
                    line: index + 1,
                    message,
                });
            }
        }
    }

    debug!(
        candidates = out.candidates.len(),
        errors = out.row_errors.len(),
        skipped_empty = out.skipped_empty,
        "Materialized rows"
    );
    Ok(out)
}

fn materialize_row(
    row: &[String],
    mapping: &ResolvedMapping,
    account_name: &str,
    formats: &[String],
) -> std::result::Result<CandidateTransaction, Vec<String>> {
    let mut errors = Vec::new();
    let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

    let date = parse_date(cell(mapping.date), formats);
    if date.is_none() {
        errors.push(format!("Invalid date: '{}'", cell(mapping.date)));
    }

    let amount = match mapping.amount {
        AmountColumns::Single {
            column,
            negative_means,
        } => match parse_signed_amount(cell(column)) {
            Some(parsed) => Some(negative_means.apply(parsed)),
            None => {
                errors.push(format!("Invalid amount: '{}'", cell(column)));
                None
            }
        },
        AmountColumns::Split { credit, debit } => match split_amount(cell(credit), cell(debit)) {
            Ok(amount) => Some(amount),
            Err(e) => {
                errors.push(e);
                None
            }
        },
    };

    match (date, amount) {
        (Some(date), Some(amount)) if errors.is_empty() => Ok(CandidateTransaction {
            date,
            account_name: account_name.to_string(),
            description: cell(mapping.description).to_string(),
            amount,
            merchant_id: None,
            category_id: None,
            subcategory_id: None,
        }),
        _ => Err(errors),
    }
}

fn split_amount(credit: &str, debit: &str) -> std::result::Result<f64, String> {
    let side = |raw: &str, label: &str| -> std::result::Result<Option<f64>, String> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        parse_unsigned_amount(raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid {} amount: '{}'", label, raw))
    };

    match (side(credit, "credit")?, side(debit, "debit")?) {
        (None, None) => Err("Row has neither a credit nor a debit amount".to_string()),
        (credit, debit) => Ok(credit.unwrap_or(0.0) - debit.unwrap_or(0.0)),
    }
}

/// Parse a signed amount, ignoring everything but digits, `.` and `-`
pub fn parse_signed_amount(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Parse an unsigned amount, ignoring everything but digits and `.`
pub fn parse_unsigned_amount(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Parse a date cell with the first format that fits.
///
/// Timestamps such as `2024-01-05T10:30:00` or `01/05/2024 10:30` are read by
/// their date part.
pub fn parse_date(cell: &str, formats: &[String]) -> Option<NaiveDate> {
    let s = cell.trim();
    if s.is_empty() {
        return None;
    }
    let try_formats =
        |text: &str| formats.iter().find_map(|f| NaiveDate::parse_from_str(text, f).ok());

    try_formats(s).or_else(|| {
        let head = s.split(['T', ' ']).next().unwrap_or(s);
        if head.len() < s.len() {
            try_formats(head)
        } else {
            None
        }
    })
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
