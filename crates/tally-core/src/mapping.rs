//! Mapping resolution: validate a column mapping and work out which columns
//! feed which transaction fields.
//!
//! Every rule is checked and all failures are reported together, so a user
//! fixing a mapping sees the whole list at once.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::{ColumnFieldMapping, FieldName, Mapping, NegativeAmountMeans, NewMapping};

/// Where the amount comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountColumns {
    /// One signed column, read with the mapping's sign convention
    Single {
        column: usize,
        negative_means: NegativeAmountMeans,
    },
    /// Separate unsigned credit (money in) and debit (money out) columns
    Split { credit: usize, debit: usize },
}

/// A mapping that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub date: usize,
    pub description: usize,
    pub amount: AmountColumns,
    /// Number of columns a row must have
    pub column_count: usize,
}

/// Check the structure of a mapping, returning every problem found
pub fn validation_errors(
    columns: &ColumnFieldMapping,
    negative_means: NegativeAmountMeans,
) -> Vec<String> {
    let mut errors = Vec::new();

    if columns.is_empty() {
        errors.push("Mapping has no columns".to_string());
        return errors;
    }

    let mut seen_indices = HashSet::new();
    for entry in columns.iter() {
        if entry.column_index >= columns.len() {
            errors.push(format!(
                "Column index {} is out of range for a {}-column mapping",
                entry.column_index,
                columns.len()
            ));
        }
        if !seen_indices.insert(entry.column_index) {
            errors.push(format!(
                "Column index {} appears more than once",
                entry.column_index
            ));
        }
    }

    let used = |field: FieldName| columns.columns_for(field);

    for field in [
        FieldName::Date,
        FieldName::Description,
        FieldName::Amount,
        FieldName::Credit,
        FieldName::Debit,
    ] {
        let cols = used(field);
        if cols.len() > 1 {
            errors.push(format!(
                "{} is assigned to more than one column ({})",
                field,
                join_columns(&cols)
            ));
        }
    }

    if used(FieldName::Date).is_empty() {
        errors.push("Date must be assigned to a column".to_string());
    }
    if used(FieldName::Description).is_empty() {
        errors.push("Description must be assigned to a column".to_string());
    }

    let has_amount = !used(FieldName::Amount).is_empty();
    let has_credit = !used(FieldName::Credit).is_empty();
    let has_debit = !used(FieldName::Debit).is_empty();

    match (has_amount, has_credit, has_debit) {
        (true, false, false) => {
            if negative_means == NegativeAmountMeans::Unset {
                errors.push(
                    "Choose whether negative amounts mean Debit or Credit when Amount is mapped"
                        .to_string(),
                );
            }
        }
        (false, true, true) => {}
        (false, false, false) => {
            errors.push("Map either Amount, or both Credit and Debit".to_string());
        }
        (true, _, _) => {
            errors.push("Amount cannot be combined with Credit or Debit".to_string());
        }
        (false, true, false) => {
            errors.push("Credit is mapped but Debit is not".to_string());
        }
        (false, false, true) => {
            errors.push("Debit is mapped but Credit is not".to_string());
        }
    }

    errors
}

/// Validate a mapping against a file's column count and resolve its columns.
///
/// `column_count` is the cell count of the first parsed row. Pass `None` to
/// check structure only (when saving a mapping without a file).
pub fn resolve(
    columns: &ColumnFieldMapping,
    negative_means: NegativeAmountMeans,
    column_count: Option<usize>,
) -> Result<ResolvedMapping> {
    let mut errors = Vec::new();

    if let Some(count) = column_count {
        if count != columns.len() {
            errors.push(format!(
                "Mapping has {} columns but the file has {}",
                columns.len(),
                count
            ));
        }
    }
    errors.extend(validation_errors(columns, negative_means));

    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }

    let single = |field: FieldName| columns.columns_for(field).first().copied();
    let missing = || Error::invalid("Mapping could not be resolved");

    let amount = match single(FieldName::Amount) {
        Some(column) => AmountColumns::Single {
            column,
            negative_means,
        },
        None => AmountColumns::Split {
            credit: single(FieldName::Credit).ok_or_else(missing)?,
            debit: single(FieldName::Debit).ok_or_else(missing)?,
        },
    };

    Ok(ResolvedMapping {
        date: single(FieldName::Date).ok_or_else(missing)?,
        description: single(FieldName::Description).ok_or_else(missing)?,
        amount,
        column_count: columns.len(),
    })
}

/// Resolve a stored mapping against a file
pub fn resolve_mapping(mapping: &Mapping, column_count: Option<usize>) -> Result<ResolvedMapping> {
    resolve(
        &mapping.column_field_mapping,
        mapping.negative_amount_means,
        column_count,
    )
}

/// Fail with `Conflict` if another mapping already uses `name`.
///
/// `own_id` is the id of the mapping being edited, which may keep its name.
pub fn check_name_available(name: &str, own_id: Option<i64>, existing: &[Mapping]) -> Result<()> {
    let wanted = name.trim();
    let clash = existing
        .iter()
        .find(|m| m.name.trim().eq_ignore_ascii_case(wanted) && Some(m.id) != own_id);
    match clash {
        Some(m) => Err(Error::Conflict(format!(
            "A mapping named '{}' already exists (id {})",
            m.name, m.id
        ))),
        None => Ok(()),
    }
}

/// Validate a mapping before it is saved: structure first, then the name
pub fn validate_for_save(
    mapping: &NewMapping,
    own_id: Option<i64>,
    existing: &[Mapping],
) -> Result<()> {
    let mut errors = Vec::new();
    if mapping.name.trim().is_empty() {
        errors.push("Mapping name is required".to_string());
    }
    errors.extend(validation_errors(
        &mapping.column_field_mapping,
        mapping.negative_amount_means,
    ));
    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }
    check_name_available(&mapping.name, own_id, existing)
}

fn join_columns(cols: &[usize]) -> String {
    cols.iter()
        .map(|c| format!("column {}", c))
        .collect::<Vec<_>>()
        .join(", ")
}
