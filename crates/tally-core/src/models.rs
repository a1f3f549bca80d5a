//! Domain models for Tally

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Transaction field a file column can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FieldName {
    Date,
    Description,
    Amount,
    Credit,
    Debit,
    /// Column is ignored
    #[default]
    #[serde(rename = "")]
    Unassigned,
}

impl FieldName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Description => "Description",
            Self::Amount => "Amount",
            Self::Credit => "Credit",
            Self::Debit => "Debit",
            Self::Unassigned => "",
        }
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, Self::Unassigned)
    }
}

impl std::str::FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "description" | "desc" => Ok(Self::Description),
            "amount" => Ok(Self::Amount),
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "" | "-" | "none" | "skip" => Ok(Self::Unassigned),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unassigned => write!(f, "(unassigned)"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One column of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnField {
    pub column_index: usize,
    pub field_name: FieldName,
}

/// Ordered column-to-field assignments, one entry per file column.
///
/// Entries are kept at indices `0..len` so the collection can grow and shrink
/// with the column count of the file being mapped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnFieldMapping(Vec<ColumnField>);

impl ColumnFieldMapping {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A mapping of `columns` unassigned entries
    pub fn with_columns(columns: usize) -> Self {
        let mut mapping = Self::new();
        mapping.resize(columns);
        mapping
    }

    /// Build from fields listed in column order
    pub fn from_fields(fields: &[FieldName]) -> Self {
        Self(
            fields
                .iter()
                .enumerate()
                .map(|(column_index, &field_name)| ColumnField {
                    column_index,
                    field_name,
                })
                .collect(),
        )
    }

    /// Build from raw entries, keeping their stored order and indices
    pub fn from_entries(entries: Vec<ColumnField>) -> Self {
        Self(entries)
    }

    /// Sized to match a sample row, every column unassigned
    pub fn from_header(row: &[String]) -> Self {
        Self::with_columns(row.len())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[ColumnField] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnField> {
        self.0.iter()
    }

    /// Grow with unassigned columns or truncate to exactly `columns` entries
    pub fn resize(&mut self, columns: usize) {
        if columns <= self.0.len() {
            self.0.truncate(columns);
            return;
        }
        let start = self.0.len();
        self.0.extend((start..columns).map(|column_index| ColumnField {
            column_index,
            field_name: FieldName::Unassigned,
        }));
    }

    /// Append one unassigned column and return its index
    pub fn push_column(&mut self) -> usize {
        let index = self.0.len();
        self.resize(index + 1);
        index
    }

    /// Set the field for a column
    pub fn assign(&mut self, column_index: usize, field_name: FieldName) -> Result<()> {
        let len = self.0.len();
        let entry = self
            .0
            .iter_mut()
            .find(|c| c.column_index == column_index)
            .ok_or_else(|| {
                Error::invalid(format!(
                    "Column {} is outside the mapping ({} columns)",
                    column_index, len
                ))
            })?;
        entry.field_name = field_name;
        Ok(())
    }

    pub fn field_at(&self, column_index: usize) -> Option<FieldName> {
        self.0
            .iter()
            .find(|c| c.column_index == column_index)
            .map(|c| c.field_name)
    }

    /// Column indices assigned to `field`, in mapping order
    pub fn columns_for(&self, field: FieldName) -> Vec<usize> {
        self.0
            .iter()
            .filter(|c| c.field_name == field)
            .map(|c| c.column_index)
            .collect()
    }
}

/// How to read the sign of a single Amount column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NegativeAmountMeans {
    /// Negative values in the file are debits; the parsed sign is kept
    Debit,
    /// Negative values in the file are credits; the parsed sign is flipped
    Credit,
    /// Not chosen. Flips the sign, same as `Credit`
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl NegativeAmountMeans {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
            Self::Unset => "",
        }
    }

    /// Apply the sign rule to a parsed Amount value
    pub fn apply(&self, parsed: f64) -> f64 {
        if *self == Self::Debit {
            parsed
        } else {
            -parsed
        }
    }
}

impl std::str::FromStr for NegativeAmountMeans {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            "" => Ok(Self::Unset),
            _ => Err(format!("Unknown sign convention: {}", s)),
        }
    }
}

/// A saved column mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub id: i64,
    pub name: String,
    pub account_name: String,
    pub includes_header: bool,
    pub column_field_mapping: ColumnFieldMapping,
    pub negative_amount_means: NegativeAmountMeans,
}

/// A mapping that has not been saved yet (or an ad hoc one authored at import time)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMapping {
    pub name: String,
    pub account_name: String,
    pub includes_header: bool,
    pub column_field_mapping: ColumnFieldMapping,
    pub negative_amount_means: NegativeAmountMeans,
}

impl NewMapping {
    pub fn with_id(self, id: i64) -> Mapping {
        Mapping {
            id,
            name: self.name,
            account_name: self.account_name,
            includes_header: self.includes_header,
            column_field_mapping: self.column_field_mapping,
            negative_amount_means: self.negative_amount_means,
        }
    }
}

impl From<Mapping> for NewMapping {
    fn from(m: Mapping) -> Self {
        Self {
            name: m.name,
            account_name: m.account_name,
            includes_header: m.includes_header,
            column_field_mapping: m.column_field_mapping,
            negative_amount_means: m.negative_amount_means,
        }
    }
}

/// Category group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryGroup {
    Expense,
    Income,
    Transfer,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for CategoryGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" | "expenses" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "transfer" | "transfers" => Ok(Self::Transfer),
            _ => Err(format!("Unknown category group: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub group: CategoryGroup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

/// A category together with the subcategories it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// A merchant rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub id: i64,
    pub name: String,
    /// Lowercase substrings matched against transaction descriptions
    pub includes: Vec<String>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

impl Merchant {
    /// Classification a transaction gets when this merchant claims it
    pub fn classification(&self) -> Classification {
        Classification {
            merchant_id: Some(self.id),
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
        }
    }

    /// Whether category and subcategory match what this merchant assigns
    pub fn carries_category_of(&self, classification: &Classification) -> bool {
        classification.category_id == self.category_id
            && classification.subcategory_id == self.subcategory_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMerchant {
    pub name: String,
    pub includes: Vec<String>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

impl NewMerchant {
    pub fn with_id(self, id: i64) -> Merchant {
        Merchant {
            id,
            name: self.name,
            includes: self.includes,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
        }
    }
}

/// A merchant mutation and how many transactions it re-linked or unlinked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantChange {
    pub merchant: Merchant,
    pub affected: usize,
}

/// The (merchant, category, subcategory) triple on a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub merchant_id: Option<i64>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

impl Classification {
    pub fn is_unclassified(&self) -> bool {
        self.merchant_id.is_none() && self.category_id.is_none() && self.subcategory_id.is_none()
    }

    /// Where this triple sits relative to the merchant it points at
    pub fn state(&self, merchant: Option<&Merchant>) -> ClassificationState {
        if self.is_unclassified() {
            return ClassificationState::Unclassified;
        }
        match (self.merchant_id, merchant) {
            (Some(id), Some(m)) if m.id == id && m.carries_category_of(self) => {
                ClassificationState::AutoClassified
            }
            _ => ClassificationState::ManuallyDiverged,
        }
    }

    /// Apply a partial update, returning the new triple
    pub fn updated(&self, update: &ClassificationUpdate) -> Self {
        Self {
            merchant_id: update.merchant_id.unwrap_or(self.merchant_id),
            category_id: update.category_id.unwrap_or(self.category_id),
            subcategory_id: update.subcategory_id.unwrap_or(self.subcategory_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationState {
    Unclassified,
    AutoClassified,
    ManuallyDiverged,
}

/// Partial change to a classification triple.
///
/// `None` leaves a slot alone, `Some(None)` clears it, `Some(Some(id))` sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassificationUpdate {
    pub merchant_id: Option<Option<i64>>,
    pub category_id: Option<Option<i64>>,
    pub subcategory_id: Option<Option<i64>>,
}

impl ClassificationUpdate {
    /// Set all three slots from a merchant
    pub fn full(merchant: &Merchant) -> Self {
        Self {
            merchant_id: Some(Some(merchant.id)),
            category_id: Some(merchant.category_id),
            subcategory_id: Some(merchant.subcategory_id),
        }
    }

    /// Attach the merchant, leaving category and subcategory alone
    pub fn merchant_only(merchant_id: i64) -> Self {
        Self {
            merchant_id: Some(Some(merchant_id)),
            ..Self::default()
        }
    }

    pub fn clear_all() -> Self {
        Self {
            merchant_id: Some(None),
            category_id: Some(None),
            subcategory_id: Some(None),
        }
    }

    pub fn clear_merchant() -> Self {
        Self {
            merchant_id: Some(None),
            ..Self::default()
        }
    }

    pub fn category(category_id: Option<i64>, subcategory_id: Option<i64>) -> Self {
        Self {
            merchant_id: None,
            category_id: Some(category_id),
            subcategory_id: Some(subcategory_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.merchant_id.is_none() && self.category_id.is_none() && self.subcategory_id.is_none()
    }
}

/// A stored transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub account_name: String,
    pub description: String,
    /// Positive is money in, negative is money out
    pub amount: f64,
    pub merchant_id: Option<i64>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

impl Transaction {
    pub fn classification(&self) -> Classification {
        Classification {
            merchant_id: self.merchant_id,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
        }
    }
}

/// A transaction produced from one file row, before it is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTransaction {
    pub date: NaiveDate,
    pub account_name: String,
    pub description: String,
    pub amount: f64,
    pub merchant_id: Option<i64>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

impl CandidateTransaction {
    pub fn classification(&self) -> Classification {
        Classification {
            merchant_id: self.merchant_id,
            category_id: self.category_id,
            subcategory_id: self.subcategory_id,
        }
    }

    pub fn set_classification(&mut self, classification: Classification) {
        self.merchant_id = classification.merchant_id;
        self.category_id = classification.category_id;
        self.subcategory_id = classification.subcategory_id;
    }
}

/// A row that could not be turned into a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// Zero-based row index in the parsed file
    pub row: usize,
    /// One-based line in the source file, counting blank lines
    pub line: usize,
    pub message: String,
}

/// Outcome of an import run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub classified: usize,
    pub skipped_empty: usize,
    pub row_errors: Vec<RowError>,
}

/// A description with no merchant, and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedDescription {
    pub description: String,
    pub count: usize,
}
