//! Default rows every new user starts with
//!
//! Provisioning is idempotent: anything that already exists (matched by name,
//! case-insensitively) is left alone, so it is safe to run on every `init`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::normalize_includes;
use crate::error::{Error, Result};
use crate::maintain;
use crate::models::{
    Category, CategoryGroup, ColumnFieldMapping, FieldName, NegativeAmountMeans, NewMapping,
    NewMerchant,
};
use crate::store::Store;

/// How many rows of each kind a provisioning run created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub categories: usize,
    pub subcategories: usize,
    pub merchants: usize,
    pub mappings: usize,
}

impl SeedSummary {
    pub fn total(&self) -> usize {
        self.categories + self.subcategories + self.merchants + self.mappings
    }
}

const CATEGORIES: &[(&str, CategoryGroup, &[&str])] = &[
    ("Income", CategoryGroup::Income, &["Salary", "Interest", "Refunds"]),
    ("Housing", CategoryGroup::Expense, &["Rent", "Mortgage", "Maintenance"]),
    ("Utilities", CategoryGroup::Expense, &["Electricity", "Internet", "Phone", "Water"]),
    ("Groceries", CategoryGroup::Expense, &[]),
    ("Dining", CategoryGroup::Expense, &["Restaurants", "Coffee", "Delivery"]),
    ("Transport", CategoryGroup::Expense, &["Fuel", "Rideshare", "Transit", "Parking"]),
    ("Shopping", CategoryGroup::Expense, &["General", "Online", "Clothing"]),
    ("Entertainment", CategoryGroup::Expense, &["Streaming", "Music", "Events"]),
    ("Healthcare", CategoryGroup::Expense, &["Pharmacy", "Doctor"]),
    ("Transfers", CategoryGroup::Transfer, &["Credit Card Payment", "Savings"]),
];

/// (merchant, includes, category, subcategory)
const MERCHANTS: &[(&str, &[&str], &str, Option<&str>)] = &[
    ("Walmart", &["walmart", "wal-mart"], "Shopping", Some("General")),
    ("Amazon", &["amazon", "amzn"], "Shopping", Some("Online")),
    ("Target", &["target"], "Shopping", Some("General")),
    ("Costco", &["costco"], "Groceries", None),
    ("Whole Foods", &["whole foods", "wholefds"], "Groceries", None),
    ("Starbucks", &["starbucks"], "Dining", Some("Coffee")),
    ("Uber", &["uber"], "Transport", Some("Rideshare")),
    ("Lyft", &["lyft"], "Transport", Some("Rideshare")),
    ("Shell", &["shell oil", "shell service"], "Transport", Some("Fuel")),
    ("Netflix", &["netflix"], "Entertainment", Some("Streaming")),
    ("Spotify", &["spotify"], "Entertainment", Some("Music")),
    ("CVS", &["cvs"], "Healthcare", Some("Pharmacy")),
];

fn stock_mappings() -> Vec<NewMapping> {
    vec![
        NewMapping {
            name: "Single amount column".to_string(),
            account_name: String::new(),
            includes_header: true,
            column_field_mapping: ColumnFieldMapping::from_fields(&[
                FieldName::Date,
                FieldName::Description,
                FieldName::Amount,
            ]),
            negative_amount_means: NegativeAmountMeans::Debit,
        },
        NewMapping {
            name: "Separate debit and credit columns".to_string(),
            account_name: String::new(),
            includes_header: true,
            column_field_mapping: ColumnFieldMapping::from_fields(&[
                FieldName::Date,
                FieldName::Description,
                FieldName::Debit,
                FieldName::Credit,
            ]),
            negative_amount_means: NegativeAmountMeans::Unset,
        },
    ]
}

/// Seed categories, subcategories, merchants and stock mappings for a user
pub fn provision_user<S: Store + ?Sized>(store: &S, user_id: &str) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut categories = store.list_categories(user_id)?;
    for (name, group, subcategories) in CATEGORIES {
        let category_id = match find_category(&categories, name, *group) {
            Some(existing) => existing.id,
            None => {
                let id = store.insert_category(user_id, name, *group)?;
                categories.push(Category {
                    id,
                    name: name.to_string(),
                    group: *group,
                });
                summary.categories += 1;
                id
            }
        };

        let existing = store.list_subcategories(user_id, Some(category_id))?;
        for sub in subcategories.iter() {
            if !existing.iter().any(|s| s.name.eq_ignore_ascii_case(sub)) {
                store.insert_subcategory(user_id, category_id, sub)?;
                summary.subcategories += 1;
            }
        }
    }

    let subcategories = store.list_subcategories(user_id, None)?;
    let merchants = store.list_merchants(user_id)?;
    for (name, includes, category_name, subcategory_name) in MERCHANTS {
        if merchants.iter().any(|m| m.name.eq_ignore_ascii_case(name)) {
            continue;
        }
        let category = categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(category_name))
            .ok_or_else(|| Error::NotFound(format!("category '{}'", category_name)))?;
        let subcategory_id = match subcategory_name {
            Some(sub) => subcategories
                .iter()
                .find(|s| s.category_id == category.id && s.name.eq_ignore_ascii_case(sub))
                .map(|s| s.id),
            None => None,
        };

        let merchant = NewMerchant {
            name: name.to_string(),
            includes: normalize_includes(*includes),
            category_id: Some(category.id),
            subcategory_id,
        };
        let id = store.insert_merchant(user_id, &merchant)?;
        maintain::on_merchant_created(store, user_id, &merchant.with_id(id))?;
        summary.merchants += 1;
    }

    let mappings = store.list_mappings(user_id)?;
    for mapping in stock_mappings() {
        if mappings
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(&mapping.name))
        {
            continue;
        }
        store.insert_mapping(user_id, &mapping)?;
        summary.mappings += 1;
    }

    debug!(user_id, created = summary.total(), "Seed pass finished");
    Ok(summary)
}

fn find_category<'a>(
    categories: &'a [Category],
    name: &str,
    group: CategoryGroup,
) -> Option<&'a Category> {
    categories
        .iter()
        .find(|c| c.group == group && c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::mapping::resolve_mapping;

    #[test]
    fn test_provision_creates_fixture() {
        let db = Database::in_memory().unwrap();
        let summary = provision_user(&db, "u1").unwrap();

        assert_eq!(summary.categories, CATEGORIES.len());
        assert_eq!(summary.merchants, MERCHANTS.len());
        assert_eq!(summary.mappings, 2);

        let walmart = db
            .list_merchants("u1")
            .unwrap()
            .into_iter()
            .find(|m| m.name == "Walmart")
            .unwrap();
        assert!(walmart.includes.contains(&"wal-mart".to_string()));
        assert!(walmart.category_id.is_some());
        assert!(walmart.subcategory_id.is_some());
    }

    #[test]
    fn test_provision_is_idempotent() {
        let db = Database::in_memory().unwrap();
        provision_user(&db, "u1").unwrap();
        let second = provision_user(&db, "u1").unwrap();
        assert_eq!(second.total(), 0);
        assert_eq!(db.list_mappings("u1").unwrap().len(), 2);
    }

    #[test]
    fn test_provision_is_per_user() {
        let db = Database::in_memory().unwrap();
        provision_user(&db, "u1").unwrap();
        let other = provision_user(&db, "u2").unwrap();
        assert_eq!(other.merchants, MERCHANTS.len());
    }

    #[test]
    fn test_stock_mappings_resolve() {
        for mapping in stock_mappings() {
            let count = mapping.column_field_mapping.len();
            assert!(resolve_mapping(&mapping.with_id(0), Some(count)).is_ok());
        }
    }
}
