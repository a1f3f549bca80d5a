//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candidate(date: &str, description: &str, amount: f64) -> CandidateTransaction {
        CandidateTransaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            account_name: "Checking".to_string(),
            description: description.to_string(),
            amount,
            merchant_id: None,
            category_id: None,
            subcategory_id: None,
        }
    }

    fn new_merchant(name: &str, includes: &[&str], category_id: Option<i64>) -> NewMerchant {
        NewMerchant {
            name: name.to_string(),
            includes: includes.iter().map(|s| s.to_string()).collect(),
            category_id,
            subcategory_id: None,
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_categories("u1").unwrap().is_empty());
        assert!(db.list_transactions("u1", None).unwrap().is_empty());
    }

    #[test]
    fn test_schema_tables_exist() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        for table in [
            "categories",
            "subcategories",
            "merchants",
            "mappings",
            "transactions",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "{} table should exist", table);
        }

        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1, "foreign keys should be enabled on pooled connections");
    }

    #[test]
    fn test_category_crud() {
        let db = Database::in_memory().unwrap();

        let id = db
            .create_category("u1", "  Groceries ", CategoryGroup::Expense)
            .unwrap();
        let category = db.get_category("u1", id).unwrap().unwrap();
        assert_eq!(category.name, "Groceries");
        assert_eq!(category.group, CategoryGroup::Expense);

        assert!(db.rename_category("u1", id, "Food").unwrap());
        assert_eq!(db.get_category("u1", id).unwrap().unwrap().name, "Food");

        assert!(!db.rename_category("u1", 999, "Nope").unwrap());
        assert!(matches!(
            db.create_category("u1", "  ", CategoryGroup::Expense),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_category_name_unique_per_group() {
        let db = Database::in_memory().unwrap();
        db.create_category("u1", "Other", CategoryGroup::Expense)
            .unwrap();

        assert!(matches!(
            db.create_category("u1", "OTHER", CategoryGroup::Expense),
            Err(Error::Conflict(_))
        ));
        // Same name in another group is fine
        assert!(db
            .create_category("u1", "Other", CategoryGroup::Income)
            .is_ok());
        // And for another user
        assert!(db
            .create_category("u2", "Other", CategoryGroup::Expense)
            .is_ok());

        let second = db
            .create_category("u1", "Dining", CategoryGroup::Expense)
            .unwrap();
        assert!(matches!(
            db.rename_category("u1", second, "other"),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_subcategories() {
        let db = Database::in_memory().unwrap();
        let dining = db
            .create_category("u1", "Dining", CategoryGroup::Expense)
            .unwrap();
        let transport = db
            .create_category("u1", "Transport", CategoryGroup::Expense)
            .unwrap();

        let coffee = db.create_subcategory("u1", dining, "Coffee").unwrap();
        db.create_subcategory("u1", transport, "Fuel").unwrap();

        assert!(matches!(
            db.create_subcategory("u1", dining, "coffee"),
            Err(Error::Conflict(_))
        ));
        assert!(db.create_subcategory("u1", transport, "Coffee").is_ok());
        assert!(matches!(
            db.create_subcategory("u1", 999, "Lost"),
            Err(Error::NotFound(_))
        ));

        let for_dining = db.list_subcategories("u1", Some(dining)).unwrap();
        assert_eq!(for_dining.len(), 1);
        assert_eq!(for_dining[0].id, coffee);
        assert_eq!(db.list_subcategories("u1", None).unwrap().len(), 3);
    }

    #[test]
    fn test_delete_category_clears_references() {
        let db = Database::in_memory().unwrap();
        let shopping = db
            .create_category("u1", "Shopping", CategoryGroup::Expense)
            .unwrap();
        let general = db.create_subcategory("u1", shopping, "General").unwrap();

        let mut merchant = new_merchant("Walmart", &["walmart"], Some(shopping));
        merchant.subcategory_id = Some(general);
        let merchant_id = db.create_merchant("u1", &merchant).unwrap();

        let mut tx = candidate("2024-01-05", "WALMART #123", -45.67);
        tx.set_classification(merchant.clone().with_id(merchant_id).classification());
        let ids = db.insert_transactions("u1", &[tx]).unwrap();

        assert!(db.delete_category("u1", shopping).unwrap());
        assert!(!db.delete_category("u1", shopping).unwrap());

        assert!(db.get_subcategory("u1", general).unwrap().is_none());
        let merchant = db.get_merchant("u1", merchant_id).unwrap().unwrap();
        assert_eq!(merchant.category_id, None);
        assert_eq!(merchant.subcategory_id, None);

        let stored = db.get_transaction("u1", ids[0]).unwrap().unwrap();
        assert_eq!(stored.merchant_id, Some(merchant_id));
        assert_eq!(stored.category_id, None);
        assert_eq!(stored.subcategory_id, None);
    }

    #[test]
    fn test_delete_subcategory_clears_references() {
        let db = Database::in_memory().unwrap();
        let dining = db
            .create_category("u1", "Dining", CategoryGroup::Expense)
            .unwrap();
        let coffee = db.create_subcategory("u1", dining, "Coffee").unwrap();

        let mut tx = candidate("2024-02-01", "STARBUCKS", -4.5);
        tx.category_id = Some(dining);
        tx.subcategory_id = Some(coffee);
        let ids = db.insert_transactions("u1", &[tx]).unwrap();

        assert!(db.delete_subcategory("u1", coffee).unwrap());
        let stored = db.get_transaction("u1", ids[0]).unwrap().unwrap();
        assert_eq!(stored.category_id, Some(dining));
        assert_eq!(stored.subcategory_id, None);
    }

    #[test]
    fn test_merchant_crud() {
        let db = Database::in_memory().unwrap();
        let id = db
            .create_merchant("u1", &new_merchant("Walmart", &["walmart", "wal-mart"], None))
            .unwrap();

        let mut merchant = db.get_merchant("u1", id).unwrap().unwrap();
        assert_eq!(merchant.includes, vec!["walmart", "wal-mart"]);

        merchant.includes = vec!["wmt".to_string()];
        assert!(db.update_merchant("u1", &merchant).unwrap());
        assert_eq!(
            db.get_merchant("u1", id).unwrap().unwrap().includes,
            vec!["wmt"]
        );

        assert!(matches!(
            db.create_merchant("u1", &new_merchant("WALMART", &["x"], None)),
            Err(Error::Conflict(_))
        ));

        assert!(db.delete_merchant("u1", id).unwrap());
        assert!(db.get_merchant("u1", id).unwrap().is_none());
        assert!(!db.delete_merchant("u1", id).unwrap());
    }

    #[test]
    fn test_delete_merchant_unlinks_transactions() {
        let db = Database::in_memory().unwrap();
        let id = db
            .create_merchant("u1", &new_merchant("Netflix", &["netflix"], None))
            .unwrap();
        let mut tx = candidate("2024-03-01", "NETFLIX.COM", -15.49);
        tx.merchant_id = Some(id);
        let ids = db.insert_transactions("u1", &[tx]).unwrap();

        db.delete_merchant("u1", id).unwrap();
        let stored = db.get_transaction("u1", ids[0]).unwrap().unwrap();
        assert_eq!(stored.merchant_id, None);
    }

    #[test]
    fn test_mapping_roundtrip_and_conflict() {
        let db = Database::in_memory().unwrap();
        let mapping = NewMapping {
            name: "Chase".to_string(),
            account_name: "Chase Checking".to_string(),
            includes_header: true,
            column_field_mapping: ColumnFieldMapping::from_fields(&[
                FieldName::Date,
                FieldName::Unassigned,
                FieldName::Description,
                FieldName::Amount,
            ]),
            negative_amount_means: NegativeAmountMeans::Debit,
        };
        let id = db.create_mapping("u1", &mapping).unwrap();

        let stored = db.get_mapping("u1", id).unwrap().unwrap();
        assert_eq!(stored, mapping.clone().with_id(id));

        assert!(matches!(
            db.create_mapping("u1", &mapping),
            Err(Error::Conflict(_))
        ));

        let mut renamed = stored.clone();
        renamed.name = "Chase Credit".to_string();
        renamed.negative_amount_means = NegativeAmountMeans::Credit;
        assert!(db.update_mapping("u1", &renamed).unwrap());
        assert_eq!(db.get_mapping("u1", id).unwrap().unwrap(), renamed);

        assert!(db.delete_mapping("u1", id).unwrap());
        assert!(db.list_mappings("u1").unwrap().is_empty());
    }

    #[test]
    fn test_transactions_ordering_and_limit() {
        let db = Database::in_memory().unwrap();
        db.insert_transactions(
            "u1",
            &[
                candidate("2024-01-01", "OLDEST", -1.0),
                candidate("2024-03-01", "NEWEST", -3.0),
                candidate("2024-02-01", "MIDDLE", -2.0),
            ],
        )
        .unwrap();

        let all = db.list_transactions("u1", None).unwrap();
        let descriptions: Vec<&str> = all.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["NEWEST", "MIDDLE", "OLDEST"]);

        assert_eq!(db.list_transactions("u1", Some(2)).unwrap().len(), 2);
        assert!(db.list_transactions("u2", None).unwrap().is_empty());
    }

    #[test]
    fn test_transactions_by_merchant() {
        let db = Database::in_memory().unwrap();
        let id = db
            .create_merchant("u1", &new_merchant("Uber", &["uber"], None))
            .unwrap();
        let mut linked = candidate("2024-01-02", "UBER TRIP", -12.0);
        linked.merchant_id = Some(id);
        db.insert_transactions(
            "u1",
            &[linked, candidate("2024-01-03", "CORNER SHOP", -3.0)],
        )
        .unwrap();

        let by_merchant = db.transactions_by_merchant("u1", Some(id)).unwrap();
        assert_eq!(by_merchant.len(), 1);
        assert_eq!(by_merchant[0].description, "UBER TRIP");

        let unlinked = db.transactions_by_merchant("u1", None).unwrap();
        assert_eq!(unlinked.len(), 1);
        assert_eq!(unlinked[0].description, "CORNER SHOP");
    }

    #[test]
    fn test_update_classification_partial() {
        let db = Database::in_memory().unwrap();
        let cat = db
            .create_category("u1", "Dining", CategoryGroup::Expense)
            .unwrap();
        let merchant = db
            .create_merchant("u1", &new_merchant("Cafe", &["cafe"], Some(cat)))
            .unwrap();

        let mut tx = candidate("2024-01-02", "CAFE", -5.0);
        tx.category_id = Some(cat);
        let ids = db.insert_transactions("u1", &[tx]).unwrap();

        let changed = db
            .update_classification("u1", &ids, &ClassificationUpdate::merchant_only(merchant))
            .unwrap();
        assert_eq!(changed, 1);
        let stored = db.get_transaction("u1", ids[0]).unwrap().unwrap();
        assert_eq!(stored.merchant_id, Some(merchant));
        assert_eq!(stored.category_id, Some(cat));

        // Another user's rows are out of reach
        let changed = db
            .update_classification("u2", &ids, &ClassificationUpdate::clear_all())
            .unwrap();
        assert_eq!(changed, 0);

        assert_eq!(
            db.update_classification("u1", &ids, &ClassificationUpdate::default())
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_update_classification_many_ids() {
        let db = Database::in_memory().unwrap();
        let cat = db
            .create_category("u1", "Misc", CategoryGroup::Expense)
            .unwrap();
        let candidates: Vec<CandidateTransaction> = (0..1200)
            .map(|i| candidate("2024-01-01", &format!("ROW {}", i), -1.0))
            .collect();
        let ids = db.insert_transactions("u1", &candidates).unwrap();
        assert_eq!(ids.len(), 1200);

        let changed = db
            .update_classification("u1", &ids, &ClassificationUpdate::category(Some(cat), None))
            .unwrap();
        assert_eq!(changed, 1200);
    }

    #[test]
    fn test_delete_user_data() {
        let db = Database::in_memory().unwrap();
        db.create_category("u1", "Dining", CategoryGroup::Expense)
            .unwrap();
        db.create_category("u2", "Dining", CategoryGroup::Expense)
            .unwrap();

        db.delete_user_data("u1").unwrap();
        assert!(db.list_categories("u1").unwrap().is_empty());
        assert_eq!(db.list_categories("u2").unwrap().len(), 1);
    }
}
