//! Service tests

use super::*;
use crate::db::Database;
use crate::envelope::{STATUS_BAD_REQUEST, STATUS_CONFLICT, STATUS_NOT_FOUND, STATUS_UNPROCESSABLE};
use crate::models::*;
use crate::parse::ParsedFile;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const USER: &str = "u1";

    fn service() -> Service<Database> {
        Service::new(Database::in_memory().unwrap())
    }

    fn rows(data: &[&[&str]]) -> ParsedFile {
        ParsedFile::from_rows(
            data.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn amount_mapping(name: &str) -> NewMapping {
        NewMapping {
            name: name.to_string(),
            account_name: "Checking".to_string(),
            includes_header: true,
            column_field_mapping: ColumnFieldMapping::from_fields(&[
                FieldName::Date,
                FieldName::Description,
                FieldName::Amount,
            ]),
            negative_amount_means: NegativeAmountMeans::Credit,
        }
    }

    fn merchant(name: &str, includes: &[&str], category_id: Option<i64>) -> NewMerchant {
        NewMerchant {
            name: name.to_string(),
            includes: includes.iter().map(|s| s.to_string()).collect(),
            category_id,
            subcategory_id: None,
        }
    }

    fn category(svc: &Service<Database>, name: &str) -> i64 {
        svc.create_category(USER, name, CategoryGroup::Expense)
            .into_data()
            .unwrap()
            .id
    }

    /// Import descriptions with amount -1.00 each through an inline mapping
    fn import(svc: &Service<Database>, descriptions: &[&str]) -> ImportSummary {
        let mut data: Vec<Vec<String>> = vec![vec!["Date".into(), "Desc".into(), "Amt".into()]];
        for d in descriptions {
            data.push(vec!["2024-01-05".into(), d.to_string(), "-1.00".into()]);
        }
        let parsed = ParsedFile::from_rows(data);
        svc.import_rows(USER, &parsed, &ImportRequest::inline(amount_mapping("inline")))
            .into_data()
            .unwrap()
    }

    fn stored(svc: &Service<Database>, description: &str) -> Transaction {
        svc.list_transactions(USER, None)
            .into_data()
            .unwrap()
            .into_iter()
            .find(|t| t.description == description)
            .unwrap()
    }

    // =========================================================================
    // Import
    // =========================================================================

    #[test]
    fn test_import_classifies_and_stores() {
        let svc = service();
        let cat = category(&svc, "Shopping");
        let walmart = svc
            .create_merchant(USER, merchant("Walmart", &["walmart"], Some(cat)))
            .into_data()
            .unwrap()
            .merchant;

        let summary = import(&svc, &["WALMART #123", "CORNER SHOP"]);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.classified, 1);

        let tx = stored(&svc, "WALMART #123");
        assert_eq!(tx.amount, 1.0);
        assert_eq!(tx.account_name, "Checking");
        assert_eq!(tx.merchant_id, Some(walmart.id));
        assert_eq!(tx.category_id, Some(cat));
    }

    #[test]
    fn test_import_with_saved_mapping_and_overrides() {
        let svc = service();
        let mapping = svc
            .create_mapping(USER, amount_mapping("Bank"))
            .into_data()
            .unwrap();

        let parsed = rows(&[&["2024-02-01", "PAYROLL", "-2000"]]);
        let request = ImportRequest::saved(mapping.id)
            .includes_header(false)
            .account_name("Savings");
        let env = svc.import_rows(USER, &parsed, &request);
        assert_eq!(env.status_code, 201);
        assert_eq!(env.data().unwrap().imported, 1);

        let tx = stored(&svc, "PAYROLL");
        assert_eq!(tx.account_name, "Savings");
        assert_eq!(tx.amount, 2000.0);
    }

    #[test]
    fn test_import_column_mismatch_writes_nothing() {
        let svc = service();
        let parsed = rows(&[
            &["Date", "Desc", "Amt"],
            &["2024-01-05", "OK ROW", "-1.00"],
            &["2024-01-06", "BROKEN", "-1.00", "extra"],
        ]);
        let env = svc.import_rows(USER, &parsed, &ImportRequest::inline(amount_mapping("x")));
        assert_eq!(env.status_code, STATUS_BAD_REQUEST);
        assert!(svc.list_transactions(USER, None).into_data().unwrap().is_empty());
    }

    #[test]
    fn test_import_mapping_width_must_match_file() {
        let svc = service();
        let parsed = rows(&[&["Date", "Desc"], &["2024-01-05", "TWO COLUMNS"]]);
        let env = svc.import_rows(USER, &parsed, &ImportRequest::inline(amount_mapping("x")));
        assert_eq!(env.status_code, STATUS_BAD_REQUEST);
        assert!(env.message().unwrap().contains("columns"));
    }

    #[test]
    fn test_import_reports_bad_rows() {
        let svc = service();
        let parsed = rows(&[
            &["Date", "Desc", "Amt"],
            &["not a date", "BAD DATE", "-1.00"],
            &["2024-01-05", "GOOD", "-1.00"],
        ]);
        let summary = svc
            .import_rows(USER, &parsed, &ImportRequest::inline(amount_mapping("x")))
            .into_data()
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.row_errors.len(), 1);
        assert_eq!(summary.row_errors[0].row, 1);
        assert_eq!(summary.row_errors[0].line, 2);
    }

    #[test]
    fn test_import_row_errors_report_file_lines() {
        let svc = service();
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,Description,Amount").unwrap();
        writeln!(file, ",,").unwrap();
        writeln!(file, "2024-01-05,GOOD,-1.00").unwrap();
        writeln!(file, ",,").unwrap();
        writeln!(file, "someday,BAD DATE,-1.00").unwrap();

        let summary = svc
            .import_file(USER, file.path(), &ImportRequest::inline(amount_mapping("x")))
            .into_data()
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped_empty, 2);
        assert_eq!(summary.row_errors.len(), 1);
        assert_eq!(summary.row_errors[0].row, 2);
        assert_eq!(summary.row_errors[0].line, 5);
    }

    #[test]
    fn test_import_blank_file_is_parse_error() {
        let svc = service();
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, ",,").unwrap();
        writeln!(file, " , , ").unwrap();

        let env = svc.import_file(USER, file.path(), &ImportRequest::inline(amount_mapping("x")));
        assert_eq!(env.status_code, STATUS_UNPROCESSABLE);
        assert!(svc.list_transactions(USER, None).into_data().unwrap().is_empty());
    }

    #[test]
    fn test_import_row_limit() {
        let svc = Service::with_import_config(
            Database::in_memory().unwrap(),
            ImportConfig {
                max_rows: 2,
                ..ImportConfig::default()
            },
        );
        let parsed = rows(&[
            &["Date", "Desc", "Amt"],
            &["2024-01-05", "A", "1"],
            &["2024-01-06", "B", "1"],
        ]);
        let env = svc.import_rows(USER, &parsed, &ImportRequest::inline(amount_mapping("x")));
        assert_eq!(env.status_code, STATUS_BAD_REQUEST);
    }

    #[test]
    fn test_import_unknown_mapping() {
        let svc = service();
        let env = svc.import_rows(USER, &rows(&[&["a"]]), &ImportRequest::saved(42));
        assert_eq!(env.status_code, STATUS_NOT_FOUND);
    }

    #[test]
    fn test_import_file_parse_error() {
        let svc = service();
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let env = svc.import_file(USER, file.path(), &ImportRequest::inline(amount_mapping("x")));
        assert_eq!(env.status_code, STATUS_UNPROCESSABLE);
    }

    #[test]
    fn test_import_file_csv() {
        let svc = service();
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,Description,Amount").unwrap();
        writeln!(file, "2024-01-05,\"COFFEE, LARGE\",-3.50").unwrap();
        writeln!(file, ",,").unwrap();

        let summary = svc
            .import_file(USER, file.path(), &ImportRequest::inline(amount_mapping("x")))
            .into_data()
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped_empty, 1);
        assert_eq!(stored(&svc, "COFFEE, LARGE").amount, 3.5);
    }

    // =========================================================================
    // Mappings
    // =========================================================================

    #[test]
    fn test_mapping_duplicate_amount_not_persisted() {
        let svc = service();
        let mut mapping = amount_mapping("Twice");
        mapping.column_field_mapping =
            ColumnFieldMapping::from_fields(&[FieldName::Date, FieldName::Amount, FieldName::Amount]);

        let env = svc.create_mapping(USER, mapping);
        assert_eq!(env.status_code, STATUS_BAD_REQUEST);
        assert!(svc.list_mappings(USER).into_data().unwrap().is_empty());
    }

    #[test]
    fn test_mapping_name_conflict() {
        let svc = service();
        let first = svc.create_mapping(USER, amount_mapping("Chase")).into_data().unwrap();
        let env = svc.create_mapping(USER, amount_mapping(" chase "));
        assert_eq!(env.status_code, STATUS_CONFLICT);
        assert!(env.message().unwrap().contains("Chase"));

        // Keeping its own name on update is allowed
        let mut edited = first.clone();
        edited.account_name = "Other".to_string();
        assert!(svc.update_mapping(USER, edited).is_success());

        let second = svc.create_mapping(USER, amount_mapping("Amex")).into_data().unwrap();
        let mut clash = second;
        clash.name = "CHASE".to_string();
        assert_eq!(svc.update_mapping(USER, clash).status_code, STATUS_CONFLICT);
    }

    #[test]
    fn test_mapping_get_and_delete() {
        let svc = service();
        let mapping = svc.create_mapping(USER, amount_mapping("Chase")).into_data().unwrap();
        assert_eq!(svc.get_mapping(USER, mapping.id).into_data(), Some(mapping.clone()));
        assert_eq!(svc.delete_mapping(USER, mapping.id).into_data(), Some(mapping.id));
        assert_eq!(svc.delete_mapping(USER, mapping.id).status_code, STATUS_NOT_FOUND);
        assert_eq!(svc.get_mapping(USER, mapping.id).status_code, STATUS_NOT_FOUND);
    }

    // =========================================================================
    // Merchants
    // =========================================================================

    #[test]
    fn test_create_merchant_attaches_existing_transactions() {
        let svc = service();
        let cat = category(&svc, "Shopping");
        let other = category(&svc, "Gifts");
        import(&svc, &["WALMART 1", "WALMART 2", "TARGET"]);

        // One walmart row already has a category chosen by hand
        let preset = stored(&svc, "WALMART 2");
        svc.edit_transaction(
            USER,
            preset.id,
            ClassificationUpdate::category(Some(other), None),
        );

        let change = svc
            .create_merchant(USER, merchant("Walmart", &["walmart"], Some(cat)))
            .into_data()
            .unwrap();
        assert_eq!(change.affected, 2);

        let full = stored(&svc, "WALMART 1");
        assert_eq!(full.merchant_id, Some(change.merchant.id));
        assert_eq!(full.category_id, Some(cat));

        let kept = stored(&svc, "WALMART 2");
        assert_eq!(kept.merchant_id, Some(change.merchant.id));
        assert_eq!(kept.category_id, Some(other));

        assert_eq!(stored(&svc, "TARGET").merchant_id, None);
    }

    #[test]
    fn test_create_merchant_validation() {
        let svc = service();
        let env = svc.create_merchant(USER, merchant("  ", &["walmart"], None));
        assert_eq!(env.status_code, STATUS_BAD_REQUEST);
        assert!(env.message().unwrap().contains("name"));

        svc.create_merchant(USER, merchant("Walmart", &["walmart"], None));
        let env = svc.create_merchant(USER, merchant("walmart", &["wm"], None));
        assert_eq!(env.status_code, STATUS_CONFLICT);

        let env = svc.create_merchant(USER, merchant("Ghost", &["ghost"], Some(999)));
        assert_eq!(env.status_code, STATUS_NOT_FOUND);
    }

    #[test]
    fn test_merchant_without_includes_matches_nothing() {
        let svc = service();
        import(&svc, &["CASH WITHDRAWAL"]);

        let change = svc
            .create_merchant(USER, merchant("Landlord", &[], None))
            .into_data()
            .unwrap();
        assert!(change.merchant.includes.is_empty());
        assert_eq!(change.affected, 0);
        assert_eq!(stored(&svc, "CASH WITHDRAWAL").merchant_id, None);
    }

    #[test]
    fn test_merchant_includes_are_normalized() {
        let svc = service();
        let change = svc
            .create_merchant(USER, merchant(" Amazon ", &[" AMZN ", "amzn", "", "Amazon"], None))
            .into_data()
            .unwrap();
        assert_eq!(change.merchant.name, "Amazon");
        assert_eq!(change.merchant.includes, vec!["amzn", "amazon"]);
    }

    #[test]
    fn test_subcategory_must_belong_to_category() {
        let svc = service();
        let dining = category(&svc, "Dining");
        let transport = category(&svc, "Transport");
        let fuel = svc
            .create_subcategory(USER, transport, "Fuel")
            .into_data()
            .unwrap();

        let mut bad = merchant("Shell", &["shell"], Some(dining));
        bad.subcategory_id = Some(fuel.id);
        assert_eq!(svc.create_merchant(USER, bad).status_code, STATUS_BAD_REQUEST);

        let mut good = merchant("Shell", &["shell"], Some(transport));
        good.subcategory_id = Some(fuel.id);
        assert!(svc.create_merchant(USER, good).is_success());
    }

    #[test]
    fn test_update_merchant_category_respects_manual_changes() {
        let svc = service();
        let old_cat = category(&svc, "Shopping");
        let new_cat = category(&svc, "Groceries");
        let manual_cat = category(&svc, "Gifts");
        let m = svc
            .create_merchant(USER, merchant("Costco", &["costco"], Some(old_cat)))
            .into_data()
            .unwrap()
            .merchant;
        import(&svc, &["COSTCO 1", "COSTCO 2"]);

        let diverged = stored(&svc, "COSTCO 2");
        svc.edit_transaction(
            USER,
            diverged.id,
            ClassificationUpdate::category(Some(manual_cat), None),
        );

        let mut updated = m.clone();
        updated.category_id = Some(new_cat);
        let change = svc.update_merchant(USER, updated).into_data().unwrap();
        assert_eq!(change.affected, 1);

        assert_eq!(stored(&svc, "COSTCO 1").category_id, Some(new_cat));
        assert_eq!(stored(&svc, "COSTCO 2").category_id, Some(manual_cat));
    }

    #[test]
    fn test_update_merchant_includes_detach_and_reattach() {
        let svc = service();
        let cat = category(&svc, "Transport");
        let m = svc
            .create_merchant(USER, merchant("Uber", &["uber"], Some(cat)))
            .into_data()
            .unwrap()
            .merchant;
        import(&svc, &["UBER TRIP", "UBER EATS", "LYFT RIDE"]);

        let mut updated = m.clone();
        updated.includes = vec!["uber trip".to_string(), "lyft".to_string()];
        let change = svc.update_merchant(USER, updated).into_data().unwrap();
        // UBER EATS detached, UBER TRIP detached then reattached, LYFT RIDE attached
        assert_eq!(change.affected, 3);

        let eats = stored(&svc, "UBER EATS");
        assert!(eats.classification().is_unclassified());

        let trip = stored(&svc, "UBER TRIP");
        assert_eq!(trip.merchant_id, Some(m.id));
        assert_eq!(trip.category_id, Some(cat));

        let lyft = stored(&svc, "LYFT RIDE");
        assert_eq!(lyft.merchant_id, Some(m.id));
        assert_eq!(lyft.category_id, Some(cat));
    }

    #[test]
    fn test_update_merchant_unknown_id() {
        let svc = service();
        let env = svc.update_merchant(
            USER,
            Merchant {
                id: 77,
                name: "Nobody".to_string(),
                includes: vec!["nobody".to_string()],
                category_id: None,
                subcategory_id: None,
            },
        );
        assert_eq!(env.status_code, STATUS_NOT_FOUND);
    }

    #[test]
    fn test_delete_merchant_clears_only_its_category() {
        let svc = service();
        let cat = category(&svc, "Entertainment");
        let manual = category(&svc, "Gifts");
        let m = svc
            .create_merchant(USER, merchant("Netflix", &["netflix"], Some(cat)))
            .into_data()
            .unwrap()
            .merchant;
        import(&svc, &["NETFLIX JAN", "NETFLIX GIFT CARD"]);
        let gift = stored(&svc, "NETFLIX GIFT CARD");
        svc.edit_transaction(USER, gift.id, ClassificationUpdate::category(Some(manual), None));

        let change = svc.delete_merchant(USER, m.id).into_data().unwrap();
        assert_eq!(change.affected, 1);
        assert_eq!(change.merchant.id, m.id);

        assert!(stored(&svc, "NETFLIX JAN").classification().is_unclassified());
        let gift = stored(&svc, "NETFLIX GIFT CARD");
        assert_eq!(gift.merchant_id, None);
        assert_eq!(gift.category_id, Some(manual));

        assert_eq!(svc.delete_merchant(USER, m.id).status_code, STATUS_NOT_FOUND);
    }

    // =========================================================================
    // Categories
    // =========================================================================

    #[test]
    fn test_list_categories_nests_subcategories() {
        let svc = service();
        let dining = category(&svc, "Dining");
        category(&svc, "Groceries");
        svc.create_subcategory(USER, dining, "Coffee");
        svc.create_subcategory(USER, dining, "Restaurants");

        let listed = svc.list_categories(USER).into_data().unwrap();
        assert_eq!(listed.len(), 2);
        let dining = listed.iter().find(|c| c.category.name == "Dining").unwrap();
        assert_eq!(dining.subcategories.len(), 2);
        let groceries = listed.iter().find(|c| c.category.name == "Groceries").unwrap();
        assert!(groceries.subcategories.is_empty());
    }

    #[test]
    fn test_category_conflicts_and_missing() {
        let svc = service();
        let dining = category(&svc, "Dining");
        let env = svc.create_category(USER, "dining", CategoryGroup::Expense);
        assert_eq!(env.status_code, STATUS_CONFLICT);

        assert_eq!(svc.rename_category(USER, 999, "X").status_code, STATUS_NOT_FOUND);
        assert_eq!(svc.delete_category(USER, 999).status_code, STATUS_NOT_FOUND);
        assert_eq!(svc.delete_subcategory(USER, 999).status_code, STATUS_NOT_FOUND);
        assert_eq!(
            svc.create_subcategory(USER, 999, "Orphan").status_code,
            STATUS_NOT_FOUND
        );

        let renamed = svc.rename_category(USER, dining, "Eating Out").into_data().unwrap();
        assert_eq!(renamed.name, "Eating Out");
        assert!(svc.delete_category(USER, dining).is_success());
        assert!(svc.list_categories(USER).into_data().unwrap().is_empty());
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    #[test]
    fn test_edit_transaction() {
        let svc = service();
        let dining = category(&svc, "Dining");
        let coffee = svc
            .create_subcategory(USER, dining, "Coffee")
            .into_data()
            .unwrap();
        import(&svc, &["BEAN THERE"]);
        let tx = stored(&svc, "BEAN THERE");

        let edited = svc
            .edit_transaction(
                USER,
                tx.id,
                ClassificationUpdate::category(Some(dining), Some(coffee.id)),
            )
            .into_data()
            .unwrap();
        assert_eq!(edited.category_id, Some(dining));
        assert_eq!(edited.subcategory_id, Some(coffee.id));

        // Subcategory alone cannot outlive its category
        let env = svc.edit_transaction(
            USER,
            tx.id,
            ClassificationUpdate {
                category_id: Some(None),
                ..ClassificationUpdate::default()
            },
        );
        assert_eq!(env.status_code, STATUS_BAD_REQUEST);

        let cleared = svc
            .edit_transaction(USER, tx.id, ClassificationUpdate::clear_all())
            .into_data()
            .unwrap();
        assert!(cleared.classification().is_unclassified());
    }

    #[test]
    fn test_edit_transaction_errors() {
        let svc = service();
        import(&svc, &["SOMETHING"]);
        let tx = stored(&svc, "SOMETHING");

        assert_eq!(
            svc.edit_transaction(USER, 999, ClassificationUpdate::clear_all())
                .status_code,
            STATUS_NOT_FOUND
        );
        assert_eq!(
            svc.edit_transaction(USER, tx.id, ClassificationUpdate::default())
                .status_code,
            STATUS_BAD_REQUEST
        );
        assert_eq!(
            svc.edit_transaction(USER, tx.id, ClassificationUpdate::merchant_only(55))
                .status_code,
            STATUS_NOT_FOUND
        );
    }

    #[test]
    fn test_unassigned_report_and_seed() {
        let svc = service();
        import(&svc, &["SHOP A", "SHOP B", "SHOP A", "SHOP A", "SHOP B", "KIOSK"]);

        let report = svc.unassigned_descriptions(USER, None).into_data().unwrap();
        let counts: Vec<(&str, usize)> = report
            .iter()
            .map(|u| (u.description.as_str(), u.count))
            .collect();
        assert_eq!(counts, vec![("SHOP A", 3), ("SHOP B", 2), ("KIOSK", 1)]);

        let limited = svc.unassigned_descriptions(USER, Some(1)).into_data().unwrap();
        assert_eq!(limited.len(), 1);

        let seed = svc
            .merchant_seed_from_description("SHOP A")
            .into_data()
            .unwrap();
        assert_eq!(seed.name, "SHOP A");
        assert_eq!(seed.includes, vec!["shop a"]);
        assert_eq!(
            svc.merchant_seed_from_description("  ").status_code,
            STATUS_BAD_REQUEST
        );
    }

    #[test]
    fn test_reclassify_is_idempotent() {
        let svc = service();
        import(&svc, &["SPOTIFY P1", "SPOTIFY P2", "OTHER"]);
        let cat = category(&svc, "Entertainment");

        // Insert the merchant behind the service so no pass runs
        svc.store()
            .create_merchant(USER, &merchant("Spotify", &["spotify"], Some(cat)))
            .unwrap();

        assert_eq!(svc.reclassify(USER).into_data(), Some(2));
        assert_eq!(svc.reclassify(USER).into_data(), Some(0));
        assert_eq!(stored(&svc, "SPOTIFY P1").category_id, Some(cat));
    }

    #[test]
    fn test_provision_user_envelope() {
        let svc = service();
        let env = svc.provision_user(USER);
        assert_eq!(env.status_code, 201);
        assert!(env.data().unwrap().total() > 0);
        assert_eq!(svc.provision_user(USER).into_data().unwrap().total(), 0);
    }
}
