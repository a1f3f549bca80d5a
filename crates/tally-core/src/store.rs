//! Data-access port used by the import pipeline and rule maintenance.
//!
//! Every method is scoped to a user id. Lookups of a missing id return
//! `Ok(None)` or `Ok(false)`; the service layer turns those into not-found
//! responses. [`crate::db::Database`] is the SQLite implementation.

use crate::error::Result;
use crate::models::{
    CandidateTransaction, Category, CategoryGroup, ClassificationUpdate, Mapping, Merchant,
    NewMapping, NewMerchant, Subcategory, Transaction,
};

pub trait Store {
    // Categories

    fn list_categories(&self, user_id: &str) -> Result<Vec<Category>>;
    fn get_category(&self, user_id: &str, id: i64) -> Result<Option<Category>>;
    fn insert_category(&self, user_id: &str, name: &str, group: CategoryGroup) -> Result<i64>;
    fn rename_category(&self, user_id: &str, id: i64, name: &str) -> Result<bool>;
    /// Delete a category and its subcategories. References to either on
    /// merchants and transactions are cleared.
    fn delete_category(&self, user_id: &str, id: i64) -> Result<bool>;

    /// Subcategories, optionally limited to one category
    fn list_subcategories(
        &self,
        user_id: &str,
        category_id: Option<i64>,
    ) -> Result<Vec<Subcategory>>;
    fn get_subcategory(&self, user_id: &str, id: i64) -> Result<Option<Subcategory>>;
    fn insert_subcategory(&self, user_id: &str, category_id: i64, name: &str) -> Result<i64>;
    /// Delete a subcategory, clearing references to it
    fn delete_subcategory(&self, user_id: &str, id: i64) -> Result<bool>;

    // Merchants

    /// All merchants, ordered by id
    fn list_merchants(&self, user_id: &str) -> Result<Vec<Merchant>>;
    fn get_merchant(&self, user_id: &str, id: i64) -> Result<Option<Merchant>>;
    fn insert_merchant(&self, user_id: &str, merchant: &NewMerchant) -> Result<i64>;
    fn update_merchant(&self, user_id: &str, merchant: &Merchant) -> Result<bool>;
    /// Delete a merchant. Transactions linked to it lose the link.
    fn delete_merchant(&self, user_id: &str, id: i64) -> Result<bool>;

    // Mappings

    fn list_mappings(&self, user_id: &str) -> Result<Vec<Mapping>>;
    fn get_mapping(&self, user_id: &str, id: i64) -> Result<Option<Mapping>>;
    fn insert_mapping(&self, user_id: &str, mapping: &NewMapping) -> Result<i64>;
    fn update_mapping(&self, user_id: &str, mapping: &Mapping) -> Result<bool>;
    fn delete_mapping(&self, user_id: &str, id: i64) -> Result<bool>;

    // Transactions

    /// Insert a batch in one unit, returning ids in input order
    fn insert_transactions(
        &self,
        user_id: &str,
        candidates: &[CandidateTransaction],
    ) -> Result<Vec<i64>>;
    /// Most recent first
    fn list_transactions(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Transaction>>;
    fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>>;
    /// Transactions linked to `merchant_id`, or with no merchant when `None`
    fn transactions_by_merchant(
        &self,
        user_id: &str,
        merchant_id: Option<i64>,
    ) -> Result<Vec<Transaction>>;
    /// Apply one partial classification update to many transactions,
    /// returning how many rows changed
    fn update_classification(
        &self,
        user_id: &str,
        ids: &[i64],
        update: &ClassificationUpdate,
    ) -> Result<usize>;
}
